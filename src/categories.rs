//! The fixed set of searchable categories offered by the bot.

/// Where a category points on the marketplace: a dedicated category path, or
/// a plain keyword for the legacy flat `/list/` search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryTarget {
    Path(&'static str),
    Keyword(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Button label shown in the chat.
    pub label: &'static str,
    /// Stable identifier used in callback data.
    pub slug: &'static str,
    pub target: CategoryTarget,
}

pub const CATEGORIES: [Category; 4] = [
    Category {
        label: "📱 Phones",
        slug: "phones",
        target: CategoryTarget::Path("elektronika/telefony"),
    },
    Category {
        label: "💻 Laptops",
        slug: "laptops",
        target: CategoryTarget::Path("elektronika/noutbuki"),
    },
    Category {
        label: "🎧 Headphones",
        slug: "headphones",
        target: CategoryTarget::Path("elektronika/naushniki"),
    },
    // Tablets have no dedicated path on the marketplace; they go through the
    // flat keyword search endpoint instead.
    Category {
        label: "📟 Tablets",
        slug: "tablets",
        target: CategoryTarget::Keyword("tablet"),
    },
];

pub fn category_by_slug(slug: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_categories_by_slug() {
        let phones = category_by_slug("phones").expect("phones category");
        assert_eq!(phones.label, "📱 Phones");
        assert_eq!(phones.target, CategoryTarget::Path("elektronika/telefony"));
    }

    #[test]
    fn rejects_unknown_slugs() {
        assert!(category_by_slug("bicycles").is_none());
        assert!(category_by_slug("").is_none());
    }

    #[test]
    fn slugs_are_unique() {
        for (index, category) in CATEGORIES.iter().enumerate() {
            assert!(
                CATEGORIES[index + 1..]
                    .iter()
                    .all(|other| other.slug != category.slug),
                "duplicate slug {}",
                category.slug
            );
        }
    }
}
