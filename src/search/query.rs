//! Marketplace search URL construction.
//!
//! Two URL shapes exist: categories with a dedicated marketplace path use
//! `{base}/{path}/q-<keyword>{-city}/`, while keyword-mapped categories fall
//! back to the flat `{base}/list/?q=<category keyword> <keyword>` endpoint.
//! Price bounds and sort order ride along as query parameters in both shapes.

use url::Url;

use crate::categories::CategoryTarget;

use super::FetchError;

pub const ORDER_PARAM: &str = "search[order]";
pub const PRICE_FROM_PARAM: &str = "search[filter_float_price:from]";
pub const PRICE_TO_PARAM: &str = "search[filter_float_price:to]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    PriceAscending,
    PriceDescending,
}

impl SortOrder {
    /// Value of the `search[order]` query parameter.
    pub fn as_order_value(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "created_at:desc",
            SortOrder::PriceAscending => "price:asc",
            SortOrder::PriceDescending => "price:desc",
        }
    }

    /// Stable identifier used in callback data.
    pub fn callback_key(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "newest",
            SortOrder::PriceAscending => "price_asc",
            SortOrder::PriceDescending => "price_desc",
        }
    }

    pub fn from_callback_key(key: &str) -> Option<Self> {
        match key {
            "newest" => Some(SortOrder::NewestFirst),
            "price_asc" => Some(SortOrder::PriceAscending),
            "price_desc" => Some(SortOrder::PriceDescending),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "Newest first",
            SortOrder::PriceAscending => "Price: low to high",
            SortOrder::PriceDescending => "Price: high to low",
        }
    }
}

/// A fully-resolved search, ready to be turned into a marketplace URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub target: CategoryTarget,
    pub city: Option<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub sort: SortOrder,
}

/// Lowercase a phrase and join its words with hyphens, as the marketplace
/// does for path-embedded search terms.
fn slugify(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

pub fn build_search_url(base: &str, query: &SearchQuery) -> Result<Url, FetchError> {
    let mut url = Url::parse(base).map_err(|source| FetchError::BadBaseUrl {
        base: base.to_string(),
        source,
    })?;

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| FetchError::BaseNotExtensible(base.to_string()))?;
        segments.pop_if_empty();

        match query.target {
            CategoryTarget::Path(path) => {
                for segment in path.split('/') {
                    segments.push(segment);
                }
                let mut leaf = format!("q-{}", slugify(&query.keyword));
                if let Some(city) = &query.city {
                    leaf.push('-');
                    leaf.push_str(&slugify(city));
                }
                segments.push(&leaf);
            }
            CategoryTarget::Keyword(_) => {
                segments.push("list");
            }
        }
        // Trailing slash, as the marketplace serves it.
        segments.push("");
    }

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(ORDER_PARAM, query.sort.as_order_value());
        if let CategoryTarget::Keyword(category_keyword) = query.target {
            let combined = if category_keyword.is_empty() {
                query.keyword.clone()
            } else {
                format!("{category_keyword} {}", query.keyword)
            };
            pairs.append_pair("q", &combined);
        }
        if let Some(min) = query.min_price {
            pairs.append_pair(PRICE_FROM_PARAM, &min.to_string());
        }
        if let Some(max) = query.max_price {
            pairs.append_pair(PRICE_TO_PARAM, &max.to_string());
        }
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.olx.ua/uk";

    fn phones_query() -> SearchQuery {
        SearchQuery {
            keyword: "iPhone 13".to_string(),
            target: CategoryTarget::Path("elektronika/telefony"),
            city: None,
            min_price: None,
            max_price: None,
            sort: SortOrder::default(),
        }
    }

    fn param(url: &Url, name: &str) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    #[test]
    fn builds_category_path_url_without_price_params() {
        let url = build_search_url(BASE, &phones_query()).expect("url");
        assert_eq!(url.path(), "/uk/elektronika/telefony/q-iphone-13/");
        assert_eq!(param(&url, ORDER_PARAM).as_deref(), Some("created_at:desc"));
        assert!(param(&url, PRICE_FROM_PARAM).is_none());
        assert!(param(&url, PRICE_TO_PARAM).is_none());
    }

    #[test]
    fn carries_both_price_bounds_verbatim() {
        let mut query = phones_query();
        query.min_price = Some(2000);
        query.max_price = Some(8000);
        let url = build_search_url(BASE, &query).expect("url");
        assert_eq!(param(&url, PRICE_FROM_PARAM).as_deref(), Some("2000"));
        assert_eq!(param(&url, PRICE_TO_PARAM).as_deref(), Some("8000"));
    }

    #[test]
    fn appends_city_to_the_keyword_segment() {
        let mut query = phones_query();
        query.city = Some("kyiv".to_string());
        let url = build_search_url(BASE, &query).expect("url");
        assert_eq!(url.path(), "/uk/elektronika/telefony/q-iphone-13-kyiv/");
    }

    #[test]
    fn keyword_categories_use_the_flat_list_endpoint() {
        let query = SearchQuery {
            keyword: "iPad Air".to_string(),
            target: CategoryTarget::Keyword("tablet"),
            city: None,
            min_price: Some(4000),
            max_price: None,
            sort: SortOrder::PriceAscending,
        };
        let url = build_search_url(BASE, &query).expect("url");
        assert_eq!(url.path(), "/uk/list/");
        assert_eq!(param(&url, "q").as_deref(), Some("tablet iPad Air"));
        assert_eq!(param(&url, ORDER_PARAM).as_deref(), Some("price:asc"));
        assert_eq!(param(&url, PRICE_FROM_PARAM).as_deref(), Some("4000"));
        assert!(param(&url, PRICE_TO_PARAM).is_none());
    }

    #[test]
    fn tolerates_a_trailing_slash_on_the_base_url() {
        let url = build_search_url("https://www.olx.ua/uk/", &phones_query()).expect("url");
        assert_eq!(url.path(), "/uk/elektronika/telefony/q-iphone-13/");
    }

    #[test]
    fn sort_keys_round_trip_through_callback_data() {
        for sort in [
            SortOrder::NewestFirst,
            SortOrder::PriceAscending,
            SortOrder::PriceDescending,
        ] {
            assert_eq!(SortOrder::from_callback_key(sort.callback_key()), Some(sort));
        }
        assert_eq!(SortOrder::from_callback_key("oldest"), None);
    }
}
