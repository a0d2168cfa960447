//! Per-chat search-configuration sessions.

pub mod store;

use teloxide::types::MessageId;

use crate::categories::Category;
use crate::search::SortOrder;

/// Which field a transient panel prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelField {
    Keyword,
    City,
    Price,
}

/// Position in the configuration flow. Free-text input is interpreted only
/// in the stages that expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    ChoosingCategory,
    /// First keyword prompt, before the panel exists.
    AwaitingKeyword,
    /// Panel resting stage.
    Configuring,
    /// A panel field edit is in flight; `prompt_id` is the short-lived
    /// prompt message to delete once the value is captured or times out.
    AwaitingField {
        field: PanelField,
        prompt_id: MessageId,
    },
    Searching,
}

/// The search being configured. Category and keyword are required before a
/// search can run; everything else is optional.
#[derive(Debug, Clone, Default)]
pub struct SearchDraft {
    pub category: Option<&'static Category>,
    /// Stored verbatim as typed.
    pub keyword: Option<String>,
    /// Stored lowercased and trimmed.
    pub city: Option<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub sort: SortOrder,
}

/// One session per chat id, held in process memory only.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    pub stage: Stage,
    pub draft: SearchDraft,
    /// The message currently displaying the configuration panel, when one
    /// has been rendered.
    pub panel_message_id: Option<MessageId>,
}

impl ChatSession {
    /// Fresh session as created by `/start`.
    pub fn started() -> Self {
        ChatSession {
            stage: Stage::ChoosingCategory,
            ..ChatSession::default()
        }
    }

    /// Post-search reset: the configuration is cleared, but the panel
    /// message is kept so it can be re-rendered in place.
    pub fn reset_after_search(&mut self) {
        self.draft = SearchDraft::default();
        self.stage = if self.panel_message_id.is_some() {
            Stage::Configuring
        } else {
            Stage::Idle
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::category_by_slug;

    #[test]
    fn started_session_is_choosing_a_category() {
        let session = ChatSession::started();
        assert_eq!(session.stage, Stage::ChoosingCategory);
        assert!(session.draft.category.is_none());
        assert!(session.draft.keyword.is_none());
        assert!(session.panel_message_id.is_none());
    }

    #[test]
    fn reset_clears_the_draft_but_keeps_the_panel() {
        let mut session = ChatSession::started();
        session.draft.category = category_by_slug("phones");
        session.draft.keyword = Some("iPhone 13".to_string());
        session.draft.min_price = Some(2000);
        session.panel_message_id = Some(MessageId(42));
        session.stage = Stage::Searching;

        session.reset_after_search();

        assert_eq!(session.stage, Stage::Configuring);
        assert!(session.draft.category.is_none());
        assert!(session.draft.keyword.is_none());
        assert!(session.draft.min_price.is_none());
        assert_eq!(session.panel_message_id, Some(MessageId(42)));
    }

    #[test]
    fn reset_without_a_panel_returns_to_idle() {
        let mut session = ChatSession::started();
        session.stage = Stage::Searching;
        session.reset_after_search();
        assert_eq!(session.stage, Stage::Idle);
    }
}
