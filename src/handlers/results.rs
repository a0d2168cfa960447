//! Search execution: validation, the fetch itself, and delivery of the
//! resulting ad records back to the chat.

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode};
use teloxide::utils::html;
use tracing::{error, warn};
use url::Url;

use crate::search::{AdRecord, SearchQuery};
use crate::sessions::{ChatSession, SearchDraft, Stage};
use crate::state::AppState;

use super::panel;

/// Preconditions that block the search trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingCategory,
    MissingKeyword,
}

impl ValidationError {
    pub fn message(self) -> &'static str {
        match self {
            ValidationError::MissingCategory => "Pick a category before searching.",
            ValidationError::MissingKeyword => "Type a keyword before searching.",
        }
    }
}

/// Resolve a draft into a runnable query. Category and keyword are required;
/// everything else passes through as-is.
pub fn resolve_query(draft: &SearchDraft) -> Result<SearchQuery, ValidationError> {
    let category = draft.category.ok_or(ValidationError::MissingCategory)?;
    let keyword = draft
        .keyword
        .clone()
        .filter(|keyword| !keyword.trim().is_empty())
        .ok_or(ValidationError::MissingKeyword)?;

    Ok(SearchQuery {
        keyword,
        target: category.target,
        city: draft.city.clone(),
        min_price: draft.min_price,
        max_price: draft.max_price,
        sort: draft.sort,
    })
}

/// Run a resolved search and deliver its outcome.
///
/// Whatever happens, the session ends up reset with the panel re-rendered in
/// place, so the user is never stuck in the searching stage.
pub async fn run_search(
    bot: &Bot,
    state: &AppState,
    chat_id: ChatId,
    session: &mut ChatSession,
    query: SearchQuery,
) -> Result<()> {
    session.stage = Stage::Searching;
    state.sessions.put(chat_id, session.clone());

    let notice = format!("⏳ Searching for <b>{}</b>…", html::escape(&query.keyword));
    if let Err(err) = bot
        .send_message(chat_id, notice)
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!("Failed to send progress notice: {err}");
    }

    match state.fetcher.fetch(&query).await {
        Ok(records) if records.is_empty() => {
            if let Err(err) = bot.send_message(chat_id, "😕 Nothing found.").await {
                warn!("Failed to send empty-result notice: {err}");
            }
        }
        Ok(records) => {
            // One send per record, awaited in turn, so delivery order
            // matches extraction order.
            for record in &records {
                deliver_record(bot, chat_id, record).await;
            }
        }
        Err(err) => {
            error!("Search failed: {err}");
            let text = format!("⚠️ Search failed: {err}");
            if let Err(err) = bot.send_message(chat_id, text).await {
                warn!("Failed to send failure notice: {err}");
            }
        }
    }

    session.reset_after_search();
    panel::render_panel(bot, chat_id, session).await;
    state.sessions.put(chat_id, session.clone());

    Ok(())
}

/// Deliver one record: photo with caption when a thumbnail exists, text-only
/// otherwise. A rejected photo falls back to the identical text message
/// rather than losing the record.
async fn deliver_record(bot: &Bot, chat_id: ChatId, record: &AdRecord) {
    let text = format_record_text(record);
    let keyboard = record_keyboard(record);

    if let Some(image) = &record.image {
        if let Ok(image_url) = Url::parse(image) {
            let request = bot
                .send_photo(chat_id, InputFile::url(image_url))
                .caption(text.clone())
                .parse_mode(ParseMode::Html);
            let request = match keyboard.clone() {
                Some(markup) => request.reply_markup(markup),
                None => request,
            };
            match request.await {
                Ok(_) => return,
                Err(err) => warn!("Photo delivery failed, falling back to text: {err}"),
            }
        }
    }

    let request = bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
    let request = match keyboard {
        Some(markup) => request.reply_markup(markup),
        None => request,
    };
    if let Err(err) = request.await {
        warn!("Failed to deliver ad record: {err}");
    }
}

fn format_record_text(record: &AdRecord) -> String {
    format!(
        "📌 <b>{}</b>\n💵 {}",
        html::escape(&record.title),
        html::escape(&record.price)
    )
}

fn record_keyboard(record: &AdRecord) -> Option<InlineKeyboardMarkup> {
    Url::parse(&record.link).ok().map(|link| {
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
            "🔗 View on OLX".to_string(),
            link,
        )]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::{category_by_slug, CategoryTarget};
    use crate::search::SortOrder;

    fn configured_draft() -> SearchDraft {
        SearchDraft {
            category: category_by_slug("phones"),
            keyword: Some("iPhone 13".to_string()),
            ..SearchDraft::default()
        }
    }

    #[test]
    fn resolves_a_complete_draft_verbatim() {
        let query = resolve_query(&configured_draft()).expect("query");
        assert_eq!(query.keyword, "iPhone 13");
        assert_eq!(query.target, CategoryTarget::Path("elektronika/telefony"));
        assert!(query.city.is_none());
        assert!(query.min_price.is_none());
        assert!(query.max_price.is_none());
        assert_eq!(query.sort, SortOrder::NewestFirst);
    }

    #[test]
    fn blocks_search_without_a_category() {
        let mut draft = configured_draft();
        draft.category = None;
        assert_eq!(resolve_query(&draft), Err(ValidationError::MissingCategory));
    }

    #[test]
    fn blocks_search_without_a_keyword() {
        let mut draft = configured_draft();
        draft.keyword = None;
        assert_eq!(resolve_query(&draft), Err(ValidationError::MissingKeyword));

        draft.keyword = Some("   ".to_string());
        assert_eq!(resolve_query(&draft), Err(ValidationError::MissingKeyword));
    }

    #[test]
    fn record_text_escapes_html_reserved_characters() {
        let record = AdRecord {
            title: "iPhone <13> & case".to_string(),
            price: "18 000 грн".to_string(),
            link: "https://www.olx.ua/d/ad".to_string(),
            image: None,
        };
        let text = format_record_text(&record);
        assert!(text.contains("&lt;13&gt; &amp; case"));
        assert!(!text.contains("<13>"));
    }

    #[test]
    fn link_button_requires_a_parseable_url() {
        let mut record = AdRecord {
            title: "A".to_string(),
            price: "1".to_string(),
            link: "https://www.olx.ua/d/ad".to_string(),
            image: None,
        };
        assert!(record_keyboard(&record).is_some());

        record.link = "not a url".to_string();
        assert!(record_keyboard(&record).is_none());
    }
}
