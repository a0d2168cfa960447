//! Stage-gated routing of free-text messages.

use std::time::Duration;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use teloxide::prelude::*;
use tracing::warn;

use crate::config::CONFIG;
use crate::sessions::{ChatSession, PanelField, Stage};
use crate::state::AppState;

use super::panel;

/// Price-range input: `<min>-<max>`, whitespace-tolerant around the hyphen.
static PRICE_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)").expect("price range regex"));

/// Parse a `2000-8000` style price range. Bounds are stored as typed; a
/// reversed range is accepted without reordering.
pub fn parse_price_range(text: &str) -> Option<(u32, u32)> {
    let captures = PRICE_RANGE_RE.captures(text)?;
    let min = captures.get(1)?.as_str().parse().ok()?;
    let max = captures.get(2)?.as_str().parse().ok()?;
    Some((min, max))
}

pub async fn handle_text(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let Some(text) = message.text().map(|text| text.to_string()) else {
        return Ok(());
    };
    let chat_id = message.chat.id;

    let guard = state.sessions.guard(chat_id);
    let _guard = guard.lock().await;

    let Some(mut session) = state.sessions.get(chat_id) else {
        send_start_hint(&bot, chat_id).await;
        return Ok(());
    };

    match session.stage {
        Stage::AwaitingKeyword => {
            session.draft.keyword = Some(text);
            session.stage = Stage::Configuring;
            panel::render_panel(&bot, chat_id, &mut session).await;
            state.sessions.put(chat_id, session);
        }
        Stage::AwaitingField { field, prompt_id } => {
            apply_field_input(&bot, chat_id, &mut session, field, &text).await;
            if let Err(err) = bot.delete_message(chat_id, prompt_id).await {
                warn!("Failed to delete field prompt: {err}");
            }
            session.stage = Stage::Configuring;
            panel::render_panel(&bot, chat_id, &mut session).await;
            state.sessions.put(chat_id, session);
        }
        _ => send_start_hint(&bot, chat_id).await,
    }

    Ok(())
}

async fn apply_field_input(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut ChatSession,
    field: PanelField,
    text: &str,
) {
    match field {
        PanelField::Keyword => {
            session.draft.keyword = Some(text.to_string());
        }
        PanelField::City => {
            let city = text.trim().to_lowercase();
            session.draft.city = if city.is_empty() { None } else { Some(city) };
        }
        PanelField::Price => match parse_price_range(text) {
            Some((min, max)) => {
                session.draft.min_price = Some(min);
                session.draft.max_price = Some(max);
            }
            None => {
                session.draft.min_price = None;
                session.draft.max_price = None;
                send_transient_notice(
                    bot,
                    chat_id,
                    "Price must look like 2000-8000. Filter left empty.",
                )
                .await;
            }
        },
    }
}

async fn send_start_hint(bot: &Bot, chat_id: ChatId) {
    if let Err(err) = bot
        .send_message(chat_id, "Send /start to set up a search 🔁")
        .await
    {
        warn!("Failed to send start hint: {err}");
    }
}

/// Send a notice that deletes itself after a short delay.
pub async fn send_transient_notice(bot: &Bot, chat_id: ChatId, text: &str) {
    match bot.send_message(chat_id, text.to_string()).await {
        Ok(notice) => {
            let bot = bot.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(CONFIG.notice_ttl_seconds)).await;
                if let Err(err) = bot.delete_message(chat_id, notice.id).await {
                    warn!("Failed to delete transient notice: {err}");
                }
            });
        }
        Err(err) => warn!("Failed to send notice: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_plain_price_range() {
        assert_eq!(parse_price_range("2000-8000"), Some((2000, 8000)));
    }

    #[test]
    fn tolerates_whitespace_around_the_hyphen() {
        assert_eq!(parse_price_range("2000 - 8000"), Some((2000, 8000)));
        assert_eq!(parse_price_range("  2000-  8000  "), Some((2000, 8000)));
    }

    #[test]
    fn accepts_a_reversed_range_without_reordering() {
        assert_eq!(parse_price_range("8000-2000"), Some((8000, 2000)));
    }

    #[test]
    fn rejects_input_with_no_range() {
        assert_eq!(parse_price_range("abc"), None);
        assert_eq!(parse_price_range(""), None);
        assert_eq!(parse_price_range("2000"), None);
    }

    #[test]
    fn finds_a_range_embedded_in_surrounding_text() {
        assert_eq!(parse_price_range("from 2000 - 8000 uah"), Some((2000, 8000)));
    }
}
