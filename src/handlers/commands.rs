use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::categories::CATEGORIES;
use crate::sessions::ChatSession;
use crate::state::AppState;

pub const CATEGORY_CALLBACK_PREFIX: &str = "cat:";

const HELP_TEXT: &str = "\
This bot searches OLX listings for you.\n\n\
/start - configure a new search\n\
/help - this message\n\n\
Pick a category, type a keyword, then optionally narrow the search by city, \
price range and sort order before hitting Search. The bot renders the \
marketplace results page and sends back up to 20 ads.";

pub fn build_category_keyboard() -> InlineKeyboardMarkup {
    let buttons = CATEGORIES
        .iter()
        .map(|category| {
            InlineKeyboardButton::callback(
                category.label.to_string(),
                format!("{CATEGORY_CALLBACK_PREFIX}{}", category.slug),
            )
        })
        .collect::<Vec<_>>();

    let rows = buttons
        .chunks(2)
        .map(|chunk| chunk.to_vec())
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// `/start` unconditionally replaces whatever session existed before.
pub async fn start_handler(bot: Bot, state: AppState, message: Message) -> Result<()> {
    let chat_id = message.chat.id;
    let guard = state.sessions.guard(chat_id);
    let _guard = guard.lock().await;

    state.sessions.put(chat_id, ChatSession::started());
    bot.send_message(chat_id, "Pick a category:")
        .reply_markup(build_category_keyboard())
        .await?;
    Ok(())
}

pub async fn help_handler(bot: Bot, message: Message) -> Result<()> {
    bot.send_message(message.chat.id, HELP_TEXT).await?;
    Ok(())
}
