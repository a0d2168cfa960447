//! The configuration panel: one editable message re-rendered in place, with
//! a button per field and callback routing for every button press.

use std::time::Duration;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::utils::html;
use tracing::warn;

use crate::categories::category_by_slug;
use crate::config::CONFIG;
use crate::search::SortOrder;
use crate::sessions::{ChatSession, PanelField, SearchDraft, Stage};
use crate::state::AppState;

use super::commands::{build_category_keyboard, CATEGORY_CALLBACK_PREFIX};
use super::results;

pub const PANEL_CALLBACK_PREFIX: &str = "panel:";
pub const SORT_CALLBACK_PREFIX: &str = "sort:";

const FIELD_PLACEHOLDER: &str = "—";

pub async fn handle_callback(bot: Bot, state: AppState, query: CallbackQuery) -> Result<()> {
    let Some(data) = query.data.clone() else {
        let _ = bot.answer_callback_query(query.id.clone()).await;
        return Ok(());
    };
    let Some(chat_id) = query.message.as_ref().map(|message| message.chat().id) else {
        let _ = bot.answer_callback_query(query.id.clone()).await;
        return Ok(());
    };

    let guard = state.sessions.guard(chat_id);
    let _guard = guard.lock().await;

    // Button presses can outlive their session, e.g. after a restart.
    let Some(mut session) = state.sessions.get(chat_id) else {
        bot.answer_callback_query(query.id.clone())
            .text("This menu is no longer active. Send /start to begin again.")
            .show_alert(true)
            .await?;
        return Ok(());
    };

    if let Some(slug) = data.strip_prefix(CATEGORY_CALLBACK_PREFIX) {
        handle_category_selection(&bot, &state, &query, chat_id, &mut session, slug).await?;
    } else if let Some(key) = data.strip_prefix(SORT_CALLBACK_PREFIX) {
        handle_sort_selection(&bot, &state, &query, chat_id, &mut session, key).await?;
    } else if let Some(action) = data.strip_prefix(PANEL_CALLBACK_PREFIX) {
        handle_panel_action(&bot, &state, &query, chat_id, &mut session, action).await?;
    } else {
        let _ = bot.answer_callback_query(query.id.clone()).await;
    }

    Ok(())
}

async fn handle_category_selection(
    bot: &Bot,
    state: &AppState,
    query: &CallbackQuery,
    chat_id: ChatId,
    session: &mut ChatSession,
    slug: &str,
) -> Result<()> {
    let _ = bot.answer_callback_query(query.id.clone()).await;

    // Category buttons are live only while a category is being chosen, and
    // unknown labels leave the session untouched.
    if session.stage != Stage::ChoosingCategory {
        return Ok(());
    }
    let Some(category) = category_by_slug(slug) else {
        return Ok(());
    };

    session.draft.category = Some(category);

    if session.panel_message_id.is_some() {
        session.stage = Stage::Configuring;
        render_panel(bot, chat_id, session).await;
        state.sessions.put(chat_id, session.clone());
    } else {
        session.stage = Stage::AwaitingKeyword;
        state.sessions.put(chat_id, session.clone());

        if let Some(message) = query.message.as_ref() {
            if let Err(err) = bot.delete_message(chat_id, message.id()).await {
                warn!("Failed to delete category prompt: {err}");
            }
        }
        bot.send_message(
            chat_id,
            format!("You picked {}.\nNow type a search keyword:", category.label),
        )
        .await?;
    }

    Ok(())
}

async fn handle_sort_selection(
    bot: &Bot,
    state: &AppState,
    query: &CallbackQuery,
    chat_id: ChatId,
    session: &mut ChatSession,
    key: &str,
) -> Result<()> {
    let _ = bot.answer_callback_query(query.id.clone()).await;

    let Some(sort) = SortOrder::from_callback_key(key) else {
        return Ok(());
    };

    session.draft.sort = sort;
    session.stage = Stage::Configuring;
    render_panel(bot, chat_id, session).await;
    state.sessions.put(chat_id, session.clone());
    Ok(())
}

async fn handle_panel_action(
    bot: &Bot,
    state: &AppState,
    query: &CallbackQuery,
    chat_id: ChatId,
    session: &mut ChatSession,
    action: &str,
) -> Result<()> {
    match action {
        "category" => {
            let _ = bot.answer_callback_query(query.id.clone()).await;
            session.stage = Stage::ChoosingCategory;
            show_panel_screen(bot, chat_id, session, "Pick a category:", build_category_keyboard())
                .await;
            state.sessions.put(chat_id, session.clone());
        }
        "sort" => {
            let _ = bot.answer_callback_query(query.id.clone()).await;
            show_panel_screen(bot, chat_id, session, "Pick a sort order:", build_sort_keyboard())
                .await;
            state.sessions.put(chat_id, session.clone());
        }
        "keyword" => {
            prompt_field(bot, state, query, chat_id, session, PanelField::Keyword,
                "Type a search keyword:")
            .await?;
        }
        "city" => {
            prompt_field(bot, state, query, chat_id, session, PanelField::City,
                "Type a city:")
            .await?;
        }
        "price" => {
            prompt_field(bot, state, query, chat_id, session, PanelField::Price,
                "Type a price range like 2000-8000:")
            .await?;
        }
        "search" => {
            handle_search_action(bot, state, query, chat_id, session).await?;
        }
        _ => {
            let _ = bot.answer_callback_query(query.id.clone()).await;
        }
    }
    Ok(())
}

/// Missing category or keyword blocks the search with an alert; the fetcher
/// is never reached.
async fn handle_search_action(
    bot: &Bot,
    state: &AppState,
    query: &CallbackQuery,
    chat_id: ChatId,
    session: &mut ChatSession,
) -> Result<()> {
    match results::resolve_query(&session.draft) {
        Err(validation) => {
            bot.answer_callback_query(query.id.clone())
                .text(validation.message())
                .show_alert(true)
                .await?;
        }
        Ok(search_query) => {
            let _ = bot.answer_callback_query(query.id.clone()).await;
            results::run_search(bot, state, chat_id, session, search_query).await?;
        }
    }
    Ok(())
}

async fn prompt_field(
    bot: &Bot,
    state: &AppState,
    query: &CallbackQuery,
    chat_id: ChatId,
    session: &mut ChatSession,
    field: PanelField,
    prompt_text: &str,
) -> Result<()> {
    let _ = bot.answer_callback_query(query.id.clone()).await;

    // A superseded prompt would otherwise linger forever; its timeout task
    // only deletes the prompt it was spawned for.
    if let Stage::AwaitingField { prompt_id, .. } = session.stage {
        if let Err(err) = bot.delete_message(chat_id, prompt_id).await {
            warn!("Failed to delete superseded field prompt: {err}");
        }
    }

    let prompt = bot.send_message(chat_id, prompt_text.to_string()).await?;
    session.stage = Stage::AwaitingField {
        field,
        prompt_id: prompt.id,
    };
    state.sessions.put(chat_id, session.clone());

    spawn_prompt_timeout(bot.clone(), state.clone(), chat_id, prompt.id);
    Ok(())
}

/// Delete a field prompt that was never answered and put the session back
/// into the configuring stage.
fn spawn_prompt_timeout(bot: Bot, state: AppState, chat_id: ChatId, prompt_id: MessageId) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(CONFIG.field_prompt_timeout_seconds)).await;

        let guard = state.sessions.guard(chat_id);
        let _guard = guard.lock().await;

        let Some(mut session) = state.sessions.get(chat_id) else {
            return;
        };
        let Stage::AwaitingField {
            prompt_id: current, ..
        } = session.stage
        else {
            return;
        };
        if current != prompt_id {
            return;
        }

        session.stage = Stage::Configuring;
        state.sessions.put(chat_id, session);
        if let Err(err) = bot.delete_message(chat_id, prompt_id).await {
            warn!("Failed to delete expired field prompt: {err}");
        }
    });
}

/// Re-render the configuration panel in place.
pub async fn render_panel(bot: &Bot, chat_id: ChatId, session: &mut ChatSession) {
    let text = build_panel_text(&session.draft);
    show_panel_screen(bot, chat_id, session, &text, build_panel_keyboard()).await;
}

/// Edit the panel message to the given screen, or send a fresh panel message
/// when none exists yet (or the old one is gone).
async fn show_panel_screen(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut ChatSession,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) {
    if let Some(panel_id) = session.panel_message_id {
        match bot
            .edit_message_text(chat_id, panel_id, text.to_string())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) => return,
            Err(err) => warn!("Failed to edit panel message, sending a new one: {err}"),
        }
    }

    match bot
        .send_message(chat_id, text.to_string())
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await
    {
        Ok(message) => session.panel_message_id = Some(message.id),
        Err(err) => warn!("Failed to send panel message: {err}"),
    }
}

fn build_panel_text(draft: &SearchDraft) -> String {
    let category = draft
        .category
        .map(|category| category.label.to_string())
        .unwrap_or_else(|| FIELD_PLACEHOLDER.to_string());
    let keyword = draft
        .keyword
        .as_deref()
        .map(html::escape)
        .unwrap_or_else(|| FIELD_PLACEHOLDER.to_string());
    let city = draft
        .city
        .as_deref()
        .map(html::escape)
        .unwrap_or_else(|| "any".to_string());
    let price = match (draft.min_price, draft.max_price) {
        (Some(min), Some(max)) => format!("{min}-{max}"),
        _ => "any".to_string(),
    };

    format!(
        "<b>Search configuration</b>\n\n\
         📂 Category: {category}\n\
         🔎 Keyword: {keyword}\n\
         🏙 City: {city}\n\
         💰 Price: {price}\n\
         ↕️ Sort: {sort}\n\n\
         Category and keyword are required. Hit Search when ready.",
        sort = draft.sort.label(),
    )
}

fn build_panel_keyboard() -> InlineKeyboardMarkup {
    let rows = vec![
        vec![
            panel_button("📂 Category", "category"),
            panel_button("🔎 Keyword", "keyword"),
        ],
        vec![
            panel_button("🏙 City", "city"),
            panel_button("💰 Price", "price"),
        ],
        vec![panel_button("↕️ Sort", "sort")],
        vec![panel_button("🚀 Search", "search")],
    ];
    InlineKeyboardMarkup::new(rows)
}

fn panel_button(label: &str, action: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label.to_string(), format!("{PANEL_CALLBACK_PREFIX}{action}"))
}

fn build_sort_keyboard() -> InlineKeyboardMarkup {
    let rows = [
        SortOrder::NewestFirst,
        SortOrder::PriceAscending,
        SortOrder::PriceDescending,
    ]
    .iter()
    .map(|sort| {
        vec![InlineKeyboardButton::callback(
            sort.label().to_string(),
            format!("{}{}", SORT_CALLBACK_PREFIX, sort.callback_key()),
        )]
    })
    .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::category_by_slug;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn empty_draft_renders_placeholders() {
        let text = build_panel_text(&SearchDraft::default());
        assert!(text.contains("Category: —"));
        assert!(text.contains("Keyword: —"));
        assert!(text.contains("City: any"));
        assert!(text.contains("Price: any"));
        assert!(text.contains("Sort: Newest first"));
    }

    #[test]
    fn configured_draft_renders_its_values() {
        let draft = SearchDraft {
            category: category_by_slug("phones"),
            keyword: Some("iPhone 13".to_string()),
            city: Some("kyiv".to_string()),
            min_price: Some(2000),
            max_price: Some(8000),
            sort: SortOrder::PriceAscending,
        };
        let text = build_panel_text(&draft);
        assert!(text.contains("📱 Phones"));
        assert!(text.contains("iPhone 13"));
        assert!(text.contains("kyiv"));
        assert!(text.contains("2000-8000"));
        assert!(text.contains("Price: low to high"));
    }

    #[test]
    fn keyword_markup_is_escaped_in_the_panel() {
        let draft = SearchDraft {
            keyword: Some("<b>bold</b> & co".to_string()),
            ..SearchDraft::default()
        };
        let text = build_panel_text(&draft);
        assert!(text.contains("&lt;b&gt;bold&lt;/b&gt; &amp; co"));
    }

    #[test]
    fn panel_keyboard_exposes_every_field_and_the_search_action() {
        let keyboard = build_panel_keyboard();
        let data: Vec<String> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            data,
            vec![
                "panel:category",
                "panel:keyword",
                "panel:city",
                "panel:price",
                "panel:sort",
                "panel:search",
            ]
        );
    }

    #[test]
    fn sort_keyboard_offers_the_three_fixed_orders() {
        let keyboard = build_sort_keyboard();
        let data: Vec<String> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(data, vec!["sort:newest", "sort:price_asc", "sort:price_desc"]);
    }
}
