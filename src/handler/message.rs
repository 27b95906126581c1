use std::time::Duration;

use chrono::{DateTime, Utc};
use teloxide::types::Message;

use crate::{engine::InboundEvent, error::HandlerResult, state::AppState};

/// Messages delivered after downtime must not drive flows.
pub fn is_fresh(msg: Message, state: AppState) -> bool {
    if is_stale(msg.date, Utc::now(), state.message_timeout) {
        warn!(
            "Dropping message {} in chat {} sent at {}",
            msg.id.0, msg.chat.id, msg.date
        );
        return false;
    }
    true
}

fn is_stale(sent: DateTime<Utc>, now: DateTime<Utc>, timeout: Duration) -> bool {
    (now - sent).to_std().map(|age| age > timeout).unwrap_or(false)
}

pub async fn handle_text(msg: Message, state: AppState) -> HandlerResult<()> {
    let Some(user) = msg.from.as_ref().map(|u| u.id) else {
        return Ok(());
    };
    let chat = msg.chat.id;

    let Some(text) = msg.text() else {
        debug!("Ignoring non-text message from user {}", user);
        return Ok(());
    };

    let event = if text.starts_with('/') {
        InboundEvent::UnknownCommand { user, chat }
    } else {
        InboundEvent::FreeText {
            text: text.to_string(),
            user,
            chat,
        }
    };

    state.engine.handle(event).await;

    Ok(())
}
