use std::str::FromStr;

use teloxide::{
    adaptors::Throttle,
    dispatching::UpdateHandler,
    prelude::*,
    types::CallbackQuery,
};

use crate::{
    callback::CallbackData, engine::InboundEvent, error::HandlerResult, service::AuthStatus, state::AppState,
};

async fn handle_callback(bot: Throttle<Bot>, q: CallbackQuery, state: AppState) -> HandlerResult<()> {
    let user = q.from.id;

    if state.auth.status(user).await != AuthStatus::Authorized {
        debug!("Dropping callback from unauthorized user {}", user);
    } else if let Some(event) = to_event(&q) {
        state.engine.handle(event).await;
    }

    bot.answer_callback_query(q.id.clone()).await?;

    Ok(())
}

fn to_event(q: &CallbackQuery) -> Option<InboundEvent> {
    let raw = q.data.as_deref()?;
    let data = match CallbackData::from_str(raw) {
        Ok(data) => data,
        Err(e) => {
            warn!("User {} pressed an unknown button: {}", q.from.id, e);
            return None;
        }
    };

    let Some(message) = q.regular_message() else {
        warn!("Callback {} from user {} has no accessible message", raw, q.from.id);
        return None;
    };

    Some(InboundEvent::Callback {
        data,
        user: q.from.id,
        chat: message.chat.id,
        message_id: message.id,
        message_text: message.text().or(message.caption()).unwrap_or_default().to_string(),
        source_is_photo: message.photo().is_some(),
    })
}

pub fn get_callback_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_callback_query().endpoint(handle_callback)
}
