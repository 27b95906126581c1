use teloxide::{
    adaptors::Throttle,
    prelude::*,
    types::{KeyboardRemove, Message, ParseMode},
    utils::html::escape,
    Bot,
};

use crate::{
    error::HandlerResult,
    service::{AuthStatus, AuthUser, PasswordOutcome},
    state::AppState,
};

pub async fn is_authorized_message(msg: Message, state: AppState) -> bool {
    match msg.from.as_ref() {
        Some(user) => state.auth.status(user.id).await == AuthStatus::Authorized,
        None => false,
    }
}

/// Runs the password challenge for anyone not on the allow list.
pub async fn handle_unauthorized_message(bot: Throttle<Bot>, msg: Message, state: AppState) -> HandlerResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let chat = msg.chat.id;

    match state.auth.status(user.id).await {
        AuthStatus::Authorized => {}
        AuthStatus::Blacklisted => {
            debug!("Ignoring blacklisted user {}", user.id);
            bot.send_message(chat, t!("auth.blacklisted")).await?;
        }
        AuthStatus::NewUser => {
            info!("New user {} ({})", user.id, user.full_name());
            if state.auth.has_password() {
                state.auth.start_challenge(user.id);
                bot.send_message(chat, t!("auth.welcome", first_name = escape(&user.first_name)))
                    .parse_mode(ParseMode::Html)
                    .await?;
            } else {
                bot.send_message(chat, t!("auth.disabled")).await?;
            }
        }
        AuthStatus::AwaitingPassword => {
            let Some(password) = msg.text() else {
                bot.send_message(chat, t!("auth.password_prompt")).await?;
                return Ok(());
            };

            let auth_user = AuthUser {
                id: user.id.0,
                username: user.username.clone().unwrap_or_else(|| user.full_name()),
            };
            let outcome = state.auth.check_password(&auth_user, password).await?;

            if let Err(e) = bot.delete_message(chat, msg.id).await {
                warn!("Failed to delete password message of user {}: {}", user.id, e);
            }

            match outcome {
                PasswordOutcome::Authorized => {
                    bot.send_message(chat, t!("auth.authorized")).await?;
                    bot.send_message(chat, t!("commands.help"))
                        .parse_mode(ParseMode::Html)
                        .reply_markup(KeyboardRemove::new())
                        .await?;
                }
                PasswordOutcome::WrongPassword { attempts_left } => {
                    bot.send_message(chat, t!("auth.wrong_password", attempts = attempts_left))
                        .await?;
                }
                PasswordOutcome::Blacklisted => {
                    bot.send_message(chat, t!("auth.now_blacklisted")).await?;
                }
                PasswordOutcome::Disabled => {
                    bot.send_message(chat, t!("auth.disabled")).await?;
                }
            }
        }
    }

    Ok(())
}
