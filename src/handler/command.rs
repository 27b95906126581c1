use teloxide::{
    dispatching::{HandlerExt, UpdateHandler},
    prelude::*,
    types::Message,
};

use crate::{command::Command, engine::InboundEvent, error::HandlerResult, state::AppState};

async fn handle_command(msg: Message, cmd: Command, state: AppState) -> HandlerResult<()> {
    let Some(user) = msg.from.as_ref().map(|u| u.id) else {
        return Ok(());
    };
    debug!("User {} sent {:?}", user, cmd);

    state
        .engine
        .handle(InboundEvent::Command {
            command: cmd,
            user,
            chat: msg.chat.id,
        })
        .await;

    Ok(())
}

pub fn get_command_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    dptree::entry().filter_command::<Command>().endpoint(handle_command)
}
