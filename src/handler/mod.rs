mod auth;
mod callback;
mod command;
mod keyboard;
mod message;

pub use keyboard::*;

use callback::get_callback_handler;
use command::get_command_handler;
use teloxide::{
    dispatching::{UpdateFilterExt, UpdateHandler},
    dptree,
    types::Update,
};

pub fn get_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let authorized = dptree::filter_async(auth::is_authorized_message)
        .branch(get_command_handler())
        .endpoint(message::handle_text);

    dptree::entry()
        .branch(
            Update::filter_message()
                .filter(message::is_fresh)
                .branch(authorized)
                .endpoint(auth::handle_unauthorized_message),
        )
        .branch(get_callback_handler())
}
