use bot::BotService;
use config::{build_config, AppConfig, EnvSecrets};
use error::HandlerResult;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;
#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en");

mod bot;
mod callback;
mod catalog;
mod command;
mod config;
mod engine;
mod error;
mod gateway;
mod handler;
mod presenter;
mod runtime;
mod service;
mod session;
mod state;
mod utils;

#[tokio::main]
async fn main() -> HandlerResult<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init_timed();

    info!("Starting telarr...");

    let config = build_config(&EnvSecrets)?;
    AppConfig::set_global(config)?;

    let bot_service = BotService::new().await?;
    info!("Bot instance created");

    bot_service.start().await
}
