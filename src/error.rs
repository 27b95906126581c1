use teloxide::RequestError;

use crate::{catalog::CatalogError, config::ConfigError, gateway::GatewayError, service::auth::AuthError};

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("App state error: {0}")]
    AppStateError(String),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Auth error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Telegram error: {0}")]
    RequestError(#[from] RequestError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for BotError {
    fn from(error: anyhow::Error) -> Self {
        BotError::Other(error)
    }
}

pub type HandlerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub type BotResult<T> = Result<T, BotError>;
