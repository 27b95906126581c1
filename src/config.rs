use std::{collections::HashMap, path::PathBuf, sync::OnceLock, time::Duration};

use url::Url;

use crate::error::{BotError, BotResult};

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing {0}")]
    MissingKey(String),

    #[error("Invalid {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Key/value source the configuration is read from.
pub trait SecretSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment.
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl SecretSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub auth: AuthConfig,
    pub radarr: CatalogConfig,
    pub sonarr: SonarrConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn set_global(config: AppConfig) -> BotResult<()> {
        APP_CONFIG
            .set(config)
            .map_err(|_| BotError::AppStateError("Failed to set global app config".to_string()))
    }

    pub fn get() -> BotResult<&'static AppConfig> {
        APP_CONFIG
            .get()
            .ok_or_else(|| BotError::AppStateError("App config not initialized".to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub token: String,
    /// Drop messages older than this.
    pub message_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// `None` disables self-authorization.
    pub password: Option<String>,
    pub data_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    /// Always ends with `/`.
    pub url: Url,
    pub api_key: String,
    pub root_folder: String,
}

#[derive(Clone, Debug)]
pub struct SonarrConfig {
    pub catalog: CatalogConfig,
    pub language_profile_id: i64,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub page_budget: usize,
    pub follow_interval: Duration,
    pub supersede_grace: Duration,
}

fn required(source: &impl SecretSource, key: &str) -> Result<String, ConfigError> {
    source
        .get(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn optional(source: &impl SecretSource, key: &str) -> Option<String> {
    source.get(key).filter(|value| !value.trim().is_empty())
}

fn parsed<T>(source: &impl SecretSource, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(source, key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Like `parsed`, but zero is rejected.
fn positive(source: &impl SecretSource, key: &str, default: u64) -> Result<u64, ConfigError> {
    match parsed(source, key, default)? {
        0 => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        value => Ok(value),
    }
}

/// Parses a catalog endpoint, adding `http://` when no scheme is given and a trailing `/`.
fn endpoint(source: &impl SecretSource, key: &str) -> Result<Url, ConfigError> {
    let raw = required(source, key)?;
    let mut raw = raw.trim().to_string();
    if !raw.contains("://") {
        raw = format!("http://{}", raw);
    }
    if !raw.ends_with('/') {
        raw.push('/');
    }

    Url::parse(&raw).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn catalog(source: &impl SecretSource, prefix: &str, default_root: &str) -> Result<CatalogConfig, ConfigError> {
    Ok(CatalogConfig {
        url: endpoint(source, &format!("{}_URL", prefix))?,
        api_key: required(source, &format!("{}_API_KEY", prefix))?,
        root_folder: optional(source, &format!("{}_ROOT_FOLDER", prefix)).unwrap_or_else(|| default_root.to_string()),
    })
}

pub fn build_config(source: &impl SecretSource) -> Result<AppConfig, ConfigError> {
    info!("Building AppConfig...");

    let config = AppConfig {
        telegram: TelegramConfig {
            token: required(source, "TELEGRAM_BOT_TOKEN")?,
            message_timeout: Duration::from_secs(parsed(source, "MESSAGE_TIMEOUT_SECS", 60)?),
        },
        auth: AuthConfig {
            password: optional(source, "TELEGRAM_PASSWORD"),
            data_dir: PathBuf::from(optional(source, "AUTH_DATA_DIR").unwrap_or_else(|| "./data".to_string())),
        },
        radarr: catalog(source, "RADARR", "/movies")?,
        sonarr: SonarrConfig {
            catalog: catalog(source, "SONARR", "/tv")?,
            language_profile_id: parsed(source, "SONARR_LANGUAGE_PROFILE_ID", 1)?,
        },
        session: SessionConfig {
            page_budget: positive(source, "PAGE_BUDGET_CHARS", 512)? as usize,
            follow_interval: Duration::from_secs(positive(source, "FOLLOW_INTERVAL_SECS", 5)?),
            supersede_grace: Duration::from_millis(parsed(source, "FOLLOW_GRACE_MILLIS", 10)?),
        },
    };

    if config.auth.password.is_none() {
        warn!("TELEGRAM_PASSWORD is not set, new users cannot authorize themselves");
    }
    info!("AppConfig built");

    Ok(config)
}
