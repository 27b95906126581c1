use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use teloxide::{adaptors::Throttle, Bot};

use crate::{
    catalog::{radarr::RadarrService, sonarr::SonarrService, ArrClient, CatalogService},
    config::AppConfig,
    engine::{EngineSettings, SessionEngine},
    error::{BotError, BotResult},
    gateway::TelegramGateway,
    service::AuthGate,
    utils::http::create_catalog_client,
};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SessionEngine>,
    pub auth: Arc<AuthGate>,
    pub message_timeout: Duration,
}

static APP_STATE: OnceLock<AppState> = OnceLock::new();

impl AppState {
    pub async fn new(config: &AppConfig, bot: Throttle<Bot>) -> BotResult<Self> {
        let http = create_catalog_client()?;

        let movies: Arc<dyn CatalogService> = Arc::new(RadarrService::new(
            ArrClient::new(http.clone(), config.radarr.url.clone(), config.radarr.api_key.clone()),
            config.radarr.root_folder.clone(),
        ));
        let series: Arc<dyn CatalogService> = Arc::new(SonarrService::new(
            ArrClient::new(
                http,
                config.sonarr.catalog.url.clone(),
                config.sonarr.catalog.api_key.clone(),
            ),
            config.sonarr.catalog.root_folder.clone(),
            config.sonarr.language_profile_id,
        ));
        info!(
            "{:?} catalog at {}, {:?} catalog at {}",
            movies.kind(),
            config.radarr.url,
            series.kind(),
            config.sonarr.catalog.url
        );

        let auth = Arc::new(AuthGate::load(&config.auth.data_dir, config.auth.password.clone()).await?);

        let settings = EngineSettings {
            page_budget: config.session.page_budget,
            follow_interval: config.session.follow_interval,
            supersede_grace: config.session.supersede_grace,
        };
        let engine = SessionEngine::new(Arc::new(TelegramGateway::new(bot)), movies, series, settings);

        Ok(Self {
            engine,
            auth,
            message_timeout: config.telegram.message_timeout,
        })
    }

    pub fn set_global(state: AppState) -> BotResult<()> {
        APP_STATE
            .set(state)
            .map_err(|_| BotError::AppStateError("Failed to set global app state".into()))
    }

    pub fn get() -> BotResult<AppState> {
        APP_STATE
            .get()
            .cloned()
            .ok_or_else(|| BotError::AppStateError("App state not initialized".into()))
    }
}
