//! Per-user conversation state machine.
//!
//! Commands always interrupt the pending flow, free text is only read while a flow waits
//! for it, and button presses are routed by their callback name plus whatever the pressed
//! message or the working set carries.

mod callback;
mod command;
mod error;
mod follow;
mod text;

pub use error::FlowError;

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use teloxide::types::{ChatId, MessageId, UserId};
use tokio::sync::mpsc;

use crate::{
    callback::CallbackData,
    catalog::{CatalogService, MediaItem, MediaKind},
    command::Command,
    gateway::{Keyboard, MessagingGateway},
    runtime::FollowerEvent,
    session::ActionStore,
};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Character budget of one library list page.
    pub page_budget: usize,
    pub follow_interval: Duration,
    /// Pause between cancelling a superseded follower and starting its replacement.
    pub supersede_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            page_budget: 512,
            follow_interval: Duration::from_secs(5),
            supersede_grace: Duration::from_millis(10),
        }
    }
}

/// An already-authorized inbound event.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Command {
        command: Command,
        user: UserId,
        chat: ChatId,
    },
    UnknownCommand {
        user: UserId,
        chat: ChatId,
    },
    FreeText {
        text: String,
        user: UserId,
        chat: ChatId,
    },
    Callback {
        data: CallbackData,
        user: UserId,
        chat: ChatId,
        message_id: MessageId,
        /// Plain text (or caption) of the pressed message.
        message_text: String,
        source_is_photo: bool,
    },
}

impl InboundEvent {
    pub fn user(&self) -> UserId {
        match self {
            InboundEvent::Command { user, .. }
            | InboundEvent::UnknownCommand { user, .. }
            | InboundEvent::FreeText { user, .. }
            | InboundEvent::Callback { user, .. } => *user,
        }
    }

    pub fn chat(&self) -> ChatId {
        match self {
            InboundEvent::Command { chat, .. }
            | InboundEvent::UnknownCommand { chat, .. }
            | InboundEvent::FreeText { chat, .. }
            | InboundEvent::Callback { chat, .. } => *chat,
        }
    }
}

pub struct SessionEngine {
    store: ActionStore,
    gateway: Arc<dyn MessagingGateway>,
    movies: Arc<dyn CatalogService>,
    series: Arc<dyn CatalogService>,
    settings: EngineSettings,
    follower_events: mpsc::UnboundedSender<FollowerEvent>,
    next_follower_id: AtomicU64,
}

impl SessionEngine {
    /// Builds the engine and spawns the task that retires finished followers.
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        movies: Arc<dyn CatalogService>,
        series: Arc<dyn CatalogService>,
        settings: EngineSettings,
    ) -> Arc<Self> {
        info!("Initializing SessionEngine with {:?}", settings);
        let (tx, rx) = mpsc::unbounded_channel();

        let engine = Arc::new(Self {
            store: ActionStore::new(),
            gateway,
            movies,
            series,
            settings,
            follower_events: tx,
            next_follower_id: AtomicU64::new(1),
        });

        tokio::spawn(Self::reap_followers(Arc::downgrade(&engine), rx));

        engine
    }

    pub fn store(&self) -> &ActionStore {
        &self.store
    }

    /// Handles one event to completion. Events of the same user never overlap.
    pub async fn handle(&self, event: InboundEvent) {
        let user = event.user();
        let chat = event.chat();
        let _guard = self.store.lock_user(user).await;

        let result = match event {
            InboundEvent::Command { command, .. } => self.on_command(user, chat, command).await,
            InboundEvent::UnknownCommand { .. } => self.on_unknown_command(user, chat).await,
            InboundEvent::FreeText { text, .. } => self.on_text(user, chat, text).await,
            InboundEvent::Callback {
                data,
                message_id,
                message_text,
                source_is_photo,
                ..
            } => {
                self.on_callback(user, chat, data, message_id, &message_text, source_is_photo)
                    .await
            }
        };

        if let Err(e) = result {
            self.report(user, chat, e).await;
        }
    }

    async fn report(&self, user: UserId, chat: ChatId, error: FlowError) {
        match &error {
            FlowError::Gateway(e) => {
                error!("Dropping event of user {}, gateway failed: {}", user, e);
                return;
            }
            FlowError::Transient(e) => error!("Catalog call failed for user {}: {}", user, e),
            other => warn!("Flow of user {} stopped: {}", user, other),
        }

        if error.aborts_flow() {
            self.store.clear(user);
        }

        if let Some(text) = error.user_message() {
            if let Err(e) = self.gateway.send_text(chat, &text, Keyboard::None).await {
                error!("Failed to report error to user {}: {}", user, e);
            }
        }
    }

    async fn reap_followers(engine: Weak<Self>, mut events: mpsc::UnboundedReceiver<FollowerEvent>) {
        while let Some(event) = events.recv().await {
            let Some(engine) = engine.upgrade() else {
                break;
            };
            let _guard = engine.store.lock_user(event.user).await;
            if engine.store.clear_follower_if(event.user, event.follower_id) {
                debug!(
                    "Follower {} of user {} retired after {:?}",
                    event.follower_id, event.user, event.outcome
                );
            }
        }
    }

    fn catalog(&self, kind: MediaKind) -> &Arc<dyn CatalogService> {
        match kind {
            MediaKind::Movie => &self.movies,
            MediaKind::Series => &self.series,
        }
    }

    fn next_follower_id(&self) -> u64 {
        self.next_follower_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Library sorted by title so that list pages stay stable between presses.
    async fn sorted_library(&self, kind: MediaKind) -> Result<Vec<MediaItem>, FlowError> {
        let mut items = self.catalog(kind).list().await?;
        items.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then(a.year.cmp(&b.year))
        });
        Ok(items)
    }
}
