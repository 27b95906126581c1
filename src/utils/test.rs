use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use serde_json::json;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId};

use crate::{
    catalog::{DownloadStatus, MediaDetails, MediaItem, MockCatalogService, QueueState, Rating, Season},
    engine::{EngineSettings, SessionEngine},
    gateway::{GatewayError, Keyboard, MessagingGateway},
};

pub fn movie(library_id: Option<i64>, tmdb_id: i64, title: &str) -> MediaItem {
    MediaItem {
        library_id,
        provider_id: tmdb_id,
        title: title.to_string(),
        year: 1979,
        in_library: library_id.is_some(),
        cover_image: Some(format!("https://image.tmdb.org/t/p/original/{}.jpg", tmdb_id)),
        rating: Rating {
            value: 8.1,
            votes: 14_500,
            source: Some("tmdb".to_string()),
        },
        overview: "During its return to the earth, commercial spaceship Nostromo intercepts a distress signal."
            .to_string(),
        genres: vec!["Horror".to_string(), "Science Fiction".to_string()],
        studio: Some("20th Century Fox".to_string()),
        details: MediaDetails::Movie {
            runtime_mins: 117,
            downloaded: library_id.is_some(),
            quality: Some("Bluray-1080p".to_string()),
            size_on_disk_gb: 9.87,
        },
        payload: json!({ "title": title, "tmdbId": tmdb_id, "year": 1979 }),
    }
}

pub fn series(library_id: Option<i64>, tvdb_id: i64, title: &str) -> MediaItem {
    MediaItem {
        library_id,
        provider_id: tvdb_id,
        title: title.to_string(),
        year: 2008,
        in_library: library_id.is_some(),
        cover_image: Some(format!("https://artworks.thetvdb.com/banners/posters/{}-1.jpg", tvdb_id)),
        rating: Rating {
            value: 9.4,
            votes: 2_100,
            source: None,
        },
        overview: "A high school chemistry teacher turned methamphetamine manufacturer.".to_string(),
        genres: vec!["Crime".to_string(), "Drama".to_string()],
        studio: Some("AMC".to_string()),
        details: MediaDetails::Series {
            season_count: 1,
            seasons: vec![
                Season {
                    number: 0,
                    downloaded_episodes: 0,
                    total_episodes: 2,
                },
                Season {
                    number: 1,
                    downloaded_episodes: 7,
                    total_episodes: 7,
                },
            ],
            size_on_disk_gb: 14.2,
        },
        payload: json!({ "title": title, "tvdbId": tvdb_id, "year": 2008 }),
    }
}

/// Half-way download of `library_id`.
pub fn downloading(library_id: i64) -> DownloadStatus {
    DownloadStatus {
        found: true,
        library_id,
        state: QueueState::Downloading,
        size: 2_000_000_000.0,
        size_left: 1_000_000_000.0,
        eta: None,
        error_message: None,
    }
}

#[derive(Debug, Clone)]
pub enum GatewayCall {
    SendText {
        chat: ChatId,
        text: String,
        keyboard: Keyboard,
    },
    SendPhoto {
        chat: ChatId,
        image: String,
        caption: String,
        keyboard: Keyboard,
    },
    EditText {
        chat: ChatId,
        message: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    EditPhotoCaption {
        chat: ChatId,
        message: MessageId,
        image: Option<String>,
        caption: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    EditKeyboard {
        chat: ChatId,
        message: MessageId,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Delete {
        chat: ChatId,
        message: MessageId,
    },
}

/// In-memory gateway that records every call and hands out increasing message ids.
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    next_id: AtomicI32,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(100),
        }
    }
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::SendText { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_message_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_text(&self, chat: ChatId, text: &str, keyboard: Keyboard) -> Result<MessageId, GatewayError> {
        self.record(GatewayCall::SendText {
            chat,
            text: text.to_string(),
            keyboard,
        });
        Ok(self.next_message_id())
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        image_ref: &str,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<MessageId, GatewayError> {
        self.record(GatewayCall::SendPhoto {
            chat,
            image: image_ref.to_string(),
            caption: caption.to_string(),
            keyboard,
        });
        Ok(self.next_message_id())
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::EditText {
            chat,
            message,
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn edit_photo_caption(
        &self,
        chat: ChatId,
        message: MessageId,
        image_ref: Option<&str>,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::EditPhotoCaption {
            chat,
            message,
            image: image_ref.map(str::to_string),
            caption: caption.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn edit_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::EditKeyboard { chat, message, keyboard });
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError> {
        self.record(GatewayCall::Delete { chat, message });
        Ok(())
    }
}

/// Engine over two mocked catalogs and a recording gateway, with default settings.
pub fn test_engine(
    movies: MockCatalogService,
    series: MockCatalogService,
) -> (Arc<SessionEngine>, Arc<RecordingGateway>) {
    let gateway = Arc::new(RecordingGateway::default());
    let engine = SessionEngine::new(
        gateway.clone(),
        Arc::new(movies),
        Arc::new(series),
        EngineSettings::default(),
    );
    (engine, gateway)
}
