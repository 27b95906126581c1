use teloxide::types::{ChatId, UserId};

use super::{FlowError, SessionEngine};
use crate::{
    catalog::{MediaItem, MediaKind},
    gateway::Keyboard,
    handler::{get_add_media_keyboard, get_added_keyboard, get_back_to_list_keyboard, get_confirm_remove_keyboard},
    presenter::{id_line, media, page_footer},
    session::ActionKind,
};

impl SessionEngine {
    pub(super) async fn on_text(&self, user: UserId, chat: ChatId, text: String) -> Result<(), FlowError> {
        let Some(action) = self.store.take_pending_action(user) else {
            debug!("User {} sent text with no pending action", user);
            self.gateway
                .send_text(chat, &t!("messages.unknown_message"), Keyboard::None)
                .await?;
            return Ok(());
        };

        let query = text.trim();
        info!("User {} answered {:?} with {:?}", user, action, query);

        match action {
            ActionKind::LookupMediaToAdd(kind) => self.lookup_to_add(user, chat, kind, query).await,
            ActionKind::MediaDetailsQuery(kind) => self.send_details(chat, kind, query).await,
            ActionKind::RemoveMediaQuery(kind) => self.propose_remove(chat, kind, query).await,
            ActionKind::AddMediaConfirmQualityProfile(kind) => self.add_with_profile(user, chat, kind, query).await,
        }
    }

    async fn lookup_to_add(&self, user: UserId, chat: ChatId, kind: MediaKind, query: &str) -> Result<(), FlowError> {
        let candidates = self.catalog(kind).lookup(query).await?;
        if candidates.is_empty() {
            return Err(FlowError::NotFound);
        }

        let total = candidates.len();
        self.store
            .set_working_set(user, kind, candidates)
            .map_err(|_| FlowError::NotFound)?;
        let first = self.store.current_candidate(user).ok_or(FlowError::Expired)?;

        debug!("User {} got {} {} candidates", user, total, kind);
        self.send_candidate(chat, &first, 1, total).await
    }

    /// Candidate message of the add flow, with its cover when there is one.
    pub(super) async fn send_candidate(
        &self,
        chat: ChatId,
        candidate: &MediaItem,
        page: usize,
        total: usize,
    ) -> Result<(), FlowError> {
        let caption = candidate_caption(candidate, page, total);
        let keyboard = get_add_media_keyboard(candidate.kind(), page, total, !candidate.in_library);

        match candidate.cover_image.as_deref() {
            Some(image) => {
                self.gateway
                    .send_photo(chat, image, &caption, keyboard.into())
                    .await?
            }
            None => self.gateway.send_text(chat, &caption, keyboard.into()).await?,
        };
        Ok(())
    }

    /// Library item matching `query`. Only the first match is used.
    async fn find_in_library(&self, kind: MediaKind, query: &str) -> Result<MediaItem, FlowError> {
        let matches = self.catalog(kind).details_in_library(query).await?;
        if matches.len() > 1 {
            warn!("{} {} match {:?}, using the first one", matches.len(), kind, query);
        }
        matches.into_iter().next().ok_or(FlowError::NotFound)
    }

    async fn send_details(&self, chat: ChatId, kind: MediaKind, query: &str) -> Result<(), FlowError> {
        let item = self.find_in_library(kind, query).await?;

        let title = media::title(&item);
        match item.cover_image.as_deref() {
            Some(image) => {
                self.gateway
                    .send_photo(chat, image, &title, Keyboard::RemoveReply)
                    .await?
            }
            None => self.gateway.send_text(chat, &title, Keyboard::RemoveReply).await?,
        };

        self.gateway
            .send_text(chat, &media::details(&item), get_back_to_list_keyboard(kind).into())
            .await?;
        Ok(())
    }

    async fn propose_remove(&self, chat: ChatId, kind: MediaKind, query: &str) -> Result<(), FlowError> {
        let item = self.find_in_library(kind, query).await?;
        let library_id = item.library_id.ok_or(FlowError::NotFound)?;

        let question = match kind {
            MediaKind::Movie => t!("messages.remove.confirm.movie"),
            MediaKind::Series => t!("messages.remove.confirm.serie"),
        };
        let text = format!("{}\n{}\n\n{}", media::title(&item), id_line(kind, library_id), question);

        self.gateway
            .send_text(chat, &text, get_confirm_remove_keyboard(kind).into())
            .await?;
        Ok(())
    }

    async fn add_with_profile(&self, user: UserId, chat: ChatId, kind: MediaKind, name: &str) -> Result<(), FlowError> {
        let candidate = self.store.current_candidate(user).ok_or(FlowError::Expired)?;
        if candidate.kind() != kind {
            return Err(FlowError::Expired);
        }

        let catalog = self.catalog(kind);
        let profiles = catalog.quality_profiles().await?;
        let profile = profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or(FlowError::NotFound)?;

        self.gateway
            .send_text(chat, &t!("messages.add.adding"), Keyboard::RemoveReply)
            .await?;

        let library_id = catalog.add(&candidate, profile.id).await?;
        self.store.clear(user);
        info!(
            "User {} added {} {:?} as {} with profile {:?}",
            user, kind, candidate.title, library_id, profile.name
        );

        let text = format!(
            "{}\n\n{}\n{}",
            media::title(&candidate),
            t!("messages.add.added"),
            id_line(kind, library_id)
        );
        self.gateway
            .send_text(chat, &text, get_added_keyboard(kind).into())
            .await?;
        Ok(())
    }
}

pub(super) fn candidate_caption(candidate: &MediaItem, page: usize, total: usize) -> String {
    format!("{}\n{}", media::title_and_in_library(candidate), page_footer(page, total))
}

#[cfg(test)]
mod tests {
    use teloxide::types::{ChatId, UserId};

    use crate::{
        catalog::{CatalogError, MediaKind, MockCatalogService, QualityProfile},
        engine::InboundEvent,
        gateway::Keyboard,
        session::ActionKind,
        utils::test::{movie, series, test_engine, GatewayCall},
    };

    const USER: UserId = UserId(7);
    const CHAT: ChatId = ChatId(70);

    fn text(text: &str) -> InboundEvent {
        InboundEvent::FreeText {
            text: text.to_string(),
            user: USER,
            chat: CHAT,
        }
    }

    #[tokio::test]
    async fn test_text_without_pending_action_is_ignored() {
        let movies = MockCatalogService::new();
        let (engine, gateway) = test_engine(movies, MockCatalogService::new());

        engine.handle(text("Alien")).await;

        assert_eq!(gateway.sent_texts().len(), 1);
        assert!(engine.store().get(USER).is_empty());
    }

    #[tokio::test]
    async fn test_lookup_fills_working_set_and_shows_first_candidate() {
        let mut movies = MockCatalogService::new();
        movies
            .expect_lookup()
            .withf(|query| query.to_string() == "Alien")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    movie(None, 348, "Alien"),
                    movie(Some(2), 679, "Aliens"),
                    movie(None, 8077, "Alien 3"),
                ])
            });
        let (engine, gateway) = test_engine(movies, MockCatalogService::new());
        engine
            .store()
            .set_pending_action(USER, Some(ActionKind::LookupMediaToAdd(MediaKind::Movie)));

        engine.handle(text("  Alien ")).await;

        let session = engine.store().get(USER);
        assert_eq!(session.pending_action, None);
        let working_set = session.working_set.unwrap();
        assert_eq!((working_set.page(), working_set.len()), (1, 3));

        match &gateway.calls()[0] {
            GatewayCall::SendPhoto { caption, keyboard, .. } => {
                assert!(caption.contains("<b>Alien</b>"));
                assert!(caption.ends_with("page 1/3"));
                assert!(keyboard.inline().is_some());
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_lookup_reports_not_found_and_goes_idle() {
        let mut series_catalog = MockCatalogService::new();
        series_catalog.expect_lookup().returning(|_| Ok(vec![]));
        let (engine, gateway) = test_engine(MockCatalogService::new(), series_catalog);
        engine
            .store()
            .set_pending_action(USER, Some(ActionKind::LookupMediaToAdd(MediaKind::Series)));

        engine.handle(text("Nothing")).await;

        assert!(engine.store().get(USER).is_empty());
        assert_eq!(gateway.sent_texts(), vec![t!("errors.not_found").to_string()]);
    }

    #[tokio::test]
    async fn test_catalog_failure_aborts_flow() {
        let mut movies = MockCatalogService::new();
        movies
            .expect_details_in_library()
            .returning(|_| Err(CatalogError::InvalidPayload("timeout".into())));
        let (engine, gateway) = test_engine(movies, MockCatalogService::new());
        engine
            .store()
            .set_pending_action(USER, Some(ActionKind::MediaDetailsQuery(MediaKind::Movie)));

        engine.handle(text("Alien")).await;

        assert!(engine.store().get(USER).is_empty());
        assert_eq!(gateway.sent_texts(), vec![t!("errors.transient").to_string()]);
    }

    #[tokio::test]
    async fn test_details_sends_cover_then_block() {
        let mut series_catalog = MockCatalogService::new();
        series_catalog
            .expect_details_in_library()
            .returning(|_| Ok(vec![series(Some(7), 81189, "Breaking Bad")]));
        let (engine, gateway) = test_engine(MockCatalogService::new(), series_catalog);
        engine
            .store()
            .set_pending_action(USER, Some(ActionKind::MediaDetailsQuery(MediaKind::Series)));

        engine.handle(text("Breaking Bad")).await;

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], GatewayCall::SendPhoto { keyboard: Keyboard::RemoveReply, .. }));
        match &calls[1] {
            GatewayCall::SendText { text, keyboard, .. } => {
                assert!(text.contains("<b>Seasons</b>"));
                assert!(keyboard.inline().is_some());
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    // Several library items can match one name; only the first is ever offered.
    #[tokio::test]
    async fn test_ambiguous_name_takes_first_match() {
        let mut movies = MockCatalogService::new();
        movies.expect_details_in_library().returning(|_| {
            Ok(vec![movie(Some(42), 1, "The Thing"), movie(Some(43), 2, "The Thing")])
        });
        let (engine, gateway) = test_engine(movies, MockCatalogService::new());
        engine
            .store()
            .set_pending_action(USER, Some(ActionKind::RemoveMediaQuery(MediaKind::Movie)));

        engine.handle(text("The Thing")).await;

        let proposal = gateway.sent_texts().pop().unwrap();
        assert!(proposal.contains("MovieId: 42"));
        assert!(!proposal.contains("MovieId: 43"));
    }

    #[tokio::test]
    async fn test_quality_profile_adds_current_candidate() {
        let mut movies = MockCatalogService::new();
        movies.expect_quality_profiles().returning(|| {
            Ok(vec![
                QualityProfile { id: 1, name: "Any".into() },
                QualityProfile { id: 4, name: "HD-1080p".into() },
            ])
        });
        movies
            .expect_add()
            .withf(|item, profile| item.provider_id == 679 && *profile == 4)
            .times(1)
            .returning(|_, _| Ok(55));
        let (engine, gateway) = test_engine(movies, MockCatalogService::new());

        let store = engine.store();
        store
            .set_working_set(
                USER,
                MediaKind::Movie,
                vec![movie(None, 348, "Alien"), movie(None, 679, "Aliens")],
            )
            .unwrap();
        store.advance_page(USER, 1).unwrap();
        store.set_pending_action(USER, Some(ActionKind::AddMediaConfirmQualityProfile(MediaKind::Movie)));

        engine.handle(text("HD-1080p")).await;

        assert!(engine.store().get(USER).is_empty());
        let added = gateway.sent_texts().pop().unwrap();
        assert!(added.contains("MovieId: 55"));
    }

    #[tokio::test]
    async fn test_unknown_quality_profile_is_not_found() {
        let mut movies = MockCatalogService::new();
        movies
            .expect_quality_profiles()
            .returning(|| Ok(vec![QualityProfile { id: 1, name: "Any".into() }]));
        movies.expect_add().never();
        let (engine, gateway) = test_engine(movies, MockCatalogService::new());
        engine
            .store()
            .set_working_set(USER, MediaKind::Movie, vec![movie(None, 348, "Alien")])
            .unwrap();
        engine
            .store()
            .set_pending_action(USER, Some(ActionKind::AddMediaConfirmQualityProfile(MediaKind::Movie)));

        engine.handle(text("4K")).await;

        assert!(engine.store().get(USER).is_empty());
        assert_eq!(gateway.sent_texts(), vec![t!("errors.not_found").to_string()]);
    }
}
