use teloxide::{
    types::{ChatId, MessageId, UserId},
    utils::html::escape,
};

use super::{text::candidate_caption, FlowError, SessionEngine};
use crate::{
    callback::{CallbackData, PageTarget},
    catalog::MediaKind,
    gateway::Keyboard,
    handler::{get_add_media_keyboard, get_list_keyboard, get_quality_profile_keyboard, get_titles_keyboard},
    presenter::{self, parse_embedded_id, parse_page_footer, with_footer, PageNav},
    session::{ActionKind, SessionError},
};

impl SessionEngine {
    pub(super) async fn on_callback(
        &self,
        user: UserId,
        chat: ChatId,
        data: CallbackData,
        message_id: MessageId,
        message_text: &str,
        source_is_photo: bool,
    ) -> Result<(), FlowError> {
        info!("User {} pressed {}", user, data);

        match data {
            CallbackData::ListPage(kind, target) => {
                self.turn_list_page(chat, kind, target, message_id, message_text)
                    .await
            }
            CallbackData::Details(kind) => {
                self.ask_for_title(user, chat, ActionKind::MediaDetailsQuery(kind))
                    .await
            }
            CallbackData::Remove(kind) => {
                self.ask_for_title(user, chat, ActionKind::RemoveMediaQuery(kind))
                    .await
            }
            CallbackData::BackToList(kind) => self.back_to_list(chat, kind, message_id).await,
            CallbackData::ConfirmRemove(kind) => self.confirm_remove(chat, kind, message_id, message_text).await,
            CallbackData::CancelRemove(kind) => self.cancel_remove(chat, kind, message_id).await,
            CallbackData::NextAdd(kind) => {
                self.move_candidate(user, chat, kind, 1, message_id, source_is_photo)
                    .await
            }
            CallbackData::PreviousAdd(kind) => {
                self.move_candidate(user, chat, kind, -1, message_id, source_is_photo)
                    .await
            }
            CallbackData::Add(kind) => self.ask_for_quality_profile(user, chat, kind).await,
            CallbackData::EditRequest(kind) => self.start_lookup(user, chat, kind).await,
            CallbackData::Cancel => {
                self.store.clear(user);
                self.gateway
                    .send_text(chat, &t!("messages.cancelled"), Keyboard::RemoveReply)
                    .await?;
                Ok(())
            }
            CallbackData::Follow(kind) => self.follow(user, chat, kind, message_id, message_text).await,
            CallbackData::Refresh(kind) => self.refresh(user, chat, kind, message_id, message_text).await,
            CallbackData::StopFollow(kind) => self.stop_following(user, chat, kind, message_id).await,
        }
    }

    /// Re-renders a library list page in place. The current page comes from the footer.
    async fn turn_list_page(
        &self,
        chat: ChatId,
        kind: MediaKind,
        target: PageTarget,
        message_id: MessageId,
        message_text: &str,
    ) -> Result<(), FlowError> {
        let (page, _) = parse_page_footer(message_text)
            .ok_or_else(|| FlowError::Malformed("missing page footer".to_string()))?;

        let items = self.sorted_library(kind).await?;
        let pages = presenter::list_pages(kind, &items, self.settings.page_budget);
        let total = pages.len();
        if total == 0 {
            return Err(FlowError::NotFound);
        }

        // the library may have shrunk since the page was sent
        let current = page.min(total);
        let next = match target {
            PageTarget::First => 1,
            PageTarget::Previous => current.saturating_sub(1).max(1),
            PageTarget::Next => (current + 1).min(total),
            PageTarget::Last => total,
        };

        if next == page {
            debug!("Page {} of {} list already shown", page, kind);
            return Ok(());
        }

        let text = with_footer(&pages[next - 1], next, total);
        self.gateway
            .edit_text(chat, message_id, &text, Some(get_list_keyboard(kind, PageNav::new(next, total))))
            .await?;
        Ok(())
    }

    async fn ask_for_title(&self, user: UserId, chat: ChatId, action: ActionKind) -> Result<(), FlowError> {
        let kind = action.media_kind();
        let items = self.sorted_library(kind).await?;
        if items.is_empty() {
            return Err(FlowError::NotFound);
        }

        let titles = items.into_iter().map(|item| item.title).collect();
        self.store.set_pending_action(user, Some(action));

        let prompt = match kind {
            MediaKind::Movie => t!("messages.select.movie"),
            MediaKind::Series => t!("messages.select.serie"),
        };
        self.gateway
            .send_text(chat, &prompt, get_titles_keyboard(titles).into())
            .await?;
        Ok(())
    }

    /// Drops the details pair (cover, then block) and sends page 1 again.
    async fn back_to_list(&self, chat: ChatId, kind: MediaKind, message_id: MessageId) -> Result<(), FlowError> {
        for id in [message_id, MessageId(message_id.0 - 1)] {
            if let Err(e) = self.gateway.delete_message(chat, id).await {
                warn!("Failed to delete details message {}: {}", id.0, e);
            }
        }
        self.send_library_list(chat, kind).await
    }

    async fn confirm_remove(
        &self,
        chat: ChatId,
        kind: MediaKind,
        message_id: MessageId,
        message_text: &str,
    ) -> Result<(), FlowError> {
        let library_id = parse_embedded_id(kind, message_text)
            .ok_or_else(|| FlowError::Malformed(format!("no {} line", kind.id_label())))?;

        if let Err(e) = self.gateway.delete_message(chat, message_id).await {
            warn!("Failed to delete remove proposal {}: {}", message_id.0, e);
        }

        self.catalog(kind).remove(library_id).await?;
        info!("Removed {} {}", kind, library_id);

        let title = message_text.lines().next().unwrap_or_default();
        self.gateway
            .send_text(
                chat,
                &t!("messages.remove.done", title = escape(title)),
                Keyboard::None,
            )
            .await?;
        Ok(())
    }

    async fn cancel_remove(&self, chat: ChatId, kind: MediaKind, message_id: MessageId) -> Result<(), FlowError> {
        if let Err(e) = self.gateway.delete_message(chat, message_id).await {
            warn!("Failed to delete remove proposal {}: {}", message_id.0, e);
        }

        let text = match kind {
            MediaKind::Movie => t!("messages.remove.cancelled.movie"),
            MediaKind::Series => t!("messages.remove.cancelled.serie"),
        };
        self.gateway.send_text(chat, &text, Keyboard::None).await?;
        Ok(())
    }

    /// Shows the neighbouring add-flow candidate, reusing the pressed message when its shape fits.
    async fn move_candidate(
        &self,
        user: UserId,
        chat: ChatId,
        kind: MediaKind,
        delta: isize,
        message_id: MessageId,
        source_is_photo: bool,
    ) -> Result<(), FlowError> {
        match self.store.working_set(user) {
            Some(working_set) if working_set.kind() == kind => {}
            _ => return Err(FlowError::Expired),
        }

        let page = match self.store.advance_page(user, delta) {
            Ok(page) => page,
            Err(SessionError::OutOfRange { page, total }) => {
                debug!("User {} tried page {} of {}", user, page, total);
                return Ok(());
            }
            Err(_) => return Err(FlowError::Expired),
        };

        let working_set = self.store.working_set(user).ok_or(FlowError::Expired)?;
        let candidate = working_set.current();
        let total = working_set.len();

        let caption = candidate_caption(candidate, page, total);
        let keyboard = get_add_media_keyboard(kind, page, total, !candidate.in_library);

        match (source_is_photo, candidate.cover_image.as_deref()) {
            (true, Some(image)) => {
                self.gateway
                    .edit_photo_caption(chat, message_id, Some(image), &caption, Some(keyboard))
                    .await?
            }
            (false, None) => {
                self.gateway
                    .edit_text(chat, message_id, &caption, Some(keyboard))
                    .await?
            }
            _ => {
                if let Err(e) = self.gateway.delete_message(chat, message_id).await {
                    warn!("Failed to delete candidate message {}: {}", message_id.0, e);
                }
                self.send_candidate(chat, candidate, page, total).await?
            }
        }
        Ok(())
    }

    async fn ask_for_quality_profile(&self, user: UserId, chat: ChatId, kind: MediaKind) -> Result<(), FlowError> {
        match self.store.working_set(user) {
            Some(working_set) if working_set.kind() == kind => {}
            _ => return Err(FlowError::Expired),
        }

        let profiles = self.catalog(kind).quality_profiles().await?;
        if profiles.is_empty() {
            return Err(FlowError::NotFound);
        }

        self.store
            .set_pending_action(user, Some(ActionKind::AddMediaConfirmQualityProfile(kind)));
        self.gateway
            .send_text(
                chat,
                &t!("messages.add.quality_profile"),
                get_quality_profile_keyboard(&profiles).into(),
            )
            .await?;
        Ok(())
    }
}
