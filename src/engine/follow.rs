use chrono::Utc;
use teloxide::types::{ChatId, MessageId, UserId};

use super::{FlowError, SessionEngine};
use crate::{
    catalog::{DownloadStatus, MediaKind},
    gateway::Keyboard,
    handler::get_follow_keyboard,
    presenter::{parse_embedded_id, status},
    runtime::{Follower, FollowerHandle},
};

impl SessionEngine {
    async fn fetch_status(&self, kind: MediaKind, message_text: &str) -> Result<DownloadStatus, FlowError> {
        let library_id = parse_embedded_id(kind, message_text)
            .ok_or_else(|| FlowError::Malformed(format!("no {} line", kind.id_label())))?;
        Ok(self.catalog(kind).download_status(library_id).await?)
    }

    async fn notify(&self, chat: ChatId, text: &str) -> Result<(), FlowError> {
        self.gateway.send_text(chat, text, Keyboard::None).await?;
        Ok(())
    }

    /// Starts following the item of the pressed message, replacing any follower the user has.
    pub(super) async fn follow(
        &self,
        user: UserId,
        chat: ChatId,
        kind: MediaKind,
        message_id: MessageId,
        message_text: &str,
    ) -> Result<(), FlowError> {
        let status = self.fetch_status(kind, message_text).await?;

        if !status.found {
            info!("User {} asked to follow {} {}, not in the queue", user, kind, status.library_id);
            return self.notify(chat, &t!("messages.follow.not_in_queue")).await;
        }

        if status.is_imported() {
            let text = status::render(&status, kind, None, Utc::now());
            self.gateway.edit_text(chat, message_id, &text, None).await?;
            return self
                .notify(chat, &t!("messages.follow.imported", noun = kind.noun()))
                .await;
        }

        self.supersede(user, chat, message_id).await;

        let interval = self.settings.follow_interval;
        let handle = FollowerHandle::new(self.next_follower_id(), kind, status.library_id, chat, message_id, interval);

        let text = status::render(&status, kind, Some(interval), Utc::now());
        self.gateway
            .edit_text(chat, message_id, &text, Some(get_follow_keyboard(kind, true)))
            .await?;

        self.store.set_follower(user, handle.clone());
        Follower::new(user, handle, self.catalog(kind).clone(), self.gateway.clone(), status)
            .spawn(self.follower_events.clone());
        Ok(())
    }

    /// Cancels the running follower, drops its live keyboard and waits out the grace period.
    ///
    /// A follower that already finished on its own has left its message complete, so that
    /// message is not touched.
    async fn supersede(&self, user: UserId, chat: ChatId, next_message: MessageId) {
        let Some(old) = self.store.take_follower(user) else {
            return;
        };

        info!("Superseding follower {} of user {}", old.id, user);
        let already_finished = old.is_finished();
        old.cancel();

        if !already_finished && (old.message_id != next_message || old.chat_id != chat) {
            if let Err(e) = self
                .gateway
                .edit_keyboard(old.chat_id, old.message_id, Some(get_follow_keyboard(old.kind, false)))
                .await
            {
                warn!("Failed to drop keyboard of follower {}: {}", old.id, e);
            }
        }

        tokio::time::sleep(self.settings.supersede_grace).await;
    }

    /// One extra fetch; a running follower keeps its own schedule.
    pub(super) async fn refresh(
        &self,
        user: UserId,
        chat: ChatId,
        kind: MediaKind,
        message_id: MessageId,
        message_text: &str,
    ) -> Result<(), FlowError> {
        let status = self.fetch_status(kind, message_text).await?;
        let following = self
            .store
            .follower(user)
            .filter(|f| f.message_id == message_id && !f.is_finished());

        if !status.found {
            return self.notify(chat, &t!("messages.follow.not_in_queue")).await;
        }

        if status.is_imported() {
            if let Some(follower) = following {
                follower.cancel();
                self.store.clear_follower_if(user, follower.id);
            }
            let text = status::render(&status, kind, None, Utc::now());
            self.gateway.edit_text(chat, message_id, &text, None).await?;
            return self
                .notify(chat, &t!("messages.follow.imported", noun = kind.noun()))
                .await;
        }

        let interval = following.as_ref().map(|f| f.interval);
        let text = status::render(&status, kind, interval, Utc::now());
        self.gateway
            .edit_text(chat, message_id, &text, Some(get_follow_keyboard(kind, interval.is_some())))
            .await?;
        Ok(())
    }

    pub(super) async fn stop_following(
        &self,
        user: UserId,
        chat: ChatId,
        kind: MediaKind,
        message_id: MessageId,
    ) -> Result<(), FlowError> {
        match self.store.follower(user) {
            Some(follower) if follower.message_id == message_id => {
                follower.cancel();
                self.store.clear_follower_if(user, follower.id);
                info!("User {} stopped follower {}", user, follower.id);
            }
            _ => debug!("User {} has no follower on message {}", user, message_id.0),
        }

        self.gateway
            .edit_keyboard(chat, message_id, Some(get_follow_keyboard(kind, false)))
            .await?;
        Ok(())
    }
}
