use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use teloxide::types::{ChatId, MessageId, UserId};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{
    catalog::{CatalogService, DownloadStatus, MediaKind},
    gateway::{Keyboard, MessagingGateway},
    handler::get_follow_keyboard,
    presenter::status,
};

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle on one running download-status follower.
///
/// Clones share the same cancellation state.
#[derive(Clone, Debug)]
pub struct FollowerHandle {
    pub id: u64,
    pub kind: MediaKind,
    pub library_id: i64,
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub interval: Duration,
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    shutdown: broadcast::Sender<()>,
}

impl FollowerHandle {
    pub fn new(
        id: u64,
        kind: MediaKind,
        library_id: i64,
        chat_id: ChatId,
        message_id: MessageId,
        interval: Duration,
    ) -> Self {
        let (shutdown, _) = broadcast::channel(1);
        Self {
            id,
            kind,
            library_id,
            chat_id,
            message_id,
            interval,
            running: Arc::new(AtomicBool::new(true)),
            finished: Arc::new(AtomicBool::new(false)),
            shutdown,
        }
    }

    pub fn cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(());
    }

    pub fn is_cancelled(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    /// True once the task has stopped, whatever the reason.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    fn mark_finished(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.finished.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerOutcome {
    Imported,
    LeftQueue,
    Cancelled,
}

/// Terminal report sent back to the engine, which owns the store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerEvent {
    pub user: UserId,
    pub follower_id: u64,
    pub outcome: FollowerOutcome,
}

pub struct Follower {
    user: UserId,
    handle: FollowerHandle,
    catalog: Arc<dyn CatalogService>,
    gateway: Arc<dyn MessagingGateway>,
    last_status: DownloadStatus,
}

impl Follower {
    /// `initial` is the status already shown in the tracked message.
    pub fn new(
        user: UserId,
        handle: FollowerHandle,
        catalog: Arc<dyn CatalogService>,
        gateway: Arc<dyn MessagingGateway>,
        initial: DownloadStatus,
    ) -> Self {
        Self {
            user,
            handle,
            catalog,
            gateway,
            last_status: initial,
        }
    }

    pub fn spawn(self, events: mpsc::UnboundedSender<FollowerEvent>) -> JoinHandle<()> {
        let mut shutdown = self.handle.subscribe();
        info!(
            "Starting follower {} for user {} ({} {})",
            self.handle.id, self.user, self.handle.kind, self.handle.library_id
        );

        tokio::spawn(async move {
            let mut follower = self;
            let outcome = follower.run(&mut shutdown).await;
            follower.handle.mark_finished();

            info!(
                "Follower {} for user {} stopped: {:?}",
                follower.handle.id, follower.user, outcome
            );

            if events
                .send(FollowerEvent {
                    user: follower.user,
                    follower_id: follower.handle.id,
                    outcome,
                })
                .is_err()
            {
                warn!("Follower {} could not report its outcome", follower.handle.id);
            }
        })
    }

    async fn run(&mut self, shutdown: &mut broadcast::Receiver<()>) -> FollowerOutcome {
        let mut ticker = tokio::time::interval(self.handle.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick fires immediately, the message already shows a fresh status
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => return FollowerOutcome::Cancelled,
            }

            if self.handle.is_cancelled() {
                return FollowerOutcome::Cancelled;
            }

            let status = match self.catalog.download_status(self.handle.library_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("Follower {} failed to fetch status: {}", self.handle.id, e);
                    continue;
                }
            };

            if self.handle.is_cancelled() {
                return FollowerOutcome::Cancelled;
            }

            if status.is_imported() {
                self.finish(&status, t!("messages.follow.imported", noun = self.handle.kind.noun()).to_string())
                    .await;
                return FollowerOutcome::Imported;
            }

            if !status.found {
                let last = self.last_status.clone();
                self.finish(&last, t!("messages.follow.left_queue", noun = self.handle.kind.noun()).to_string())
                    .await;
                return FollowerOutcome::LeftQueue;
            }

            let text = status::render(&status, self.handle.kind, Some(self.handle.interval), Utc::now());
            if let Err(e) = self
                .gateway
                .edit_text(
                    self.handle.chat_id,
                    self.handle.message_id,
                    &text,
                    Some(get_follow_keyboard(self.handle.kind, true)),
                )
                .await
            {
                warn!("Follower {} failed to edit message: {}", self.handle.id, e);
            }
            self.last_status = status;
        }
    }

    /// Last edit without keyboard, then a notice.
    async fn finish(&self, shown: &DownloadStatus, notice: String) {
        let text = status::render(shown, self.handle.kind, None, Utc::now());
        if let Err(e) = self
            .gateway
            .edit_text(self.handle.chat_id, self.handle.message_id, &text, None)
            .await
        {
            warn!("Follower {} failed to drop its keyboard: {}", self.handle.id, e);
        }
        if let Err(e) = self
            .gateway
            .send_text(self.handle.chat_id, &notice, Keyboard::None)
            .await
        {
            error!("Follower {} failed to notify user {}: {}", self.handle.id, self.user, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{MockCatalogService, QueueState},
        utils::test::{downloading, GatewayCall, RecordingGateway},
    };

    fn handle(id: u64) -> FollowerHandle {
        FollowerHandle::new(id, MediaKind::Movie, 42, ChatId(1), MessageId(10), Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn test_imported_tick_sends_one_completion() {
        let mut catalog = MockCatalogService::new();
        let mut calls = 0;
        catalog.expect_download_status().returning(move |id| {
            calls += 1;
            let mut status = downloading(id);
            if calls >= 2 {
                status.state = QueueState::Imported;
                status.size_left = 0.0;
            }
            Ok(status)
        });

        let gateway = Arc::new(RecordingGateway::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = handle(1);

        let task = Follower::new(UserId(7), handle.clone(), Arc::new(catalog), gateway.clone(), downloading(42))
            .spawn(tx);

        let event = rx.recv().await.unwrap();
        task.await.unwrap();

        assert_eq!(event.outcome, FollowerOutcome::Imported);
        assert_eq!(event.follower_id, 1);
        assert!(handle.is_finished());

        let calls = gateway.calls();
        let sent: Vec<_> = calls.iter().filter(|c| matches!(c, GatewayCall::SendText { .. })).collect();
        assert_eq!(sent.len(), 1);
        match calls.iter().rev().find(|c| matches!(c, GatewayCall::EditText { .. })) {
            Some(GatewayCall::EditText { keyboard, .. }) => assert!(keyboard.is_none()),
            _ => panic!("expected a final edit"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_before_next_tick() {
        let mut catalog = MockCatalogService::new();
        catalog.expect_download_status().never();

        let gateway = Arc::new(RecordingGateway::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = handle(3);

        let task = Follower::new(UserId(7), handle.clone(), Arc::new(catalog), gateway.clone(), downloading(42))
            .spawn(tx);
        handle.cancel();

        let event = rx.recv().await.unwrap();
        task.await.unwrap();

        assert_eq!(event.outcome, FollowerOutcome::Cancelled);
        assert!(handle.is_finished());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_vanished_item_terminates() {
        let mut catalog = MockCatalogService::new();
        catalog
            .expect_download_status()
            .times(1)
            .returning(|id| Ok(DownloadStatus::not_found(id)));

        let gateway = Arc::new(RecordingGateway::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = Follower::new(UserId(7), handle(4), Arc::new(catalog), gateway.clone(), downloading(42)).spawn(tx);

        let event = rx.recv().await.unwrap();
        task.await.unwrap();

        assert_eq!(event.outcome, FollowerOutcome::LeftQueue);
        assert_eq!(gateway.sent_texts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_still_ticks() {
        let mut catalog = MockCatalogService::new();
        catalog
            .expect_download_status()
            .times(1)
            .returning(|id| Ok(DownloadStatus::not_found(id)));

        let gateway = Arc::new(RecordingGateway::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = FollowerHandle::new(6, MediaKind::Movie, 42, ChatId(1), MessageId(10), Duration::ZERO);

        let task = Follower::new(UserId(7), handle.clone(), Arc::new(catalog), gateway, downloading(42)).spawn(tx);

        let event = rx.recv().await.unwrap();
        task.await.unwrap();

        assert_eq!(event.outcome, FollowerOutcome::LeftQueue);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_errors_keep_following() {
        let mut catalog = MockCatalogService::new();
        let mut calls = 0;
        catalog.expect_download_status().returning(move |id| {
            calls += 1;
            match calls {
                1 => Err(crate::catalog::CatalogError::InvalidPayload("boom".into())),
                2 => Ok(downloading(id)),
                _ => Ok(DownloadStatus::not_found(id)),
            }
        });

        let gateway = Arc::new(RecordingGateway::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = Follower::new(UserId(7), handle(5), Arc::new(catalog), gateway.clone(), downloading(42)).spawn(tx);

        let event = rx.recv().await.unwrap();
        task.await.unwrap();

        assert_eq!(event.outcome, FollowerOutcome::LeftQueue);
        let live_edits = gateway
            .calls()
            .into_iter()
            .filter(|c| matches!(c, GatewayCall::EditText { keyboard: Some(_), .. }))
            .count();
        assert_eq!(live_edits, 1);
    }
}
