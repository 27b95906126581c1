mod error;
mod model;

pub use error::SessionError;
pub use model::*;

use std::sync::Arc;

use dashmap::DashMap;
use teloxide::types::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    catalog::{MediaItem, MediaKind},
    runtime::FollowerHandle,
};

/// Per-user action state, sharded by user id.
///
/// Every mutation touches a single entry, so users never contend on a shared lock.
/// `lock_user` serializes whole event handling for one user; a lock nobody waits on is
/// dropped together with its guard.
#[derive(Debug, Default)]
pub struct ActionStore {
    sessions: DashMap<UserId, UserSession>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl ActionStore {
    pub fn new() -> Self {
        info!("Initializing ActionStore");
        Self::default()
    }

    pub async fn lock_user(&self, user: UserId) -> UserGuard<'_> {
        let lock = self.locks.entry(user).or_default().clone();
        UserGuard {
            store: self,
            user,
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Snapshot of the user's session, empty if the user has none.
    pub fn get(&self, user: UserId) -> UserSession {
        self.sessions.get(&user).map(|s| s.clone()).unwrap_or_default()
    }

    fn update<R>(&self, user: UserId, f: impl FnOnce(&mut UserSession) -> R) -> R {
        let mut entry = self.sessions.entry(user).or_default();
        let result = f(entry.value_mut());
        let empty = entry.is_empty();
        drop(entry);
        if empty {
            self.sessions.remove_if(&user, |_, s| s.is_empty());
        }
        result
    }

    pub fn set_pending_action(&self, user: UserId, action: Option<ActionKind>) {
        trace!("user {} pending action -> {:?}", user, action);
        self.update(user, |s| s.pending_action = action);
    }

    pub fn take_pending_action(&self, user: UserId) -> Option<ActionKind> {
        self.update(user, |s| s.pending_action.take())
    }

    /// Replaces the working set and moves to page 1.
    pub fn set_working_set(&self, user: UserId, kind: MediaKind, items: Vec<MediaItem>) -> Result<(), SessionError> {
        let working_set = WorkingSet::new(kind, items)?;
        self.update(user, |s| s.working_set = Some(working_set));
        Ok(())
    }

    pub fn working_set(&self, user: UserId) -> Option<WorkingSet> {
        self.sessions.get(&user).and_then(|s| s.working_set.clone())
    }

    pub fn clear_working_set(&self, user: UserId) {
        self.update(user, |s| s.working_set = None);
    }

    /// Moves the page by `delta`; out-of-range moves leave the page untouched.
    pub fn advance_page(&self, user: UserId, delta: isize) -> Result<usize, SessionError> {
        self.update(user, |s| match s.working_set.as_mut() {
            Some(ws) => ws.advance(delta),
            None => Err(SessionError::NoWorkingSet),
        })
    }

    pub fn current_candidate(&self, user: UserId) -> Option<MediaItem> {
        self.sessions
            .get(&user)
            .and_then(|s| s.working_set.as_ref().map(|ws| ws.current().clone()))
    }

    /// Drops the pending action and working set; a running follower is kept.
    pub fn clear(&self, user: UserId) {
        debug!("Clearing session of user {}", user);
        self.update(user, |s| {
            s.pending_action = None;
            s.working_set = None;
        });
    }

    /// Installs a follower and hands back the one it replaces.
    pub fn set_follower(&self, user: UserId, handle: FollowerHandle) -> Option<FollowerHandle> {
        self.update(user, |s| s.follower.replace(handle))
    }

    pub fn follower(&self, user: UserId) -> Option<FollowerHandle> {
        self.sessions.get(&user).and_then(|s| s.follower.clone())
    }

    pub fn take_follower(&self, user: UserId) -> Option<FollowerHandle> {
        self.update(user, |s| s.follower.take())
    }

    /// Removes the follower only if it is still the one identified by `id`.
    pub fn clear_follower_if(&self, user: UserId, id: u64) -> bool {
        self.update(user, |s| match &s.follower {
            Some(handle) if handle.id == id => {
                s.follower = None;
                true
            }
            _ => false,
        })
    }
}

/// Holds one user's event lock.
pub struct UserGuard<'a> {
    store: &'a ActionStore,
    user: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // waiters hold a clone, so the count is 1 only when nobody is queued
        self.store
            .locks
            .remove_if(&self.user, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use teloxide::types::{ChatId, MessageId};

    use super::*;
    use crate::utils::test::movie;

    const USER: UserId = UserId(1);

    fn alien_candidates() -> Vec<MediaItem> {
        vec![
            movie(None, 348, "Alien"),
            movie(None, 679, "Aliens"),
            movie(None, 8077, "Alien 3"),
        ]
    }

    fn handle(id: u64) -> FollowerHandle {
        FollowerHandle::new(id, MediaKind::Movie, 42, ChatId(1), MessageId(10), Duration::from_secs(5))
    }

    #[test]
    fn test_absent_user_gets_empty_session() {
        let store = ActionStore::new();
        let session = store.get(USER);
        assert!(session.is_empty());
        assert!(store.sessions.is_empty());
    }

    #[test]
    fn test_set_working_set_resets_page() {
        let store = ActionStore::new();
        store.set_working_set(USER, MediaKind::Movie, alien_candidates()).unwrap();
        store.advance_page(USER, 2).unwrap();

        store.set_working_set(USER, MediaKind::Movie, alien_candidates()).unwrap();
        assert_eq!(store.working_set(USER).unwrap().page(), 1);
    }

    #[test]
    fn test_empty_working_set_is_rejected() {
        let store = ActionStore::new();
        assert_eq!(
            store.set_working_set(USER, MediaKind::Movie, vec![]),
            Err(SessionError::EmptyWorkingSet)
        );
        assert!(store.working_set(USER).is_none());
    }

    #[test]
    fn test_advance_page_stays_in_range() {
        let store = ActionStore::new();
        store.set_working_set(USER, MediaKind::Movie, alien_candidates()).unwrap();

        assert_eq!(store.advance_page(USER, 1), Ok(2));
        assert_eq!(store.advance_page(USER, 1), Ok(3));
        assert!(matches!(store.advance_page(USER, 1), Err(SessionError::OutOfRange { .. })));
        assert_eq!(store.working_set(USER).unwrap().page(), 3);
        assert_eq!(store.current_candidate(USER).unwrap().title, "Alien 3");

        assert!(matches!(store.advance_page(USER, -3), Err(SessionError::OutOfRange { .. })));
        assert_eq!(store.working_set(USER).unwrap().page(), 3);
        assert_eq!(store.advance_page(USER, -2), Ok(1));
        assert!(matches!(store.advance_page(USER, -1), Err(SessionError::OutOfRange { .. })));
    }

    #[test]
    fn test_advance_page_without_working_set() {
        let store = ActionStore::new();
        assert_eq!(store.advance_page(USER, 1), Err(SessionError::NoWorkingSet));
    }

    #[test]
    fn test_clear_keeps_follower() {
        let store = ActionStore::new();
        store.set_pending_action(USER, Some(ActionKind::LookupMediaToAdd(MediaKind::Movie)));
        store.set_working_set(USER, MediaKind::Movie, alien_candidates()).unwrap();
        store.set_follower(USER, handle(1));

        store.clear(USER);

        let session = store.get(USER);
        assert!(session.pending_action.is_none());
        assert!(session.working_set.is_none());
        assert_eq!(session.follower.map(|f| f.id), Some(1));
    }

    #[test]
    fn test_take_pending_action() {
        let store = ActionStore::new();
        store.set_pending_action(USER, Some(ActionKind::RemoveMediaQuery(MediaKind::Series)));
        assert_eq!(
            store.take_pending_action(USER),
            Some(ActionKind::RemoveMediaQuery(MediaKind::Series))
        );
        assert_eq!(store.take_pending_action(USER), None);
        assert!(store.sessions.is_empty());
    }

    #[test]
    fn test_set_follower_returns_previous() {
        let store = ActionStore::new();
        assert!(store.set_follower(USER, handle(1)).is_none());
        let previous = store.set_follower(USER, handle(2)).unwrap();
        assert_eq!(previous.id, 1);
        assert_eq!(store.follower(USER).unwrap().id, 2);
    }

    #[test]
    fn test_clear_follower_if_matches_id_only() {
        let store = ActionStore::new();
        store.set_follower(USER, handle(2));

        assert!(!store.clear_follower_if(USER, 1));
        assert!(store.follower(USER).is_some());
        assert!(store.clear_follower_if(USER, 2));
        assert!(store.follower(USER).is_none());
    }

    #[test]
    fn test_users_are_independent() {
        let store = ActionStore::new();
        let other = UserId(2);
        store.set_working_set(USER, MediaKind::Movie, alien_candidates()).unwrap();
        store.set_pending_action(other, Some(ActionKind::LookupMediaToAdd(MediaKind::Series)));

        store.clear(other);

        assert!(store.working_set(USER).is_some());
        assert!(store.get(other).is_empty());
    }

    #[tokio::test]
    async fn test_user_lock_does_not_block_other_users() {
        let store = ActionStore::new();
        let _held = store.lock_user(USER).await;

        let other = tokio::time::timeout(Duration::from_millis(100), store.lock_user(UserId(2))).await;
        assert!(other.is_ok());

        let same = tokio::time::timeout(Duration::from_millis(50), store.lock_user(USER)).await;
        assert!(same.is_err());
    }

    #[tokio::test]
    async fn test_released_lock_is_dropped() {
        let store = ActionStore::new();

        drop(store.lock_user(USER).await);
        assert!(store.locks.is_empty());

        let held = store.lock_user(USER).await;
        let waiter = store.lock_user(USER);
        tokio::pin!(waiter);
        assert!(tokio::time::timeout(Duration::from_millis(20), &mut waiter).await.is_err());

        // the queued waiter keeps the entry alive
        drop(held);
        assert_eq!(store.locks.len(), 1);
        drop(waiter.await);
        assert!(store.locks.is_empty());
    }
}
