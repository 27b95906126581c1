use crate::{
    catalog::{MediaItem, MediaKind},
    runtime::FollowerHandle,
};

use super::SessionError;

/// The flow step waiting for the user's next free-text reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    LookupMediaToAdd(MediaKind),
    MediaDetailsQuery(MediaKind),
    RemoveMediaQuery(MediaKind),
    AddMediaConfirmQualityProfile(MediaKind),
}

impl ActionKind {
    pub fn media_kind(&self) -> MediaKind {
        match *self {
            ActionKind::LookupMediaToAdd(kind)
            | ActionKind::MediaDetailsQuery(kind)
            | ActionKind::RemoveMediaQuery(kind)
            | ActionKind::AddMediaConfirmQualityProfile(kind) => kind,
        }
    }
}

/// Candidates from a lookup together with the 1-based page being shown.
///
/// The page only exists alongside a non-empty item list and always stays in `1..=len`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingSet {
    kind: MediaKind,
    items: Vec<MediaItem>,
    page: usize,
}

impl WorkingSet {
    pub fn new(kind: MediaKind, items: Vec<MediaItem>) -> Result<Self, SessionError> {
        if items.is_empty() {
            return Err(SessionError::EmptyWorkingSet);
        }
        Ok(Self { kind, items, page: 1 })
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn current(&self) -> &MediaItem {
        &self.items[self.page - 1]
    }

    pub fn advance(&mut self, delta: isize) -> Result<usize, SessionError> {
        let target = self.page as isize + delta;
        if target < 1 || target > self.items.len() as isize {
            return Err(SessionError::OutOfRange {
                page: target,
                total: self.items.len(),
            });
        }
        self.page = target as usize;
        Ok(self.page)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserSession {
    pub pending_action: Option<ActionKind>,
    pub working_set: Option<WorkingSet>,
    pub follower: Option<FollowerHandle>,
}

impl UserSession {
    pub fn is_empty(&self) -> bool {
        self.pending_action.is_none() && self.working_set.is_none() && self.follower.is_none()
    }
}
