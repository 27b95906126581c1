use std::{fmt, str::FromStr};

use crate::catalog::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    First,
    Previous,
    Next,
    Last,
}

/// Symbolic name carried by an inline button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    ListPage(MediaKind, PageTarget),
    Details(MediaKind),
    BackToList(MediaKind),
    Remove(MediaKind),
    ConfirmRemove(MediaKind),
    CancelRemove(MediaKind),
    Add(MediaKind),
    NextAdd(MediaKind),
    PreviousAdd(MediaKind),
    EditRequest(MediaKind),
    Follow(MediaKind),
    Refresh(MediaKind),
    StopFollow(MediaKind),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown callback data: {0}")]
pub struct UnknownCallback(pub String);

impl CallbackData {
    pub fn all() -> Vec<CallbackData> {
        let mut all = vec![CallbackData::Cancel];
        for kind in [MediaKind::Movie, MediaKind::Series] {
            for target in [PageTarget::First, PageTarget::Previous, PageTarget::Next, PageTarget::Last] {
                all.push(CallbackData::ListPage(kind, target));
            }
            all.extend([
                CallbackData::Details(kind),
                CallbackData::BackToList(kind),
                CallbackData::Remove(kind),
                CallbackData::ConfirmRemove(kind),
                CallbackData::CancelRemove(kind),
                CallbackData::Add(kind),
                CallbackData::NextAdd(kind),
                CallbackData::PreviousAdd(kind),
                CallbackData::EditRequest(kind),
                CallbackData::Follow(kind),
                CallbackData::Refresh(kind),
                CallbackData::StopFollow(kind),
            ]);
        }
        all
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        match *self {
            CallbackData::Cancel => None,
            CallbackData::ListPage(kind, _)
            | CallbackData::Details(kind)
            | CallbackData::BackToList(kind)
            | CallbackData::Remove(kind)
            | CallbackData::ConfirmRemove(kind)
            | CallbackData::CancelRemove(kind)
            | CallbackData::Add(kind)
            | CallbackData::NextAdd(kind)
            | CallbackData::PreviousAdd(kind)
            | CallbackData::EditRequest(kind)
            | CallbackData::Follow(kind)
            | CallbackData::Refresh(kind)
            | CallbackData::StopFollow(kind) => Some(kind),
        }
    }
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = self.media_kind().map(|k| k.callback_suffix()).unwrap_or_default();
        match self {
            CallbackData::ListPage(_, PageTarget::First) => write!(f, "first{}", suffix),
            CallbackData::ListPage(_, PageTarget::Previous) => write!(f, "previous{}", suffix),
            CallbackData::ListPage(_, PageTarget::Next) => write!(f, "next{}", suffix),
            CallbackData::ListPage(_, PageTarget::Last) => write!(f, "last{}", suffix),
            CallbackData::Details(kind) => write!(f, "{}Details", kind.noun()),
            CallbackData::BackToList(_) => write!(f, "backTo{}sList", suffix),
            CallbackData::Remove(_) => write!(f, "remove{}", suffix),
            CallbackData::ConfirmRemove(_) => write!(f, "confirmRemove{}", suffix),
            CallbackData::CancelRemove(_) => write!(f, "cancelRemove{}", suffix),
            CallbackData::Add(_) => write!(f, "add{}", suffix),
            CallbackData::NextAdd(_) => write!(f, "nextAdd{}", suffix),
            CallbackData::PreviousAdd(_) => write!(f, "previousAdd{}", suffix),
            CallbackData::EditRequest(_) => write!(f, "editRequest{}", suffix),
            CallbackData::Follow(_) => write!(f, "followDownloadingStatus{}", suffix),
            CallbackData::Refresh(_) => write!(f, "refreshDownloadingStatus{}", suffix),
            CallbackData::StopFollow(_) => write!(f, "cancelFollowDownloadingStatus{}", suffix),
            CallbackData::Cancel => f.write_str("cancel"),
        }
    }
}

impl FromStr for CallbackData {
    type Err = UnknownCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallbackData::all()
            .into_iter()
            .find(|data| data.to_string() == s)
            .ok_or_else(|| UnknownCallback(s.to_string()))
    }
}
