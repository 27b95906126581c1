#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("page {page} is out of range 1..={total}")]
    OutOfRange { page: isize, total: usize },
    #[error("no working set")]
    NoWorkingSet,
    #[error("working set cannot be empty")]
    EmptyWorkingSet,
}
