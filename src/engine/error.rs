use crate::{catalog::CatalogError, gateway::GatewayError};

/// Outcome of a flow that could not complete. Every variant ends in a safe state.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("nothing matched the request")]
    NotFound,

    #[error("catalog call failed: {0}")]
    Transient(#[from] CatalogError),

    #[error("session expired")]
    Expired,

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("gateway call failed: {0}")]
    Gateway(#[from] GatewayError),
}

impl FlowError {
    /// Whether the pending action and working set should be dropped.
    pub fn aborts_flow(&self) -> bool {
        matches!(self, FlowError::NotFound | FlowError::Transient(_))
    }

    /// Text shown to the user, `None` when the gateway itself is failing.
    pub fn user_message(&self) -> Option<String> {
        match self {
            FlowError::NotFound => Some(t!("errors.not_found").to_string()),
            FlowError::Transient(_) => Some(t!("errors.transient").to_string()),
            FlowError::Expired | FlowError::Malformed(_) => Some(t!("errors.expired").to_string()),
            FlowError::Gateway(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_found_and_transient_abort() {
        assert!(FlowError::NotFound.aborts_flow());
        assert!(FlowError::Transient(CatalogError::InvalidPayload("x".into())).aborts_flow());
        assert!(!FlowError::Expired.aborts_flow());
        assert!(!FlowError::Malformed("no id".into()).aborts_flow());
    }

    #[test]
    fn test_gateway_failure_is_silent() {
        let error = FlowError::Gateway(GatewayError::InvalidImage("nope".into()));
        assert!(error.user_message().is_none());
        assert!(FlowError::Expired.user_message().is_some());
    }
}
