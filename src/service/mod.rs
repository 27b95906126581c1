pub mod auth;

pub use auth::{AuthGate, AuthStatus, AuthUser, PasswordOutcome};
