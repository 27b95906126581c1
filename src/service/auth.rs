use std::path::{Path, PathBuf};

use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use teloxide::types::UserId;
use tokio::sync::RwLock;

const AUTH_FILE: &str = "authorized.json";
pub const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Auth store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Auth store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: u64,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AuthLists {
    #[serde(default)]
    authorized: Vec<AuthUser>,
    #[serde(default)]
    blacklisted: Vec<AuthUser>,
}

impl AuthLists {
    fn is_authorized(&self, user: UserId) -> bool {
        self.authorized.iter().any(|u| u.id == user.0)
    }

    fn is_blacklisted(&self, user: UserId) -> bool {
        self.blacklisted.iter().any(|u| u.id == user.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Authorized,
    Blacklisted,
    /// Never seen, no password asked yet.
    NewUser,
    AwaitingPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOutcome {
    Authorized,
    WrongPassword { attempts_left: u32 },
    Blacklisted,
    /// No password is configured.
    Disabled,
}

/// Persisted allow/deny lists plus the in-flight password challenges.
#[derive(Debug)]
pub struct AuthGate {
    path: PathBuf,
    password: Option<String>,
    lists: RwLock<AuthLists>,
    attempts: DashMap<UserId, u32>,
    challenged: DashSet<UserId>,
}

impl AuthGate {
    /// Loads `authorized.json` from `dir`, creating the directory when needed.
    pub async fn load(dir: &Path, password: Option<String>) -> Result<Self, AuthError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(AUTH_FILE);

        let lists = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => AuthLists::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AuthLists::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "Auth store loaded from {}: {} authorized, {} blacklisted",
            path.display(),
            lists.authorized.len(),
            lists.blacklisted.len()
        );

        Ok(Self {
            path,
            password,
            lists: RwLock::new(lists),
            attempts: DashMap::new(),
            challenged: DashSet::new(),
        })
    }

    pub async fn status(&self, user: UserId) -> AuthStatus {
        let lists = self.lists.read().await;
        if lists.is_blacklisted(user) {
            AuthStatus::Blacklisted
        } else if lists.is_authorized(user) {
            AuthStatus::Authorized
        } else if self.challenged.contains(&user) {
            AuthStatus::AwaitingPassword
        } else {
            AuthStatus::NewUser
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    pub fn start_challenge(&self, user: UserId) {
        debug!("Asking user {} for the password", user);
        self.challenged.insert(user);
    }

    pub async fn check_password(&self, user: &AuthUser, password: &str) -> Result<PasswordOutcome, AuthError> {
        let Some(expected) = self.password.as_deref() else {
            return Ok(PasswordOutcome::Disabled);
        };
        let id = UserId(user.id);

        let mut lists = self.lists.write().await;
        if lists.is_authorized(id) {
            return Ok(PasswordOutcome::Authorized);
        }

        if password.trim() == expected {
            lists.authorized.push(user.clone());
            self.persist(&lists).await?;
            self.attempts.remove(&id);
            self.challenged.remove(&id);
            info!("User {} ({}) is now authorized", user.id, user.username);
            return Ok(PasswordOutcome::Authorized);
        }

        let attempts = {
            let mut entry = self.attempts.entry(id).or_insert(0);
            *entry += 1;
            *entry
        };

        if attempts >= MAX_ATTEMPTS {
            if !lists.is_blacklisted(id) {
                lists.blacklisted.push(user.clone());
                self.persist(&lists).await?;
            }
            self.attempts.remove(&id);
            self.challenged.remove(&id);
            warn!("User {} ({}) blacklisted after {} attempts", user.id, user.username, attempts);
            return Ok(PasswordOutcome::Blacklisted);
        }

        debug!("User {} entered a wrong password ({} of {})", user.id, attempts, MAX_ATTEMPTS);
        Ok(PasswordOutcome::WrongPassword {
            attempts_left: MAX_ATTEMPTS - attempts,
        })
    }

    async fn persist(&self, lists: &AuthLists) -> Result<(), AuthError> {
        let bytes = serde_json::to_vec_pretty(lists)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}
