//! Session-gated write access.
//!
//! - bearer token extraction from request headers
//! - password verification against the hash in the admin document
//! - login / logout on top of the session store
//! - password changes persisted back into the admin document

pub mod password;
pub mod token;

use http::HeaderMap;
use serde_json::{Map, Value};

use crate::document::{DocumentStore, StoreError};
use crate::session::{Session, SessionError, SessionStore};

pub use password::{hash_password, DEFAULT_MIN_PASSWORD_LENGTH, DEFAULT_PASSWORD_HASH};
pub use token::{extract_token, generate_token};

/// Field of the admin document holding the password hash.
pub const PASSWORD_HASH_FIELD: &str = "passwordHash";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No bearer token was presented
    #[error("authentication required")]
    AuthRequired,
    /// Wrong password, or a token without a live session
    #[error("invalid credentials")]
    AuthInvalid,
    #[error("new password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    documents: DocumentStore,
    sessions: SessionStore,
    admin_key: String,
    min_password_length: usize,
}

impl AuthGate {
    pub fn new(documents: DocumentStore, sessions: SessionStore, admin_key: &str) -> Self {
        Self {
            documents,
            sessions,
            admin_key: admin_key.to_string(),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }

    pub fn with_min_password_length(mut self, min: usize) -> Self {
        self.min_password_length = min;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn admin_key(&self) -> &str {
        &self.admin_key
    }

    /// Whether the request carries a token with a live session.
    ///
    /// Fails closed: a session backend error counts as unauthenticated.
    pub async fn verify_auth(&self, headers: &HeaderMap) -> bool {
        let Some(token) = extract_token(headers) else {
            return false;
        };
        match self.sessions.validate(&token).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed, treating request as unauthenticated");
                false
            }
        }
    }

    /// Like [`AuthGate::verify_auth`], but says why a request was refused.
    pub async fn require_auth(&self, headers: &HeaderMap) -> Result<Session, AuthError> {
        let token = extract_token(headers).ok_or_else(|| {
            tracing::debug!("request without bearer token");
            AuthError::AuthRequired
        })?;
        self.sessions.get(&token).await?.ok_or_else(|| {
            tracing::debug!("bearer token has no live session");
            AuthError::AuthInvalid
        })
    }

    /// Check `candidate` against the stored password hash.
    pub async fn verify_password(&self, candidate: &str) -> Result<bool, AuthError> {
        let admin = self.admin_document().await?;
        // An absent hash means the default password; a hash of the wrong
        // shape is a damaged admin document and never unlocks anything.
        let stored = match admin.get(PASSWORD_HASH_FIELD) {
            None => DEFAULT_PASSWORD_HASH.to_string(),
            Some(value) => serde_json::from_value::<String>(value.clone()).map_err(|source| {
                StoreError::Corrupt {
                    key: self.admin_key.clone(),
                    source,
                }
            })?,
        };
        Ok(password::verify_password(candidate, &stored))
    }

    /// Verify `password` and open a new session for it.
    pub async fn login(&self, password: &str) -> Result<Session, AuthError> {
        if !self.verify_password(password).await? {
            tracing::debug!("login rejected");
            return Err(AuthError::AuthInvalid);
        }
        Ok(self.sessions.create(&generate_token()).await?)
    }

    /// End the session named by the request's bearer token.
    pub async fn logout(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let token = extract_token(headers).ok_or(AuthError::AuthRequired)?;
        Ok(self.sessions.delete(&token).await?)
    }

    /// Replace the password, keeping every other admin setting.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), AuthError> {
        if !self.verify_password(current).await? {
            tracing::debug!("password change rejected: current password mismatch");
            return Err(AuthError::AuthInvalid);
        }
        if new.chars().count() < self.min_password_length {
            return Err(AuthError::PasswordTooShort {
                min: self.min_password_length,
            });
        }

        let mut admin = self.admin_document().await?;
        admin.insert(
            PASSWORD_HASH_FIELD.to_string(),
            Value::String(hash_password(new)),
        );
        self.documents.write(&self.admin_key, &admin).await?;

        tracing::info!("admin password changed");
        Ok(())
    }

    /// The admin document. Read strictly: falling back to an empty document
    /// on a backend outage would re-enable the default password.
    async fn admin_document(&self) -> Result<Map<String, Value>, StoreError> {
        self.documents.read_strict(&self.admin_key, Map::new()).await
    }
}
