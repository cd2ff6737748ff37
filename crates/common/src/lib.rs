/**
 * Session-gated write access.
 *  - Bearer token extraction
 *  - Password verification against the admin document
 */
pub mod auth;
/**
 * Configuration for every backend a site needs,
 *  plus environment overrides for credentials.
 */
pub mod config;
/**
 * Durable JSON documents over an append-only,
 *  eventually consistent blob store.
 * Writes create a new version before removing
 *  the old ones, so readers never see a gap.
 */
pub mod document;
/**
 * Time-limited sessions keyed by opaque tokens.
 */
pub mod session;
/**
 * Wiring: builds the stores and the auth gate
 *  from a single configuration.
 */
pub mod site;

pub mod prelude {
    pub use crate::auth::{extract_token, AuthError, AuthGate};
    pub use crate::config::{KvConfig, StoreConfig};
    pub use crate::document::{DocumentStore, StoreError, WriteOutcome};
    pub use crate::session::{Session, SessionError, SessionStore};
    pub use crate::site::{SetupError, Site};
}
