//! Session storage and token lifecycle.
//!
//! The store keeps one authoritative copy of the credentials mirrored into the
//! cookie jar and persistent storage. The token manager decides when a token
//! must be refreshed and makes sure only one refresh runs at a time. Token
//! values are wrapped in `SecretString` once they leave a medium and must
//! never be logged.

pub mod jwt;
pub mod refresh;
pub mod storage;
pub mod store;
pub mod tokens;

pub use refresh::RefreshGate;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{Session, SessionStore};
pub use tokens::{TokenManager, TokenRefresher};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const CSRF_TOKEN_KEY: &str = "csrftoken";
pub const USER_KEY: &str = "user";
pub const REMEMBER_ME_KEY: &str = "rememberMe";
pub const EMAIL_KEY: &str = "email";

/// Older builds wrote the access token under these keys.
pub const LEGACY_ACCESS_TOKEN_KEYS: [&str; 1] = ["civic_jwt"];
