pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use client::{ApiClient, ApiRequest, AuthMode, OnUnauthenticated};
pub use config::ClientConfig;
pub use error::ApiError;
pub use session::{FileStore, KeyValueStore, MemoryStore, Session, SessionStore, StorageError};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

/// Where the CLI (and other desktop callers) keep the session between runs when nothing else
/// is configured: `$HOME/.lakshya/session.json`, or `.lakshya-session.json` in the current
/// directory if there is no home directory.
pub fn default_session_path() -> std::path::PathBuf {
    match std::env::var_os("HOME") {
        Some(home) if !home.is_empty() => std::path::PathBuf::from(home)
            .join(".lakshya")
            .join("session.json"),
        _ => std::path::PathBuf::from(".lakshya-session.json"),
    }
}
