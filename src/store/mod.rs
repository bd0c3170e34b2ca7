//! Per-domain caches of server-owned data.
//!
//! Every store follows the same contract:
//! - `load_*` replaces the cached collection wholesale and mirrors it to
//!   durable storage. On failure it logs, rehydrates from the mirror when a
//!   copy exists, and still returns the error.
//! - mutations call the API first and then patch the in-memory collection
//!   (insert at front, find-replace, filter-out) instead of reloading. The
//!   cache is eventually consistent: a failed patch leaves it stale until the
//!   next load, and racing mutations resolve last-writer-wins.
//! - derived views are computed from the collection on every call.

pub mod auth_store;
pub mod chat_store;
pub mod knowledge_store;
pub mod mcp_store;
pub mod model_store;
pub mod prompt_store;
pub mod settings_store;
pub mod todo_store;

pub use auth_store::AuthStore;
pub use chat_store::ChatStore;
pub use knowledge_store::KnowledgeStore;
pub use mcp_store::McpStore;
pub use model_store::ModelStore;
pub use prompt_store::PromptStore;
pub use settings_store::SettingsStore;
pub use todo_store::TodoStore;

use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::errors::AppError;
use crate::storage::Mirror;

/// Logs a failed load and returns the mirrored copy, if any.
pub(crate) fn rehydrate<T: DeserializeOwned>(
    mirror: &Mirror,
    key: &str,
    what: &str,
    err: &AppError,
) -> Option<T> {
    error!("Failed to load {what}: {err}");
    let cached = mirror.load(key);
    if cached.is_some() {
        info!("Restored {what} from local storage");
    }
    cached
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
