//! Client-side session and state layer for the LLM chat backend: the HTTP
//! pipeline, one API module per resource, per-domain stores and their
//! local durable mirror.

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod navigation;
pub mod state;
pub mod storage;
pub mod store;

pub use config::AppConfig;
pub use errors::{AppError, AppResult};
pub use state::AppState;
