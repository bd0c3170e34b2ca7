use reqwest::StatusCode;
use thiserror::Error;

/// Top-level client error.
/// Every failure the stores surface to their callers is one of these variants.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Stream interrupted: {message}")]
    Stream { message: String },

    // ── Server responses ─────────────────────────────────────────────────────
    #[error("Not authorized, credential cleared")]
    Unauthorized { body: String },

    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Unexpected response shape from {url}: {message}")]
    Decode { url: String, message: String },

    // ── Local lookups ────────────────────────────────────────────────────────
    #[error("{entity_type} '{id}' not found")]
    NotFound { entity_type: &'static str, id: String },

    // ── Local infrastructure ─────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Transport { url: url.into(), source }
    }

    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        AppError::NotFound { entity_type, id: id.to_string() }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            AppError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    /// The backend's `detail` field, falling back to the full message.
    pub fn detail(&self) -> String {
        if let AppError::Http { body, .. } | AppError::Unauthorized { body } = self {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
                if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
                    return detail.to_string();
                }
            }
        }
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound { .. })
            || self.status() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport { .. } | AppError::Stream { .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_prefers_backend_field() {
        let err = AppError::Http {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"detail":"Incorrect username or password"}"#.to_string(),
        };
        assert_eq!(err.detail(), "Incorrect username or password");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn detail_falls_back_to_display() {
        let err = AppError::Http {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };
        assert_eq!(err.detail(), "HTTP 500 Internal Server Error: boom");
    }

    #[test]
    fn unauthorized_keeps_backend_detail() {
        let err = AppError::Unauthorized {
            body: r#"{"detail":"Incorrect username or password"}"#.to_string(),
        };
        assert_eq!(err.detail(), "Incorrect username or password");
        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(AppError::Unauthorized { body: String::new() }.detail(), "Not authorized, credential cleared");
    }

    #[test]
    fn not_found_covers_local_and_remote() {
        assert!(AppError::not_found("Model", 3).is_not_found());
        let remote = AppError::Http { status: StatusCode::NOT_FOUND, body: String::new() };
        assert!(remote.is_not_found());
        let unauthorized = AppError::Unauthorized { body: String::new() };
        assert!(!unauthorized.is_not_found());
        assert!(unauthorized.is_unauthorized());
    }
}
