//! Request and response schemas for every backend endpoint.
//!
//! Shapes are validated at the boundary by serde; anything the server adds on
//! top of these fields is ignored.

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod image;
pub mod mcp;
pub mod settings;
pub mod todo;

use serde::{Deserialize, Deserializer, Serialize};

/// Plain acknowledgement returned by most delete/maintenance endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Accepts either a JSON string or a JSON number and keeps it as a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
