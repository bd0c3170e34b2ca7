//! Local preference blobs (mirrored under camelCase keys) and the server-side
//! user settings record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub api_base_url: String,
    pub theme: Theme,
    pub language: String,
    pub auto_save: bool,
    pub max_conversations: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8001".to_string(),
            theme: Theme::Light,
            language: "zh-CN".to_string(),
            auto_save: true,
            max_conversations: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultModelSettings {
    pub model_id: Option<i64>,
    pub title_generation_model_id: Option<i64>,
    pub temperature: f64,
    pub max_tokens: i64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub enable_chain_of_thought: bool,
}

impl Default for DefaultModelSettings {
    fn default() -> Self {
        Self {
            model_id: None,
            title_generation_model_id: None,
            temperature: 0.7,
            max_tokens: 2000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            enable_chain_of_thought: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub language: String,
    pub timezone: String,
    pub auto_save: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            language: "zh-CN".to_string(),
            timezone: "Asia/Shanghai".to_string(),
            auto_save: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    pub theme: Theme,
    pub font_size: u32,
    pub density: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { theme: Theme::Light, font_size: 14, density: "normal".to_string() }
    }
}

/// Server-side settings record. The backend owns the schema, so every field
/// other than the id is kept as an open map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerUserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}
