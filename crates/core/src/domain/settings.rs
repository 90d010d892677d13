use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prompt::{parse_prompt, render_prompt, PromptData};

/// Bot configuration row holding the canonical system prompt text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSettings {
    pub prompt_system: String,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl BotSettings {
    pub fn new(prompt_system: impl Into<String>, updated_by: Option<String>) -> Self {
        Self { prompt_system: prompt_system.into(), updated_by, updated_at: Utc::now() }
    }

    pub fn from_prompt(data: &PromptData, updated_by: Option<String>) -> Self {
        Self::new(render_prompt(data), updated_by)
    }

    pub fn prompt(&self) -> PromptData {
        parse_prompt(&self.prompt_system)
    }
}

/// Wire shape of the settings resource.
///
/// Reads accept `promptSystem` or the older `prompt` key; a `null` value is
/// treated as empty text. Writes always use `promptSystem`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPayload {
    #[serde(rename = "promptSystem", alias = "prompt", default, deserialize_with = "null_as_empty")]
    pub prompt_system: String,
}

impl SettingsPayload {
    pub fn new(prompt_system: impl Into<String>) -> Self {
        Self { prompt_system: prompt_system.into() }
    }
}

impl From<&BotSettings> for SettingsPayload {
    fn from(settings: &BotSettings) -> Self {
        Self::new(settings.prompt_system.clone())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
