use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `GET /v1/voices` response
#[derive(Debug, Deserialize)]
pub(crate) struct VoicesResponse {
    pub voices: Vec<VoiceSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoiceSummary {
    pub name: String,
    pub voice_id: String,
}

/// `POST /v1/dubbing` response
#[derive(Debug, Deserialize)]
pub(crate) struct DubbingCreated {
    pub dubbing_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: Option<f64>,
    pub similarity_boost: Option<f64>,
    pub style: Option<f64>,
    pub use_speaker_boost: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceDetails {
    pub voice_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: Option<String>,
    pub settings: Option<VoiceSettings>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub tier: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub character_count: u64,
    #[serde(default)]
    pub character_limit: u64,
    pub next_character_count_reset_unix: Option<i64>,
    #[serde(default)]
    pub can_use_instant_voice_cloning: bool,
    #[serde(default)]
    pub professional_voice_limit: u32,
    pub can_use_api: Option<bool>,
}

impl Subscription {
    pub fn remaining_characters(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }

    pub fn next_reset(&self) -> Option<DateTime<Utc>> {
        self.next_character_count_reset_unix
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// `GET /v1/user` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub email: Option<String>,
    #[serde(default)]
    pub subscription: Subscription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub history_item_id: Option<String>,
    #[serde(default)]
    pub text: String,
    pub voice_name: Option<String>,
    pub date_unix: Option<i64>,
    pub character_count_change_from: Option<i64>,
}

impl HistoryItem {
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date_unix.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// `GET /v1/history` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub history: Vec<HistoryItem>,
    #[serde(default)]
    pub has_more: bool,
}
