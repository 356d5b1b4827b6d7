use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Result, VoxError};

/// Remote status while the job is still running
pub const PROCESSING_STATUS: &str = "dubbing";
/// Remote status once the dubbed media is ready
pub const COMPLETE_STATUS: &str = "dubbed";

pub const TARGET_LANGUAGES: &[&str] = &[
    "es", "fr", "de", "it", "pt", "pl", "ru", "nl", "ja", "zh", "ko", "hi", "ar", "tr",
];
pub const MAX_SPEAKERS: u8 = 10;

/// Upload and language settings for a new dubbing job
#[derive(Debug, Clone)]
pub struct DubbingRequest {
    pub audio: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    pub target_lang: String,
    /// `None` lets the service detect the source language
    pub source_lang: Option<String>,
    pub num_speakers: u8,
}

impl DubbingRequest {
    /// A WAV upload with automatic source detection and one speaker
    pub fn wav(audio: Vec<u8>, target_lang: impl Into<String>) -> Self {
        Self {
            audio,
            file_name: "audio.wav".to_string(),
            mime_type: "audio/wav".to_string(),
            target_lang: target_lang.into(),
            source_lang: None,
            num_speakers: 1,
        }
    }

    /// Read an upload from disk; name and mime type follow the file.
    pub async fn from_path(path: impl AsRef<Path>, target_lang: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let audio = tokio::fs::read(path).await?;
        let (file_name, mime_type) = upload_meta(path);
        Ok(Self::wav(audio, target_lang).file(file_name, mime_type))
    }

    /// Set the source language; `"auto"` clears it.
    pub fn source_lang(mut self, lang: impl Into<String>) -> Self {
        let lang = lang.into();
        self.source_lang = if lang.eq_ignore_ascii_case("auto") || lang.trim().is_empty() {
            None
        } else {
            Some(lang)
        };
        self
    }

    /// Out-of-range counts are kept as given and rejected by [`validate`](Self::validate).
    pub fn num_speakers(mut self, n: u8) -> Self {
        self.num_speakers = n;
        self
    }

    pub fn file(mut self, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self.mime_type = mime_type.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.audio.is_empty() {
            return Err(VoxError::InvalidRequest("audio payload is empty".into()));
        }
        if !TARGET_LANGUAGES.contains(&self.target_lang.as_str()) {
            return Err(VoxError::InvalidRequest(format!(
                "unsupported target language: {}",
                self.target_lang
            )));
        }
        if !(1..=MAX_SPEAKERS).contains(&self.num_speakers) {
            return Err(VoxError::InvalidRequest(format!(
                "num_speakers must be between 1 and {}",
                MAX_SPEAKERS
            )));
        }
        Ok(())
    }
}

/// File name and mime type for an upload, guessed from the extension.
pub fn upload_meta(path: &Path) -> (String, &'static str) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio.wav".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let mime = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        _ => "audio/wav",
    };
    (name, mime)
}

/// Status document for one job. Only `status` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default = "unknown_status")]
    pub status: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

fn unknown_status() -> String {
    "unknown".to_string()
}

impl JobStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn remote_status(&self) -> RemoteStatus {
        RemoteStatus::from_status(&self.status)
    }
}

/// Classification of a remote status string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Processing,
    Complete,
    Other(String),
}

impl RemoteStatus {
    pub fn from_status(status: &str) -> Self {
        match status {
            PROCESSING_STATUS => RemoteStatus::Processing,
            COMPLETE_STATUS => RemoteStatus::Complete,
            other => RemoteStatus::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RemoteStatus::Processing)
    }
}

/// Terminal result of one poll loop
#[derive(Debug)]
pub enum JobOutcome {
    Complete { job_id: String, status: String },
    /// Any status other than processing/complete; passed through as-is
    Other { job_id: String, status: String },
    Timeout { job_id: String, max_wait: Duration },
    TransportError { job_id: String, error: VoxError },
    Cancelled { job_id: String },
}

impl JobOutcome {
    pub fn job_id(&self) -> &str {
        match self {
            JobOutcome::Complete { job_id, .. }
            | JobOutcome::Other { job_id, .. }
            | JobOutcome::Timeout { job_id, .. }
            | JobOutcome::TransportError { job_id, .. }
            | JobOutcome::Cancelled { job_id } => job_id,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, JobOutcome::Complete { .. })
    }

    /// Remote status, when the loop ended on one
    pub fn status(&self) -> Option<&str> {
        match self {
            JobOutcome::Complete { status, .. } | JobOutcome::Other { status, .. } => Some(status),
            _ => None,
        }
    }
}

/// Starts a remote job and returns its id
#[async_trait]
pub trait JobCreator: Send + Sync {
    async fn create_job(&self, request: &DubbingRequest, api_key: Option<&str>) -> Result<String>;
}

/// Reads the current status of a remote job
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn query_job_status(&self, job_id: &str, api_key: Option<&str>) -> Result<JobStatus>;
}
