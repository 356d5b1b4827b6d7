// Voxnode Core Library
// Speech API adapters: discovery cache, dubbing poller, REST client

pub mod client;
pub mod config;
pub mod discovery;
pub mod dubbing;

// Export core types
pub use client::{
    AudioUpload, HistoryItem, HistoryPage, SoundEffectRequest, SpeechClient, SpeechRequest,
    Transcription, TranscriptionRequest, UserInfo, VoiceChangeRequest, VoiceDetails,
    VoiceSettings,
};
pub use config::{CacheConfig, ClientConfig, PollerConfig, VoxConfig};
pub use discovery::{
    CacheEntry, Descriptor, Discovery, DiscoveryCache, Listing, ListingSource, RefreshReport,
    ResourceKind,
};
pub use dubbing::{
    Dubber, DubbingReport, DubbingRequest, JobCreator, JobOutcome, JobPoller, JobStatus,
    JobStatusSource, RemoteStatus,
};

// Error types
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VoxError {
    /// True for failures that happened while talking to the remote API.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            VoxError::Transport(_) | VoxError::Http { .. } | VoxError::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, VoxError>;

/// Adapter runtime: one client, one discovery cache, one dubber.
///
/// Built once by the host at startup and handed to every node that needs it.
pub struct Voxnode {
    pub config: VoxConfig,
    pub client: Arc<SpeechClient>,
    pub discovery: Discovery,
    pub dubber: Dubber<SpeechClient>,
}

impl Voxnode {
    pub fn new(config: VoxConfig) -> Self {
        let client = Arc::new(SpeechClient::new(
            config.client.clone(),
            config.api_key.clone(),
        ));
        let cache = Arc::new(DiscoveryCache::with_config(&config.cache));
        let discovery = Discovery::new(cache, client.clone());
        let dubber = Dubber::new(client.clone(), JobPoller::new(config.poller.clone()));

        tracing::info!(
            target: "voxnode",
            base_url = %config.client.base_url,
            cache_ttl_secs = config.cache.ttl.as_secs(),
            "Voxnode adapters ready"
        );

        Self {
            config,
            client,
            discovery,
            dubber,
        }
    }
}
