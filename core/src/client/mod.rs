//! REST client for the speech API
//!
//! One `reqwest` client implements every remote collaborator the adapters
//! need: the voice listing behind [`ListingSource`], job creation and status
//! behind [`JobCreator`] / [`JobStatusSource`], a handful of read-only
//! account endpoints, and the audio generation calls in `generate`.
//!
//! Every call takes an optional per-call API key that overrides the key the
//! client was built with.
//!
//! Each call is a single attempt; failures come back as [`VoxError`] and
//! nothing is retried here.

mod account;
mod generate;

pub use account::{HistoryItem, HistoryPage, Subscription, UserInfo, VoiceDetails, VoiceSettings};
pub use generate::{
    AudioUpload, SoundEffectRequest, SpeechRequest, Transcription, TranscriptionRequest,
    VoiceChangeRequest, DEFAULT_OUTPUT_FORMAT, OUTPUT_FORMATS,
};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::discovery::{Descriptor, ListingSource, ResourceKind};
use crate::dubbing::{DubbingRequest, JobCreator, JobStatus, JobStatusSource};
use crate::{Result, VoxError};
use account::{DubbingCreated, VoicesResponse};

const API_KEY_HEADER: &str = "xi-api-key";
const MAX_ERROR_BODY: usize = 500;
pub const MAX_HISTORY_PAGE: u32 = 100;

/// The API has no model listing endpoint; these are the documented ids.
pub const KNOWN_MODELS: &[&str] = &[
    "eleven_v3",
    "eleven_ttv_v3",
    "eleven_multilingual_v2",
    "eleven_turbo_v2_5",
    "eleven_turbo_v2",
    "eleven_flash_v2_5",
    "eleven_flash_v2",
    "eleven_english_sts_v2",
    "eleven_multilingual_sts_v2",
    "eleven_multilingual_ttv_v2",
    "eleven_monolingual_v1",
    "eleven_multilingual_v1",
];

pub struct SpeechClient {
    config: ClientConfig,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl SpeechClient {
    pub fn new(config: ClientConfig, api_key: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            http_client,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `{base_url}/v1/{segments..}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
            return Err(VoxError::InvalidRequest(format!("invalid path segment: {:?}", bad)));
        }
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| VoxError::Config(format!("invalid base url {}: {}", self.config.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| VoxError::Config(format!("base url cannot take a path: {}", self.config.base_url)))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    /// Per-call key first, then the client's default.
    fn key<'a>(&'a self, api_key: Option<&'a str>) -> Option<&'a str> {
        api_key
            .filter(|k| !k.trim().is_empty())
            .or(self.api_key.as_deref())
    }

    fn authorize(&self, request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
        match self.key(api_key) {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    fn get(&self, segments: &[&str], api_key: Option<&str>) -> Result<RequestBuilder> {
        let request = self
            .http_client
            .get(self.endpoint(segments)?)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(self.config.request_timeout());
        Ok(self.authorize(request, api_key))
    }

    fn post(
        &self,
        segments: &[&str],
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<RequestBuilder> {
        let request = self
            .http_client
            .post(self.endpoint(segments)?)
            .timeout(timeout);
        Ok(self.authorize(request, api_key))
    }

    /// Send once and turn connection failures and non-2xx replies into errors.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            warn!(target: "client", what = %what, error = %e, "Request failed");
            VoxError::Transport(format!("{} request failed: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target: "client", what = %what, status = %status, "API returned error");
            return Err(VoxError::Http {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self.send(request, what).await?;
        response.json::<T>().await.map_err(|e| {
            warn!(target: "client", what = %what, error = %e, "Failed to parse response");
            VoxError::Decode(format!("{} response: {}", what, e))
        })
    }

    /// Raw response body, for endpoints that answer with encoded audio.
    async fn bytes(&self, request: RequestBuilder, what: &str) -> Result<Vec<u8>> {
        let response = self.send(request, what).await?;
        let body = response.bytes().await.map_err(|e| {
            warn!(target: "client", what = %what, error = %e, "Failed to read response body");
            VoxError::Transport(format!("{} response body: {}", what, e))
        })?;
        Ok(body.to_vec())
    }

    /// List voices as descriptors, in the order the API returns them.
    pub async fn list_voices(&self, api_key: Option<&str>) -> Result<Vec<Descriptor>> {
        debug!(target: "client", "Listing voices");
        let response: VoicesResponse = self.json(self.get(&["voices"], api_key)?, "voices").await?;
        Ok(response
            .voices
            .into_iter()
            .map(|v| Descriptor::voice(v.name, v.voice_id))
            .collect())
    }

    pub fn list_models(&self) -> Vec<Descriptor> {
        KNOWN_MODELS.iter().map(|m| Descriptor::model(*m)).collect()
    }

    pub async fn create_dubbing(
        &self,
        request: &DubbingRequest,
        api_key: Option<&str>,
    ) -> Result<String> {
        let file = Part::bytes(request.audio.clone())
            .file_name(request.file_name.clone())
            .mime_str(&request.mime_type)
            .map_err(|e| VoxError::InvalidRequest(format!("bad mime type: {}", e)))?;

        let mut form = Form::new()
            .text("target_lang", request.target_lang.clone())
            .text("mode", "automatic")
            .text("num_speakers", request.num_speakers.to_string());
        if let Some(source) = &request.source_lang {
            form = form.text("source_lang", source.clone());
        }
        form = form.part("file", file);

        debug!(
            target: "client",
            target_lang = %request.target_lang,
            bytes = request.audio.len(),
            "Creating dubbing job"
        );

        let builder = self
            .post(&["dubbing"], api_key, self.config.create_timeout())?
            .multipart(form);
        let created: DubbingCreated = self.json(builder, "dubbing").await?;

        created
            .dubbing_id
            .filter(|id| !id.is_empty())
            .ok_or(VoxError::MissingField("dubbing_id"))
    }

    pub async fn dubbing_status(&self, dubbing_id: &str, api_key: Option<&str>) -> Result<JobStatus> {
        self.json(self.get(&["dubbing", dubbing_id], api_key)?, "dubbing status")
            .await
    }

    pub async fn voice(&self, voice_id: &str, api_key: Option<&str>) -> Result<VoiceDetails> {
        self.json(self.get(&["voices", voice_id], api_key)?, "voice")
            .await
    }

    pub async fn voice_settings(&self, voice_id: &str, api_key: Option<&str>) -> Result<VoiceSettings> {
        self.json(
            self.get(&["voices", voice_id, "settings"], api_key)?,
            "voice settings",
        )
        .await
    }

    pub async fn user(&self, api_key: Option<&str>) -> Result<UserInfo> {
        if self.key(api_key).is_none() {
            return Err(VoxError::Config("an API key is required".into()));
        }
        self.json(self.get(&["user"], api_key)?, "user").await
    }

    /// Most recent generations, `page_size` clamped to 1..=100.
    pub async fn history(&self, page_size: u32, api_key: Option<&str>) -> Result<HistoryPage> {
        let page_size = page_size.clamp(1, MAX_HISTORY_PAGE);
        let request = self
            .get(&["history"], api_key)?
            .query(&[("page_size", page_size)]);
        self.json(request, "history").await
    }
}

#[async_trait]
impl ListingSource for SpeechClient {
    async fn list(&self, kind: ResourceKind, api_key: Option<&str>) -> Result<Vec<Descriptor>> {
        match kind {
            ResourceKind::Voices => self.list_voices(api_key).await,
            ResourceKind::Models => Ok(self.list_models()),
        }
    }
}

#[async_trait]
impl JobCreator for SpeechClient {
    async fn create_job(&self, request: &DubbingRequest, api_key: Option<&str>) -> Result<String> {
        self.create_dubbing(request, api_key).await
    }
}

#[async_trait]
impl JobStatusSource for SpeechClient {
    async fn query_job_status(&self, job_id: &str, api_key: Option<&str>) -> Result<JobStatus> {
        self.dubbing_status(job_id, api_key).await
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
