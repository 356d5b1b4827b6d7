//! Audio generation and transcription endpoints.
//!
//! These calls hand back the encoded audio exactly as the API sends it;
//! decoding into samples is left to the caller.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{SpeechClient, VoiceSettings};
use crate::dubbing::upload_meta;
use crate::{Result, VoxError};

pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";
pub const OUTPUT_FORMATS: &[&str] = &[
    "mp3_44100_128",
    "mp3_44100_192",
    "pcm_16000",
    "pcm_22050",
    "pcm_24000",
    "pcm_44100",
];
pub const DEFAULT_STS_MODEL: &str = "eleven_english_sts_v2";
pub const DEFAULT_STT_MODEL: &str = "scribe_v1";

impl VoiceSettings {
    /// Settings sent with generation requests when the caller picks none
    pub fn generation_defaults() -> Self {
        Self {
            stability: Some(0.5),
            similarity_boost: Some(0.75),
            style: Some(0.0),
            use_speaker_boost: Some(true),
        }
    }
}

/// Encoded audio sent as a multipart file
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl AudioUpload {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "audio.wav".to_string(),
            mime_type: "audio/wav".to_string(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let (file_name, mime_type) = upload_meta(path);
        Ok(Self {
            bytes,
            file_name,
            mime_type: mime_type.to_string(),
        })
    }

    fn part(&self) -> Result<Part> {
        if self.bytes.is_empty() {
            return Err(VoxError::InvalidRequest("audio payload is empty".into()));
        }
        Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime_type)
            .map_err(|e| VoxError::InvalidRequest(format!("bad mime type: {}", e)))
    }
}

/// `POST /v1/text-to-speech/{voice_id}` body
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    pub text: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    /// Sent as the `output_format` query parameter
    #[serde(skip)]
    pub output_format: String,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model_id: model_id.into(),
            voice_settings: VoiceSettings::generation_defaults(),
            language_code: None,
            seed: None,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }

    /// `"auto"` leaves language detection to the model.
    pub fn language(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.language_code = if code.eq_ignore_ascii_case("auto") || code.trim().is_empty() {
            None
        } else {
            Some(code)
        };
        self
    }

    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    pub fn voice_settings(mut self, settings: VoiceSettings) -> Self {
        self.voice_settings = settings;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(VoxError::InvalidRequest("no text to speak".into()));
        }
        if self.model_id.trim().is_empty() {
            return Err(VoxError::InvalidRequest("model id is empty".into()));
        }
        if !OUTPUT_FORMATS.contains(&self.output_format.as_str()) {
            return Err(VoxError::InvalidRequest(format!(
                "unsupported output format: {}",
                self.output_format
            )));
        }
        Ok(())
    }
}

/// Speech-to-speech: re-voice an upload with a target voice
#[derive(Debug, Clone)]
pub struct VoiceChangeRequest {
    pub audio: AudioUpload,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
}

impl VoiceChangeRequest {
    pub fn new(audio: AudioUpload) -> Self {
        Self {
            audio,
            model_id: DEFAULT_STS_MODEL.to_string(),
            voice_settings: VoiceSettings::generation_defaults(),
        }
    }

    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }
}

/// `POST /v1/sound-generation` body
#[derive(Debug, Clone, Serialize)]
pub struct SoundEffectRequest {
    pub text: String,
    pub duration_seconds: f64,
    pub prompt_influence: f64,
}

impl SoundEffectRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            duration_seconds: 5.0,
            prompt_influence: 0.3,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(VoxError::InvalidRequest("no sound description".into()));
        }
        if !(0.5..=22.0).contains(&self.duration_seconds) {
            return Err(VoxError::InvalidRequest(
                "duration_seconds must be between 0.5 and 22".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.prompt_influence) {
            return Err(VoxError::InvalidRequest(
                "prompt_influence must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio: AudioUpload,
    pub model_id: String,
    /// `None` lets the service detect the language
    pub language: Option<String>,
}

impl TranscriptionRequest {
    pub fn new(audio: AudioUpload) -> Self {
        Self {
            audio,
            model_id: DEFAULT_STT_MODEL.to_string(),
            language: None,
        }
    }

    pub fn language(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.language = if code.eq_ignore_ascii_case("auto") || code.trim().is_empty() {
            None
        } else {
            Some(code)
        };
        self
    }
}

/// `POST /v1/speech-to-text` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
    pub language_code: Option<String>,
}

impl SpeechClient {
    /// Speak `request.text` with `voice_id`; returns the encoded audio.
    pub async fn text_to_speech(
        &self,
        voice_id: &str,
        request: &SpeechRequest,
        api_key: Option<&str>,
    ) -> Result<Vec<u8>> {
        request.validate()?;
        debug!(
            target: "client",
            voice_id = %voice_id,
            model = %request.model_id,
            chars = request.text.chars().count(),
            "Text to speech"
        );

        let builder = self
            .post(&["text-to-speech", voice_id], api_key, self.config.generate_timeout())?
            .query(&[("output_format", request.output_format.as_str())])
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(request);
        self.bytes(builder, "text to speech").await
    }

    /// Re-voice `request.audio` with `voice_id`; returns the encoded audio.
    pub async fn speech_to_speech(
        &self,
        voice_id: &str,
        request: &VoiceChangeRequest,
        api_key: Option<&str>,
    ) -> Result<Vec<u8>> {
        let form = Form::new()
            .text("model_id", request.model_id.clone())
            .text("voice_settings", serde_json::to_string(&request.voice_settings)?)
            .part("audio", request.audio.part()?);
        debug!(target: "client", voice_id = %voice_id, model = %request.model_id, "Speech to speech");

        let builder = self
            .post(&["speech-to-speech", voice_id], api_key, self.config.generate_timeout())?
            .multipart(form);
        self.bytes(builder, "speech to speech").await
    }

    pub async fn sound_effect(
        &self,
        request: &SoundEffectRequest,
        api_key: Option<&str>,
    ) -> Result<Vec<u8>> {
        request.validate()?;
        let builder = self
            .post(&["sound-generation"], api_key, self.config.generate_timeout())?
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(request);
        self.bytes(builder, "sound generation").await
    }

    /// Strip background noise from an upload.
    pub async fn isolate_voice(&self, audio: &AudioUpload, api_key: Option<&str>) -> Result<Vec<u8>> {
        let form = Form::new().part("audio", audio.part()?);
        let builder = self
            .post(&["audio-isolation"], api_key, self.config.generate_timeout())?
            .multipart(form);
        self.bytes(builder, "audio isolation").await
    }

    pub async fn transcribe(
        &self,
        request: &TranscriptionRequest,
        api_key: Option<&str>,
    ) -> Result<Transcription> {
        let mut form = Form::new()
            .text("model_id", request.model_id.clone())
            .part("audio", request.audio.part()?);
        if let Some(language) = &request.language {
            form = form.text("language", language.clone());
        }
        let builder = self
            .post(&["speech-to-text"], api_key, self.config.generate_timeout())?
            .multipart(form);
        self.json(builder, "speech to text").await
    }
}
