mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use voxnode_core::discovery::voice_id_from_label;
use voxnode_core::{
    AudioUpload, Descriptor, DubbingReport, DubbingRequest, JobOutcome, Listing, ResourceKind,
    SoundEffectRequest, SpeechRequest, TranscriptionRequest, VoiceChangeRequest, Voxnode,
};

#[derive(Parser, Debug)]
#[command(name = "voxnode", version, about = "Speech API adapters from the command line")]
struct Cli {
    /// API key; overrides VOXNODE_API_KEY and the config file
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available voices
    Voices {
        #[arg(long)]
        refresh: bool,
    },
    /// List available models
    Models {
        #[arg(long)]
        refresh: bool,
    },
    /// Invalidate and refetch the discovery cache
    Refresh {
        #[arg(long)]
        skip_voices: bool,
        #[arg(long)]
        skip_models: bool,
    },
    /// Dub an audio file into another language
    Dub {
        file: PathBuf,
        #[arg(long, default_value = "es")]
        target: String,
        #[arg(long, default_value = "auto")]
        source: String,
        #[arg(long, default_value_t = 1)]
        speakers: u8,
        /// Return the job id instead of waiting for completion
        #[arg(long)]
        no_wait: bool,
    },
    /// Check or wait on an existing dubbing job
    Status {
        dubbing_id: String,
        #[arg(long)]
        wait: bool,
    },
    /// Show a voice's details, by id or "Name (id)" label
    Voice {
        voice: String,
        #[arg(long)]
        settings: bool,
    },
    /// Show account subscription and usage
    User,
    /// Speak text with a voice; defaults to the first listed voice
    Speak {
        text: String,
        #[arg(long)]
        voice: Option<String>,
        #[arg(long, default_value = "eleven_multilingual_v2")]
        model: String,
        #[arg(long, default_value = "auto")]
        language: String,
        #[arg(long, default_value = "mp3_44100_128")]
        format: String,
        #[arg(long, short, default_value = "speech.mp3")]
        out: PathBuf,
    },
    /// Re-voice an audio file with another voice
    ChangeVoice {
        file: PathBuf,
        #[arg(long)]
        voice: String,
        #[arg(long, default_value = "eleven_english_sts_v2")]
        model: String,
        #[arg(long, short, default_value = "changed.mp3")]
        out: PathBuf,
    },
    /// Generate a sound effect from a description
    SoundEffect {
        text: String,
        #[arg(long, default_value_t = 5.0)]
        duration: f64,
        #[arg(long, default_value_t = 0.3)]
        influence: f64,
        #[arg(long, short, default_value = "effect.mp3")]
        out: PathBuf,
    },
    /// Remove background noise from an audio file
    Isolate {
        file: PathBuf,
        #[arg(long, short, default_value = "isolated.mp3")]
        out: PathBuf,
    },
    /// Transcribe an audio file
    Transcribe {
        file: PathBuf,
        #[arg(long, default_value = "auto")]
        language: String,
    },
    /// Show recent generations
    History {
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging / tracing
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,voxnode_core=info,voxnode=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration (defaults + env + optional TOML overlay)
    let mut cfg = config::load();
    if let Some(key) = cli.api_key.filter(|k| !k.is_empty()) {
        cfg.api_key = Some(key);
    }
    let vox = Voxnode::new(cfg);

    match cli.command {
        Command::Voices { refresh } => {
            print_listing(vox.discovery.voices(None, refresh).await);
        }
        Command::Models { refresh } => {
            print_listing(vox.discovery.models(None, refresh).await);
        }
        Command::Refresh {
            skip_voices,
            skip_models,
        } => {
            let mut kinds = Vec::new();
            if !skip_voices {
                kinds.push(ResourceKind::Voices);
            }
            if !skip_models {
                kinds.push(ResourceKind::Models);
            }
            println!("{}", vox.discovery.refresh(&kinds, None).await);
        }
        Command::Dub {
            file,
            target,
            source,
            speakers,
            no_wait,
        } => {
            let request = DubbingRequest::from_path(&file, target)
                .await?
                .source_lang(source)
                .num_speakers(speakers);

            let cancel = cancel_on_ctrl_c();
            match vox.dubber.dub(&request, None, !no_wait, Some(&cancel)).await? {
                DubbingReport::Pending { job_id } => {
                    println!("Dubbing ID: {}\nStatus: processing", job_id);
                }
                DubbingReport::Finished(outcome) => print_outcome(&outcome),
            }
        }
        Command::Status { dubbing_id, wait } => {
            if wait {
                let cancel = cancel_on_ctrl_c();
                print_outcome(&vox.dubber.resume(&dubbing_id, None, Some(&cancel)).await);
            } else {
                let status = vox.client.dubbing_status(&dubbing_id, None).await?;
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
        }
        Command::Voice { voice, settings } => {
            let voice_id = voice_id_from_label(&voice);
            if settings {
                let s = vox.client.voice_settings(voice_id, None).await?;
                println!("{}", serde_json::to_string_pretty(&s)?);
            } else {
                let d = vox.client.voice(voice_id, None).await?;
                println!("{}", serde_json::to_string_pretty(&d)?);
            }
        }
        Command::User => {
            let user = vox.client.user(None).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
            println!(
                "Remaining characters: {}",
                user.subscription.remaining_characters()
            );
        }
        Command::History { page_size } => {
            let page = vox.client.history(page_size, None).await?;
            if page.history.is_empty() {
                println!("No history items found");
            }
            for (i, item) in page.history.iter().enumerate() {
                let text: String = item.text.chars().take(50).collect();
                println!(
                    "{}. {} | {} | {}",
                    i + 1,
                    text,
                    item.voice_name.as_deref().unwrap_or("N/A"),
                    item.date()
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_else(|| "N/A".into())
                );
            }
        }
        Command::Speak {
            text,
            voice,
            model,
            language,
            format,
            out,
        } => {
            let voice_id = match voice {
                Some(label) => voice_id_from_label(&label).to_string(),
                None => first_voice(vox.discovery.voices(None, false).await)?,
            };
            let request = SpeechRequest::new(text, model)
                .language(language)
                .output_format(format);
            let audio = vox.client.text_to_speech(&voice_id, &request, None).await?;
            write_audio(&out, &audio).await?;
        }
        Command::ChangeVoice {
            file,
            voice,
            model,
            out,
        } => {
            let request = VoiceChangeRequest::new(AudioUpload::from_path(&file).await?).model(model);
            let audio = vox
                .client
                .speech_to_speech(voice_id_from_label(&voice), &request, None)
                .await?;
            write_audio(&out, &audio).await?;
        }
        Command::SoundEffect {
            text,
            duration,
            influence,
            out,
        } => {
            let request = SoundEffectRequest {
                duration_seconds: duration,
                prompt_influence: influence,
                ..SoundEffectRequest::new(text)
            };
            let audio = vox.client.sound_effect(&request, None).await?;
            write_audio(&out, &audio).await?;
        }
        Command::Isolate { file, out } => {
            let upload = AudioUpload::from_path(&file).await?;
            let audio = vox.client.isolate_voice(&upload, None).await?;
            write_audio(&out, &audio).await?;
        }
        Command::Transcribe { file, language } => {
            let request = TranscriptionRequest::new(AudioUpload::from_path(&file).await?)
                .language(language);
            let transcription = vox.client.transcribe(&request, None).await?;
            println!("{}", transcription.text);
        }
    }

    Ok(())
}

fn first_voice(listing: Listing) -> Result<String, Box<dyn std::error::Error>> {
    match listing {
        Listing::Available { items } => items
            .iter()
            .find_map(|d| match d {
                Descriptor::Voice { voice_id, .. } => Some(voice_id.clone()),
                _ => None,
            })
            .ok_or_else(|| "no voices available; pass --voice".into()),
        Listing::Unavailable { reason } => Err(format!("voices unavailable: {}", reason).into()),
    }
}

async fn write_audio(path: &std::path::Path, audio: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(path, audio).await?;
    info!(target: "voxnode", path = %path.display(), bytes = audio.len(), "Audio written");
    println!("Saved {}", path.display());
    Ok(())
}

fn print_listing(listing: Listing) {
    match listing {
        Listing::Available { items } => {
            for d in &items {
                println!("{}", d);
            }
            info!(target: "voxnode", count = items.len(), "Listing printed");
        }
        Listing::Unavailable { reason } => {
            warn!(target: "voxnode", reason = %reason, "No data available");
            eprintln!("Unavailable: {}", reason);
        }
    }
}

fn print_outcome(outcome: &JobOutcome) {
    match outcome {
        JobOutcome::Complete { job_id, status } => {
            println!("Dubbing complete\nID: {}\nStatus: {}", job_id, status)
        }
        JobOutcome::Other { job_id, status } => {
            println!("Dubbing ID: {}\nStatus: {}", job_id, status)
        }
        JobOutcome::Timeout { job_id, max_wait } => println!(
            "Dubbing timeout after {}s\nID: {}\nCheck status later.",
            max_wait.as_secs(),
            job_id
        ),
        JobOutcome::TransportError { job_id, error } => {
            eprintln!("Error checking dubbing {}: {}", job_id, error)
        }
        JobOutcome::Cancelled { job_id } => println!("Stopped waiting on {}", job_id),
    }
}

/// Token that fires on Ctrl+C so a long wait can be abandoned.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "voxnode", "Ctrl+C received; cancelling wait");
            trigger.cancel();
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_voice_skips_to_a_voice_id() {
        let listing = Listing::Available {
            items: vec![Descriptor::voice("Rachel", "v-1"), Descriptor::voice("Domi", "v-2")],
        };
        assert_eq!(first_voice(listing).unwrap(), "v-1");
        assert!(first_voice(Listing::Unavailable { reason: "down".into() }).is_err());
    }

    #[test]
    fn cli_parses_speak_defaults() {
        let cli = Cli::parse_from(["voxnode", "speak", "Hello there"]);
        match cli.command {
            Command::Speak { voice, model, format, .. } => {
                assert!(voice.is_none());
                assert_eq!(model, "eleven_multilingual_v2");
                assert_eq!(format, "mp3_44100_128");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_parses_dub_flags() {
        let cli = Cli::parse_from([
            "voxnode", "--api-key", "k", "dub", "in.wav", "--target", "fr", "--no-wait",
        ]);
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        match cli.command {
            Command::Dub { target, no_wait, speakers, .. } => {
                assert_eq!(target, "fr");
                assert!(no_wait);
                assert_eq!(speakers, 1);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
