use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use futures::StreamExt;
use std::path::Path;
use tracing::{debug, info, warn};

use super::messages::{AudioFrameMessage, TranscriptMessage};
use crate::audio::AudioFile;
use crate::recording::{Transcriber, TranscriptionOutcome};

const TRANSCRIPT_SUBJECT: &str = "stt.text.final";
const BLOCK_MS: u64 = 100;

/// Transcribes capture artifacts through the NATS speech-to-text bridge.
///
/// The artifact is streamed as base64 PCM frames on `audio.frame.<session>`
/// followed by a final marker; the first final transcript for that session
/// is the result.
pub struct NatsTranscriber {
    client: Client,
}

impl NatsTranscriber {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    async fn publish_frame(
        &self,
        session_id: &str,
        sequence: u32,
        pcm_bytes: &[u8],
        audio: &AudioFile,
        is_final: bool,
    ) -> Result<()> {
        let subject = format!("audio.frame.{}", session_id);

        let message = AudioFrameMessage {
            session_id: session_id.to_string(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame: is_final,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish audio frame")?;

        debug!(
            "Published audio frame to {} (sequence={}, bytes={}, final={})",
            subject,
            sequence,
            pcm_bytes.len(),
            is_final
        );

        Ok(())
    }

    async fn run(&self, location: &Path) -> Result<Option<String>> {
        let audio = AudioFile::open(location)?;
        let session_id = format!("recording-{}", uuid::Uuid::new_v4());

        // Subscribe before publishing so the transcript cannot be missed
        let mut transcripts = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT.to_string())
            .await
            .context("Failed to subscribe to transcripts")?;

        let blocks = audio.pcm_blocks(BLOCK_MS);
        let mut sequence = 0u32;
        for block in &blocks {
            self.publish_frame(&session_id, sequence, block, &audio, false)
                .await?;
            sequence += 1;
        }
        self.publish_frame(&session_id, sequence, &[], &audio, true)
            .await?;
        self.client.flush().await.context("Failed to flush NATS")?;

        info!(
            "Sent {} frames of {} for transcription (session {})",
            blocks.len(),
            location.display(),
            session_id
        );

        while let Some(msg) = transcripts.next().await {
            match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                Ok(transcript) if transcript.session_id == session_id && !transcript.partial => {
                    return Ok(Some(transcript.text));
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to parse transcript message: {}", e),
            }
        }

        // Subscription closed before a transcript arrived
        Ok(None)
    }
}

#[async_trait::async_trait]
impl Transcriber for NatsTranscriber {
    async fn transcribe(&self, location: &Path) -> TranscriptionOutcome {
        match self.run(location).await {
            Ok(Some(text)) => {
                info!("Received transcript ({} chars)", text.len());
                TranscriptionOutcome::Text(text)
            }
            Ok(None) => TranscriptionOutcome::Unavailable,
            Err(e) => TranscriptionOutcome::Failed(format!("{:#}", e)),
        }
    }
}
