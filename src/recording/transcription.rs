use std::path::Path;

/// What the transcription collaborator made of an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionOutcome {
    Text(String),
    /// No transcription service on this host
    Unavailable,
    Failed(String),
}

/// Turns a capture artifact into text.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, location: &Path) -> TranscriptionOutcome;
}

/// Transcriber for hosts without speech-to-text.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableTranscriber;

#[async_trait::async_trait]
impl Transcriber for UnavailableTranscriber {
    async fn transcribe(&self, _location: &Path) -> TranscriptionOutcome {
        TranscriptionOutcome::Unavailable
    }
}
