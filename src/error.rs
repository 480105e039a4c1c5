use thiserror::Error;

/// Failures surfaced by the playback and recording engines.
///
/// Collaborators report failures as `anyhow::Error`; the engines fold the
/// error chain into the message of the matching variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("Microphone permission has not been granted")]
    PermissionDenied,

    #[error("Audio session configuration failed: {0}")]
    SessionConfigurationFailed(String),

    #[error("Audio resource could not be created: {0}")]
    ResourceCreationFailed(String),
}

impl AudioError {
    pub(crate) fn session(err: anyhow::Error) -> Self {
        AudioError::SessionConfigurationFailed(format!("{:#}", err))
    }

    pub(crate) fn resource(err: anyhow::Error) -> Self {
        AudioError::ResourceCreationFailed(format!("{:#}", err))
    }
}

pub type AudioResult<T> = Result<T, AudioError>;
