use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// A platform capture handle writing to a single artifact.
#[async_trait::async_trait]
pub trait Recorder: Send + Sync {
    /// Where the artifact is written
    fn location(&self) -> &Path;

    /// Start capturing, or resume after `pause`
    fn record(&self) -> Result<()>;

    fn pause(&self);

    fn is_recording(&self) -> bool;

    fn set_metering_enabled(&self, enabled: bool);

    /// Latest average power in dBFS; `None` while metering is off or before any audio
    fn level(&self) -> Option<f32>;

    /// Stop capturing and flush the artifact
    async fn stop(&self) -> Result<()>;

    /// Remove the artifact
    fn delete_recording(&self) -> Result<()>;
}

/// Creates capture handles.
#[async_trait::async_trait]
pub trait RecorderFactory: Send + Sync {
    async fn create(&self, location: &Path) -> Result<Arc<dyn Recorder>>;
}
