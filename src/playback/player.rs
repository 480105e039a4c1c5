use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Where to load media from, plus headers for authenticated retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSource {
    pub url: String,
    pub headers: HashMap<String, String>,
}

impl MediaSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A platform media handle.
///
/// Methods take `&self`; implementations keep their own interior state the
/// way platform player objects do. Positions and durations are in seconds and
/// the duration may be NaN until the media is ready.
#[async_trait::async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Resolves once, when the media becomes playable or fails to load
    async fn ready(&self) -> Result<()>;

    /// Resolves when playback reaches the end of the media
    async fn finished(&self);

    fn position(&self) -> f64;

    fn duration(&self) -> f64;

    fn is_playing(&self) -> bool;

    /// Rate applied while running, kept across pauses
    fn playback_rate(&self) -> f32;

    fn play(&self);

    fn pause(&self);

    /// Start immediately at `rate`
    fn play_at_rate(&self, rate: f32);

    /// Change the rate. Some platforms start running on a non-zero rate.
    fn set_rate(&self, rate: f32);

    /// Seek with zero tolerance
    fn seek(&self, seconds: f64);
}

/// Opens media handles.
pub trait MediaBackend: Send + Sync {
    fn open(&self, source: &MediaSource) -> Result<Arc<dyn MediaPlayer>>;
}
