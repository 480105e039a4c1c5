pub mod audio;
pub mod config;
pub mod error;
pub mod events;
pub mod nats;
pub mod observer;
pub mod playback;
pub mod recording;
pub mod session;
pub mod time;

pub use audio::{AudioBackend, AudioBackendConfig, AudioFile, AudioFrame, ToneBackend};
pub use config::Config;
pub use error::{AudioError, AudioResult};
pub use events::{AudioEvent, EventSink, Notifier};
pub use nats::{AudioFrameMessage, NatsTranscriber, TranscriptMessage};
pub use playback::{
    MediaBackend, MediaPlayer, MediaSource, PlayRequest, PlaybackEngine, PlaybackSnapshot,
    PlaybackState, SimulatedBackend,
};
pub use recording::{
    AudioRecordingResult, MeteringUpdate, RecordingEngine, RecordingState, Transcriber,
    TranscriptionOutcome, UnavailableTranscriber, WavRecorderFactory,
};
pub use session::{
    HeadlessAudioSession, HeadlessPermissions, PermissionState, SessionCategory, SessionMonitor,
};
