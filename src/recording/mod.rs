//! Voice recording engine
//!
//! `RecordingEngine` owns one capture session at a time. The capture handle
//! and the speech-to-text step are collaborators behind the `Recorder`,
//! `RecorderFactory` and `Transcriber` traits; `WavRecorder` is the bundled
//! handle that writes an `AudioBackend` stream to disk.

mod engine;
mod recorder;
mod transcription;
mod wav;

pub use engine::{AudioRecordingResult, MeteringUpdate, RecordingEngine, RecordingState};
pub use recorder::{Recorder, RecorderFactory};
pub use transcription::{Transcriber, TranscriptionOutcome, UnavailableTranscriber};
pub use wav::{WavRecorder, WavRecorderFactory};
