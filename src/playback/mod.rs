//! Media playback engine
//!
//! `PlaybackEngine` drives one `MediaPlayer` at a time and turns its clock
//! into timeline, milestone, player-info and end-of-media events.

mod engine;
mod player;
mod simulated;
mod snapshot;

pub use engine::{PlayRequest, PlaybackEngine, PlaybackState};
pub use player::{MediaBackend, MediaPlayer, MediaSource};
pub use simulated::{SimulatedBackend, SimulatedPlayer};
pub use snapshot::{PlaybackSnapshot, ProgressMilestone, TimelineUpdate};
