use serde::{Deserialize, Serialize};

use super::player::MediaPlayer;
use crate::time::{format_position, played_fraction, timeline_fraction, usable_duration};

/// Player state derived on demand. Never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub percentage: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub is_playing: bool,
    pub playback_speed: Option<f32>,
}

impl PlaybackSnapshot {
    /// Snapshot for when no media is loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn capture(player: &dyn MediaPlayer) -> Self {
        let duration = player.duration();
        Self {
            percentage: played_fraction(player.position(), duration),
            duration_seconds: usable_duration(duration),
            is_playing: player.is_playing(),
            playback_speed: Some(player.playback_rate()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineUpdate {
    pub played_label: String,
    pub remaining_label: String,
    pub percentage: f64,
}

impl TimelineUpdate {
    pub fn capture(player: &dyn MediaPlayer) -> Self {
        let position = player.position();
        let duration = player.duration();
        let remaining = usable_duration(duration)
            .map(|d| (d - position).max(0.0))
            .unwrap_or(0.0);

        Self {
            played_label: format_position(position),
            remaining_label: format_position(remaining),
            percentage: timeline_fraction(position, duration),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMilestone {
    pub elapsed_ms: u64,
    pub percentage: f64,
}

impl ProgressMilestone {
    /// Milestone for the current position, only while playing with a defined percentage.
    pub fn capture(player: &dyn MediaPlayer) -> Option<Self> {
        if !player.is_playing() {
            return None;
        }

        let position = player.position();
        let percentage = played_fraction(position, player.duration())?;

        Some(Self {
            elapsed_ms: (position * 1000.0).round() as u64,
            percentage,
        })
    }
}
