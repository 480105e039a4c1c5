//! Clock helpers shared by the playback and recording engines.

/// Format a position in seconds as `MM:SS`, or `H:MM:SS` once it reaches an hour.
///
/// Negative and non-finite inputs render as `00:00`.
pub fn format_position(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Duration in seconds when it is usable for arithmetic: finite and positive.
pub fn usable_duration(duration: f64) -> Option<f64> {
    if duration.is_finite() && duration > 0.0 {
        Some(duration)
    } else {
        None
    }
}

/// Fraction of the media that has been played.
///
/// Absent unless the duration is usable and the ratio lies in `(0, 1]`.
/// Position zero is treated as undefined, so nothing reports progress at the
/// very start of the media.
pub fn played_fraction(position: f64, duration: f64) -> Option<f64> {
    let duration = usable_duration(duration)?;
    let ratio = position / duration;
    if ratio.is_finite() && ratio > 0.0 && ratio <= 1.0 {
        Some(ratio)
    } else {
        None
    }
}

/// Unguarded ratio for the timeline: 0.0 when the duration is unusable.
pub fn timeline_fraction(position: f64, duration: f64) -> f64 {
    match usable_duration(duration) {
        Some(duration) => (position / duration).clamp(0.0, 1.0),
        None => 0.0,
    }
}
