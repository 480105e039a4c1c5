/// Floor reported for silence, matching platform recorder metering.
pub const SILENCE_DBFS: f32 = -160.0;

/// Average power of a block of 16-bit samples in dBFS (`-160.0..=0.0`).
pub fn average_power_dbfs(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return SILENCE_DBFS;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let normalized = s as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();
    let rms = (sum_squares / samples.len() as f64).sqrt();

    if rms <= 0.0 {
        return SILENCE_DBFS;
    }

    (20.0 * rms.log10()).clamp(SILENCE_DBFS as f64, 0.0) as f32
}
