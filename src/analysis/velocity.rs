// src/analysis/velocity.rs
//
// Straight-line entry-to-exit speed. Intermediate positions are ignored and
// pixels map to meters through a single fixed scale, no perspective model.

use tracing::warn;

pub const DEFAULT_FPS: f64 = 30.0;
pub const DEFAULT_PIXEL_TO_METER: f64 = 0.05;

const MPS_TO_KMPH: f64 = 3.6;

/// Frame rate to use for a video, falling back when the source reports
/// nothing usable (absent, zero, negative or non-finite).
pub fn effective_fps(reported: Option<f64>, default_fps: f64) -> f64 {
    match reported {
        Some(fps) if fps.is_finite() && fps > 0.0 => fps,
        other => {
            warn!(
                "Invalid frame rate {:?}, falling back to {:.1} FPS",
                other, default_fps
            );
            default_fps
        }
    }
}

pub fn pixel_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Speed in km/h between two centroids spanning `total_frames` frames,
/// rounded to two decimals. Zero when the span has no duration.
pub fn estimate_speed_kmph(
    first: (f64, f64),
    last: (f64, f64),
    total_frames: u64,
    fps: f64,
    pixel_to_meter: f64,
) -> f64 {
    let time_sec = total_frames as f64 / fps;
    if time_sec <= 0.0 {
        return 0.0;
    }

    let meters = pixel_distance(first, last) * pixel_to_meter;
    round2((meters / time_sec) * MPS_TO_KMPH)
}

/// Round the exact decimal value to two places, ties to even.
pub fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}
