//! Time utilities for the game loop

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Get current Unix timestamp in seconds
pub fn unix_secs() -> u64 {
    unix_millis() / 1000
}

/// Display refresh rate the physics constants are tuned for
pub const FRAME_RATE: u32 = 60;

/// Default scheduler rate (one tick per display refresh)
pub const SIMULATION_TPS: u32 = 60;

/// Largest delta a single tick may integrate, in frames
pub const MAX_FRAME_DELTA: f32 = 3.0;

/// Period of the tick scheduler for a given rate
pub fn tick_period(tps: u32) -> Duration {
    Duration::from_micros(1_000_000 / tps.clamp(1, 240) as u64)
}

/// Convert a wall-clock delta into frame units, clamped to [`MAX_FRAME_DELTA`]
pub fn frames_between(elapsed: Duration) -> f32 {
    let frames = elapsed.as_secs_f32() * FRAME_RATE as f32;
    frames.clamp(0.0, MAX_FRAME_DELTA)
}

/// Seconds covered by a number of frames
pub fn frames_to_secs(frames: f32) -> f32 {
    frames / FRAME_RATE as f32
}
