//! Frame timing

use std::time::Instant;

/// Weight of the newest frame in the smoothed delta
const SMOOTHING: f32 = 0.05;

/// Tracks per-frame delta, total elapsed time and a smoothed FPS estimate
pub struct FrameTimer {
    start: Instant,
    last_frame: Instant,
    delta_secs: f32,
    smoothed_delta: f32,
    frame_count: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            smoothed_delta: 0.0,
            frame_count: 0,
        }
    }

    /// Call once per frame to update timing
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta_secs = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        self.smoothed_delta = if self.frame_count == 1 {
            self.delta_secs
        } else {
            self.smoothed_delta + (self.delta_secs - self.smoothed_delta) * SMOOTHING
        };
    }

    /// Seconds since the previous tick
    pub fn delta_secs(&self) -> f32 {
        self.delta_secs
    }

    /// Seconds elapsed since the timer was created
    pub fn elapsed_secs(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Frame rate estimate from the exponentially smoothed delta
    pub fn fps(&self) -> f32 {
        if self.smoothed_delta > 0.0 {
            1.0 / self.smoothed_delta
        } else {
            0.0
        }
    }

    /// Total frames ticked
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_advances_frame_count() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.frame_count(), 0);
        timer.tick();
        timer.tick();
        assert_eq!(timer.frame_count(), 2);
    }

    #[test]
    fn test_delta_is_non_negative() {
        let mut timer = FrameTimer::new();
        timer.tick();
        assert!(timer.delta_secs() >= 0.0);
        assert!(timer.elapsed_secs() >= timer.delta_secs());
    }

    #[test]
    fn test_fps_zero_before_first_tick() {
        let timer = FrameTimer::new();
        assert_eq!(timer.fps(), 0.0);
    }
}
