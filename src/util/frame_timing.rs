//! Frame clock: monotonic elapsed time for the attribute generator, plus
//! FPS smoothing and optional frame limiting.

use web_time::{Duration, Instant};

/// Frame clock with a fixed start instant, smoothed-FPS tracking, and an
/// optional FPS cap.
pub struct FrameClock {
    /// Engine start; `elapsed()` is measured from here.
    start: Instant,
    /// Target FPS (0 = unlimited).
    target_fps: u32,
    /// Minimum frame duration based on target FPS.
    min_frame_duration: Duration,
    /// Last frame timestamp.
    last_frame: Instant,
    /// Smoothed FPS using exponential moving average.
    smoothed_fps: f32,
    /// Smoothing factor (lower = smoother, 0.0-1.0).
    smoothing: f32,
}

impl FrameClock {
    /// Create a clock with the given FPS target (0 = unlimited).
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        let min_frame_duration = if target_fps > 0 {
            Duration::from_secs_f64(1.0 / f64::from(target_fps))
        } else {
            Duration::ZERO
        };

        let now = Instant::now();
        Self {
            start: now,
            target_fps,
            min_frame_duration,
            last_frame: now,
            smoothed_fps: 60.0,
            smoothing: 0.05,
        }
    }

    /// Seconds since the clock was created. Monotonic; feeds the
    /// attribute generator's elapsed-time scalar.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Returns true if enough time has passed to render another frame.
    #[must_use]
    pub fn should_render(&self) -> bool {
        if self.target_fps == 0 {
            return true;
        }
        self.last_frame.elapsed() >= self.min_frame_duration
    }

    /// Call after rendering to update timing.
    pub fn end_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;

        let frame_time = elapsed.as_secs_f32();
        if frame_time > 0.0 {
            let instant_fps = 1.0 / frame_time;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }
    }

    /// Smoothed frames-per-second estimate.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_clock_always_renders() {
        let clock = FrameClock::new(0);
        assert!(clock.should_render());
    }

    #[test]
    fn test_elapsed_is_monotonic() {
        let clock = FrameClock::new(0);
        let a = clock.elapsed();
        let b = clock.elapsed();
        assert!(b >= a);
    }

    #[test]
    fn test_fps_smoothing_moves_toward_observed_rate() {
        let mut clock = FrameClock::new(0);
        std::thread::sleep(Duration::from_millis(5));
        clock.end_frame();
        // One 5ms frame (200 fps) should pull the 60 fps seed upward.
        assert!(clock.fps() > 60.0);
    }
}
