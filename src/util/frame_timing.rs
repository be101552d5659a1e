use web_time::Instant;

/// Smoothed frames-per-second meter for presented frames.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    /// Timestamp of the previous presented frame.
    last_frame: Option<Instant>,
    /// Smoothed FPS using exponential moving average
    smoothed_fps: f32,
    /// Smoothing factor (lower = smoother, 0.0-1.0)
    smoothing: f32,
    frames: u64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTiming {
    /// Create a meter that starts at a nominal 60 FPS.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_frame: None,
            smoothed_fps: 60.0,
            smoothing: 0.05,
            frames: 0,
        }
    }

    /// Call after each presented frame.
    pub fn end_frame(&mut self) {
        self.end_frame_at(Instant::now());
    }

    fn end_frame_at(&mut self, now: Instant) {
        self.frames += 1;
        let Some(last) = self.last_frame.replace(now) else {
            return;
        };
        let frame_time = now.duration_since(last).as_secs_f32();
        if frame_time > 0.0 {
            let instant_fps = 1.0 / frame_time;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing)
                + instant_fps * self.smoothing;
        }
    }

    /// Current FPS (smoothed).
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }

    /// Frames presented since creation.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use web_time::Duration;

    use super::*;

    #[test]
    fn first_frame_only_starts_the_clock() {
        let mut timing = FrameTiming::new();
        timing.end_frame_at(Instant::now());
        assert_eq!(timing.frames(), 1);
        assert_eq!(timing.fps(), 60.0);
    }

    #[test]
    fn fps_moves_toward_frame_rate() {
        let mut timing = FrameTiming::new();
        let start = Instant::now();
        for i in 0..200u32 {
            timing.end_frame_at(start + Duration::from_millis(u64::from(i) * 33));
        }
        assert!((timing.fps() - 30.3).abs() < 1.0, "fps = {}", timing.fps());
        assert_eq!(timing.frames(), 200);
    }
}
