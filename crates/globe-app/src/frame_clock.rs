//! Wall-clock frame timing and the frames-per-second counter.
//!
//! The planet animates on real elapsed time, so each frame advances by
//! whatever time actually passed. Long stalls (window drags, breakpoints)
//! are clamped so the scene does not lurch forward afterwards.

use std::time::{Duration, Instant};
use tracing::warn;

/// Longest interval a single frame may advance, in seconds.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// How often the FPS counter produces a reading.
pub const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Timing handed to the frame updater.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the previous frame, clamped to [`MAX_FRAME_TIME`].
    pub interval: f32,
    /// Total clamped seconds since the clock started.
    pub elapsed: f32,
}

/// Measures per-frame intervals.
pub struct FrameClock {
    previous: Instant,
    elapsed: f64,
    frame_count: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            previous: Instant::now(),
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Measure the time since the last tick.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous).as_secs_f64();
        self.previous = now;
        self.advance(frame_time)
    }

    fn advance(&mut self, frame_time: f64) -> FrameTime {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }
        self.elapsed += frame_time;
        self.frame_count += 1;
        FrameTime {
            interval: frame_time as f32,
            elapsed: self.elapsed as f32,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts frames and reports the rate once per [`FPS_WINDOW`].
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: Option<f32>,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: None,
        }
    }

    /// Count a presented frame. Returns a fresh reading when the window closes.
    pub fn record(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let span = now.saturating_duration_since(self.window_start);
        if span < FPS_WINDOW {
            return None;
        }
        let fps = self.frames as f32 / span.as_secs_f32();
        self.window_start = now;
        self.frames = 0;
        self.fps = Some(fps);
        Some(fps)
    }

    /// Most recent reading.
    pub fn fps(&self) -> Option<f32> {
        self.fps
    }
}
