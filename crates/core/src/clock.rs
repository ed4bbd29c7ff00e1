//! Frame timing: delta time, pausable animation time and FPS reporting.

use std::time::{Duration, Instant};

const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Frame-rate summary over one reporting window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub frames: u32,
    pub fps: f32,
    pub avg_frame_ms: f32,
}

/// Per-frame clock driven once per rendered frame.
///
/// Wall time always advances the delta and FPS window; animation time only
/// advances while not paused, so pausing freezes object motion but leaves
/// the camera responsive.
#[derive(Debug)]
pub struct FrameClock {
    last_tick: Instant,
    delta: f32,
    animation_time: f32,
    paused: bool,
    window_elapsed: Duration,
    window_frames: u32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            delta: 0.0,
            animation_time: 0.0,
            paused: false,
            window_elapsed: Duration::ZERO,
            window_frames: 0,
        }
    }

    /// Advances by the wall time since the previous tick.
    ///
    /// Returns stats when a one-second reporting window completes.
    pub fn tick(&mut self) -> Option<FrameStats> {
        let now = Instant::now();
        let elapsed = now - self.last_tick;
        self.last_tick = now;
        self.advance(elapsed)
    }

    /// Advances by `elapsed`.
    pub fn advance(&mut self, elapsed: Duration) -> Option<FrameStats> {
        self.delta = elapsed.as_secs_f32();
        if !self.paused {
            self.animation_time += self.delta;
        }

        self.window_elapsed += elapsed;
        self.window_frames += 1;

        if self.window_elapsed < FPS_WINDOW {
            return None;
        }

        let seconds = self.window_elapsed.as_secs_f32();
        let stats = FrameStats {
            frames: self.window_frames,
            fps: self.window_frames as f32 / seconds,
            avg_frame_ms: seconds * 1000.0 / self.window_frames as f32,
        };
        self.window_elapsed = Duration::ZERO;
        self.window_frames = 0;
        Some(stats)
    }

    /// Seconds between the last two ticks.
    #[inline]
    pub fn delta_secs(&self) -> f32 {
        self.delta
    }

    /// Accumulated unpaused time in seconds.
    #[inline]
    pub fn animation_time(&self) -> f32 {
        self.animation_time
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Flips the paused state and returns the new one.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Restarts delta measurement from now, e.g. after a long stall such as
    /// swapchain recreation, so the next delta does not include it.
    pub fn resync(&mut self) {
        self.last_tick = Instant::now();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(10);

    #[test]
    fn test_animation_time_accumulates() {
        let mut clock = FrameClock::new();
        for _ in 0..5 {
            clock.advance(FRAME);
        }
        assert!((clock.animation_time() - 0.05).abs() < 1e-6);
        assert!((clock.delta_secs() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_pause_freezes_animation_time() {
        let mut clock = FrameClock::new();
        clock.advance(FRAME);
        assert!(clock.toggle_pause());

        clock.advance(FRAME);
        clock.advance(FRAME);
        assert!((clock.animation_time() - 0.01).abs() < 1e-6);
        assert!((clock.delta_secs() - 0.01).abs() < 1e-6);

        assert!(!clock.toggle_pause());
        clock.advance(FRAME);
        assert!((clock.animation_time() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_stats_reported_once_per_window() {
        let mut clock = FrameClock::new();
        let reports: Vec<FrameStats> = (0..250).filter_map(|_| clock.advance(FRAME)).collect();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].frames, 100);
        assert!((reports[0].fps - 100.0).abs() < 0.01);
        assert!((reports[0].avg_frame_ms - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_stats_reported_while_paused() {
        let mut clock = FrameClock::new();
        clock.toggle_pause();
        assert!(clock.advance(Duration::from_millis(1500)).is_some());
        assert_eq!(clock.animation_time(), 0.0);
    }
}
