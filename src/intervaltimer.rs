use std::thread;
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;

pub struct IntervalTimer {
    interval: Duration,
    last_tick: Instant,
    thread_name: String,
    measure_fps: bool,
    last_fps_print: Instant,
    frames: u32,
}

impl IntervalTimer {
    pub fn new(freq_hz: f32, measure_fps: bool) -> IntervalTimer {
        let frame_duration_microsec = 1000.0 / freq_hz * 1000.0;
        let cur_thread = thread::current();
        let thread_name = if let Some(name) = cur_thread.name() {
            name
        } else {
            "unnamed"
        };

        IntervalTimer {
            interval: Duration::from_micros(frame_duration_microsec as u64),
            last_tick: Instant::now(),
            thread_name: thread_name.to_string(),
            measure_fps,
            last_fps_print: Instant::now(),
            frames: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleeps until the next tick. Returns false if `cancel` fired while
    /// waiting, in which case the caller should stop producing frames.
    pub fn sleep_until_next_tick(&mut self, cancel: &CancelToken) -> bool {
        if self.measure_fps {
            self.update_fps();
        }

        let now = Instant::now();
        let next_tick = if self.last_tick + self.interval > now {
            self.last_tick + self.interval
        } else {
            log::debug!("{} skipped a frame", self.thread_name);
            now + self.interval
        };

        let cancelled = cancel.sleep_until(next_tick);
        self.last_tick = next_tick;
        !cancelled
    }

    fn update_fps(&mut self) {
        self.frames += 1;

        if Instant::now() - self.last_fps_print > Duration::from_secs(1) {
            log::trace!("{} FPS: {}", self.thread_name, self.frames);
            self.frames = 0;
            self.last_fps_print = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_frequency() {
        assert_eq!(IntervalTimer::new(10.0, false).interval(), Duration::from_millis(100));
        assert_eq!(IntervalTimer::new(50.0, false).interval(), Duration::from_millis(20));
    }

    #[test]
    fn ticks_keep_pace() {
        let cancel = CancelToken::new();
        let mut timer = IntervalTimer::new(100.0, true);
        let start = Instant::now();
        for _ in 0..5 {
            assert!(timer.sleep_until_next_tick(&cancel));
        }
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn cancelled_tick_reports_stop() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut timer = IntervalTimer::new(1.0, false);
        let start = Instant::now();
        assert!(!timer.sleep_until_next_tick(&cancel));
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
