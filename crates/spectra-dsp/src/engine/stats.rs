//! Performance bookkeeping for external instrumentation.
//!
//! Nothing in the engine reads these values back to make decisions.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Call counters, cumulative FFT time, and a rolling throughput window.
#[derive(Debug, Clone)]
pub struct EngineStats {
    fft_calls: u64,
    filter_calls: u64,
    demod_calls: u64,
    fallback_calls: u64,
    fft_time: Duration,
    window_len: Duration,
    window_start: Instant,
    window_samples: u64,
    last_window_rate: f64,
}

/// Point-in-time copy of [`EngineStats`] for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// FFT calls (plain and windowed).
    pub fft_calls: u64,
    /// Filter calls.
    pub filter_calls: u64,
    /// FM and AM demodulation calls.
    pub demod_calls: u64,
    /// Calls answered by software after the accelerated path declined.
    pub fallback_calls: u64,
    /// Cumulative time spent in FFT calls, in seconds.
    pub fft_seconds: f64,
    /// Samples per second over the current window.
    pub samples_per_second: f64,
}

impl EngineStats {
    /// Creates empty stats rolling over every `window_len`.
    pub fn new(window_len: Duration) -> Self {
        Self {
            fft_calls: 0,
            filter_calls: 0,
            demod_calls: 0,
            fallback_calls: 0,
            fft_time: Duration::ZERO,
            window_len: window_len.max(Duration::from_millis(1)),
            window_start: Instant::now(),
            window_samples: 0,
            last_window_rate: 0.0,
        }
    }

    pub(crate) fn record_fft(&mut self, samples: usize, elapsed: Duration) {
        self.fft_calls += 1;
        self.fft_time += elapsed;
        self.record_samples(samples);
    }

    pub(crate) fn record_filter(&mut self, samples: usize) {
        self.filter_calls += 1;
        self.record_samples(samples);
    }

    pub(crate) fn record_demod(&mut self, samples: usize) {
        self.demod_calls += 1;
        self.record_samples(samples);
    }

    pub(crate) fn record_fallback(&mut self) {
        self.fallback_calls += 1;
    }

    fn record_samples(&mut self, samples: usize) {
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.window_len {
            self.last_window_rate = self.window_samples as f64 / elapsed.as_secs_f64();
            self.window_start = Instant::now();
            self.window_samples = 0;
        }
        self.window_samples += samples as u64;
    }

    /// FFT calls so far.
    pub fn fft_calls(&self) -> u64 {
        self.fft_calls
    }

    /// Filter calls so far.
    pub fn filter_calls(&self) -> u64 {
        self.filter_calls
    }

    /// Demodulation calls so far.
    pub fn demod_calls(&self) -> u64 {
        self.demod_calls
    }

    /// Calls the software path answered after the accelerated path declined.
    pub fn fallback_calls(&self) -> u64 {
        self.fallback_calls
    }

    /// Cumulative FFT time.
    pub fn fft_time(&self) -> Duration {
        self.fft_time
    }

    /// Samples per second over the window in progress.
    pub fn samples_per_second(&self) -> f64 {
        let secs = self.window_start.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.window_samples as f64 / secs
        } else {
            0.0
        }
    }

    /// Rate of the last completed window.
    pub fn last_window_rate(&self) -> f64 {
        self.last_window_rate
    }

    /// Restarts the throughput window without touching the counters.
    pub fn reset_window(&mut self) {
        self.window_start = Instant::now();
        self.window_samples = 0;
        self.last_window_rate = 0.0;
    }

    /// Clears everything.
    pub fn reset(&mut self) {
        *self = Self::new(self.window_len);
    }

    /// Copies the current values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fft_calls: self.fft_calls,
            filter_calls: self.filter_calls,
            demod_calls: self.demod_calls,
            fallback_calls: self.fallback_calls,
            fft_seconds: self.fft_time.as_secs_f64(),
            samples_per_second: self.samples_per_second(),
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_calls() {
        let mut stats = EngineStats::default();
        stats.record_fft(1024, Duration::from_micros(50));
        stats.record_fft(1024, Duration::from_micros(50));
        stats.record_filter(256);
        stats.record_demod(256);

        assert_eq!(stats.fft_calls(), 2);
        assert_eq!(stats.filter_calls(), 1);
        assert_eq!(stats.demod_calls(), 1);
        assert_eq!(stats.fft_time(), Duration::from_micros(100));
    }

    #[test]
    fn reset_clears_counters() {
        let mut stats = EngineStats::new(Duration::from_millis(250));
        stats.record_fft(64, Duration::from_micros(1));
        stats.record_fallback();
        stats.reset();
        let snap = stats.snapshot();
        assert_eq!(snap.fft_calls, 0);
        assert_eq!(snap.fallback_calls, 0);
        assert_eq!(snap.fft_seconds, 0.0);
    }

    #[test]
    fn reset_window_keeps_counters() {
        let mut stats = EngineStats::new(Duration::from_millis(1));
        stats.record_filter(1000);
        std::thread::sleep(Duration::from_millis(5));
        stats.record_filter(10);
        assert!(stats.last_window_rate() > 0.0);

        stats.reset_window();
        assert_eq!(stats.last_window_rate(), 0.0);
        assert_eq!(stats.samples_per_second(), 0.0);
        assert_eq!(stats.filter_calls(), 2);
    }

    #[test]
    fn window_rolls_over() {
        let mut stats = EngineStats::new(Duration::from_millis(1));
        stats.record_filter(1000);
        std::thread::sleep(Duration::from_millis(5));
        stats.record_filter(10);
        assert!(stats.last_window_rate() > 0.0);
    }
}
