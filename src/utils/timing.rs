//! Timing utilities
//!
//! [`ScopedTimer`] logs the elapsed time of a scan phase when it goes out of
//! scope; [`ScanTiming`] keeps per-rule durations for the terminal summary.

use std::time::{Duration, Instant};
use tracing::debug;

/// A simple timer for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_formatted(&self) -> String {
        format_duration(self.elapsed())
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Format a duration as `< 1ms`, `456ms` or `1.23s`
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();

    if millis == 0 {
        "< 1ms".to_string()
    } else if millis >= 1000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", millis)
    }
}

/// Logs `<phase> took <duration>` at debug level on drop
#[derive(Debug)]
pub struct ScopedTimer {
    phase: String,
    timer: Timer,
}

impl ScopedTimer {
    pub fn new(phase: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            timer: Timer::start(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        debug!(
            phase = %self.phase,
            elapsed = %self.timer.elapsed_formatted(),
            "Phase finished"
        );
    }
}

/// Duration of one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTiming {
    pub rule_name: String,
    pub candidates: usize,
    pub matched: usize,
    pub duration: Duration,
}

impl RuleTiming {
    pub fn duration_formatted(&self) -> String {
        format_duration(self.duration)
    }
}

/// Timing of a whole scan
#[derive(Debug, Clone, Default)]
pub struct ScanTiming {
    pub rules: Vec<RuleTiming>,
    pub total_duration: Duration,
}

impl ScanTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, timing: RuleTiming) {
        self.rules.push(timing);
    }

    pub fn total_duration_formatted(&self) -> String {
        format_duration(self.total_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_micros(500)), "< 1ms");
        assert_eq!(format_duration(Duration::ZERO), "< 1ms");
        assert_eq!(format_duration(Duration::from_millis(456)), "456ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1234)), "1.23s");
        assert_eq!(format_duration(Duration::from_secs(60)), "60.00s");
    }

    #[test]
    fn test_timer_basic() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_scoped_timer_measures() {
        let timer = ScopedTimer::new("candidates");
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_scan_timing() {
        let mut timing = ScanTiming::new();
        timing.add_rule(RuleTiming {
            rule_name: "Naming".to_string(),
            candidates: 10,
            matched: 2,
            duration: Duration::from_millis(45),
        });
        timing.total_duration = Duration::from_millis(1234);

        assert_eq!(timing.rules[0].duration_formatted(), "45ms");
        assert_eq!(timing.total_duration_formatted(), "1.23s");
    }
}
