//! Soft wall-clock budget shared by every solver.
//!
//! Expiry is checked at least once per outer iteration; in-flight work is
//! allowed to complete so accounting stays consistent. Expiry is a soft
//! signal (`timed_out` on results), never an error.

use croft_core::AlgorithmConfig;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Deadline {
            started: Instant::now(),
            budget: None,
        }
    }

    pub fn with_seconds(seconds: f64) -> Self {
        Deadline {
            started: Instant::now(),
            budget: Some(Duration::from_secs_f64(seconds)),
        }
    }

    pub fn from_config(config: &AlgorithmConfig) -> Self {
        match config.time_limit_seconds {
            Some(seconds) => Deadline::with_seconds(seconds),
            None => Deadline::unbounded(),
        }
    }

    pub fn expired(&self) -> bool {
        match self.budget {
            Some(budget) => self.started.elapsed() >= budget,
            None => false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_never_expires() {
        let d = Deadline::unbounded();
        assert!(!d.expired());
    }

    #[test]
    fn test_tiny_budget_expires() {
        let d = Deadline::with_seconds(1e-9);
        std::thread::sleep(Duration::from_millis(1));
        assert!(d.expired());
    }
}
