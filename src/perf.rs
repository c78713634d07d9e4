//! Lightweight timing of blocking calls.
//!
//! A [`Scope`] records when it was created and emits a `tracing` debug
//! event with the elapsed time when dropped. Events are only formatted
//! when the subscriber has debug enabled for this module.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Scope {
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(target: "docnav::perf", scope = self.name, "{elapsed_ms:.2} ms");
    }
}

/// Start timing `name` until the returned guard is dropped.
pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_measures_elapsed_time() {
        let scope = scope("test.sleep");
        std::thread::sleep(Duration::from_millis(2));
        assert!(scope.elapsed() >= Duration::from_millis(2));
    }
}
