//! At most one run in flight; overlapping triggers are dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct SingleFlight {
    running: Arc<AtomicBool>,
}

/// Holds the flight; releasing happens on drop, including on panic
pub struct FlightGuard {
    running: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self) -> Option<FlightGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard {
                running: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_refused_until_release() {
        let flight = SingleFlight::new();
        let guard = flight.try_begin().expect("first begin");
        assert!(flight.is_running());
        assert!(flight.try_begin().is_none());

        drop(guard);
        assert!(!flight.is_running());
        assert!(flight.try_begin().is_some());
    }

    #[test]
    fn clones_share_the_flag() {
        let flight = SingleFlight::new();
        let other = flight.clone();
        let _guard = flight.try_begin().unwrap();
        assert!(other.try_begin().is_none());
    }
}
