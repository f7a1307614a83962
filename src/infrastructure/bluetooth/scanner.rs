//! Scan session bookkeeping.
//!
//! Tracks the lifecycle of the single discovery scan: idle, scanning with
//! a hard deadline, and the short stopping window while the platform
//! acknowledges the stop. The service owns the actual timer and the
//! platform calls; this type only enforces the state invariants, so it
//! stays testable without a radio.

use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::domain::models::ScanState;

pub const DEFAULT_SCAN_WINDOW: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub struct ScanSession {
    state: ScanState,
    window: Duration,
    deadline: Option<Instant>,
}

impl ScanSession {
    pub fn new(window: Duration) -> Self {
        Self {
            state: ScanState::Idle,
            window,
            deadline: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    /// When the running scan must stop on its own.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Enter `Scanning` and arm the deadline. Starting over a running scan
    /// replaces it: the deadline is re-armed from `now`.
    pub fn begin(&mut self, now: Instant) {
        if self.state == ScanState::Stopping {
            warn!("scan restarted while the previous stop was still pending");
        }
        self.state = ScanState::Scanning;
        self.deadline = Some(now + self.window);
    }

    /// Enter `Stopping`. Returns `false` (no-op) unless a scan is running.
    pub fn begin_stop(&mut self) -> bool {
        if self.state != ScanState::Scanning {
            return false;
        }
        self.state = ScanState::Stopping;
        self.deadline = None;
        true
    }

    /// Return to `Idle` once the platform stop completed. Safe from any
    /// state.
    pub fn finish(&mut self) {
        self.state = ScanState::Idle;
        self.deadline = None;
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_arms_the_deadline() {
        let mut scan = ScanSession::new(Duration::from_millis(3000));
        assert_eq!(scan.state(), ScanState::Idle);
        assert!(scan.deadline().is_none());

        let now = Instant::now();
        scan.begin(now);
        assert!(scan.is_scanning());
        assert_eq!(scan.deadline(), Some(now + Duration::from_millis(3000)));
    }

    #[test]
    fn restart_rearms_the_deadline() {
        let mut scan = ScanSession::new(Duration::from_millis(3000));
        let first = Instant::now();
        scan.begin(first);
        let later = first + Duration::from_millis(500);
        scan.begin(later);
        assert_eq!(scan.deadline(), Some(later + Duration::from_millis(3000)));
    }

    #[test]
    fn stop_from_idle_is_a_no_op() {
        let mut scan = ScanSession::default();
        assert!(!scan.begin_stop());
        assert_eq!(scan.state(), ScanState::Idle);
    }

    #[test]
    fn full_lifecycle() {
        let mut scan = ScanSession::default();
        scan.begin(Instant::now());
        assert!(scan.begin_stop());
        assert_eq!(scan.state(), ScanState::Stopping);
        assert!(scan.deadline().is_none());
        scan.finish();
        assert_eq!(scan.state(), ScanState::Idle);
    }
}
