//! GATT session state machine.
//!
//! One session per connected peer, advancing strictly through
//! `Connecting -> ServiceDiscovery -> NotificationsEnabling -> Streaming`.
//! Each guard method applies only from its legal predecessor phase; an
//! out-of-phase call is logged and ignored, because the platform may still
//! deliver events for a session that was already torn down.

use tracing::{debug, warn};

use crate::domain::models::{GattPhase, HeartRateReading, SessionFault};

#[derive(Debug)]
pub struct GattSession {
    phase: GattPhase,
    peer_address: Option<String>,
    last_reading: Option<HeartRateReading>,
}

impl GattSession {
    pub fn new() -> Self {
        Self {
            phase: GattPhase::Disconnected,
            peer_address: None,
            last_reading: None,
        }
    }

    pub fn phase(&self) -> GattPhase {
        self.phase
    }

    pub fn peer_address(&self) -> Option<&str> {
        self.peer_address.as_deref()
    }

    pub fn last_reading(&self) -> Option<HeartRateReading> {
        self.last_reading
    }

    /// A session exists for a peer and has not reached a terminal phase.
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            GattPhase::Connecting
                | GattPhase::ServiceDiscovery
                | GattPhase::NotificationsEnabling
                | GattPhase::Streaming
        )
    }

    pub fn is_streaming_from(&self, address: &str) -> bool {
        self.phase == GattPhase::Streaming && self.peer_address.as_deref() == Some(address)
    }

    /// Start a session for `address`. Only legal when no session is active;
    /// the caller tears down any running session first.
    pub fn begin_connect(&mut self, address: String) -> bool {
        if self.is_active() {
            warn!(peer = %address, "connect requested while a session is active");
            return false;
        }
        self.phase = GattPhase::Connecting;
        self.peer_address = Some(address);
        self.last_reading = None;
        true
    }

    /// Platform reported the link up; move on to service discovery.
    pub fn mark_connected(&mut self) -> bool {
        self.advance(GattPhase::Connecting, GattPhase::ServiceDiscovery)
    }

    /// The measurement characteristic was found; next step is the
    /// notification descriptor write.
    pub fn mark_discovered(&mut self) -> bool {
        self.advance(GattPhase::ServiceDiscovery, GattPhase::NotificationsEnabling)
    }

    /// Notifications are on; readings may now arrive.
    pub fn mark_streaming(&mut self) -> bool {
        self.advance(GattPhase::NotificationsEnabling, GattPhase::Streaming)
    }

    /// End the attempt in a terminal fault. The caller recovers with a new
    /// `begin_connect`.
    pub fn fail(&mut self, fault: SessionFault) {
        debug!(?fault, peer = ?self.peer_address, "session attempt failed");
        self.phase = GattPhase::Failed(fault);
        self.last_reading = None;
    }

    /// Tear the session down. Reachable from every phase; the peer address
    /// and last reading are cleared. Returns the peer address the session
    /// was for, or `None` when it was already down.
    pub fn reset(&mut self) -> Option<String> {
        self.last_reading = None;
        if self.phase == GattPhase::Disconnected {
            self.peer_address = None;
            return None;
        }
        self.phase = GattPhase::Disconnected;
        self.peer_address.take()
    }

    /// Record a decoded reading. Ignored unless the session is streaming.
    pub fn record_reading(&mut self, reading: HeartRateReading) -> bool {
        if self.phase != GattPhase::Streaming {
            debug!(phase = ?self.phase, "dropping reading outside streaming phase");
            return false;
        }
        self.last_reading = Some(reading);
        true
    }

    fn advance(&mut self, from: GattPhase, to: GattPhase) -> bool {
        if self.phase != from {
            warn!(current = ?self.phase, expected = ?from, target = ?to, "ignoring out-of-phase transition");
            return false;
        }
        self.phase = to;
        true
    }
}

impl Default for GattSession {
    fn default() -> Self {
        Self::new()
    }
}
