//! Seam between the monitor core and the platform BLE stack.

use async_trait::async_trait;

use crate::error::BleError;

/// Events pushed by a [`RadioLink`] backend into the service.
///
/// Backends receive an `UnboundedSender<RadioEvent>` at construction and
/// may deliver these from any task; the service consumes them on its own
/// single-writer loop.
#[derive(Debug, Clone)]
pub enum RadioEvent {
    DeviceDiscovered {
        address: String,
        name: Option<String>,
        signal_strength: i16,
        connectable: bool,
    },
    /// The platform aborted a running scan (rate limiting, radio loss).
    ScanFailed(i32),
    /// A characteristic-value notification from the connected peer.
    Notification {
        address: String,
        payload: Vec<u8>,
    },
    /// The peer dropped the link, or the radio lost it.
    PeerDisconnected {
        address: String,
    },
}

/// The platform BLE primitives the monitor core depends on.
///
/// One method per externally visible side effect, all driven sequentially
/// by the service; a backend never has to cope with overlapping calls for
/// the same peer.
#[async_trait]
pub trait RadioLink: Send + Sync + 'static {
    /// Capability check run before scanning or connecting: permissions
    /// granted and adapter powered.
    async fn ensure_ready(&self) -> Result<(), BleError>;

    async fn start_scan(&self) -> Result<(), BleError>;

    async fn stop_scan(&self) -> Result<(), BleError>;

    async fn connect(&self, address: &str) -> Result<(), BleError>;

    /// Enumerate the peer's services and locate the heart-rate measurement
    /// characteristic. Fails with [`BleError::CharacteristicNotFound`] when
    /// the peer does not expose it.
    async fn discover_measurement(&self, address: &str) -> Result<(), BleError>;

    /// Write the enable-notifications descriptor value for the measurement
    /// characteristic and begin forwarding [`RadioEvent::Notification`]s.
    async fn enable_notifications(&self, address: &str) -> Result<(), BleError>;

    async fn disconnect(&self, address: &str) -> Result<(), BleError>;
}
