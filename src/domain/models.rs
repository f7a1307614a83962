//! Core value types shared between the service, the platform backend and
//! the caller.

use tokio::sync::oneshot;

use crate::error::BleError;

/// A peripheral observed during a scan.
///
/// Snapshot of the first advertisement seen for an address; later
/// advertisements for the same address are suppressed, so `signal_strength`
/// is the RSSI at first sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDevice {
    /// Stable hardware identifier, unique per device.
    pub address: String,
    /// Advertised local name, or `"Unknown"` when the advertisement carries
    /// none.
    pub name: String,
    /// RSSI in dBm at first discovery.
    pub signal_strength: i16,
    pub connectable: bool,
}

/// One decoded heart-rate measurement notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartRateReading {
    pub beats_per_minute: u16,
    /// Raw flags byte (byte 0 of the payload), kept for diagnostics.
    pub flags: u8,
}

/// Scan lifecycle. `Stopping` covers the window between the stop request
/// (deadline or explicit) and the platform acknowledging it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Stopping,
}

/// Lifecycle of the single GATT session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattPhase {
    Disconnected,
    Connecting,
    ServiceDiscovery,
    NotificationsEnabling,
    Streaming,
    /// Terminal for the attempt; a new connect starts over.
    Failed(SessionFault),
}

/// Why a session attempt ended in `GattPhase::Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFault {
    CharacteristicNotFound,
    DescriptorWriteFailed,
}

/// Commands from the caller to the monitor service.
#[derive(Debug)]
pub enum MonitorCommand {
    StartScan,
    StopScan,
    /// Snapshot of the devices discovered by the current/most recent scan.
    ListDevices {
        reply: oneshot::Sender<Vec<ScannedDevice>>,
    },
    Connect(String),
    Disconnect,
}

/// Events emitted by the monitor service to its caller.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    DeviceDiscovered(ScannedDevice),
    ScanStateChanged(ScanState),
    ScanFailed(BleError),
    SessionStateChanged {
        address: String,
        phase: GattPhase,
    },
    /// A session attempt ended abnormally (connect failure, lost link).
    SessionError {
        address: String,
        error: BleError,
    },
    Reading(HeartRateReading),
}
