//! Error taxonomy for the BLE monitor core.

use thiserror::Error;

/// Failures surfaced to the caller.
///
/// Every variant is a terminal outcome of the current attempt - nothing is
/// retried internally. `ConnectionLost` is recoverable by issuing a new
/// connect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BleError {
    #[error("Bluetooth permission denied")]
    PermissionDenied,

    #[error("Bluetooth radio is disabled or unavailable")]
    RadioDisabled,

    #[error("Scan rejected by the platform (code {0})")]
    ScanFailed(i32),

    #[error("Device {0} not found")]
    DeviceNotFound(String),

    #[error("Heart-rate measurement characteristic not found")]
    CharacteristicNotFound,

    #[error("Enabling notifications failed: descriptor write rejected")]
    DescriptorWriteFailed,

    #[error("Connection to {0} lost")]
    ConnectionLost(String),

    #[error("Bluetooth backend error: {0}")]
    Backend(String),
}
