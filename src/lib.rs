//! BLE heart-rate monitor core: bounded device discovery, a deduplicated
//! device registry, a single-connection GATT session state machine and a
//! defensive measurement decoder, coordinated by one service task.

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::models::{
    GattPhase, HeartRateReading, MonitorCommand, MonitorEvent, ScanState, ScannedDevice,
    SessionFault,
};
pub use domain::registry::DeviceRegistry;
pub use error::BleError;
pub use infrastructure::bluetooth::radio::{RadioEvent, RadioLink};
pub use infrastructure::bluetooth::{BluetoothService, MonitorHandle};
