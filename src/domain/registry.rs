//! Registry of peripherals discovered by the current scan.

use crate::domain::models::ScannedDevice;

/// Deduplicated, insertion-ordered set of discovered devices, keyed by
/// address.
///
/// Re-discovering a known address is suppressed entirely: the first-seen
/// snapshot (name and RSSI included) is kept for the lifetime of the scan.
/// A linear scan is plenty here - a scan window surfaces a few dozen
/// devices at most.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<ScannedDevice>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly discovered device. Returns `true` when the address
    /// was unseen and the record was added, `false` when it was suppressed
    /// as a duplicate.
    pub fn upsert(&mut self, device: ScannedDevice) -> bool {
        if self.devices.iter().any(|d| d.address == device.address) {
            return false;
        }
        self.devices.push(device);
        true
    }

    /// Drop all records. Called at the start of every scan so the list
    /// never shows stale signal strengths.
    pub fn clear(&mut self) {
        self.devices.clear();
    }

    /// Devices in first-seen order.
    pub fn list(&self) -> &[ScannedDevice] {
        &self.devices
    }

    pub fn get(&self, address: &str) -> Option<&ScannedDevice> {
        self.devices.iter().find(|d| d.address == address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(address: &str, rssi: i16) -> ScannedDevice {
        ScannedDevice {
            address: address.to_string(),
            name: "Polar H10".to_string(),
            signal_strength: rssi,
            connectable: true,
        }
    }

    #[test]
    fn upsert_keeps_first_seen_order() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.upsert(device("AA:BB:CC:DD:EE:01", -40)));
        assert!(registry.upsert(device("AA:BB:CC:DD:EE:02", -60)));
        assert!(registry.upsert(device("AA:BB:CC:DD:EE:03", -50)));

        let addresses: Vec<&str> = registry.list().iter().map(|d| d.address.as_str()).collect();
        assert_eq!(
            addresses,
            ["AA:BB:CC:DD:EE:01", "AA:BB:CC:DD:EE:02", "AA:BB:CC:DD:EE:03"]
        );
    }

    #[test]
    fn duplicate_address_is_suppressed() {
        let mut registry = DeviceRegistry::new();
        assert!(registry.upsert(device("AA:BB:CC:DD:EE:01", -40)));
        assert!(!registry.upsert(device("AA:BB:CC:DD:EE:01", -75)));

        assert_eq!(registry.len(), 1);
        // First-seen snapshot survives, including its RSSI.
        assert_eq!(registry.get("AA:BB:CC:DD:EE:01").unwrap().signal_strength, -40);
    }

    #[test]
    fn clear_empties_the_registry() {
        let mut registry = DeviceRegistry::new();
        registry.upsert(device("AA:BB:CC:DD:EE:01", -40));
        registry.clear();
        assert!(registry.is_empty());
        // Cleared addresses can be inserted again.
        assert!(registry.upsert(device("AA:BB:CC:DD:EE:01", -42)));
    }
}
