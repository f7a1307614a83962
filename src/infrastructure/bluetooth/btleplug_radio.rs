//! btleplug-backed [`RadioLink`] implementation.
//!
//! Translates the cross-platform btleplug central API into the narrow
//! surface the service needs: scan control, one tracked connection, and
//! `RadioEvent`s forwarded from the adapter's event stream and the
//! peer's notification stream.

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Characteristic, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::BleError;
use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::bluetooth::radio::{RadioEvent, RadioLink};

/// Which service/characteristic pair the backend looks for. Defaults to
/// the standard Heart Rate profile; overridable for peripherals that
/// expose the measurement under a vendor UUID.
#[derive(Debug, Clone)]
pub struct RadioConfig {
    pub service_uuid: Uuid,
    pub measurement_uuid: Uuid,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            service_uuid: protocol::HEART_RATE_SERVICE_UUID,
            measurement_uuid: protocol::HEART_RATE_MEASUREMENT_UUID,
        }
    }
}

struct ConnectedPeer {
    address: String,
    peripheral: Peripheral,
    measurement: Option<Characteristic>,
    notify_task: Option<JoinHandle<()>>,
}

pub struct BtleplugRadio {
    adapter: Adapter,
    config: RadioConfig,
    events: mpsc::UnboundedSender<RadioEvent>,
    connected: Mutex<Option<ConnectedPeer>>,
}

impl BtleplugRadio {
    /// Acquire the first adapter and start forwarding its central events.
    pub async fn new(
        events: mpsc::UnboundedSender<RadioEvent>,
        config: RadioConfig,
    ) -> Result<Arc<Self>, BleError> {
        let manager = Manager::new().await.map_err(map_backend_error)?;
        let adapters = manager.adapters().await.map_err(map_backend_error)?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(BleError::RadioDisabled)?;

        let radio = Arc::new(Self {
            adapter,
            config,
            events,
            connected: Mutex::new(None),
        });
        radio.spawn_central_forwarder().await?;
        Ok(radio)
    }

    async fn spawn_central_forwarder(self: &Arc<Self>) -> Result<(), BleError> {
        let mut stream = self.adapter.events().await.map_err(map_backend_error)?;
        let this = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                match event {
                    CentralEvent::DeviceDiscovered(id) => this.forward_discovery(id).await,
                    CentralEvent::DeviceDisconnected(id) => this.forward_disconnect(id).await,
                    _ => {}
                }
            }
            debug!("adapter event stream ended");
        });
        Ok(())
    }

    async fn forward_discovery(&self, id: PeripheralId) {
        let peripheral = match self.adapter.peripheral(&id).await {
            Ok(peripheral) => peripheral,
            Err(error) => {
                debug!(%error, "discovered peripheral vanished before lookup");
                return;
            }
        };
        let address = peripheral.address().to_string();
        let (name, signal_strength) = match peripheral.properties().await {
            Ok(Some(properties)) => (properties.local_name, properties.rssi.unwrap_or(0)),
            _ => (None, 0),
        };
        // btleplug does not surface the advertisement's connectable flag;
        // peripherals the adapter reports are treated as connectable.
        let _ = self.events.send(RadioEvent::DeviceDiscovered {
            address,
            name,
            signal_strength,
            connectable: true,
        });
    }

    async fn forward_disconnect(&self, id: PeripheralId) {
        let guard = self.connected.lock().await;
        if let Some(peer) = guard.as_ref() {
            if peer.peripheral.id() == id {
                let _ = self.events.send(RadioEvent::PeerDisconnected {
                    address: peer.address.clone(),
                });
            }
        }
    }

    async fn find_peripheral(&self, address: &str) -> Result<Peripheral, BleError> {
        let peripherals = self.adapter.peripherals().await.map_err(map_backend_error)?;
        peripherals
            .into_iter()
            .find(|p| p.address().to_string() == address)
            .ok_or_else(|| BleError::DeviceNotFound(address.to_string()))
    }
}

#[async_trait]
impl RadioLink for BtleplugRadio {
    async fn ensure_ready(&self) -> Result<(), BleError> {
        // The adapter existing is not enough; asking it for its info is the
        // cheapest call that fails when the radio is off or inaccessible.
        self.adapter
            .adapter_info()
            .await
            .map(|_| ())
            .map_err(|error| match map_backend_error(error) {
                BleError::PermissionDenied => BleError::PermissionDenied,
                _ => BleError::RadioDisabled,
            })
    }

    async fn start_scan(&self) -> Result<(), BleError> {
        // Unfiltered: the device list shows everything nearby, connectable
        // heart-rate straps included.
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(map_backend_error)
    }

    async fn stop_scan(&self) -> Result<(), BleError> {
        self.adapter.stop_scan().await.map_err(map_backend_error)
    }

    async fn connect(&self, address: &str) -> Result<(), BleError> {
        let peripheral = self.find_peripheral(address).await?;
        peripheral.connect().await.map_err(map_backend_error)?;

        let mut guard = self.connected.lock().await;
        if let Some(old) = guard.take() {
            warn!(peer = %old.address, "replacing a connection the service never tore down");
            if let Some(task) = old.notify_task {
                task.abort();
            }
        }
        *guard = Some(ConnectedPeer {
            address: address.to_string(),
            peripheral,
            measurement: None,
            notify_task: None,
        });
        Ok(())
    }

    async fn discover_measurement(&self, address: &str) -> Result<(), BleError> {
        let mut guard = self.connected.lock().await;
        let peer = guard
            .as_mut()
            .filter(|peer| peer.address == address)
            .ok_or_else(|| BleError::DeviceNotFound(address.to_string()))?;

        peer.peripheral
            .discover_services()
            .await
            .map_err(map_backend_error)?;

        let measurement = peer
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| {
                c.uuid == self.config.measurement_uuid
                    && c.service_uuid == self.config.service_uuid
            })
            .ok_or(BleError::CharacteristicNotFound)?;
        debug!(peer = %address, uuid = %measurement.uuid, "measurement characteristic found");
        peer.measurement = Some(measurement);
        Ok(())
    }

    async fn enable_notifications(&self, address: &str) -> Result<(), BleError> {
        let mut guard = self.connected.lock().await;
        let peer = guard
            .as_mut()
            .filter(|peer| peer.address == address)
            .ok_or_else(|| BleError::DeviceNotFound(address.to_string()))?;
        let measurement = peer
            .measurement
            .clone()
            .ok_or(BleError::CharacteristicNotFound)?;

        // subscribe() performs the client-characteristic-configuration
        // descriptor write under the hood.
        peer.peripheral
            .subscribe(&measurement)
            .await
            .map_err(|_| BleError::DescriptorWriteFailed)?;

        let mut notifications = peer
            .peripheral
            .notifications()
            .await
            .map_err(map_backend_error)?;
        let events = self.events.clone();
        let peer_address = address.to_string();
        let measurement_uuid = self.config.measurement_uuid;
        peer.notify_task = Some(tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                if notification.uuid != measurement_uuid {
                    continue;
                }
                let _ = events.send(RadioEvent::Notification {
                    address: peer_address.clone(),
                    payload: notification.value,
                });
            }
        }));
        Ok(())
    }

    async fn disconnect(&self, address: &str) -> Result<(), BleError> {
        let mut guard = self.connected.lock().await;
        match guard.take() {
            Some(peer) if peer.address == address => {
                if let Some(task) = peer.notify_task {
                    task.abort();
                }
                peer.peripheral.disconnect().await.map_err(map_backend_error)
            }
            other => {
                // Not connected to this peer: disconnecting is a no-op.
                *guard = other;
                Ok(())
            }
        }
    }
}

fn map_backend_error(error: btleplug::Error) -> BleError {
    match error {
        btleplug::Error::PermissionDenied => BleError::PermissionDenied,
        other => BleError::Backend(other.to_string()),
    }
}
