//! Bluetooth Service Module
//!
//! The single-writer coordinator for all BLE state. Scan bookkeeping, the
//! device registry and the GATT session live inside one spawned task;
//! callers talk to it through [`MonitorHandle`] and consume
//! [`MonitorEvent`]s, while the platform backend feeds [`RadioEvent`]s in
//! from whatever task the OS delivers them on. No state is shared, so no
//! locks are needed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::domain::models::{
    GattPhase, MonitorCommand, MonitorEvent, ScanState, ScannedDevice, SessionFault,
};
use crate::domain::registry::DeviceRegistry;
use crate::error::BleError;
use crate::infrastructure::bluetooth::connection::GattSession;
use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::bluetooth::radio::{RadioEvent, RadioLink};
use crate::infrastructure::bluetooth::scanner::ScanSession;

/// Caller-side handle to the service task.
///
/// Commands are fire-and-forget; outcomes arrive on the event stream.
/// Dropping every handle shuts the service down once its queue drains.
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::UnboundedSender<MonitorCommand>,
}

impl MonitorHandle {
    pub fn start_scan(&self) {
        let _ = self.commands.send(MonitorCommand::StartScan);
    }

    pub fn stop_scan(&self) {
        let _ = self.commands.send(MonitorCommand::StopScan);
    }

    pub fn connect(&self, address: impl Into<String>) {
        let _ = self.commands.send(MonitorCommand::Connect(address.into()));
    }

    pub fn disconnect(&self) {
        let _ = self.commands.send(MonitorCommand::Disconnect);
    }

    /// Snapshot of the devices found by the current or most recent scan,
    /// in first-seen order.
    pub async fn devices(&self) -> Vec<ScannedDevice> {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(MonitorCommand::ListDevices { reply })
            .is_err()
        {
            return Vec::new();
        }
        response.await.unwrap_or_default()
    }
}

/// The service task state. Constructed and spawned via [`Self::spawn`].
pub struct BluetoothService<R: RadioLink> {
    radio: Arc<R>,
    registry: DeviceRegistry,
    scan: ScanSession,
    session: GattSession,
    events: mpsc::UnboundedSender<MonitorEvent>,
    radio_events: mpsc::UnboundedReceiver<RadioEvent>,
    commands: mpsc::UnboundedReceiver<MonitorCommand>,
}

impl<R: RadioLink> BluetoothService<R> {
    /// Spawn the service task. `radio_events` is the receiving end of the
    /// channel handed to the backend at construction.
    pub fn spawn(
        radio: Arc<R>,
        radio_events: mpsc::UnboundedReceiver<RadioEvent>,
        scan_window: Duration,
    ) -> (MonitorHandle, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let service = Self {
            radio,
            registry: DeviceRegistry::new(),
            scan: ScanSession::new(scan_window),
            session: GattSession::new(),
            events: event_tx,
            radio_events,
            commands: command_rx,
        };
        tokio::spawn(service.run());

        (
            MonitorHandle {
                commands: command_tx,
            },
            event_rx,
        )
    }

    async fn run(mut self) {
        loop {
            let deadline = self.scan.deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    // Every handle dropped: tear down and exit.
                    None => break,
                },
                Some(event) = self.radio_events.recv() => {
                    self.handle_radio_event(event).await;
                }
                _ = deadline_elapsed(deadline), if deadline.is_some() => {
                    debug!("scan window elapsed");
                    self.finish_scan().await;
                }
            }
        }

        if self.scan.is_scanning() {
            let _ = self.radio.stop_scan().await;
        }
        if let Some(address) = self.session.peer_address().map(str::to_string) {
            let _ = self.radio.disconnect(&address).await;
        }
        debug!("monitor service stopped");
    }

    async fn handle_command(&mut self, command: MonitorCommand) {
        match command {
            MonitorCommand::StartScan => self.start_scan().await,
            MonitorCommand::StopScan => self.finish_scan().await,
            MonitorCommand::ListDevices { reply } => {
                let _ = reply.send(self.registry.list().to_vec());
            }
            MonitorCommand::Connect(address) => self.connect(address).await,
            MonitorCommand::Disconnect => self.disconnect_current().await,
        }
    }

    async fn handle_radio_event(&mut self, event: RadioEvent) {
        match event {
            RadioEvent::DeviceDiscovered {
                address,
                name,
                signal_strength,
                connectable,
            } => {
                // The registry only tracks the active scan window.
                if !self.scan.is_scanning() {
                    debug!(peer = %address, "dropping discovery outside scan window");
                    return;
                }
                let device = ScannedDevice {
                    address,
                    name: name
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(|| "Unknown".to_string()),
                    signal_strength,
                    connectable,
                };
                if self.registry.upsert(device.clone()) {
                    debug!(
                        peer = %device.address,
                        name = %device.name,
                        rssi = device.signal_strength,
                        "device discovered"
                    );
                    self.emit(MonitorEvent::DeviceDiscovered(device));
                }
            }
            RadioEvent::ScanFailed(code) => {
                if self.scan.state() == ScanState::Idle {
                    return;
                }
                warn!(code, "platform aborted the scan");
                self.scan.finish();
                self.emit(MonitorEvent::ScanFailed(BleError::ScanFailed(code)));
                self.emit(MonitorEvent::ScanStateChanged(ScanState::Idle));
            }
            RadioEvent::Notification { address, payload } => {
                if !self.session.is_streaming_from(&address) {
                    debug!(peer = %address, "dropping notification outside streaming session");
                    return;
                }
                let reading = protocol::decode_measurement(&payload);
                if self.session.record_reading(reading) {
                    self.emit(MonitorEvent::Reading(reading));
                }
            }
            RadioEvent::PeerDisconnected { address } => {
                if self.session.peer_address() != Some(address.as_str()) {
                    return;
                }
                let was_active = self.session.is_active();
                if self.session.reset().is_some() {
                    info!(peer = %address, "link lost");
                    if was_active {
                        self.emit(MonitorEvent::SessionError {
                            address: address.clone(),
                            error: BleError::ConnectionLost(address.clone()),
                        });
                    }
                    self.emit_phase(&address, GattPhase::Disconnected);
                }
            }
        }
    }

    async fn start_scan(&mut self) {
        if let Err(error) = self.radio.ensure_ready().await {
            warn!(%error, "cannot start scan");
            self.emit(MonitorEvent::ScanFailed(error));
            return;
        }

        // Starting over a running scan replaces it.
        if self.scan.is_scanning() {
            let _ = self.radio.stop_scan().await;
        }
        self.registry.clear();

        match self.radio.start_scan().await {
            Ok(()) => {
                self.scan.begin(Instant::now());
                info!("scan started");
                self.emit(MonitorEvent::ScanStateChanged(ScanState::Scanning));
            }
            Err(error) => {
                warn!(%error, "scan rejected");
                self.scan.finish();
                self.emit(MonitorEvent::ScanFailed(error));
            }
        }
    }

    /// Stop the running scan, whether the window elapsed or the caller
    /// asked. No-op when nothing is running.
    async fn finish_scan(&mut self) {
        if !self.scan.begin_stop() {
            return;
        }
        self.emit(MonitorEvent::ScanStateChanged(ScanState::Stopping));
        if let Err(error) = self.radio.stop_scan().await {
            warn!(%error, "stopping scan failed");
        }
        self.scan.finish();
        info!(devices = self.registry.len(), "scan finished");
        self.emit(MonitorEvent::ScanStateChanged(ScanState::Idle));
    }

    async fn connect(&mut self, address: String) {
        if let Err(error) = self.radio.ensure_ready().await {
            warn!(%error, "cannot connect");
            self.emit(MonitorEvent::SessionError { address, error });
            return;
        }

        // Single-connection model: the old session is observably down
        // before the new one starts connecting.
        if self.session.peer_address().is_some() {
            self.disconnect_current().await;
        }

        self.session.begin_connect(address.clone());
        self.emit_phase(&address, GattPhase::Connecting);

        if let Err(error) = self.radio.connect(&address).await {
            warn!(%error, peer = %address, "connect failed");
            self.session.reset();
            self.emit(MonitorEvent::SessionError {
                address: address.clone(),
                error,
            });
            self.emit_phase(&address, GattPhase::Disconnected);
            return;
        }
        self.session.mark_connected();
        self.emit_phase(&address, GattPhase::ServiceDiscovery);

        match self.radio.discover_measurement(&address).await {
            Ok(()) => {}
            Err(BleError::CharacteristicNotFound) => {
                self.session.fail(SessionFault::CharacteristicNotFound);
                self.emit_phase(
                    &address,
                    GattPhase::Failed(SessionFault::CharacteristicNotFound),
                );
                self.emit(MonitorEvent::SessionError {
                    address,
                    error: BleError::CharacteristicNotFound,
                });
                return;
            }
            Err(error) => {
                warn!(%error, peer = %address, "service discovery failed");
                let _ = self.radio.disconnect(&address).await;
                self.session.reset();
                self.emit(MonitorEvent::SessionError {
                    address: address.clone(),
                    error,
                });
                self.emit_phase(&address, GattPhase::Disconnected);
                return;
            }
        }
        self.session.mark_discovered();
        self.emit_phase(&address, GattPhase::NotificationsEnabling);

        if let Err(error) = self.radio.enable_notifications(&address).await {
            warn!(%error, peer = %address, "notification subscribe failed");
            self.session.fail(SessionFault::DescriptorWriteFailed);
            self.emit_phase(
                &address,
                GattPhase::Failed(SessionFault::DescriptorWriteFailed),
            );
            self.emit(MonitorEvent::SessionError { address, error });
            return;
        }
        self.session.mark_streaming();
        info!(peer = %address, "heart-rate stream established");
        self.emit_phase(&address, GattPhase::Streaming);
    }

    /// Tear down the current session. No-op when nothing is connected.
    async fn disconnect_current(&mut self) {
        let Some(address) = self.session.peer_address().map(str::to_string) else {
            debug!("disconnect requested with no session");
            return;
        };
        // Best-effort: the link may already be gone, and a Failed session
        // may still hold a live link worth closing.
        if let Err(error) = self.radio.disconnect(&address).await {
            debug!(%error, peer = %address, "platform disconnect failed");
        }
        self.session.reset();
        self.emit_phase(&address, GattPhase::Disconnected);
    }

    fn emit(&self, event: MonitorEvent) {
        let _ = self.events.send(event);
    }

    fn emit_phase(&self, address: &str, phase: GattPhase) {
        self.emit(MonitorEvent::SessionStateChanged {
            address: address.to_string(),
            phase,
        });
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
