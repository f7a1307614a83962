use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use hr_monitor_rust::domain::settings::SettingsService;
use hr_monitor_rust::infrastructure::bluetooth::btleplug_radio::{BtleplugRadio, RadioConfig};
use hr_monitor_rust::infrastructure::logging;
use hr_monitor_rust::{BluetoothService, GattPhase, MonitorEvent, ScanState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut settings = SettingsService::new().context("loading settings")?;
    let _logging_guard = logging::init_logger(&settings.get().log_settings)?;
    info!("Starting heart-rate monitor");

    let config = RadioConfig {
        service_uuid: Uuid::parse_str(&settings.get().ble_service_uuid)
            .context("invalid service UUID in settings")?,
        measurement_uuid: Uuid::parse_str(&settings.get().ble_measurement_char_uuid)
            .context("invalid measurement characteristic UUID in settings")?,
    };

    let (radio_tx, radio_rx) = mpsc::unbounded_channel();
    let radio = BtleplugRadio::new(radio_tx, config)
        .await
        .context("initializing Bluetooth adapter")?;
    let scan_window = Duration::from_millis(settings.get().scan_window_ms);
    let (monitor, mut events) = BluetoothService::spawn(radio, radio_rx, scan_window);

    // Target priority: explicit argument, remembered address, first
    // connectable device from the scan.
    let requested = std::env::args().nth(1);

    println!("Scanning for {} ms...", settings.get().scan_window_ms);
    monitor.start_scan();
    while let Some(event) = events.recv().await {
        match event {
            MonitorEvent::DeviceDiscovered(device) => {
                println!(
                    "  {}  {}  {}dBm",
                    device.address, device.name, device.signal_strength
                );
            }
            MonitorEvent::ScanFailed(error) => anyhow::bail!("scan failed: {error}"),
            MonitorEvent::ScanStateChanged(ScanState::Idle) => break,
            _ => {}
        }
    }

    let devices = monitor.devices().await;
    anyhow::ensure!(!devices.is_empty(), "no BLE devices discovered");

    let remembered = settings
        .get()
        .last_connected_address
        .clone()
        .filter(|address| devices.iter().any(|d| &d.address == address));
    let target = requested
        .or(remembered)
        .or_else(|| {
            devices
                .iter()
                .find(|d| d.connectable)
                .map(|d| d.address.clone())
        })
        .context("no connectable device discovered")?;

    println!("Connecting to {target}...");
    monitor.connect(target);

    loop {
        tokio::select! {
            maybe_event = events.recv() => {
                let Some(event) = maybe_event else { break };
                match event {
                    MonitorEvent::SessionStateChanged { address, phase } => match phase {
                        GattPhase::Streaming => {
                            settings.remember_address(&address)?;
                            println!("Streaming from {address} - Ctrl-C to quit");
                        }
                        GattPhase::Failed(fault) => {
                            anyhow::bail!("session failed: {fault:?}");
                        }
                        GattPhase::Disconnected => {
                            warn!(peer = %address, "disconnected");
                            break;
                        }
                        other => info!(peer = %address, ?other, "session state"),
                    },
                    MonitorEvent::SessionError { address, error } => {
                        warn!(peer = %address, %error, "session error");
                        anyhow::bail!("session to {address} ended: {error}");
                    }
                    MonitorEvent::Reading(reading) => {
                        println!("{} BPM", reading.beats_per_minute);
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                monitor.disconnect();
                break;
            }
        }
    }

    Ok(())
}
