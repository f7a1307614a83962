//! Bluetooth Module
//!
//! BLE discovery and heart-rate streaming.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   BluetoothService                       │
//! │   (single-writer task - public API via MonitorHandle)   │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┬─────────────┐
//!         │             │             │             │
//!         ▼             ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐  ┌──────────┐
//! │  Scanner  │  │ Connection │  │ Protocol │  │  Radio   │
//! │           │  │            │  │          │  │          │
//! │ - scan    │  │ - GATT     │  │ - UUIDs  │  │ - trait  │
//! │   window  │  │   phases   │  │ - BPM    │  │ - btle-  │
//! │ - states  │  │ - guards   │  │   decode │  │   plug   │
//! └───────────┘  └────────────┘  └──────────┘  └──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Heart Rate profile UUIDs and measurement decoding
//! - [`scanner`] - scan-window state tracking
//! - [`connection`] - GATT session state machine
//! - [`radio`] - platform seam: the `RadioLink` trait and `RadioEvent`s
//! - [`btleplug_radio`] - production `RadioLink` backend
//! - [`service`] - single-writer coordinator owning all of the above

pub mod btleplug_radio;
pub mod connection;
pub mod protocol;
pub mod radio;
pub mod scanner;
pub mod service;

// Re-export main service for convenience
pub use service::{BluetoothService, MonitorHandle};
