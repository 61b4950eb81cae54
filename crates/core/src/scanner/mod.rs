//! Scan cycle coordinator.
//!
//! Owns the shared status record and the recurring scan loop. Each cycle
//! probes BLE, Wi-Fi, SDR spectrum and GPS through the [`CommandRunner`]
//! seam, normalizes tool output with the identification tables, and hands
//! every record to the registered [`DiscoveryCallback`].
//!
//! [`CommandRunner`]: crate::process::CommandRunner

mod config;
mod coordinator;
mod error;
mod media;
pub mod parsers;
mod types;

pub use config::{ScannerConfig, StaticPosition, SweepBand};
pub use coordinator::ScanCoordinator;
pub use error::ScanError;
pub use media::MediaProbes;
pub use types::{
    new_shared_status, BleDevice, DiscoveredSignal, Discovery, DiscoveryCallback, GpsFix, Medium,
    ScannerStatus, ScanningFlags, SdrSignal, SharedStatus, WifiDevice,
};
