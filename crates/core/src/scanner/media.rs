//! Per-medium probes: run the tool, parse its output.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::capabilities::{BLUETOOTHCTL, GPSPIPE, HCITOOL, IWLIST, NMCLI, RTL_POWER};
use crate::process::{CommandOutput, CommandRequest, CommandRunner, ProcessError};

use super::config::{ScannerConfig, SweepBand};
use super::error::ScanError;
use super::parsers::{
    merge_sightings, parse_bluetoothctl_devices, parse_gpspipe, parse_iwlist, parse_lescan,
    parse_nmcli, parse_sweep,
};
use super::types::{BleDevice, GpsFix, Medium, SdrSignal, WifiDevice};

/// Runs the scanning tools for each medium.
pub struct MediaProbes {
    config: ScannerConfig,
    runner: Arc<dyn CommandRunner>,
}

impl MediaProbes {
    pub fn new(config: ScannerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// One position read from gpsd.
    pub async fn gps(&self) -> Result<GpsFix, ScanError> {
        let request = CommandRequest::new(GPSPIPE, ["-w", "-n", "10"])
            .with_timeout(Duration::from_secs(self.config.gps_timeout_secs));
        let output = self.run(Medium::Gps, request).await?;
        parse_gpspipe(&output.stdout, self.config.default_gps_accuracy_meters)
            .map_err(|e| ScanError::parse(Medium::Gps, e.0))
    }

    /// Passive LE scan merged with the known-device listing.
    ///
    /// Either source may fail alone; both failing is an error.
    pub async fn ble(&self) -> Result<Vec<BleDevice>, ScanError> {
        let mut sources = Vec::new();
        let mut failures = Vec::new();

        if self.runner.is_available(HCITOOL).await {
            let request = CommandRequest::new(HCITOOL, ["lescan"])
                .with_timeout(Duration::from_secs(self.config.ble_scan_secs))
                .keep_output_on_timeout();
            match self.run(Medium::Ble, request).await {
                Ok(output) => sources.push(parse_lescan(&output.stdout)),
                Err(e) => failures.push(e.to_string()),
            }
        }

        if self.runner.is_available(BLUETOOTHCTL).await {
            let request = CommandRequest::new(BLUETOOTHCTL, ["devices"])
                .with_timeout(Duration::from_secs(self.config.bluetoothctl_timeout_secs));
            match self.run(Medium::Ble, request).await {
                Ok(output) => sources.push(parse_bluetoothctl_devices(&output.stdout)),
                Err(e) => failures.push(e.to_string()),
            }
        }

        if sources.is_empty() && !failures.is_empty() {
            return Err(ScanError::NoSource {
                medium: Medium::Ble,
                reasons: failures.join("; "),
            });
        }
        for failure in &failures {
            warn!("BLE source failed, using the other: {}", failure);
        }
        Ok(merge_sightings(sources))
    }

    /// One Wi-Fi scan, via iwlist or nmcli.
    pub async fn wifi(&self) -> Result<Vec<WifiDevice>, ScanError> {
        let timeout = Duration::from_secs(self.config.wifi_timeout_secs);
        let mut iwlist_error = None;

        if self.runner.is_available(IWLIST).await {
            let request = CommandRequest::new(IWLIST, [self.config.wifi_interface.as_str(), "scan"])
                .with_timeout(timeout);
            match self.run(Medium::Wifi, request).await {
                Ok(output) => return Ok(parse_iwlist(&output.stdout)),
                Err(e) => iwlist_error = Some(e),
            }
        }

        if self.runner.is_available(NMCLI).await {
            if let Some(e) = &iwlist_error {
                warn!("iwlist scan failed, falling back to nmcli: {}", e);
            }
            let request = CommandRequest::new(
                NMCLI,
                ["-t", "-f", "BSSID,SSID,SIGNAL,CHAN,SECURITY,FREQ", "dev", "wifi", "list"],
            )
            .with_timeout(timeout);
            let output = self.run(Medium::Wifi, request).await?;
            return Ok(parse_nmcli(&output.stdout));
        }

        Err(iwlist_error.unwrap_or_else(|| {
            ScanError::process(
                Medium::Wifi,
                ProcessError::NotFound {
                    program: IWLIST.to_string(),
                },
            )
        }))
    }

    /// One `rtl_power` sweep across `band`.
    pub async fn sdr_band(&self, band: &SweepBand) -> Result<Vec<SdrSignal>, ScanError> {
        let range = format!(
            "{}:{}:{}",
            band.start_hz, band.end_hz, self.config.sdr_bin_width_hz
        );
        let integration = self.config.sdr_integration_secs.to_string();
        let request = CommandRequest::new(
            RTL_POWER,
            ["-f", range.as_str(), "-i", integration.as_str(), "-1", "-"],
        )
        .with_timeout(Duration::from_secs(self.config.sdr_timeout_secs));

        let output = self.run(Medium::Sdr, request).await?;
        parse_sweep(&output.stdout, &band.name, self.config.noise_threshold_dbfs)
            .map_err(|e| ScanError::parse(Medium::Sdr, format!("{}: {}", band.name, e)))
    }

    async fn run(&self, medium: Medium, request: CommandRequest) -> Result<CommandOutput, ScanError> {
        let program = request.program.clone();
        debug!("Running {}", request.command_line());
        let output = self
            .runner
            .run(request)
            .await
            .map_err(|e| ScanError::process(medium, e))?;
        if output.timed_out {
            return Ok(output);
        }
        output
            .into_success(&program)
            .map_err(|e| ScanError::process(medium, e))
    }
}
