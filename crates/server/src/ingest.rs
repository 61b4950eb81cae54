//! Discovery forwarding to the upstream ingestion endpoint.
//!
//! The discovery callback runs synchronously inside the scan loop, so it only
//! queues records. A background forwarder batches them and POSTs
//! `{"devices": [...]}` to `<url>/api/collector/push`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use sigint_core::{
    identify::wifi_channel_to_mhz, DiscoveredSignal, DiscoveryCallback, GpsFix, IngestConfig,
    Medium,
};

use crate::metrics::{INGEST_BATCHES_TOTAL, INGEST_DROPPED_TOTAL, INGEST_RECORDS_TOTAL};

/// BLE advertising channel 37, reported as the BLE frequency.
const BLE_FREQUENCY_HZ: u64 = 2_402_000_000;

/// One record in the push payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushDevice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    pub name: String,
    pub signal_type: String,
    pub device_type: String,
    pub manufacturer: String,
    pub signal_strength: f64,
    pub frequency: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    pub protocol: String,
    pub encryption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

impl PushDevice {
    pub fn from_discovery(signal: &DiscoveredSignal, gps: Option<&GpsFix>) -> Self {
        let mut device = match signal {
            DiscoveredSignal::Ble(ble) => Self::blank(
                Some(ble.mac_address.clone()),
                ble.name.clone(),
                "bluetooth",
                ble.device_type.clone(),
                ble.manufacturer.clone(),
                ble.rssi as f64,
                BLE_FREQUENCY_HZ,
                "BLE",
                "Unknown",
            ),
            DiscoveredSignal::Wifi(wifi) => {
                let frequency = wifi
                    .frequency_khz
                    .map(|khz| khz * 1_000)
                    .or_else(|| wifi_channel_to_mhz(wifi.channel).map(|mhz| mhz as u64 * 1_000_000))
                    .unwrap_or(0);
                let mut device = Self::blank(
                    Some(wifi.mac_address.clone()),
                    wifi.ssid.clone(),
                    "wifi",
                    "Wi-Fi Network".to_string(),
                    wifi.manufacturer.clone(),
                    wifi.rssi as f64,
                    frequency,
                    "802.11",
                    if wifi.encryption { "Encrypted" } else { "Open" },
                );
                device.channel = Some(wifi.channel);
                device
            }
            DiscoveredSignal::Sdr(sdr) => Self::blank(
                None,
                sdr.label.clone(),
                "sdr",
                sdr.band.clone(),
                "Unknown".to_string(),
                sdr.power_dbfs,
                sdr.frequency_hz,
                "RF",
                "Unknown",
            ),
        };

        if let Some(fix) = gps {
            device.latitude = Some(fix.latitude);
            device.longitude = Some(fix.longitude);
            device.altitude = fix.altitude;
        }
        device
    }

    #[allow(clippy::too_many_arguments)]
    fn blank(
        mac_address: Option<String>,
        name: String,
        signal_type: &str,
        device_type: String,
        manufacturer: String,
        signal_strength: f64,
        frequency: u64,
        protocol: &str,
        encryption: &str,
    ) -> Self {
        Self {
            mac_address,
            name,
            signal_type: signal_type.to_string(),
            device_type,
            manufacturer,
            signal_strength,
            frequency,
            channel: None,
            protocol: protocol.to_string(),
            encryption: encryption.to_string(),
            latitude: None,
            longitude: None,
            altitude: None,
            observed_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct PushBody<'a> {
    devices: &'a [PushDevice],
}

/// Handle for queueing discoveries
///
/// Cheaply cloneable. Queueing never blocks: when the buffer is full the
/// record is dropped and counted.
#[derive(Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<PushDevice>,
}

impl IngestHandle {
    pub fn new(tx: mpsc::Sender<PushDevice>) -> Self {
        Self { tx }
    }

    /// Queue one record. Returns false if it was dropped.
    pub fn try_queue(&self, device: PushDevice) -> bool {
        match self.tx.try_send(device) {
            Ok(()) => true,
            Err(e) => {
                INGEST_DROPPED_TOTAL.inc();
                debug!("Dropping discovery for ingest: {}", e);
                false
            }
        }
    }

    /// Discovery callback that queues every record.
    pub fn callback(self) -> DiscoveryCallback {
        Arc::new(move |signal: &DiscoveredSignal, _medium: Medium, gps: Option<&GpsFix>| {
            self.try_queue(PushDevice::from_discovery(signal, gps));
        })
    }
}

/// Background task that batches queued records and pushes them upstream
pub struct IngestForwarder {
    rx: mpsc::Receiver<PushDevice>,
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    batch_size: usize,
    flush_interval: Duration,
}

impl IngestForwarder {
    pub fn new(rx: mpsc::Receiver<PushDevice>, config: &IngestConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build ingest HTTP client ({}), using defaults", e);
                reqwest::Client::new()
            });

        Self {
            rx,
            client,
            endpoint: push_url(&config.url),
            api_key: config.api_key.clone(),
            batch_size: config.batch_size.max(1),
            flush_interval: Duration::from_millis(config.flush_interval_ms.max(1)),
        }
    }

    /// Run the forwarder until every handle is dropped
    ///
    /// This should be spawned as a background task. Queued records are
    /// flushed before it returns.
    pub async fn run(mut self) {
        info!("Ingest forwarder started, pushing to {}", self.endpoint);

        let mut batch: Vec<PushDevice> = Vec::with_capacity(self.batch_size);
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = self.rx.recv() => match received {
                    Some(device) => {
                        batch.push(device);
                        if batch.len() >= self.batch_size {
                            self.flush(&mut batch).await;
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if !batch.is_empty() {
                        self.flush(&mut batch).await;
                    }
                }
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch).await;
        }
        info!("Ingest forwarder shutting down");
    }

    /// Push the batch. Failed batches are logged and dropped.
    async fn flush(&self, batch: &mut Vec<PushDevice>) {
        let count = batch.len();
        let result = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&PushBody { devices: batch })
            .send()
            .await;
        batch.clear();

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Pushed {} record(s)", count);
                INGEST_BATCHES_TOTAL.with_label_values(&["ok"]).inc();
                INGEST_RECORDS_TOTAL.inc_by(count as u64);
            }
            Ok(response) => {
                let status = response.status();
                let reason = match status.as_u16() {
                    401 => "invalid API key".to_string(),
                    403 => "API key is disabled".to_string(),
                    _ => response.text().await.unwrap_or_default().chars().take(200).collect(),
                };
                warn!("Ingest push of {} record(s) rejected ({}): {}", count, status, reason);
                INGEST_BATCHES_TOTAL.with_label_values(&["rejected"]).inc();
            }
            Err(e) => {
                error!("Ingest push of {} record(s) failed: {}", count, e);
                INGEST_BATCHES_TOTAL.with_label_values(&["error"]).inc();
            }
        }
    }
}

fn push_url(base: &str) -> String {
    format!("{}/api/collector/push", base.trim_end_matches('/'))
}

/// Create the ingest handle and its forwarder
///
/// Spawn the forwarder with `tokio::spawn(forwarder.run())`.
pub fn create_ingest_system(
    config: &IngestConfig,
    buffer_size: usize,
) -> (IngestHandle, IngestForwarder) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (IngestHandle::new(tx), IngestForwarder::new(rx, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigint_core::scanner::{BleDevice, SdrSignal, WifiDevice};

    fn fix() -> GpsFix {
        GpsFix {
            latitude: 51.5007,
            longitude: -0.1246,
            altitude: Some(35.0),
            speed: None,
            heading: None,
            accuracy_meters: 5.0,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_push_url_trims_slash() {
        assert_eq!(
            push_url("https://collector.example.net/"),
            "https://collector.example.net/api/collector/push"
        );
    }

    #[test]
    fn test_ble_record_payload() {
        let signal = DiscoveredSignal::Ble(BleDevice {
            mac_address: "A4:83:E7:11:22:33".to_string(),
            name: "AirPods Pro".to_string(),
            rssi: -75,
            device_type: "Audio / Headphones".to_string(),
            manufacturer: "Apple".to_string(),
        });
        let device = PushDevice::from_discovery(&signal, Some(&fix()));
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["macAddress"], "A4:83:E7:11:22:33");
        assert_eq!(json["signalType"], "bluetooth");
        assert_eq!(json["deviceType"], "Audio / Headphones");
        assert_eq!(json["frequency"], 2_402_000_000u64);
        assert_eq!(json["latitude"], 51.5007);
        assert!(json.get("channel").is_none());
    }

    #[test]
    fn test_wifi_frequency_from_channel() {
        let signal = DiscoveredSignal::Wifi(WifiDevice {
            mac_address: "C4:E9:84:12:34:56".to_string(),
            ssid: "HomeNet".to_string(),
            rssi: -40,
            channel: 11,
            encryption: true,
            frequency_khz: None,
            manufacturer: "TP-Link".to_string(),
        });
        let device = PushDevice::from_discovery(&signal, None);
        assert_eq!(device.frequency, 2_462_000_000);
        assert_eq!(device.channel, Some(11));
        assert_eq!(device.encryption, "Encrypted");
        assert!(device.latitude.is_none());
    }

    #[test]
    fn test_sdr_record_has_no_mac() {
        let signal = DiscoveredSignal::Sdr(SdrSignal {
            frequency_hz: 100_025_000,
            power_dbfs: -30.5,
            bandwidth_hz: 25_000,
            label: "FM Broadcast".to_string(),
            band: "VHF".to_string(),
        });
        let json = serde_json::to_value(PushDevice::from_discovery(&signal, None)).unwrap();
        assert!(json.get("macAddress").is_none());
        assert_eq!(json["signalType"], "sdr");
        assert_eq!(json["signalStrength"], -30.5);
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = IngestHandle::new(tx);
        let signal = DiscoveredSignal::Sdr(SdrSignal {
            frequency_hz: 1,
            power_dbfs: 0.0,
            bandwidth_hz: 1,
            label: "x".to_string(),
            band: "y".to_string(),
        });
        assert!(handle.try_queue(PushDevice::from_discovery(&signal, None)));
        assert!(!handle.try_queue(PushDevice::from_discovery(&signal, None)));
        assert!(rx.recv().await.is_some());
    }
}
