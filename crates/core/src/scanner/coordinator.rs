//! Scan cycle coordinator.
//!
//! Runs one cycle at a time: identity refresh, GPS, BLE, Wi-Fi, then each SDR
//! band. Per-medium failures are logged and counted; a cycle always completes.

use chrono::Utc;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::capabilities::MediumAvailability;
use crate::metrics;
use crate::node::{NodeIdentity, NodeStore, SUPPORTED_PLATFORM};
use crate::process::CommandRunner;

use super::config::ScannerConfig;
use super::error::ScanError;
use super::media::MediaProbes;
use super::types::{
    DiscoveredSignal, Discovery, DiscoveryCallback, GpsFix, Medium, ScannerStatus, SharedStatus,
};

/// Whether a probe updates the shared scanning flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracking {
    /// Periodic cycle: flags and metrics.
    Cycle,
    /// Manual scan: metrics only.
    Manual,
}

struct CoordinatorInner {
    probes: MediaProbes,
    node_store: NodeStore,
    identity: RwLock<Option<NodeIdentity>>,
    status: SharedStatus,
    callback: DiscoveryCallback,
}

/// Drives the recurring, non-overlapping scan loop.
pub struct ScanCoordinator {
    inner: Arc<CoordinatorInner>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScanCoordinator {
    pub fn new(
        config: ScannerConfig,
        runner: Arc<dyn CommandRunner>,
        node_store: NodeStore,
        status: SharedStatus,
        callback: DiscoveryCallback,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            inner: Arc::new(CoordinatorInner {
                probes: MediaProbes::new(config, runner),
                node_store,
                identity: RwLock::new(None),
                status,
                callback,
            }),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Start the loop. The first cycle runs immediately.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scanner already running");
            return;
        }

        // a previous loop may still be finishing its last cycle
        if let Some(previous) = self.task.lock().await.take() {
            if let Err(e) = previous.await {
                warn!("Previous scan loop ended abnormally: {}", e);
            }
        }

        let identity = self.inner.refresh_identity().await;
        info!(
            "Starting scanner for node {} ({}), interval {:?}",
            identity.node_id,
            identity.node_name,
            identity.scan_interval()
        );
        if !identity.is_supported_platform() {
            warn!(
                "Platform {} is not supported, scanning tools are only wired up for {}",
                identity.platform, SUPPORTED_PLATFORM
            );
        }
        {
            let mut status = self.inner.status.write().await;
            status.running = true;
            status.node_id = Some(identity.node_id.clone());
        }

        let inner = Arc::clone(&self.inner);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let handle = tokio::spawn(async move {
            info!("Scan loop started");
            loop {
                inner.run_cycle().await;

                let interval = inner.current_identity().await.scan_interval();
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Scan loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                    }
                }
            }
            info!("Scan loop stopped");
        });

        *self.task.lock().await = Some(handle);
    }

    /// Stop scheduling cycles. An in-flight cycle runs to completion.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("Scanner not running");
            return;
        }

        info!("Stopping scanner");
        let _ = self.shutdown_tx.send(());
        self.inner.status.write().await.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run one full cycle now, on the caller's task.
    pub async fn run_cycle(&self) {
        self.inner.run_cycle().await;
    }

    /// Probe every enabled, available medium once and return the results.
    ///
    /// Does not invoke the callback, touch scanning flags, or count cycles.
    pub async fn run_manual_scan(&self) -> Vec<Discovery> {
        self.inner.run_manual_scan().await
    }

    pub async fn status(&self) -> ScannerStatus {
        self.inner.status.read().await.clone()
    }

    pub fn shared_status(&self) -> SharedStatus {
        Arc::clone(&self.inner.status)
    }

    /// Set the per-medium availability flags.
    pub async fn apply_capabilities(&self, availability: MediumAvailability) {
        self.inner.status.write().await.available = availability;
    }
}

impl CoordinatorInner {
    /// Re-read the identity file, falling back to the last good copy.
    async fn refresh_identity(&self) -> NodeIdentity {
        let store = self.node_store.clone();
        let loaded = tokio::task::spawn_blocking(move || store.load_or_create())
            .await
            .map_err(|e| e.to_string())
            .and_then(|result| result.map_err(|e| e.to_string()));

        match loaded {
            Ok(identity) => {
                *self.identity.write().await = Some(identity.clone());
                identity
            }
            Err(e) => {
                warn!(
                    "Failed to read node identity from {}: {}",
                    self.node_store.path().display(),
                    e
                );
                self.current_identity().await
            }
        }
    }

    async fn current_identity(&self) -> NodeIdentity {
        let mut cached = self.identity.write().await;
        cached.get_or_insert_with(NodeIdentity::default).clone()
    }

    async fn run_cycle(&self) {
        let identity = self.refresh_identity().await;
        let available = self.status.read().await.available;
        debug!("Scan cycle starting");

        let gps = self.acquire_gps(&identity, available, Tracking::Cycle).await;

        if identity.enable_ble && available.ble {
            let scan = self.probe(Medium::Ble, Tracking::Cycle, self.probes.ble());
            if let Some(devices) = scan.await {
                for device in devices {
                    self.emit(DiscoveredSignal::Ble(device), gps.as_ref()).await;
                }
            }
        }

        if identity.enable_wifi && available.wifi {
            let scan = self.probe(Medium::Wifi, Tracking::Cycle, self.probes.wifi());
            if let Some(networks) = scan.await {
                for network in networks {
                    self.emit(DiscoveredSignal::Wifi(network), gps.as_ref()).await;
                }
            }
        }

        if identity.enable_sdr && available.sdr {
            for band in &self.probes.config().sdr_bands {
                let sweep = self.probe(Medium::Sdr, Tracking::Cycle, self.probes.sdr_band(band));
                if let Some(signals) = sweep.await {
                    for signal in signals {
                        self.emit(DiscoveredSignal::Sdr(signal), gps.as_ref()).await;
                    }
                }
            }
        }

        let cycles = {
            let mut status = self.status.write().await;
            status.cycles_completed += 1;
            status.last_cycle_at = Some(Utc::now());
            status.cycles_completed
        };
        metrics::SCAN_CYCLES.inc();
        debug!("Scan cycle {} complete", cycles);
    }

    async fn run_manual_scan(&self) -> Vec<Discovery> {
        let identity = self.current_identity().await;
        let available = self.status.read().await.available;
        let gps = self.acquire_gps(&identity, available, Tracking::Manual).await;

        let mut signals = Vec::new();
        if identity.enable_ble && available.ble {
            let scan = self.probe(Medium::Ble, Tracking::Manual, self.probes.ble());
            if let Some(devices) = scan.await {
                signals.extend(devices.into_iter().map(DiscoveredSignal::Ble));
            }
        }
        if identity.enable_wifi && available.wifi {
            let scan = self.probe(Medium::Wifi, Tracking::Manual, self.probes.wifi());
            if let Some(networks) = scan.await {
                signals.extend(networks.into_iter().map(DiscoveredSignal::Wifi));
            }
        }
        if identity.enable_sdr && available.sdr {
            for band in &self.probes.config().sdr_bands {
                let sweep = self.probe(Medium::Sdr, Tracking::Manual, self.probes.sdr_band(band));
                if let Some(found) = sweep.await {
                    signals.extend(found.into_iter().map(DiscoveredSignal::Sdr));
                }
            }
        }

        info!("Manual scan found {} signal(s)", signals.len());
        signals
            .into_iter()
            .map(|signal| Discovery::new(signal, gps.clone()))
            .collect()
    }

    /// Read GPS if possible; otherwise the last good fix, then the static position.
    async fn acquire_gps(
        &self,
        identity: &NodeIdentity,
        available: MediumAvailability,
        tracking: Tracking,
    ) -> Option<GpsFix> {
        if identity.enable_gps && available.gps {
            if let Some(fix) = self.probe(Medium::Gps, tracking, self.probes.gps()).await {
                self.status.write().await.last_gps = Some(fix.clone());
                return Some(fix);
            }
        }

        if let Some(fix) = self.status.read().await.last_gps.clone() {
            return Some(fix);
        }

        self.probes
            .config()
            .static_position
            .as_ref()
            .map(|position| GpsFix {
                latitude: position.latitude,
                longitude: position.longitude,
                altitude: position.altitude,
                speed: None,
                heading: None,
                accuracy_meters: position.accuracy_meters,
                timestamp_ms: Utc::now().timestamp_millis(),
            })
    }

    /// Run one medium's probe inside its failure boundary.
    ///
    /// The scanning flag (cycle probes only) is set for exactly the duration
    /// of the probe and is cleared on success, error or panic.
    async fn probe<T, F>(&self, medium: Medium, tracking: Tracking, probe: F) -> Option<T>
    where
        F: Future<Output = Result<T, ScanError>>,
    {
        if tracking == Tracking::Cycle {
            self.status.write().await.scanning.set(medium, true);
        }
        let timer = metrics::PROBE_DURATION
            .with_label_values(&[medium.as_str()])
            .start_timer();

        let outcome = AssertUnwindSafe(probe).catch_unwind().await;

        timer.observe_duration();
        if tracking == Tracking::Cycle {
            self.status.write().await.scanning.set(medium, false);
        }

        match outcome {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!("{}", e);
                metrics::PROBE_FAILURES
                    .with_label_values(&[medium.as_str()])
                    .inc();
                None
            }
            Err(_) => {
                error!("{} probe panicked", medium);
                metrics::PROBE_FAILURES
                    .with_label_values(&[medium.as_str()])
                    .inc();
                None
            }
        }
    }

    /// Count one record and hand it to the callback.
    async fn emit(&self, signal: DiscoveredSignal, gps: Option<&GpsFix>) {
        let medium = signal.medium();
        self.status.write().await.discoveries_total += 1;
        metrics::DISCOVERIES.with_label_values(&[medium.as_str()]).inc();

        let callback = Arc::clone(&self.callback);
        let delivered =
            std::panic::catch_unwind(AssertUnwindSafe(|| callback(&signal, medium, gps)));
        if delivered.is_err() {
            error!("Discovery callback panicked on a {} record", medium);
        }
    }
}
