//! Signal orchestrator implementation.
//!
//! Wires the capability prober, scan coordinator and audio controller around
//! one shared status record.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::audio::{AudioBackend, AudioController, AudioError, AudioRequest, AudioSessionState, TuneRequest};
use crate::capabilities::{CapabilityProber, CapabilityReport, MediumAvailability};
use crate::config::Config;
use crate::node::NodeStore;
use crate::process::CommandRunner;
use crate::scanner::{new_shared_status, Discovery, DiscoveryCallback, ScanCoordinator, ScannerStatus};

/// Facade over the prober, scan loop and audio channel.
pub struct SignalOrchestrator {
    config: Config,
    prober: CapabilityProber,
    coordinator: ScanCoordinator,
    audio: AudioController,
    running: AtomicBool,
}

impl SignalOrchestrator {
    pub fn new(
        config: Config,
        runner: Arc<dyn CommandRunner>,
        audio_backend: Arc<dyn AudioBackend>,
        callback: DiscoveryCallback,
    ) -> Self {
        let status = new_shared_status();
        let prober = CapabilityProber::new(config.capabilities.clone(), Arc::clone(&runner));
        let coordinator = ScanCoordinator::new(
            config.scanner.clone(),
            Arc::clone(&runner),
            NodeStore::new(config.node.clone()),
            Arc::clone(&status),
            callback,
        );
        let audio = AudioController::new(config.audio.clone(), runner, audio_backend, status);

        Self {
            config,
            prober,
            coordinator,
            audio,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Probe capabilities once, then start the scan loop.
    pub async fn start(&self) -> CapabilityReport {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return self.prober.dependency_status().await;
        }

        info!("Starting signal orchestrator");
        let report = self.check_capabilities().await;
        self.coordinator.start().await;
        report
    }

    /// Stop scheduling scan cycles and end any audio session.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            info!("Orchestrator not running");
        }
        self.coordinator.stop().await;
        self.audio.stop_audio().await;
        info!("Signal orchestrator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub async fn run_manual_scan(&self) -> Vec<Discovery> {
        self.coordinator.run_manual_scan().await
    }

    pub async fn status(&self) -> ScannerStatus {
        self.coordinator.status().await
    }

    pub async fn dependency_status(&self) -> CapabilityReport {
        self.prober.dependency_status().await
    }

    /// Re-run the capability check and apply it to the availability flags.
    pub async fn check_capabilities(&self) -> CapabilityReport {
        let report = self.prober.check_and_install_dependencies().await;
        let availability = report.availability();
        log_availability(&availability);
        self.coordinator.apply_capabilities(availability).await;
        report
    }

    pub async fn start_audio(&self, request: AudioRequest) -> Result<AudioSessionState, AudioError> {
        self.audio.start_audio(request).await
    }

    pub async fn stop_audio(&self) -> AudioSessionState {
        self.audio.stop_audio().await
    }

    pub async fn tune_audio(&self, request: TuneRequest) -> Result<AudioSessionState, AudioError> {
        self.audio.tune_audio(request).await
    }

    pub async fn audio_status(&self) -> AudioSessionState {
        self.audio.audio_status().await
    }
}

fn log_availability(availability: &MediumAvailability) {
    info!(
        "Media available: ble={} wifi={} sdr={} gps={} audio={}",
        availability.ble, availability.wifi, availability.sdr, availability.gps, availability.audio
    );
}
