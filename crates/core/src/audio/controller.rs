//! Single-session audio controller.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capabilities::{APLAY, RTL_FM, SOX_PLAY};
use crate::metrics;
use crate::process::CommandRunner;
use crate::scanner::SharedStatus;

use super::config::AudioConfig;
use super::error::AudioError;
use super::pipeline::{AudioBackend, AudioSettings, PipelinePlan, PipelineProcess};
use super::types::{AudioRequest, AudioSessionState, AudioSink, TuneRequest};

/// Tunable range of RTL2832U/R820T dongles.
pub const MIN_FREQUENCY_HZ: u64 = 24_000_000;
pub const MAX_FREQUENCY_HZ: u64 = 1_766_000_000;

/// Accepted output sample rates.
pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// No session is current.
const NO_SESSION: u64 = 0;

struct ActiveSession {
    id: u64,
    settings: AudioSettings,
    stop_tx: oneshot::Sender<()>,
    supervisor: JoinHandle<()>,
}

enum Outcome {
    Stopped,
    Exited(Result<super::pipeline::PipelineExit, AudioError>),
}

/// Owns at most one tuner → sink pipeline.
///
/// The session slot is a critical section: starting a session fully tears
/// down the previous one (kill and supervisor join) before spawning.
pub struct AudioController {
    config: AudioConfig,
    runner: Arc<dyn CommandRunner>,
    backend: Arc<dyn AudioBackend>,
    status: SharedStatus,
    session: Mutex<Option<ActiveSession>>,
    current_id: Arc<AtomicU64>,
    next_id: AtomicU64,
}

impl AudioController {
    pub fn new(
        config: AudioConfig,
        runner: Arc<dyn CommandRunner>,
        backend: Arc<dyn AudioBackend>,
        status: SharedStatus,
    ) -> Self {
        Self {
            config,
            runner,
            backend,
            status,
            session: Mutex::new(None),
            current_id: Arc::new(AtomicU64::new(NO_SESSION)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start a session, replacing any active one.
    ///
    /// Missing tools and spawn failures yield an inactive state with an
    /// error message; only out-of-range parameters are an `Err`.
    pub async fn start_audio(&self, request: AudioRequest) -> Result<AudioSessionState, AudioError> {
        let settings = self.resolve(&request);
        validate(&settings)?;

        let sink = match self.check_tools().await {
            Ok(sink) => sink,
            Err(e) => {
                warn!("Cannot start audio: {}", e);
                metrics::AUDIO_SESSIONS.with_label_values(&["missing_tools"]).inc();
                let state = AudioSessionState::failed(e.to_string());
                let mut status = self.status.write().await;
                if !status.audio.active {
                    status.audio = state.clone();
                }
                return Ok(state);
            }
        };

        let mut slot = self.session.lock().await;
        if let Some(previous) = slot.take() {
            self.teardown(previous).await;
        }

        let plan = PipelinePlan::new(
            &settings,
            sink,
            self.config.device_index,
            self.config.ppm_correction,
        );
        let process = match self.backend.spawn(&plan).await {
            Ok(process) => process,
            Err(e) => {
                warn!("Audio pipeline failed to start: {}", e);
                metrics::AUDIO_SESSIONS.with_label_values(&["spawn_failed"]).inc();
                let state = AudioSessionState::failed(e.to_string());
                self.status.write().await.audio = state.clone();
                return Ok(state);
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let state = AudioSessionState {
            active: true,
            frequency_hz: Some(settings.frequency_hz),
            mode: Some(settings.mode),
            gain: Some(settings.gain),
            squelch: settings.squelch,
            sample_rate: Some(settings.sample_rate),
            sink: Some(sink),
            pid: process.id(),
            started_at: Some(Utc::now()),
            error: None,
        };
        self.current_id.store(id, Ordering::SeqCst);
        self.status.write().await.audio = state.clone();

        let (stop_tx, stop_rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(
            id,
            process,
            stop_rx,
            Arc::clone(&self.current_id),
            Arc::clone(&self.status),
        ));
        *slot = Some(ActiveSession {
            id,
            settings: settings.clone(),
            stop_tx,
            supervisor,
        });

        metrics::AUDIO_SESSIONS.with_label_values(&["started"]).inc();
        info!(
            "Audio session {} started: {} Hz {} via {}",
            id,
            settings.frequency_hz,
            settings.mode,
            sink.program()
        );
        Ok(state)
    }

    /// Stop the active session. A no-op without one.
    pub async fn stop_audio(&self) -> AudioSessionState {
        let mut slot = self.session.lock().await;
        let Some(session) = slot.take() else {
            let mut state = self.status.read().await.audio.clone();
            state.active = false;
            return state;
        };

        let id = session.id;
        let exited = self.current_id.load(Ordering::SeqCst) != id;
        self.teardown(session).await;
        if exited {
            debug!("Audio session {} had already exited", id);
            return self.status.read().await.audio.clone();
        }

        let state = AudioSessionState::default();
        self.status.write().await.audio = state.clone();
        metrics::AUDIO_SESSIONS.with_label_values(&["stopped"]).inc();
        info!("Audio session {} stopped", id);
        state
    }

    /// Restart at a new frequency, keeping the current session's other
    /// parameters unless overridden.
    pub async fn tune_audio(&self, request: TuneRequest) -> Result<AudioSessionState, AudioError> {
        let current = self
            .session
            .lock()
            .await
            .as_ref()
            .map(|session| session.settings.clone());

        let start = AudioRequest {
            frequency_hz: request.frequency_hz,
            mode: request.mode.or(current.as_ref().map(|s| s.mode)),
            gain: request.gain.or(current.as_ref().map(|s| s.gain)),
            squelch: request.squelch.or(current.as_ref().map(|s| s.squelch)),
            sample_rate: current.as_ref().map(|s| s.sample_rate),
        };
        self.start_audio(start).await
    }

    pub async fn audio_status(&self) -> AudioSessionState {
        self.status.read().await.audio.clone()
    }

    fn resolve(&self, request: &AudioRequest) -> AudioSettings {
        AudioSettings {
            frequency_hz: request.frequency_hz,
            mode: request.mode.unwrap_or(self.config.default_mode),
            gain: request.gain.unwrap_or(self.config.default_gain),
            squelch: request.squelch.unwrap_or(self.config.default_squelch),
            sample_rate: request.sample_rate.unwrap_or(self.config.default_sample_rate),
        }
    }

    /// Live check for the tuner and a sink, `aplay` preferred.
    async fn check_tools(&self) -> Result<AudioSink, AudioError> {
        if !self.runner.is_available(RTL_FM).await {
            return Err(AudioError::missing_tool(RTL_FM));
        }
        if self.runner.is_available(APLAY).await {
            Ok(AudioSink::Aplay)
        } else if self.runner.is_available(SOX_PLAY).await {
            Ok(AudioSink::Play)
        } else {
            Err(AudioError::NoSink)
        }
    }

    async fn teardown(&self, session: ActiveSession) {
        self.current_id.store(NO_SESSION, Ordering::SeqCst);
        // the supervisor may already be gone after an unexpected exit
        let _ = session.stop_tx.send(());
        if let Err(e) = session.supervisor.await {
            warn!("Audio supervisor for session {} failed: {}", session.id, e);
        }
    }
}

/// Owns the pipeline until it is stopped or exits on its own.
async fn supervise(
    id: u64,
    mut process: Box<dyn PipelineProcess>,
    mut stop_rx: oneshot::Receiver<()>,
    current_id: Arc<AtomicU64>,
    status: SharedStatus,
) {
    let outcome = tokio::select! {
        _ = &mut stop_rx => Outcome::Stopped,
        exit = process.wait() => Outcome::Exited(exit),
    };

    match outcome {
        Outcome::Stopped => {
            if let Err(e) = process.kill().await {
                warn!("Failed to kill audio session {}: {}", id, e);
            }
        }
        Outcome::Exited(exit) => {
            let message = match exit {
                Ok(exit) => format!("audio pipeline exited unexpectedly: {}", exit),
                Err(e) => format!("audio pipeline failed: {}", e),
            };
            if current_id
                .compare_exchange(id, NO_SESSION, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                warn!("Audio session {}: {}", id, message);
                status.write().await.audio = AudioSessionState::failed(message);
                metrics::AUDIO_SESSIONS.with_label_values(&["exited"]).inc();
            }
        }
    }
}

fn validate(settings: &AudioSettings) -> Result<(), AudioError> {
    if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&settings.frequency_hz) {
        return Err(AudioError::InvalidRequest(format!(
            "frequency {} Hz outside {}..={} Hz",
            settings.frequency_hz, MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ
        )));
    }
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&settings.sample_rate) {
        return Err(AudioError::InvalidRequest(format!(
            "sample rate {} outside {}..={}",
            settings.sample_rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{DemodMode, Gain};
    use crate::scanner::new_shared_status;
    use crate::testing::{MockAudioBackend, MockRunner};

    async fn controller(tools: &[&str]) -> (AudioController, MockAudioBackend) {
        let runner = MockRunner::new();
        runner.set_available(tools.iter().copied()).await;
        let backend = MockAudioBackend::new();
        let controller = AudioController::new(
            AudioConfig::default(),
            Arc::new(runner),
            Arc::new(backend.clone()),
            new_shared_status(),
        );
        (controller, backend)
    }

    #[tokio::test]
    async fn test_stop_without_session_is_noop() {
        let (controller, backend) = controller(&[RTL_FM, APLAY]).await;
        let state = controller.stop_audio().await;
        assert!(!state.active);
        assert!(state.error.is_none());
        assert_eq!(backend.spawn_count().await, 0);
    }

    #[tokio::test]
    async fn test_start_replaces_previous_session() {
        let (controller, backend) = controller(&[RTL_FM, APLAY]).await;

        let first = controller.start_audio(AudioRequest::new(162_550_000)).await.unwrap();
        let second = controller
            .start_audio(AudioRequest::new(145_800_000).with_mode(DemodMode::Nfm))
            .await
            .unwrap();

        assert!(first.active && second.active);
        assert_ne!(first.pid, second.pid);
        assert_eq!(backend.spawn_count().await, 2);
        assert_eq!(backend.live_count().await, 1);
        assert!(backend.was_killed(0).await);
        assert!(!backend.was_killed(1).await);
        assert_eq!(controller.audio_status().await.frequency_hz, Some(145_800_000));
    }

    #[tokio::test]
    async fn test_missing_sink_spawns_nothing() {
        let (controller, backend) = controller(&[RTL_FM]).await;
        let state = controller.start_audio(AudioRequest::new(100_000_000)).await.unwrap();
        assert!(!state.active);
        assert!(state.error.as_deref().unwrap().contains("alsa-utils"));
        assert_eq!(backend.spawn_count().await, 0);
        assert_eq!(controller.audio_status().await, state);
    }

    #[tokio::test]
    async fn test_missing_tuner_names_package() {
        let (controller, _) = controller(&[APLAY]).await;
        let state = controller.start_audio(AudioRequest::new(100_000_000)).await.unwrap();
        assert!(state.error.as_deref().unwrap().contains("rtl-sdr"));
    }

    #[tokio::test]
    async fn test_sox_sink_when_no_aplay() {
        let (controller, backend) = controller(&[RTL_FM, SOX_PLAY]).await;
        let state = controller.start_audio(AudioRequest::new(100_000_000)).await.unwrap();
        assert_eq!(state.sink, Some(AudioSink::Play));
        assert_eq!(backend.plans().await[0].sink.program, "play");
    }

    #[tokio::test]
    async fn test_invalid_parameters_rejected() {
        let (controller, backend) = controller(&[RTL_FM, APLAY]).await;
        let low = controller.start_audio(AudioRequest::new(1_000_000)).await;
        assert!(matches!(low, Err(AudioError::InvalidRequest(_))));
        let rate = controller
            .start_audio(AudioRequest::new(100_000_000).with_sample_rate(400_000))
            .await;
        assert!(matches!(rate, Err(AudioError::InvalidRequest(_))));
        assert_eq!(backend.spawn_count().await, 0);
    }

    #[tokio::test]
    async fn test_unexpected_exit_resets_state() {
        let (controller, backend) = controller(&[RTL_FM, APLAY]).await;
        controller.start_audio(AudioRequest::new(162_550_000)).await.unwrap();

        backend.exit(0, Some(1)).await;

        let mut state = controller.audio_status().await;
        for _ in 0..50 {
            if !state.active {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            state = controller.audio_status().await;
        }
        assert!(!state.active);
        assert!(state.pid.is_none());
        assert!(state.error.as_deref().unwrap().contains("exited unexpectedly"));

        // stopping afterwards keeps the recorded exit
        let stopped = controller.stop_audio().await;
        assert!(!stopped.active);
        assert!(stopped.error.as_deref().unwrap().contains("exited unexpectedly"));
        assert_eq!(controller.audio_status().await, stopped);
        assert!(!backend.was_killed(0).await);
    }

    #[tokio::test]
    async fn test_tune_keeps_unspecified_parameters() {
        let (controller, backend) = controller(&[RTL_FM, APLAY]).await;
        controller
            .start_audio(
                AudioRequest::new(118_100_000)
                    .with_mode(DemodMode::Am)
                    .with_gain(Gain::Db(30.0))
                    .with_squelch(10),
            )
            .await
            .unwrap();

        let state = controller
            .tune_audio(TuneRequest {
                frequency_hz: 121_500_000,
                squelch: Some(0),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(state.active);
        assert_eq!(state.frequency_hz, Some(121_500_000));
        assert_eq!(state.mode, Some(DemodMode::Am));
        assert_eq!(state.gain, Some(Gain::Db(30.0)));
        assert_eq!(state.squelch, 0);
        assert_eq!(backend.live_count().await, 1);
    }

    #[tokio::test]
    async fn test_tune_without_session_uses_config_defaults() {
        let (controller, _) = controller(&[RTL_FM, APLAY]).await;
        let state = controller
            .tune_audio(TuneRequest {
                frequency_hz: 96_100_000,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(state.mode, Some(DemodMode::Nfm));
        assert_eq!(state.gain, Some(Gain::Auto));
        assert_eq!(state.sample_rate, Some(48_000));
    }
}
