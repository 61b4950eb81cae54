//! Tuner → sink process pipeline.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::capabilities::RTL_FM;

use super::error::AudioError;
use super::types::{AudioSink, DemodMode, Gain};

/// Fully resolved session parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSettings {
    pub frequency_hz: u64,
    pub mode: DemodMode,
    pub gain: Gain,
    pub squelch: u32,
    pub sample_rate: u32,
}

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl StageCommand {
    pub fn command_line(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// What to spawn for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePlan {
    pub tuner: StageCommand,
    pub sink: StageCommand,
}

impl PipelinePlan {
    /// Builds the tuner and sink command lines.
    pub fn new(
        settings: &AudioSettings,
        sink: AudioSink,
        device_index: u32,
        ppm_correction: i32,
    ) -> Self {
        let mut args = vec![
            "-f".to_string(),
            settings.frequency_hz.to_string(),
            "-M".to_string(),
            settings.mode.modulation().to_string(),
            "-s".to_string(),
            settings.mode.intermediate_rate().to_string(),
            "-r".to_string(),
            settings.sample_rate.to_string(),
        ];
        if let Gain::Db(db) = settings.gain {
            args.push("-g".to_string());
            args.push(db.to_string());
        }
        if settings.squelch > 0 {
            args.push("-l".to_string());
            args.push(settings.squelch.to_string());
        }
        if ppm_correction != 0 {
            args.push("-p".to_string());
            args.push(ppm_correction.to_string());
        }
        args.push("-d".to_string());
        args.push(device_index.to_string());
        args.push("-".to_string());

        let rate = settings.sample_rate.to_string();
        let sink_args: Vec<&str> = match sink {
            AudioSink::Aplay => vec!["-q", "-r", &rate, "-f", "S16_LE", "-t", "raw", "-c", "1"],
            AudioSink::Play => vec![
                "-q",
                "-t",
                "raw",
                "-r",
                &rate,
                "-e",
                "signed-integer",
                "-b",
                "16",
                "-c",
                "1",
                "-",
            ],
        };

        Self {
            tuner: StageCommand {
                program: RTL_FM.to_string(),
                args,
            },
            sink: StageCommand {
                program: sink.program().to_string(),
                args: sink_args.into_iter().map(String::from).collect(),
            },
        }
    }
}

/// How a pipeline ended on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineExit {
    /// The stage that exited first.
    pub program: String,
    pub code: Option<i32>,
}

impl fmt::Display for PipelineExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} exited with status {}", self.program, code),
            None => write!(f, "{} was terminated by a signal", self.program),
        }
    }
}

/// Handle to a running pipeline.
#[async_trait]
pub trait PipelineProcess: Send {
    /// Process id of the tuner stage.
    fn id(&self) -> Option<u32>;

    /// Resolves when any stage exits.
    async fn wait(&mut self) -> Result<PipelineExit, AudioError>;

    /// Kills every stage and reaps them.
    async fn kill(&mut self) -> Result<(), AudioError>;
}

/// Seam for spawning pipelines.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    async fn spawn(&self, plan: &PipelinePlan) -> Result<Box<dyn PipelineProcess>, AudioError>;
}

/// Spawns real processes, piping tuner stdout into the sink.
#[derive(Debug, Clone, Default)]
pub struct ProcessAudioBackend;

impl ProcessAudioBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AudioBackend for ProcessAudioBackend {
    async fn spawn(&self, plan: &PipelinePlan) -> Result<Box<dyn PipelineProcess>, AudioError> {
        debug!(
            "Spawning audio pipeline: {} | {}",
            plan.tuner.command_line(),
            plan.sink.command_line()
        );

        let mut tuner = Command::new(&plan.tuner.program)
            .args(&plan.tuner.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AudioError::SpawnFailed(format!("{}: {}", plan.tuner.program, e)))?;

        let Some(tuner_out) = tuner.stdout.take() else {
            let _ = tuner.start_kill();
            return Err(AudioError::SpawnFailed(format!(
                "{} stdout not captured",
                plan.tuner.program
            )));
        };
        let sink_in: Stdio = match tuner_out.try_into() {
            Ok(stdio) => stdio,
            Err(e) => {
                let _ = tuner.start_kill();
                return Err(AudioError::Io(e));
            }
        };

        let sink = match Command::new(&plan.sink.program)
            .args(&plan.sink.args)
            .stdin(sink_in)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let _ = tuner.start_kill();
                let _ = tuner.wait().await;
                return Err(AudioError::SpawnFailed(format!("{}: {}", plan.sink.program, e)));
            }
        };

        Ok(Box::new(ProcessPipeline {
            tuner,
            sink,
            tuner_program: plan.tuner.program.clone(),
            sink_program: plan.sink.program.clone(),
        }))
    }
}

struct ProcessPipeline {
    tuner: Child,
    sink: Child,
    tuner_program: String,
    sink_program: String,
}

#[async_trait]
impl PipelineProcess for ProcessPipeline {
    fn id(&self) -> Option<u32> {
        self.tuner.id()
    }

    async fn wait(&mut self) -> Result<PipelineExit, AudioError> {
        let (program, status) = tokio::select! {
            status = self.tuner.wait() => (self.tuner_program.clone(), status?),
            status = self.sink.wait() => (self.sink_program.clone(), status?),
        };
        // one stage alone is useless; take the other down with it
        self.kill().await?;
        Ok(PipelineExit {
            program,
            code: status.code(),
        })
    }

    async fn kill(&mut self) -> Result<(), AudioError> {
        for child in [&mut self.tuner, &mut self.sink] {
            if let Err(e) = child.start_kill() {
                // already exited
                debug!("start_kill: {}", e);
            }
        }
        for (program, child) in [
            (&self.tuner_program, &mut self.tuner),
            (&self.sink_program, &mut self.sink),
        ] {
            if let Err(e) = child.wait().await {
                warn!("Failed to reap {}: {}", program, e);
            }
        }
        Ok(())
    }
}
