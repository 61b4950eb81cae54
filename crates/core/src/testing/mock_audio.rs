//! Mock audio backend for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};

use crate::audio::{AudioBackend, AudioError, PipelineExit, PipelinePlan, PipelineProcess};

/// First fake process id handed out.
const BASE_PID: u32 = 4000;

#[derive(Debug)]
struct SpawnedProcess {
    plan: PipelinePlan,
    killed: Arc<AtomicBool>,
    /// Taken when the test ends the process.
    exit_tx: Option<oneshot::Sender<Option<i32>>>,
}

/// Mock implementation of the [`AudioBackend`] trait.
///
/// Every spawn is recorded with its plan. Processes run until killed by the
/// controller or ended from the test with [`MockAudioBackend::exit`].
///
/// # Example
///
/// ```rust,ignore
/// use sigint_core::testing::MockAudioBackend;
///
/// let backend = MockAudioBackend::new();
/// // ... start a session through the controller ...
/// backend.exit(0, Some(1)).await;
/// assert_eq!(backend.live_count().await, 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockAudioBackend {
    spawned: Arc<RwLock<Vec<SpawnedProcess>>>,
    /// If set, the next spawn fails with this message.
    next_error: Arc<RwLock<Option<String>>>,
}

impl MockAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next spawn fail.
    pub async fn fail_next_spawn(&self, message: impl Into<String>) {
        *self.next_error.write().await = Some(message.into());
    }

    pub async fn spawn_count(&self) -> usize {
        self.spawned.read().await.len()
    }

    /// Plans of every successful spawn, oldest first.
    pub async fn plans(&self) -> Vec<PipelinePlan> {
        self.spawned.read().await.iter().map(|p| p.plan.clone()).collect()
    }

    /// Processes neither killed nor exited.
    pub async fn live_count(&self) -> usize {
        self.spawned
            .read()
            .await
            .iter()
            .filter(|p| p.exit_tx.is_some() && !p.killed.load(Ordering::SeqCst))
            .count()
    }

    pub async fn was_killed(&self, index: usize) -> bool {
        self.spawned
            .read()
            .await
            .get(index)
            .map(|p| p.killed.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// End the `index`th process on its own with `code`.
    pub async fn exit(&self, index: usize, code: Option<i32>) {
        let sender = self
            .spawned
            .write()
            .await
            .get_mut(index)
            .and_then(|p| p.exit_tx.take());
        if let Some(sender) = sender {
            let _ = sender.send(code);
        }
    }
}

#[async_trait]
impl AudioBackend for MockAudioBackend {
    async fn spawn(&self, plan: &PipelinePlan) -> Result<Box<dyn PipelineProcess>, AudioError> {
        if let Some(message) = self.next_error.write().await.take() {
            return Err(AudioError::SpawnFailed(message));
        }

        let mut spawned = self.spawned.write().await;
        let (exit_tx, exit_rx) = oneshot::channel();
        let killed = Arc::new(AtomicBool::new(false));
        let pid = BASE_PID + spawned.len() as u32;
        spawned.push(SpawnedProcess {
            plan: plan.clone(),
            killed: Arc::clone(&killed),
            exit_tx: Some(exit_tx),
        });

        Ok(Box::new(MockProcess {
            pid,
            program: plan.tuner.program.clone(),
            killed,
            exit_rx: Some(exit_rx),
        }))
    }
}

struct MockProcess {
    pid: u32,
    program: String,
    killed: Arc<AtomicBool>,
    exit_rx: Option<oneshot::Receiver<Option<i32>>>,
}

#[async_trait]
impl PipelineProcess for MockProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    async fn wait(&mut self) -> Result<PipelineExit, AudioError> {
        let code = match self.exit_rx.as_mut() {
            Some(rx) => match rx.await {
                Ok(code) => code,
                // backend dropped: the process never exits on its own
                Err(_) => std::future::pending().await,
            },
            None => std::future::pending().await,
        };
        self.exit_rx = None;
        Ok(PipelineExit {
            program: self.program.clone(),
            code,
        })
    }

    async fn kill(&mut self) -> Result<(), AudioError> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
