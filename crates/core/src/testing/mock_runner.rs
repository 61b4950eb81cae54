//! Mock command runner for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::process::{CommandOutput, CommandRequest, CommandRunner, ProcessError};

/// Canned response for a matched command.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Process finished with this output.
    Output(CommandOutput),
    /// Process hit its deadline.
    Timeout,
    /// Process could not be spawned.
    SpawnFailure(String),
}

impl MockResponse {
    /// Successful exit with the given stdout.
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self::Output(CommandOutput::ok(stdout))
    }

    /// Non-zero exit with the given stderr.
    pub fn exit(code: i32, stderr: impl Into<String>) -> Self {
        Self::Output(CommandOutput::failed(code, stderr))
    }

    fn into_result(self, request: &CommandRequest) -> Result<CommandOutput, ProcessError> {
        match self {
            Self::Output(out) => Ok(out),
            Self::Timeout => Err(ProcessError::Timeout {
                program: request.program.clone(),
                timeout_secs: request.timeout.as_secs(),
            }),
            Self::SpawnFailure(reason) => Err(ProcessError::spawn_failed(&request.program, reason)),
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    /// Matches when the command line starts with this prefix.
    prefix: String,
    response: MockResponse,
    /// Consumed after the first match.
    once: bool,
    /// Tools that become available after this rule matches with success.
    provides: Vec<String>,
}

/// Mock implementation of the [`CommandRunner`] trait.
///
/// Rules are matched against `CommandRequest::command_line()` by prefix, most
/// recently added first. Commands without a matching rule fail as if the
/// executable were missing.
///
/// # Example
///
/// ```rust,ignore
/// use sigint_core::testing::{MockResponse, MockRunner};
///
/// let runner = MockRunner::new();
/// runner.set_available(["iwlist"]).await;
/// runner.respond("iwlist", MockResponse::stdout(fixtures::IWLIST_SCAN)).await;
///
/// let calls = runner.recorded_calls().await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    available: Arc<RwLock<HashSet<String>>>,
    rules: Arc<RwLock<Vec<Rule>>>,
    calls: Arc<RwLock<Vec<CommandRequest>>>,
}

impl MockRunner {
    /// Create a new mock runner with nothing installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark tools as present on PATH.
    pub async fn set_available<I, S>(&self, tools: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut available = self.available.write().await;
        available.extend(tools.into_iter().map(Into::into));
    }

    /// Remove a tool from PATH.
    pub async fn remove_available(&self, tool: &str) {
        self.available.write().await.remove(tool);
    }

    /// Respond to every command starting with `prefix`.
    pub async fn respond(&self, prefix: impl Into<String>, response: MockResponse) {
        self.push_rule(prefix.into(), response, false, Vec::new()).await;
    }

    /// Respond to the next command starting with `prefix` only.
    pub async fn respond_once(&self, prefix: impl Into<String>, response: MockResponse) {
        self.push_rule(prefix.into(), response, true, Vec::new()).await;
    }

    /// Respond, and on success make `tools` available (simulates an install).
    pub async fn respond_and_provide<I, S>(
        &self,
        prefix: impl Into<String>,
        response: MockResponse,
        tools: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provides = tools.into_iter().map(Into::into).collect();
        self.push_rule(prefix.into(), response, false, provides).await;
    }

    async fn push_rule(&self, prefix: String, response: MockResponse, once: bool, provides: Vec<String>) {
        self.rules.write().await.push(Rule {
            prefix,
            response,
            once,
            provides,
        });
    }

    /// All commands run so far.
    pub async fn recorded_calls(&self) -> Vec<CommandRequest> {
        self.calls.read().await.clone()
    }

    /// Number of commands whose command line starts with `prefix`.
    pub async fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.command_line().starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn is_available(&self, program: &str) -> bool {
        self.available.read().await.contains(program)
    }

    async fn run(&self, request: CommandRequest) -> Result<CommandOutput, ProcessError> {
        self.calls.write().await.push(request.clone());

        let line = request.command_line();
        let matched = {
            let mut rules = self.rules.write().await;
            match rules.iter().rposition(|r| line.starts_with(&r.prefix)) {
                Some(idx) if rules[idx].once => Some(rules.remove(idx)),
                Some(idx) => Some(rules[idx].clone()),
                None => None,
            }
        };

        let Some(rule) = matched else {
            return Err(ProcessError::NotFound {
                program: request.program.clone(),
            });
        };

        let result = rule.response.into_result(&request);
        if matches!(&result, Ok(out) if out.success) && !rule.provides.is_empty() {
            self.available.write().await.extend(rule.provides);
        }
        result
    }
}
