//! Extraction oracle backed by a local model process.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::ScoutError;
use crate::websearch::{ExtractionOracle, OracleConfig};

/// Runs `<command> [args..] run <model>` with the prompt on stdin.
#[derive(Debug, Clone)]
pub struct OllamaOracle {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl OllamaOracle {
    /// Creates an oracle from configuration.
    #[must_use]
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
        }
    }

    /// Overrides the executable.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Sets arguments placed before `run <model>`.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Overrides the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ExtractionOracle for OllamaOracle {
    async fn extract(&self, prompt: &str, model: &str) -> Result<String, ScoutError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg("run")
            .arg(model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScoutError::oracle(model, format!("failed to start {}: {e}", self.command)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScoutError::oracle(model, "failed to capture stdin"))?;
        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| ScoutError::oracle(model, "failed to capture stdout"))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| ScoutError::oracle(model, "failed to capture stderr"))?;

        let input = prompt.as_bytes().to_vec();
        let stdin_task = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
        });

        let status = match timeout(self.timeout, child.wait()).await {
            Ok(status) => status.map_err(|e| ScoutError::oracle(model, format!("wait failed: {e}")))?,
            Err(_) => {
                let _ = child.kill().await;
                stdin_task.abort();
                stdout_task.abort();
                stderr_task.abort();
                return Err(ScoutError::oracle(
                    model,
                    format!("timed out after {}s", self.timeout.as_secs_f64()),
                ));
            }
        };

        if let Ok(Err(e)) = stdin_task.await {
            debug!(model = %model, error = %e, "Oracle closed stdin early");
        }
        let stdout = match stdout_task.await {
            Ok(Ok(buf)) => buf,
            Ok(Err(e)) => return Err(ScoutError::oracle(model, format!("reading stdout: {e}"))),
            Err(e) => return Err(ScoutError::oracle(model, format!("stdout task failed: {e}"))),
        };
        let stderr = match stderr_task.await {
            Ok(Ok(buf)) => buf,
            _ => Vec::new(),
        };

        let output = String::from_utf8_lossy(&stdout).trim().to_string();
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            if output.is_empty() {
                return Err(ScoutError::oracle(
                    model,
                    format!("exited with {status}: {}", stderr.trim()),
                ));
            }
            warn!(model = %model, status = %status, stderr = %stderr.trim(), "Oracle exited with error but produced output");
        }

        debug!(model = %model, bytes = output.len(), "Oracle answered");
        Ok(output)
    }
}
