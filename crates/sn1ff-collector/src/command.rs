//! Collector capability and its sn1ff_client subprocess adapter

use async_trait::async_trait;
use sn1ff_core::config::CollectorConfig;
use sn1ff_core::{Phase, RecordHandle, Result, Sn1ffError, Status, Ttl};
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Operations a check session needs from the collector
///
/// Every call is awaited to completion before the session moves on.
#[async_trait]
pub trait CollectorClient: Send + Sync {
    /// Allocate a new record and return its handle
    async fn open_record(&self) -> Result<RecordHandle>;

    /// Submit a record with its final status and time-to-live
    async fn submit_record(&self, handle: &RecordHandle, status: &Status, ttl: Ttl) -> Result<()>;
}

/// Captured output of one collector invocation
#[derive(Debug, Clone)]
pub struct CollectorOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
}

impl From<Output> for CollectorOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
            success: output.status.success(),
        }
    }
}

impl CollectorOutput {
    /// Diagnostic text: stdout when it has any, stderr otherwise
    pub fn diagnostic(&self) -> String {
        let stdout = self.stdout.trim();
        if stdout.is_empty() {
            self.stderr.trim().to_string()
        } else {
            stdout.to_string()
        }
    }

    fn rejected(&self, phase: Phase, diagnostic: String) -> Sn1ffError {
        Sn1ffError::CollectorRejected {
            phase,
            code: self.code,
            diagnostic,
        }
    }

    /// Interpret the output of an open call
    ///
    /// The handle is only trusted when the call fully succeeded and printed
    /// exactly one non-empty line.
    pub fn into_handle(self) -> Result<RecordHandle> {
        if !self.success {
            return Err(self.rejected(Phase::Begin, self.diagnostic()));
        }

        let mut lines = self.stdout.lines().map(str::trim).filter(|l| !l.is_empty());
        let handle = match (lines.next(), lines.next()) {
            (Some(line), None) => RecordHandle::parse(line)
                .map_err(|e| self.rejected(Phase::Begin, e.to_string()))?,
            (None, _) => {
                return Err(self.rejected(
                    Phase::Begin,
                    format!("collector printed no record handle: {}", self.stderr.trim()),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(self.rejected(
                    Phase::Begin,
                    format!("collector printed more than one line: {}", self.stdout.trim()),
                ))
            }
        };
        Ok(handle)
    }

    /// Interpret the output of a submit call
    pub fn into_submitted(self) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(self.rejected(Phase::End, self.diagnostic()))
        }
    }
}

/// Collector reached by running the `sn1ff_client` executable
#[derive(Debug, Clone)]
pub struct CommandCollector {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    remote_host: Option<String>,
}

impl CommandCollector {
    /// Create an adapter for `program`, placing `args` before each directive
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(60),
            remote_host: None,
        }
    }

    /// Build the adapter from configuration, locating the program once
    ///
    /// A program that cannot be found is a configuration error, reported
    /// here rather than on the first begin.
    pub fn resolve(config: &CollectorConfig) -> Result<Self> {
        config.validate()?;
        let program = which::which(&config.program).map_err(|e| {
            Sn1ffError::Config(format!(
                "collector program '{}' not found: {}",
                config.program, e
            ))
        })?;
        debug!("Resolved collector program to {}", program.display());

        let mut collector = Self::new(program, config.args.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs));
        if let Some(host) = &config.remote_host {
            collector = collector.with_remote_host(host.clone());
        }
        Ok(collector)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Submit to a remote sn1ff server instead of the local one
    pub fn with_remote_host(mut self, host: impl Into<String>) -> Self {
        self.remote_host = Some(host.into());
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn remote_host(&self) -> Option<&str> {
        self.remote_host.as_deref()
    }

    fn submit_args(&self, handle: &RecordHandle, status: &Status, ttl: Ttl) -> Vec<String> {
        let mut args = vec![
            "-e".to_string(),
            "-f".to_string(),
            handle.as_str().to_string(),
            "-s".to_string(),
            status.as_str().to_string(),
            "-t".to_string(),
            ttl.to_string(),
        ];
        if let Some(host) = &self.remote_host {
            args.push("-a".to_string());
            args.push(host.clone());
        }
        args
    }

    /// Run the collector once, bounded by the configured timeout
    #[instrument(skip_all, fields(program = %self.program.display(), phase = %phase))]
    async fn exec(&self, phase: Phase, directive: &[String]) -> Result<CollectorOutput> {
        debug!("Executing collector {:?} {:?}", self.args, directive);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(directive)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => CollectorOutput::from(output),
            Ok(Err(e)) => {
                return Err(Sn1ffError::CollectorUnavailable {
                    phase,
                    reason: format!("failed to execute {}: {}", self.program.display(), e),
                })
            }
            Err(_) => {
                warn!("Collector timed out after {:?}", self.timeout);
                return Err(Sn1ffError::CollectorUnavailable {
                    phase,
                    reason: format!("timed out after {}s", self.timeout.as_secs_f64()),
                });
            }
        };

        if !output.success {
            debug!("Collector failed ({:?}): {}", output.code, output.diagnostic());
        }

        Ok(output)
    }
}

#[async_trait]
impl CollectorClient for CommandCollector {
    async fn open_record(&self) -> Result<RecordHandle> {
        self.exec(Phase::Begin, &["-b".to_string()])
            .await?
            .into_handle()
    }

    async fn submit_record(&self, handle: &RecordHandle, status: &Status, ttl: Ttl) -> Result<()> {
        let args = self.submit_args(handle, status, ttl);
        self.exec(Phase::End, &args).await?.into_submitted()
    }
}
