//! Check session state machine
//!
//! A session binds one record handle to its lifecycle:
//!
//! ```text
//! NEW --begin--> OPEN --end--> CLOSED
//! ```
//!
//! Collector failures never move the session: a failed begin leaves it NEW,
//! a failed end leaves it OPEN with the same handle so the submit can be
//! repeated. CLOSED is terminal.

use sn1ff_collector::CollectorClient;
use sn1ff_core::{RecordHandle, Result, Sn1ffError, Status, Ttl};
use tracing::{debug, error, info, warn};

use crate::RecordWriter;

/// Lifecycle state of a check session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No record opened yet
    New,
    /// Record opened, observations may be appended
    Open(RecordHandle),
    /// Record submitted; the handle is consumed
    Closed(RecordHandle),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::New => "NEW",
            SessionState::Open(_) => "OPEN",
            SessionState::Closed(_) => "CLOSED",
        }
    }
}

/// One check's result record, from open to submission
///
/// Methods take `&mut self`, so a session is driven by exactly one owner.
/// Independent sessions share nothing but the collector.
pub struct CheckSession<C: CollectorClient> {
    collector: C,
    writer: RecordWriter,
    state: SessionState,
    appended: usize,
}

impl<C: CollectorClient> CheckSession<C> {
    pub fn new(collector: C) -> Self {
        Self {
            collector,
            writer: RecordWriter::new(),
            state: SessionState::New,
            appended: 0,
        }
    }

    /// Pick up a record opened by an earlier session whose submit failed
    pub fn resume(collector: C, handle: RecordHandle) -> Self {
        debug!("Resuming record {}", handle);
        Self {
            collector,
            writer: RecordWriter::new(),
            state: SessionState::Open(handle),
            appended: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle of the open or submitted record
    pub fn handle(&self) -> Option<&RecordHandle> {
        match &self.state {
            SessionState::New => None,
            SessionState::Open(handle) | SessionState::Closed(handle) => Some(handle),
        }
    }

    /// Lines appended through this session
    pub fn appended(&self) -> usize {
        self.appended
    }

    fn invalid_state(&self, operation: &'static str) -> Sn1ffError {
        error!(
            "Check session misuse: {} while {}",
            operation,
            self.state.name()
        );
        Sn1ffError::InvalidState {
            operation,
            state: self.state.name(),
        }
    }

    /// Open a record with the collector
    pub async fn begin(&mut self) -> Result<RecordHandle> {
        if self.state != SessionState::New {
            return Err(self.invalid_state("begin"));
        }

        match self.collector.open_record().await {
            Ok(handle) => {
                info!("Opened check record {}", handle);
                self.state = SessionState::Open(handle.clone());
                Ok(handle)
            }
            Err(e) => {
                warn!("Could not open check record: {}", e);
                Err(e)
            }
        }
    }

    /// Append one observation line to the record's local storage
    ///
    /// Never contacts the collector. The line is on disk when this returns.
    pub async fn append(&mut self, text: &str) -> Result<()> {
        let handle = match &self.state {
            SessionState::Open(handle) => handle,
            _ => return Err(self.invalid_state("append")),
        };

        self.writer.append_line(handle, text).await?;
        self.appended += 1;
        debug!("Appended line {} to {}", self.appended, handle);
        Ok(())
    }

    /// Submit the record with its final status and TTL in minutes
    ///
    /// Arguments are validated before the collector is contacted. On a
    /// collector failure the session stays OPEN and `end` may be repeated.
    pub async fn end(&mut self, status: &str, ttl: i64) -> Result<()> {
        if !matches!(self.state, SessionState::Open(_)) {
            return Err(self.invalid_state("end"));
        }
        let status = Status::new(status)?;
        let ttl = Ttl::new(ttl)?;
        self.submit(&status, ttl).await
    }

    /// Submit with already validated arguments
    pub async fn submit(&mut self, status: &Status, ttl: Ttl) -> Result<()> {
        let handle = match &self.state {
            SessionState::Open(handle) => handle.clone(),
            _ => return Err(self.invalid_state("end")),
        };

        if !status.is_known() {
            warn!(
                "Status '{}' is not one of {:?}; submitting anyway",
                status,
                Status::KNOWN
            );
        }

        match self.collector.submit_record(&handle, status, ttl).await {
            Ok(()) => {
                info!(
                    "Submitted check record {} (status {}, ttl {}m)",
                    handle, status, ttl
                );
                self.state = SessionState::Closed(handle);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Submit failed, record {} kept for resubmission: {}",
                    handle, e
                );
                Err(e)
            }
        }
    }

    /// Begin, append every line, then end
    ///
    /// On failure the session is left in whatever state the failing step
    /// allows, so the caller can inspect [`CheckSession::handle`].
    pub async fn run<I, S>(&mut self, lines: I, status: &str, ttl: i64) -> Result<RecordHandle>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let status = Status::new(status)?;
        let ttl = Ttl::new(ttl)?;

        let handle = self.begin().await?;
        for line in lines {
            self.append(line.as_ref()).await?;
        }
        self.submit(&status, ttl).await?;
        Ok(handle)
    }
}
