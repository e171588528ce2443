//! In-memory collector for tests

use async_trait::async_trait;
use sn1ff_core::{Phase, RecordHandle, Result, Sn1ffError, Status, Ttl};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::CollectorClient;

/// A call observed by the mock collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorCall {
    Open,
    Submit {
        handle: String,
        status: String,
        ttl: u32,
    },
}

/// Scripted failure for the next call of one kind
#[derive(Debug, Clone)]
pub enum MockFailure {
    Unavailable(String),
    Rejected { code: i32, diagnostic: String },
}

impl MockFailure {
    fn into_error(self, phase: Phase) -> Sn1ffError {
        match self {
            MockFailure::Unavailable(reason) => Sn1ffError::CollectorUnavailable { phase, reason },
            MockFailure::Rejected { code, diagnostic } => Sn1ffError::CollectorRejected {
                phase,
                code: Some(code),
                diagnostic,
            },
        }
    }
}

#[derive(Default)]
struct MockState {
    handles: VecDeque<String>,
    open_failures: VecDeque<MockFailure>,
    submit_failures: VecDeque<MockFailure>,
    opened: usize,
    submitted: HashSet<String>,
    calls: Vec<CollectorCall>,
}

/// Mock collector
///
/// Clones share state, so a test can keep one clone to inspect calls after
/// handing another to a session. Like the real collector, it refuses a
/// second successful submission of the same handle.
#[derive(Clone, Default)]
pub struct MockCollector {
    state: Arc<Mutex<MockState>>,
}

impl MockCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out `handle` on the next successful open
    ///
    /// Without queued handles, opens return `/mock/sn1ff/record-<n>.snff`.
    pub fn with_handle(self, handle: impl Into<String>) -> Self {
        self.lock().handles.push_back(handle.into());
        self
    }

    pub fn fail_next_open(self, failure: MockFailure) -> Self {
        self.lock().open_failures.push_back(failure);
        self
    }

    pub fn fail_next_submit(self, failure: MockFailure) -> Self {
        self.lock().submit_failures.push_back(failure);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<CollectorCall> {
        self.lock().calls.clone()
    }

    pub fn submissions(&self) -> Vec<CollectorCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, CollectorCall::Submit { .. }))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CollectorClient for MockCollector {
    async fn open_record(&self) -> Result<RecordHandle> {
        let mut state = self.lock();
        state.calls.push(CollectorCall::Open);

        if let Some(failure) = state.open_failures.pop_front() {
            return Err(failure.into_error(Phase::Begin));
        }

        state.opened += 1;
        let raw = match state.handles.pop_front() {
            Some(handle) => handle,
            None => format!("/mock/sn1ff/record-{}.snff", state.opened),
        };
        RecordHandle::parse(raw)
    }

    async fn submit_record(&self, handle: &RecordHandle, status: &Status, ttl: Ttl) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(CollectorCall::Submit {
            handle: handle.to_string(),
            status: status.to_string(),
            ttl: ttl.minutes(),
        });

        if let Some(failure) = state.submit_failures.pop_front() {
            return Err(failure.into_error(Phase::End));
        }

        if !state.submitted.insert(handle.to_string()) {
            return Err(Sn1ffError::CollectorRejected {
                phase: Phase::End,
                code: Some(1),
                diagnostic: format!("record already submitted: {}", handle),
            });
        }
        Ok(())
    }
}
