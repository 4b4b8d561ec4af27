//! Fake transports for exercising the messaging core without a broker.

use crate::context::RequestContext;
use crate::dispatch::CallTimeout;
use crate::envelope::Envelope;
use crate::error::{CellsError, CellsResult};
use crate::CellsTransport;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One message as the transport saw it.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub context: RequestContext,
    pub topic: String,
    pub envelope: Envelope,
    /// Present for calls, absent for casts.
    pub timeout: Option<CallTimeout>,
}

/// A transport that records everything sent through it and answers calls
/// with a scripted response.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    casts: Mutex<Vec<SentMessage>>,
    calls: Mutex<Vec<SentMessage>>,
    response: Mutex<Value>,
    fail_next: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record sends and answer every call with `response`.
    pub fn with_response(response: Value) -> Self {
        Self {
            response: Mutex::new(response),
            ..Self::default()
        }
    }

    pub fn set_response(&self, response: Value) {
        *self.response.lock().unwrap() = response;
    }

    /// Make the next cast or call fail as if the broker were unreachable.
    pub fn fail_next_send(&self) {
        self.fail_next.store(true, Ordering::Relaxed);
    }

    pub fn casts(&self) -> Vec<SentMessage> {
        self.casts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<SentMessage> {
        self.calls.lock().unwrap().clone()
    }

    /// The single recorded cast; panics if there is not exactly one.
    pub fn only_cast(&self) -> SentMessage {
        let casts = self.casts();
        assert_eq!(casts.len(), 1, "expected exactly one cast, got {casts:?}");
        casts.into_iter().next().unwrap()
    }

    /// The single recorded call; panics if there is not exactly one.
    pub fn only_call(&self) -> SentMessage {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one call, got {calls:?}");
        calls.into_iter().next().unwrap()
    }

    fn check_failure(&self) -> CellsResult<()> {
        if self.fail_next.swap(false, Ordering::Relaxed) {
            return Err(CellsError::transport_unavailable("simulated broker outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl CellsTransport for RecordingTransport {
    async fn cast(
        &self,
        context: &RequestContext,
        topic: &str,
        envelope: Envelope,
    ) -> CellsResult<()> {
        self.check_failure()?;
        self.casts.lock().unwrap().push(SentMessage {
            context: context.clone(),
            topic: topic.to_string(),
            envelope,
            timeout: None,
        });
        Ok(())
    }

    async fn call(
        &self,
        context: &RequestContext,
        topic: &str,
        envelope: Envelope,
        timeout: CallTimeout,
    ) -> CellsResult<Value> {
        self.check_failure()?;
        self.calls.lock().unwrap().push(SentMessage {
            context: context.clone(),
            topic: topic.to_string(),
            envelope,
            timeout: Some(timeout),
        });
        Ok(self.response.lock().unwrap().clone())
    }
}

/// A transport that fails every operation with a fixed error.
#[derive(Debug)]
pub struct FailingTransport {
    error: CellsError,
}

impl FailingTransport {
    pub fn new(error: CellsError) -> Self {
        Self { error }
    }
}

impl Default for FailingTransport {
    fn default() -> Self {
        Self::new(CellsError::transport_unavailable("simulated failure"))
    }
}

#[async_trait]
impl CellsTransport for FailingTransport {
    async fn cast(&self, _: &RequestContext, _: &str, _: Envelope) -> CellsResult<()> {
        Err(self.error.clone())
    }

    async fn call(
        &self,
        _: &RequestContext,
        _: &str,
        _: Envelope,
        _: CallTimeout,
    ) -> CellsResult<Value> {
        Err(self.error.clone())
    }
}

/// A transport whose calls take a fixed amount of time, for exercising
/// timeout semantics. Enforces [`CallTimeout::After`] the way a real broker
/// client would; casts are accepted immediately.
#[derive(Debug)]
pub struct SlowTransport {
    delay: Duration,
    response: Value,
}

impl SlowTransport {
    pub fn new(delay: Duration, response: Value) -> Self {
        Self { delay, response }
    }
}

#[async_trait]
impl CellsTransport for SlowTransport {
    async fn cast(&self, _: &RequestContext, _: &str, _: Envelope) -> CellsResult<()> {
        Ok(())
    }

    async fn call(
        &self,
        _: &RequestContext,
        _: &str,
        _: Envelope,
        timeout: CallTimeout,
    ) -> CellsResult<Value> {
        match timeout {
            CallTimeout::After(limit) => {
                match tokio::time::timeout(limit, tokio::time::sleep(self.delay)).await {
                    Ok(()) => Ok(self.response.clone()),
                    Err(_) => Err(CellsError::timeout(limit)),
                }
            }
            CallTimeout::TransportDefault | CallTimeout::Unbounded => {
                tokio::time::sleep(self.delay).await;
                Ok(self.response.clone())
            }
        }
    }
}
