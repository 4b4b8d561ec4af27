//! Cast/call dispatch through an injected transport.
//!
//! The dispatcher is the only place this core touches the broker. It never
//! picks topics (the resolver does), never retries, and holds no state beyond
//! the transport handle; a cast returns as soon as the broker accepts the
//! message, and a call suspends for exactly the transport round-trip.

use crate::context::RequestContext;
use crate::envelope::Envelope;
use crate::error::CellsResult;
use crate::CellsTransport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// How a message travels: fire-and-forget or request/response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// At-most-once delivery, no result observed by the caller.
    Cast,
    /// Caller blocks for a result or a timeout.
    Call,
}

impl DispatchMode {
    pub const fn name(self) -> &'static str {
        match self {
            DispatchMode::Cast => "cast",
            DispatchMode::Call => "call",
        }
    }
}

/// Timeout applied to a call-mode dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTimeout {
    /// Let the transport apply its own configured default.
    TransportDefault,
    /// Block indefinitely.
    Unbounded,
    /// Give up after this long.
    After(Duration),
}

impl CallTimeout {
    pub const fn from_secs(secs: u64) -> Self {
        CallTimeout::After(Duration::from_secs(secs))
    }

    /// Wire encoding used when a timeout is tunnelled inside envelope args:
    /// seconds as an integer, `-1` for the transport default, `null` for
    /// unbounded. Explicit durations clamp to `i64::MAX` seconds so a huge
    /// value can never wrap into the negative sentinel range.
    pub fn wire_value(&self) -> Value {
        match self {
            CallTimeout::TransportDefault => Value::from(-1i64),
            CallTimeout::Unbounded => Value::Null,
            CallTimeout::After(duration) => {
                Value::from(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
            }
        }
    }

    /// Decode the wire encoding on the receiving side. Anything negative is
    /// the transport-default sentinel; unrecognized shapes degrade to it too.
    pub fn from_wire(value: &Value) -> Self {
        match value {
            Value::Null => CallTimeout::Unbounded,
            Value::Number(n) => match n.as_i64() {
                Some(secs) if secs >= 0 => CallTimeout::After(Duration::from_secs(secs as u64)),
                _ => CallTimeout::TransportDefault,
            },
            _ => CallTimeout::TransportDefault,
        }
    }
}

/// Sends envelopes through the transport chosen at construction time.
///
/// Tests inject a fake transport; production wires the broker client in. The
/// dispatcher itself is cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    transport: Arc<dyn CellsTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn CellsTransport>) -> Self {
        Self { transport }
    }

    /// Deliver without waiting for a result. Fails only if the broker cannot
    /// accept the message; remote-side processing errors are unobservable by
    /// design.
    pub async fn send_cast(
        &self,
        ctx: &RequestContext,
        topic: &str,
        envelope: Envelope,
    ) -> CellsResult<()> {
        trace!(
            method = %envelope.method,
            version = %envelope.version,
            topic,
            request_id = ctx.request_id(),
            "casting envelope"
        );
        self.transport.cast(ctx, topic, envelope).await
    }

    /// Deliver and block until a response or the timeout. The remote's return
    /// value comes back verbatim; its failures surface as
    /// [`RemoteExecution`](crate::CellsError::RemoteExecution).
    pub async fn send_call(
        &self,
        ctx: &RequestContext,
        topic: &str,
        envelope: Envelope,
        timeout: CallTimeout,
    ) -> CellsResult<Value> {
        debug!(
            method = %envelope.method,
            version = %envelope.version,
            topic,
            ?timeout,
            request_id = ctx.request_id(),
            "calling envelope"
        );
        self.transport.call(ctx, topic, envelope, timeout).await
    }
}
