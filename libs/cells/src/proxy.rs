//! Proxy and tunnel payload encoding.
//!
//! A proxy operation names a further operation to execute at a remote cell,
//! adding one layer of indirection: the outer envelope's method is always the
//! fixed dispatcher name (`run_compute_api_method`), and the inner
//! `method_info` is opaque to every intermediate cell on the path. New remote
//! operations therefore need no protocol version bump, only a new inner
//! method name.
//!
//! A second, lower-level tunnel (`proxy_rpc_to_manager`, gated at 1.2)
//! forwards raw broker messages that are not modeled as named operations at
//! all; its payload passes through unmodified.

use crate::dispatch::CallTimeout;
use crate::envelope::{to_arg_value, Args, Envelope};
use crate::error::{CellsError, CellsResult};
use crate::operations::CellMethod;
use crate::topic::CellName;
use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The inner invocation a proxy call carries: a method name plus its
/// positional and named arguments. Only the final destination cell ever
/// interprets this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub method: String,
    #[serde(default)]
    pub method_args: Vec<Value>,
    #[serde(default)]
    pub method_kwargs: Args,
}

impl MethodInfo {
    pub fn new(
        method: impl Into<String>,
        method_args: Vec<Value>,
        method_kwargs: Args,
    ) -> CellsResult<Self> {
        let method = method.into();
        if method.is_empty() {
            return Err(CellsError::invalid_argument(
                "proxied method name must not be empty",
            ));
        }
        Ok(Self {
            method,
            method_args,
            method_kwargs,
        })
    }
}

/// A fully-addressed proxy invocation: the inner method, the cell to run it
/// in, and whether the remote invocation must block for a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyCall {
    pub method_info: MethodInfo,
    pub cell_name: CellName,
    pub call: bool,
}

impl ProxyCall {
    pub fn new(cell_name: CellName, method_info: MethodInfo, call: bool) -> Self {
        Self {
            method_info,
            cell_name,
            call,
        }
    }

    /// Wrap into the outer envelope, stamped with the dispatcher method's
    /// resolved version.
    pub fn into_envelope(self, version: ProtocolVersion) -> CellsResult<Envelope> {
        let args = match to_arg_value(&self)? {
            Value::Object(map) => map,
            other => {
                return Err(CellsError::invalid_argument(format!(
                    "proxy payload did not serialize to an object: {other}"
                )))
            }
        };
        Envelope::new(CellMethod::RunComputeApiMethod.wire_name(), version, args)
    }

    /// Decode at the receiving side. Lossless inverse of [`into_envelope`]:
    /// the destination cell sees exactly the method, args, and call flag the
    /// sender encoded.
    ///
    /// [`into_envelope`]: ProxyCall::into_envelope
    pub fn from_envelope(envelope: &Envelope) -> CellsResult<Self> {
        if envelope.method != CellMethod::RunComputeApiMethod.wire_name() {
            return Err(CellsError::invalid_argument(format!(
                "not a proxy envelope: {}",
                envelope.method
            )));
        }
        serde_json::from_value(Value::Object(envelope.args.clone()))
            .map_err(|e| CellsError::invalid_argument(e.to_string()))
    }
}

/// A raw broker message to forward to an arbitrary topic: the low-level
/// tunnel for calls that are not modeled as named cells operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcProxyMessage {
    pub rpc_message: Value,
    pub topic: String,
    pub call: bool,
    pub timeout: CallTimeout,
}

impl RpcProxyMessage {
    pub fn new(rpc_message: Value, topic: impl Into<String>, call: bool, timeout: CallTimeout) -> Self {
        Self {
            rpc_message,
            topic: topic.into(),
            call,
            timeout,
        }
    }

    /// Argument shape of the `proxy_rpc_to_manager` envelope.
    pub fn into_args(self) -> Args {
        let mut args = Args::new();
        args.insert("rpc_message".to_string(), self.rpc_message);
        args.insert("topic".to_string(), Value::from(self.topic));
        args.insert("call".to_string(), Value::from(self.call));
        args.insert("timeout".to_string(), self.timeout.wire_value());
        args
    }

    /// Receiving-side decode of the `proxy_rpc_to_manager` argument shape.
    pub fn from_args(args: &Args) -> CellsResult<Self> {
        let rpc_message = args
            .get("rpc_message")
            .cloned()
            .ok_or_else(|| CellsError::invalid_argument("missing rpc_message"))?;
        let topic = args
            .get("topic")
            .and_then(Value::as_str)
            .ok_or_else(|| CellsError::invalid_argument("missing topic"))?
            .to_string();
        let call = args
            .get("call")
            .and_then(Value::as_bool)
            .ok_or_else(|| CellsError::invalid_argument("missing call flag"))?;
        let timeout = args
            .get("timeout")
            .map(CallTimeout::from_wire)
            .unwrap_or(CallTimeout::TransportDefault);
        Ok(Self {
            rpc_message,
            topic,
            call,
            timeout,
        })
    }
}
