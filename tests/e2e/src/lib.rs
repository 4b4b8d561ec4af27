//! Test fixtures: an in-memory executing cell the messaging core can talk to.

use async_trait::async_trait;
use cells_rpc::{
    Args, CallTimeout, CellMethod, CellsError, CellsResult, CellsTransport, Envelope,
    ProtocolVersion, ProxyCall, RequestContext, VersionResolver,
};
use serde_json::{json, Value};
use std::sync::Mutex;
use tracing::debug;

/// A loopback transport that behaves like the executing cell on the other
/// side of the broker: it decodes each envelope, enforces the inbound version
/// policy, and runs a small canned handler per method.
///
/// Unknown methods and unsupported versions come back as
/// [`CellsError::RemoteExecution`], the way a real remote rejection would.
#[derive(Debug)]
pub struct LoopbackCell {
    topic: String,
    versions: VersionResolver,
    services: Vec<Value>,
    casts_seen: Mutex<Vec<Envelope>>,
}

impl LoopbackCell {
    pub fn new(topic: impl Into<String>, version_cap: ProtocolVersion) -> Self {
        Self {
            topic: topic.into(),
            versions: VersionResolver::new(version_cap),
            services: vec![
                json!({"host": "compute-1", "binary": "fabric-compute", "disabled": false}),
                json!({"host": "compute-2", "binary": "fabric-compute", "disabled": true}),
            ],
            casts_seen: Mutex::new(Vec::new()),
        }
    }

    /// Envelopes delivered as casts, in arrival order.
    pub fn casts_seen(&self) -> Vec<Envelope> {
        self.casts_seen.lock().unwrap().clone()
    }

    fn accept(&self, envelope: &Envelope) -> CellsResult<CellMethod> {
        if envelope.method.is_empty() {
            return Err(CellsError::remote("BadRequest", "empty method"));
        }
        let method = CellMethod::from_wire_name(&envelope.method).ok_or_else(|| {
            CellsError::remote(
                "UnsupportedRpcMethod",
                format!("no handler for {}", envelope.method),
            )
        })?;
        self.versions
            .check_inbound(method, envelope.version)
            .map_err(|e| CellsError::remote("UnsupportedRpcVersion", e.to_string()))?;
        Ok(method)
    }

    fn execute(&self, method: CellMethod, envelope: &Envelope) -> CellsResult<Value> {
        match method {
            CellMethod::RunComputeApiMethod => {
                let proxy = ProxyCall::from_envelope(envelope)
                    .map_err(|e| CellsError::remote("BadRequest", e.to_string()))?;
                // Echo the decoded inner invocation back so tests can assert
                // the tunnel was lossless end to end.
                Ok(json!({
                    "ran_in_cell": proxy.cell_name.as_str(),
                    "method": proxy.method_info.method,
                    "method_args": proxy.method_info.method_args,
                    "method_kwargs": proxy.method_info.method_kwargs,
                    "call": proxy.call,
                }))
            }
            CellMethod::GetCellInfoForNeighbors => Ok(json!([
                {"name": "top", "relationship": "parent"},
                {"name": "top.sibling", "relationship": "child"},
            ])),
            CellMethod::ServiceGetAll => {
                let filters = envelope
                    .args
                    .get("filters")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();
                Ok(Value::Array(self.filter_services(&filters)))
            }
            CellMethod::ServiceGetByComputeHost => {
                let host = envelope.args.get("host_name").and_then(Value::as_str);
                self.services
                    .iter()
                    .find(|s| s.get("host").and_then(Value::as_str) == host)
                    .cloned()
                    .ok_or_else(|| {
                        CellsError::remote(
                            "ComputeHostNotFound",
                            format!("no service for host {host:?}"),
                        )
                    })
            }
            CellMethod::ComputeNodeStats => Ok(json!({"count": 2, "vcpus_used": 7})),
            _ => Err(CellsError::remote(
                "UnsupportedRpcMethod",
                format!("loopback cell has no handler for {method}"),
            )),
        }
    }

    fn filter_services(&self, filters: &Args) -> Vec<Value> {
        self.services
            .iter()
            .filter(|service| {
                filters
                    .iter()
                    .all(|(key, expected)| service.get(key) == Some(expected))
            })
            .cloned()
            .collect()
    }

    fn check_topic(&self, topic: &str) -> CellsResult<()> {
        if topic != self.topic {
            return Err(CellsError::transport_unavailable(format!(
                "no queue bound to topic {topic:?}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CellsTransport for LoopbackCell {
    async fn cast(
        &self,
        _context: &RequestContext,
        topic: &str,
        envelope: Envelope,
    ) -> CellsResult<()> {
        self.check_topic(topic)?;
        debug!(method = %envelope.method, "loopback cell received cast");
        // Remote-side failures on a cast are unobservable by the caller; the
        // envelope is recorded either way.
        self.casts_seen.lock().unwrap().push(envelope);
        Ok(())
    }

    async fn call(
        &self,
        _context: &RequestContext,
        topic: &str,
        envelope: Envelope,
        _timeout: CallTimeout,
    ) -> CellsResult<Value> {
        self.check_topic(topic)?;
        debug!(method = %envelope.method, version = %envelope.version, "loopback cell received call");
        let method = self.accept(&envelope)?;
        self.execute(method, &envelope)
    }
}
