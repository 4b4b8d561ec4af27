//! # Cells RPC — control-plane messaging for a tree of compute cells
//!
//! A cell is an autonomous compute partition with its own scheduler, database,
//! and hypervisor fleet; cells form a strict tree rooted at the "top" cell.
//! This crate is the messaging layer that lets any cell issue operations —
//! instance-state propagation, service discovery, arbitrary proxied calls —
//! routed by name to a specific cell or to the top, tolerating version skew
//! between cells upgraded at different times.
//!
//! ## How a message travels
//!
//! 1. A caller invokes a named operation on [`CellsApi`].
//! 2. The [`VersionResolver`] stamps the exact protocol version that
//!    operation requires (never the client's ceiling).
//! 3. An immutable [`Envelope`] (`{method, args, version}`) is built.
//! 4. The [`TopicResolver`] picks the destination topic — the cell's own
//!    configured topic, with proxy routing carried inside the args.
//! 5. The [`Dispatcher`] casts (fire-and-forget) or calls (request/response
//!    with timeout) through the injected [`CellsTransport`].
//!
//! The broker itself, the hypervisor driver, and persistence are external
//! collaborators; this crate only defines the seam they plug into.
//!
//! ## Example
//!
//! ```
//! use cells_rpc::test_utils::RecordingTransport;
//! use cells_rpc::{CellsApi, CellsConfig, RequestContext};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cells_rpc::CellsResult<()> {
//! let transport = Arc::new(RecordingTransport::new());
//! let api = CellsApi::new(CellsConfig::new("api", "cells.api"), transport.clone())?;
//!
//! let ctx = RequestContext::new();
//! api.instance_update_at_top(&ctx, json!({"uuid": "inst-1"})).await?;
//!
//! let sent = transport.only_cast();
//! assert_eq!(sent.envelope.method, "instance_update_at_top");
//! assert_eq!(sent.envelope.version.to_string(), "1.0");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod operations;
pub mod proxy;
pub mod test_utils;
pub mod topic;
pub mod version;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

pub use api::{BwUpdateInfo, CellsApi};
pub use config::CellsConfig;
pub use context::RequestContext;
pub use dispatch::{CallTimeout, DispatchMode, Dispatcher};
pub use envelope::{Args, Envelope};
pub use error::{CellsError, CellsResult};
pub use operations::CellMethod;
pub use proxy::{MethodInfo, ProxyCall, RpcProxyMessage};
pub use topic::{CellName, Destination, TopicResolver};
pub use version::{
    ProtocolVersion, VersionResolver, BASE_RPC_API_VERSION, CURRENT_RPC_API_VERSION,
};

/// The topic-based broker this core sends through.
///
/// Implementations own delivery, in-flight multiplexing, ordering, and call
/// timeouts; this core never retries and makes no ordering promise between
/// independently issued messages. The [`RequestContext`] is carried opaquely.
/// Tests supply fakes (see [`test_utils`]); production wires in the real
/// broker client.
#[async_trait]
pub trait CellsTransport: Send + Sync + Debug {
    /// Deliver at most once, without a reply. Fails only if the message
    /// cannot be enqueued.
    async fn cast(
        &self,
        context: &RequestContext,
        topic: &str,
        envelope: Envelope,
    ) -> CellsResult<()>;

    /// Deliver and wait for the remote's response or the timeout. Remote
    /// failures come back as [`CellsError::RemoteExecution`]; an elapsed
    /// timeout as [`CellsError::Timeout`].
    async fn call(
        &self,
        context: &RequestContext,
        topic: &str,
        envelope: Envelope,
        timeout: CallTimeout,
    ) -> CellsResult<Value>;
}
