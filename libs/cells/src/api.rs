//! The caller-facing cells operation catalog.
//!
//! Every method here is a thin, one-to-one mapping onto envelope building
//! plus dispatch with a fixed argument shape and required version. Inputs are
//! validated for required fields only; cross-field validation belongs to the
//! executing cell. Call-mode operations return the remote's structure
//! verbatim.

use crate::config::CellsConfig;
use crate::context::RequestContext;
use crate::dispatch::{CallTimeout, Dispatcher};
use crate::envelope::{to_arg_value, Args, Envelope};
use crate::error::{CellsError, CellsResult};
use crate::operations::CellMethod;
use crate::proxy::{MethodInfo, ProxyCall, RpcProxyMessage};
use crate::topic::{Destination, TopicResolver};
use crate::version::VersionResolver;
use crate::CellsTransport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Bandwidth usage rollup, repacked from the caller's positional fields into
/// the one named record the wire carries. The counter fields are renamed on
/// the way in (`ctr_in` becomes `last_ctr_in`); this mapping is specific to
/// this operation, not a generic rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BwUpdateInfo {
    pub uuid: String,
    pub mac: String,
    pub start_period: String,
    pub bw_in: u64,
    pub bw_out: u64,
    pub last_ctr_in: u64,
    pub last_ctr_out: u64,
    pub last_refreshed: Option<String>,
}

/// Entry point for issuing cells operations.
///
/// Holds the read-only resolution tables and the injected transport; value
/// objects are created per call, so concurrent callers need no coordination.
#[derive(Debug, Clone)]
pub struct CellsApi {
    config: Arc<CellsConfig>,
    topics: TopicResolver,
    versions: VersionResolver,
    dispatcher: Dispatcher,
}

impl CellsApi {
    pub fn new(config: CellsConfig, transport: Arc<dyn CellsTransport>) -> CellsResult<Self> {
        config.validate()?;
        let topics = TopicResolver::new(&config);
        let versions = VersionResolver::new(config.api_version_cap);
        Ok(Self {
            config: Arc::new(config),
            topics,
            versions,
            dispatcher: Dispatcher::new(transport),
        })
    }

    pub fn config(&self) -> &CellsConfig {
        &self.config
    }

    fn ensure_enabled(&self) -> CellsResult<()> {
        if !self.config.enable {
            return Err(CellsError::transport_unavailable(
                "cells messaging is disabled",
            ));
        }
        Ok(())
    }

    fn envelope_for(&self, method: CellMethod, args: Args) -> CellsResult<Envelope> {
        let version = self.versions.resolve(method)?;
        Envelope::new(method.wire_name(), version, args)
    }

    async fn cast_envelope(&self, ctx: &RequestContext, envelope: Envelope) -> CellsResult<()> {
        self.ensure_enabled()?;
        let topic = self.topics.resolve(&Destination::SelfCell)?;
        self.dispatcher.send_cast(ctx, &topic, envelope).await
    }

    async fn call_envelope(&self, ctx: &RequestContext, envelope: Envelope) -> CellsResult<Value> {
        self.ensure_enabled()?;
        let topic = self.topics.resolve(&Destination::SelfCell)?;
        self.dispatcher
            .send_call(ctx, &topic, envelope, self.config.default_call_timeout())
            .await
    }

    async fn cast_to_self(
        &self,
        ctx: &RequestContext,
        method: CellMethod,
        args: Args,
    ) -> CellsResult<()> {
        let envelope = self.envelope_for(method, args)?;
        self.cast_envelope(ctx, envelope).await
    }

    async fn call_to_self(
        &self,
        ctx: &RequestContext,
        method: CellMethod,
        args: Args,
    ) -> CellsResult<Value> {
        let envelope = self.envelope_for(method, args)?;
        self.call_envelope(ctx, envelope).await
    }

    /// Run a compute API method in a named cell without waiting for it.
    pub async fn cast_compute_api_method(
        &self,
        ctx: &RequestContext,
        cell_name: &str,
        method: &str,
        method_args: Vec<Value>,
        method_kwargs: Args,
    ) -> CellsResult<()> {
        let envelope = self.proxy_envelope(cell_name, method, method_args, method_kwargs, false)?;
        self.cast_envelope(ctx, envelope).await
    }

    /// Run a compute API method in a named cell and return its result.
    pub async fn call_compute_api_method(
        &self,
        ctx: &RequestContext,
        cell_name: &str,
        method: &str,
        method_args: Vec<Value>,
        method_kwargs: Args,
    ) -> CellsResult<Value> {
        let envelope = self.proxy_envelope(cell_name, method, method_args, method_kwargs, true)?;
        self.call_envelope(ctx, envelope).await
    }

    fn proxy_envelope(
        &self,
        cell_name: &str,
        method: &str,
        method_args: Vec<Value>,
        method_kwargs: Args,
        call: bool,
    ) -> CellsResult<Envelope> {
        let proxy = ProxyCall::new(
            cell_name.parse()?,
            MethodInfo::new(method, method_args, method_kwargs)?,
            call,
        );
        let version = self.versions.resolve(CellMethod::RunComputeApiMethod)?;
        proxy.into_envelope(version)
    }

    /// Hand a spawn request to the scheduler. The kwargs are whatever the
    /// scheduler's host-selection needs; this layer packs them unchanged
    /// under `host_sched_kwargs`.
    pub async fn schedule_run_instance(
        &self,
        ctx: &RequestContext,
        host_sched_kwargs: Args,
    ) -> CellsResult<()> {
        let mut args = Args::new();
        args.insert(
            "host_sched_kwargs".to_string(),
            Value::Object(host_sched_kwargs),
        );
        self.cast_to_self(ctx, CellMethod::ScheduleRunInstance, args)
            .await
    }

    /// Propagate an instance create/update toward the top cell.
    pub async fn instance_update_at_top(
        &self,
        ctx: &RequestContext,
        instance: Value,
    ) -> CellsResult<()> {
        let mut args = Args::new();
        args.insert("instance".to_string(), instance);
        self.cast_to_self(ctx, CellMethod::InstanceUpdateAtTop, args)
            .await
    }

    /// Propagate an instance destroy toward the top cell.
    pub async fn instance_destroy_at_top(
        &self,
        ctx: &RequestContext,
        instance: Value,
    ) -> CellsResult<()> {
        let mut args = Args::new();
        args.insert("instance".to_string(), instance);
        self.cast_to_self(ctx, CellMethod::InstanceDestroyAtTop, args)
            .await
    }

    /// Delete an instance in every cell that knows about it.
    pub async fn instance_delete_everywhere(
        &self,
        ctx: &RequestContext,
        instance: Value,
        delete_type: &str,
    ) -> CellsResult<()> {
        let mut args = Args::new();
        args.insert("instance".to_string(), instance);
        args.insert("delete_type".to_string(), Value::from(delete_type));
        self.cast_to_self(ctx, CellMethod::InstanceDeleteEverywhere, args)
            .await
    }

    /// Record an instance fault at the top cell.
    pub async fn instance_fault_create_at_top(
        &self,
        ctx: &RequestContext,
        instance_fault: Value,
    ) -> CellsResult<()> {
        let mut args = Args::new();
        args.insert("instance_fault".to_string(), instance_fault);
        self.cast_to_self(ctx, CellMethod::InstanceFaultCreateAtTop, args)
            .await
    }

    /// Roll a bandwidth usage sample up to the top cell.
    #[allow(clippy::too_many_arguments)]
    pub async fn bw_usage_update_at_top(
        &self,
        ctx: &RequestContext,
        uuid: &str,
        mac: &str,
        start_period: &str,
        bw_in: u64,
        bw_out: u64,
        ctr_in: u64,
        ctr_out: u64,
        last_refreshed: Option<String>,
    ) -> CellsResult<()> {
        let info = BwUpdateInfo {
            uuid: uuid.to_string(),
            mac: mac.to_string(),
            start_period: start_period.to_string(),
            bw_in,
            bw_out,
            last_ctr_in: ctr_in,
            last_ctr_out: ctr_out,
            last_refreshed,
        };
        let mut args = Args::new();
        args.insert("bw_update_info".to_string(), to_arg_value(&info)?);
        self.cast_to_self(ctx, CellMethod::BwUsageUpdateAtTop, args)
            .await
    }

    /// Fetch what this cell knows about its parent and child cells.
    pub async fn get_cell_info_for_neighbors(&self, ctx: &RequestContext) -> CellsResult<Value> {
        self.call_to_self(ctx, CellMethod::GetCellInfoForNeighbors, Args::new())
            .await
    }

    /// Ask child cells to re-sync instance state matching the filters.
    pub async fn sync_instances(
        &self,
        ctx: &RequestContext,
        project_id: Option<&str>,
        updated_since: Option<&str>,
        deleted: bool,
    ) -> CellsResult<()> {
        let mut args = Args::new();
        args.insert("project_id".to_string(), opt_str(project_id));
        args.insert("updated_since".to_string(), opt_str(updated_since));
        args.insert("deleted".to_string(), Value::from(deleted));
        self.cast_to_self(ctx, CellMethod::SyncInstances, args).await
    }

    /// List services across cells, matching the given filters.
    pub async fn service_get_all(&self, ctx: &RequestContext, filters: Args) -> CellsResult<Value> {
        let mut args = Args::new();
        args.insert("filters".to_string(), Value::Object(filters));
        self.call_to_self(ctx, CellMethod::ServiceGetAll, args).await
    }

    /// Look up the service record for a compute host.
    pub async fn service_get_by_compute_host(
        &self,
        ctx: &RequestContext,
        host_name: &str,
    ) -> CellsResult<Value> {
        let mut args = Args::new();
        args.insert("host_name".to_string(), Value::from(host_name));
        self.call_to_self(ctx, CellMethod::ServiceGetByComputeHost, args)
            .await
    }

    /// Forward a raw broker message to a topic, tunnelled through the cells
    /// tree. Returns the remote result only in call mode.
    pub async fn proxy_rpc_to_manager(
        &self,
        ctx: &RequestContext,
        rpc_message: Value,
        topic: &str,
        call: bool,
        timeout: CallTimeout,
    ) -> CellsResult<Option<Value>> {
        let message = RpcProxyMessage::new(rpc_message, topic, call, timeout);
        let envelope = self.envelope_for(CellMethod::ProxyRpcToManager, message.into_args())?;
        if call {
            Ok(Some(self.call_envelope(ctx, envelope).await?))
        } else {
            self.cast_envelope(ctx, envelope).await?;
            Ok(None)
        }
    }

    /// List task log entries matching the period and filters.
    pub async fn task_log_get_all(
        &self,
        ctx: &RequestContext,
        task_name: &str,
        period_beginning: &str,
        period_ending: &str,
        host: Option<&str>,
        state: Option<&str>,
    ) -> CellsResult<Value> {
        let mut args = Args::new();
        args.insert("task_name".to_string(), Value::from(task_name));
        args.insert("period_beginning".to_string(), Value::from(period_beginning));
        args.insert("period_ending".to_string(), Value::from(period_ending));
        args.insert("host".to_string(), opt_str(host));
        args.insert("state".to_string(), opt_str(state));
        self.call_to_self(ctx, CellMethod::TaskLogGetAll, args).await
    }

    /// List compute nodes, optionally filtered by hypervisor match.
    pub async fn compute_node_get_all(
        &self,
        ctx: &RequestContext,
        hypervisor_match: Option<&str>,
    ) -> CellsResult<Value> {
        let mut args = Args::new();
        args.insert("hypervisor_match".to_string(), opt_str(hypervisor_match));
        self.call_to_self(ctx, CellMethod::ComputeNodeGetAll, args)
            .await
    }

    /// Describe one compute node.
    pub async fn compute_node_get(
        &self,
        ctx: &RequestContext,
        compute_id: &str,
    ) -> CellsResult<Value> {
        let mut args = Args::new();
        args.insert("compute_id".to_string(), Value::from(compute_id));
        self.call_to_self(ctx, CellMethod::ComputeNodeGet, args).await
    }

    /// Aggregate stats across all compute nodes.
    pub async fn compute_node_stats(&self, ctx: &RequestContext) -> CellsResult<Value> {
        self.call_to_self(ctx, CellMethod::ComputeNodeStats, Args::new())
            .await
    }
}

fn opt_str(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::from(s),
        None => Value::Null,
    }
}
