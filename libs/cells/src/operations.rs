//! The fixed catalog of cells operations.
//!
//! The original control plane dispatched on bare method strings; here the
//! catalog is a closed enum so wire names, required versions, and default
//! dispatch modes are resolved at compile time and exhaustively testable.

use crate::dispatch::DispatchMode;
use crate::version::{ProtocolVersion, BASE_RPC_API_VERSION};

/// Every method a cell can address to another cell.
///
/// Declared in protocol order: methods added later in the protocol's life
/// carry higher required versions, never lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellMethod {
    // 1.0 — baseline
    RunComputeApiMethod,
    ScheduleRunInstance,
    InstanceUpdateAtTop,
    InstanceDestroyAtTop,
    InstanceDeleteEverywhere,
    InstanceFaultCreateAtTop,
    BwUsageUpdateAtTop,
    // 1.1
    GetCellInfoForNeighbors,
    SyncInstances,
    // 1.2
    ServiceGetAll,
    ServiceGetByComputeHost,
    ProxyRpcToManager,
    // 1.3
    TaskLogGetAll,
    // 1.4
    ComputeNodeGetAll,
    ComputeNodeGet,
    ComputeNodeStats,
}

impl CellMethod {
    /// Catalog in protocol order, for iteration in tests and receivers.
    pub const ALL: [CellMethod; 16] = [
        CellMethod::RunComputeApiMethod,
        CellMethod::ScheduleRunInstance,
        CellMethod::InstanceUpdateAtTop,
        CellMethod::InstanceDestroyAtTop,
        CellMethod::InstanceDeleteEverywhere,
        CellMethod::InstanceFaultCreateAtTop,
        CellMethod::BwUsageUpdateAtTop,
        CellMethod::GetCellInfoForNeighbors,
        CellMethod::SyncInstances,
        CellMethod::ServiceGetAll,
        CellMethod::ServiceGetByComputeHost,
        CellMethod::ProxyRpcToManager,
        CellMethod::TaskLogGetAll,
        CellMethod::ComputeNodeGetAll,
        CellMethod::ComputeNodeGet,
        CellMethod::ComputeNodeStats,
    ];

    /// The method string stamped on the envelope.
    pub const fn wire_name(self) -> &'static str {
        match self {
            CellMethod::RunComputeApiMethod => "run_compute_api_method",
            CellMethod::ScheduleRunInstance => "schedule_run_instance",
            CellMethod::InstanceUpdateAtTop => "instance_update_at_top",
            CellMethod::InstanceDestroyAtTop => "instance_destroy_at_top",
            CellMethod::InstanceDeleteEverywhere => "instance_delete_everywhere",
            CellMethod::InstanceFaultCreateAtTop => "instance_fault_create_at_top",
            CellMethod::BwUsageUpdateAtTop => "bw_usage_update_at_top",
            CellMethod::GetCellInfoForNeighbors => "get_cell_info_for_neighbors",
            CellMethod::SyncInstances => "sync_instances",
            CellMethod::ServiceGetAll => "service_get_all",
            CellMethod::ServiceGetByComputeHost => "service_get_by_compute_host",
            CellMethod::ProxyRpcToManager => "proxy_rpc_to_manager",
            CellMethod::TaskLogGetAll => "task_log_get_all",
            CellMethod::ComputeNodeGetAll => "compute_node_get_all",
            CellMethod::ComputeNodeGet => "compute_node_get",
            CellMethod::ComputeNodeStats => "compute_node_stats",
        }
    }

    /// The minimum protocol revision a receiver needs to interpret this
    /// method's argument shape.
    pub const fn required_version(self) -> ProtocolVersion {
        match self {
            CellMethod::RunComputeApiMethod
            | CellMethod::ScheduleRunInstance
            | CellMethod::InstanceUpdateAtTop
            | CellMethod::InstanceDestroyAtTop
            | CellMethod::InstanceDeleteEverywhere
            | CellMethod::InstanceFaultCreateAtTop
            | CellMethod::BwUsageUpdateAtTop => BASE_RPC_API_VERSION,
            CellMethod::GetCellInfoForNeighbors | CellMethod::SyncInstances => {
                ProtocolVersion::new(1, 1)
            }
            CellMethod::ServiceGetAll
            | CellMethod::ServiceGetByComputeHost
            | CellMethod::ProxyRpcToManager => ProtocolVersion::new(1, 2),
            CellMethod::TaskLogGetAll => ProtocolVersion::new(1, 3),
            CellMethod::ComputeNodeGetAll
            | CellMethod::ComputeNodeGet
            | CellMethod::ComputeNodeStats => ProtocolVersion::new(1, 4),
        }
    }

    /// The dispatch mode this method normally uses. The two tunnel methods
    /// (`run_compute_api_method`, `proxy_rpc_to_manager`) honor the `call`
    /// flag carried in their own arguments instead.
    pub const fn default_mode(self) -> DispatchMode {
        match self {
            CellMethod::ScheduleRunInstance
            | CellMethod::InstanceUpdateAtTop
            | CellMethod::InstanceDestroyAtTop
            | CellMethod::InstanceDeleteEverywhere
            | CellMethod::InstanceFaultCreateAtTop
            | CellMethod::BwUsageUpdateAtTop
            | CellMethod::SyncInstances => DispatchMode::Cast,
            CellMethod::RunComputeApiMethod
            | CellMethod::GetCellInfoForNeighbors
            | CellMethod::ServiceGetAll
            | CellMethod::ServiceGetByComputeHost
            | CellMethod::ProxyRpcToManager
            | CellMethod::TaskLogGetAll
            | CellMethod::ComputeNodeGetAll
            | CellMethod::ComputeNodeGet
            | CellMethod::ComputeNodeStats => DispatchMode::Call,
        }
    }

    /// Look up a method by its wire name, for the receiving side.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.wire_name() == name)
    }
}

impl std::fmt::Display for CellMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}
