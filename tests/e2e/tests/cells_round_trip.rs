//! End-to-end scenarios: the messaging core talking to a loopback executing
//! cell, including mixed-version deployments.

use cells_e2e_tests::LoopbackCell;
use cells_rpc::{
    Args, CellsApi, CellsConfig, CellsError, ProtocolVersion, RequestContext,
    CURRENT_RPC_API_VERSION,
};
use serde_json::json;
use std::sync::Arc;

const TOPIC: &str = "cells.region-east";

fn api_against(cell: Arc<LoopbackCell>, caller_cap: ProtocolVersion) -> CellsApi {
    let mut config = CellsConfig::new("top.region-east", TOPIC);
    config.api_version_cap = caller_cap;
    CellsApi::new(config, cell).unwrap()
}

#[test_log::test(tokio::test)]
async fn proxy_call_round_trips_losslessly() -> anyhow::Result<()> {
    let cell = Arc::new(LoopbackCell::new(TOPIC, CURRENT_RPC_API_VERSION));
    let api = api_against(cell.clone(), CURRENT_RPC_API_VERSION);
    let ctx = RequestContext::new();

    let mut kwargs = Args::new();
    kwargs.insert("flavor".to_string(), json!("m1.small"));
    let result = api
        .call_compute_api_method(
            &ctx,
            "top.region-east.rack12",
            "resize_instance",
            vec![json!("inst-7")],
            kwargs,
        )
        .await?;

    // The destination decoded exactly what we encoded.
    assert_eq!(
        result,
        json!({
            "ran_in_cell": "top.region-east.rack12",
            "method": "resize_instance",
            "method_args": ["inst-7"],
            "method_kwargs": {"flavor": "m1.small"},
            "call": true,
        })
    );
    Ok(())
}

#[test_log::test(tokio::test)]
async fn casts_reach_the_cell_without_blocking_on_results() -> anyhow::Result<()> {
    let cell = Arc::new(LoopbackCell::new(TOPIC, CURRENT_RPC_API_VERSION));
    let api = api_against(cell.clone(), CURRENT_RPC_API_VERSION);
    let ctx = RequestContext::new();

    api.instance_update_at_top(&ctx, json!({"uuid": "inst-1", "vm_state": "active"}))
        .await?;
    api.instance_destroy_at_top(&ctx, json!({"uuid": "inst-2"}))
        .await?;
    api.sync_instances(&ctx, Some("proj-1"), None, false).await?;

    let seen = cell.casts_seen();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].method, "instance_update_at_top");
    assert_eq!(seen[1].method, "instance_destroy_at_top");
    assert_eq!(seen[2].method, "sync_instances");
    assert_eq!(seen[2].version, ProtocolVersion::new(1, 1));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn service_queries_filter_at_the_executing_cell() -> anyhow::Result<()> {
    let cell = Arc::new(LoopbackCell::new(TOPIC, CURRENT_RPC_API_VERSION));
    let api = api_against(cell, CURRENT_RPC_API_VERSION);
    let ctx = RequestContext::new();

    let mut filters = Args::new();
    filters.insert("disabled".to_string(), json!(false));
    let services = api.service_get_all(&ctx, filters).await?;
    assert_eq!(
        services,
        json!([{"host": "compute-1", "binary": "fabric-compute", "disabled": false}])
    );

    let service = api.service_get_by_compute_host(&ctx, "compute-2").await?;
    assert_eq!(service.get("host"), Some(&json!("compute-2")));

    let err = api
        .service_get_by_compute_host(&ctx, "compute-9")
        .await
        .unwrap_err();
    match err {
        CellsError::RemoteExecution { kind, .. } => assert_eq!(kind, "ComputeHostNotFound"),
        other => panic!("expected remote error, got {other:?}"),
    }
    Ok(())
}

#[test_log::test(tokio::test)]
async fn old_receiver_rejects_methods_newer_than_it_implements() {
    // The executing cell only implements up to 1.2; the caller is current.
    let cell = Arc::new(LoopbackCell::new(TOPIC, ProtocolVersion::new(1, 2)));
    let api = api_against(cell, CURRENT_RPC_API_VERSION);
    let ctx = RequestContext::new();

    // 1.2 methods interoperate.
    assert!(api.service_get_by_compute_host(&ctx, "compute-1").await.is_ok());

    // 1.4 methods are rejected by the remote with a well-defined error, not
    // silently misinterpreted.
    let err = api.compute_node_stats(&ctx).await.unwrap_err();
    match err {
        CellsError::RemoteExecution { kind, .. } => assert_eq!(kind, "UnsupportedRpcVersion"),
        other => panic!("expected remote rejection, got {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn old_caller_fails_locally_before_anything_is_sent() {
    let cell = Arc::new(LoopbackCell::new(TOPIC, CURRENT_RPC_API_VERSION));
    let api = api_against(cell.clone(), ProtocolVersion::new(1, 1));
    let ctx = RequestContext::new();

    // Base and 1.1 operations still work under the old cap.
    assert!(api.get_cell_info_for_neighbors(&ctx).await.is_ok());
    api.instance_fault_create_at_top(&ctx, json!({"id": 1}))
        .await
        .unwrap();

    // A 1.2 operation never leaves the caller.
    let err = api
        .service_get_all(&ctx, Args::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CellsError::InvalidArgument(_)));
    assert_eq!(cell.casts_seen().len(), 1);
}
