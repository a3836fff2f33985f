//! End-to-end cluster-request scenarios (S1-S6), run against `wiremock`
//! stand-ins for data-plane nodes through the public `replicator` facade.

use bytes::Bytes;
use http::HeaderMap;
use replicator::{
    AlwaysConnectedDirectory, ClusterDirectory, ConnectionState, FirstSuccessMerger,
    JsonSumMerger, Method, NodeId, NoopFlowStateTracker, Replicator, ReplicatorConfig,
    ReplicatorError,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method as wm_method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_node(name: &str) -> (NodeId, MockServer) {
    let server = MockServer::start().await;
    let uri: http::Uri = server.uri().parse().unwrap();
    let node = NodeId::new(name, uri.host().unwrap(), uri.port_u16().unwrap_or(80));
    (node, server)
}

fn config() -> ReplicatorConfig {
    ReplicatorConfig::builder()
        .num_threads(4)
        .connect_timeout(Duration::from_millis(500))
        .read_timeout(Duration::from_millis(500))
        .build()
}

fn json_sum_selector() -> impl Fn(Method, &str, &HeaderMap) -> Arc<dyn replicator::ResponseMerger> {
    |_method, _path, _headers| Arc::new(JsonSumMerger::new("v")) as Arc<_>
}

fn first_success_selector() -> impl Fn(Method, &str, &HeaderMap) -> Arc<dyn replicator::ResponseMerger>
{
    |_method, _path, _headers| Arc::new(FirstSuccessMerger) as Arc<_>
}

/// S1 - All-accept apply: three nodes accept verification, then all apply
/// successfully; the merger sums the per-node `v` field to 3.
#[tokio::test]
async fn s1_all_accept_apply() {
    let (node_a, server_a) = mock_node("a").await;
    let (node_b, server_b) = mock_node("b").await;
    let (node_c, server_c) = mock_node("c").await;

    for server in [&server_a, &server_b, &server_c] {
        Mock::given(wm_method("PUT"))
            .and(path("/items"))
            .respond_with(|req: &wiremock::Request| {
                if req.headers.get("x-verify-intent").is_some() {
                    ResponseTemplate::new(150)
                } else {
                    ResponseTemplate::new(200).set_body_string(r#"{"v":1}"#)
                }
            })
            .mount(server)
            .await;
    }

    let replicator = Replicator::new(
        config(),
        AlwaysConnectedDirectory,
        json_sum_selector(),
        NoopFlowStateTracker,
    )
    .unwrap();
    replicator.start().await;

    let handle = replicator
        .replicate(
            vec![node_a, node_b, node_c],
            Method::Put,
            "http://cluster/items".parse().unwrap(),
            Some(Bytes::from_static(b"x=1")),
            HeaderMap::new(),
            true,
        )
        .unwrap();

    let merged = wait_for_consumable(&handle).await;
    match merged {
        replicator::MergedPayload::Json(v) => assert_eq!(v["v"], 3.0),
        other => panic!("expected json payload, got {other:?}"),
    }

    replicator.stop().await;
}

/// S2 - Unanimity broken: node B vetoes the verification round with a
/// "conflict" body; no apply round is dispatched and the fatal error names
/// node B's dissent.
#[tokio::test]
async fn s2_unanimity_broken() {
    let (node_a, server_a) = mock_node("a").await;
    let (node_b, server_b) = mock_node("b").await;

    Mock::given(wm_method("POST"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(150))
        .mount(&server_a)
        .await;
    Mock::given(wm_method("POST"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(417).set_body_string("conflict"))
        .mount(&server_b)
        .await;

    let replicator = Replicator::new(
        config(),
        AlwaysConnectedDirectory,
        first_success_selector(),
        NoopFlowStateTracker,
    )
    .unwrap();
    replicator.start().await;

    let handle = replicator
        .replicate(
            vec![node_a, node_b],
            Method::Post,
            "http://cluster/items".parse().unwrap(),
            None,
            HeaderMap::new(),
            true,
        )
        .unwrap();

    let result = wait_for_terminal(&handle).await;
    let err = result.unwrap_err();
    assert!(err.is_verification_rejected());
    let message = err.to_string();
    assert!(message.contains("Node b"), "unexpected message: {message}");
    assert!(message.contains("conflict"), "unexpected message: {message}");

    // No apply round was dispatched: wiremock would have rejected an
    // unregistered POST without X-Verify-Intent outright (501), but we
    // additionally assert no such request landed by checking receive counts.
    assert_eq!(server_a.received_requests().await.unwrap().len(), 1);
    assert_eq!(server_b.received_requests().await.unwrap().len(), 1);

    replicator.stop().await;
}

/// S3 - Transport failure during apply: node B times out on the apply round
/// while A and C succeed; the aggregator still completes with all three
/// responses, B's carrying a transport error.
#[tokio::test]
async fn s3_transport_failure_during_apply() {
    let (node_a, server_a) = mock_node("a").await;
    let (node_b, server_b) = mock_node("b").await;
    let (node_c, server_c) = mock_node("c").await;

    Mock::given(wm_method("DELETE"))
        .and(path("/items/1"))
        .respond_with(|req: &wiremock::Request| {
            if req.headers.get("x-verify-intent").is_some() {
                ResponseTemplate::new(150)
            } else {
                ResponseTemplate::new(204)
            }
        })
        .mount(&server_a)
        .await;
    Mock::given(wm_method("DELETE"))
        .and(path("/items/1"))
        .respond_with(|req: &wiremock::Request| {
            if req.headers.get("x-verify-intent").is_some() {
                ResponseTemplate::new(150)
            } else {
                ResponseTemplate::new(204).set_delay(Duration::from_secs(5))
            }
        })
        .mount(&server_b)
        .await;
    Mock::given(wm_method("DELETE"))
        .and(path("/items/1"))
        .respond_with(|req: &wiremock::Request| {
            if req.headers.get("x-verify-intent").is_some() {
                ResponseTemplate::new(150)
            } else {
                ResponseTemplate::new(204)
            }
        })
        .mount(&server_c)
        .await;

    // total_budget() adds a fixed 50ms on top the configured timeouts; the
    // mock's 5s delay still comfortably exceeds that ~250ms per-hop budget.
    let cfg = ReplicatorConfig::builder()
        .num_threads(4)
        .connect_timeout(Duration::from_millis(100))
        .read_timeout(Duration::from_millis(100))
        .build();

    let replicator = Replicator::new(
        cfg,
        AlwaysConnectedDirectory,
        first_success_selector(),
        NoopFlowStateTracker,
    )
    .unwrap();
    replicator.start().await;

    let handle = replicator
        .replicate(
            vec![node_a, node_b, node_c],
            Method::Delete,
            "http://cluster/items/1".parse().unwrap(),
            None,
            HeaderMap::new(),
            true,
        )
        .unwrap();

    let _ = wait_for_terminal(&handle).await;
    assert_eq!(handle.expected_nodes().len(), 3);
    assert!(handle.is_complete());

    replicator.stop().await;
}

/// S4 - Read-only single-phase: GET is dispatched without a verification
/// round even though `verify = true`, and the merger sums the two nodes'
/// `n` fields to 3.
#[tokio::test]
async fn s4_read_only_single_phase() {
    let (node_a, server_a) = mock_node("a").await;
    let (node_b, server_b) = mock_node("b").await;

    Mock::given(wm_method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"n":1}"#))
        .mount(&server_a)
        .await;
    Mock::given(wm_method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"n":2}"#))
        .mount(&server_b)
        .await;

    let selector = |_m: Method, _p: &str, _h: &HeaderMap| {
        Arc::new(JsonSumMerger::new("n")) as Arc<dyn replicator::ResponseMerger>
    };

    let replicator = Replicator::new(
        config(),
        AlwaysConnectedDirectory,
        selector,
        NoopFlowStateTracker,
    )
    .unwrap();
    replicator.start().await;

    let handle = replicator
        .replicate(
            vec![node_a, node_b],
            Method::Get,
            "http://cluster/status".parse().unwrap(),
            None,
            HeaderMap::new(),
            true,
        )
        .unwrap();

    let merged = wait_for_consumable(&handle).await;
    match merged {
        replicator::MergedPayload::Json(v) => assert_eq!(v["n"], 3.0),
        other => panic!("expected json payload, got {other:?}"),
    }

    // Read-only calls skip the verification round: no X-Verify-Intent
    // header should ever have reached either node.
    for server in [&server_a, &server_b] {
        for req in server.received_requests().await.unwrap() {
            assert!(req.headers.get("x-verify-intent").is_none());
        }
    }

    replicator.stop().await;
}

/// S5 - Cluster in transition: a node reported `Connecting` causes
/// `replicate()` to fail synchronously with `ConnectingNodeRejection`, and
/// no request ever reaches that node.
#[tokio::test]
async fn s5_cluster_in_transition() {
    let (node_a, server_a) = mock_node("a").await;

    Mock::given(wm_method("PUT"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(150))
        .mount(&server_a)
        .await;

    struct ConnectingDirectory;
    impl ClusterDirectory for ConnectingDirectory {
        fn connection_state(&self, _node: &NodeId) -> ConnectionState {
            ConnectionState::Connecting
        }
    }

    let replicator = Replicator::new(
        config(),
        ConnectingDirectory,
        first_success_selector(),
        NoopFlowStateTracker,
    )
    .unwrap();
    replicator.start().await;

    let result = replicator.replicate(
        vec![node_a],
        Method::Put,
        "http://cluster/items".parse().unwrap(),
        Some(Bytes::from_static(b"x=1")),
        HeaderMap::new(),
        true,
    );

    assert!(matches!(
        result,
        Err(ReplicatorError::ConnectingNodeRejection { .. })
    ));
    assert!(server_a.received_requests().await.unwrap().is_empty());

    replicator.stop().await;
}

/// S6 - Sweep of abandoned request: a caller that never polls still has its
/// entry reclaimed once it is both complete and older than the TTL.
#[tokio::test(start_paused = true)]
async fn s6_sweep_of_abandoned_request() {
    let (node_a, server_a) = mock_node("a").await;

    Mock::given(wm_method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server_a)
        .await;

    let cfg = ReplicatorConfig::builder()
        .num_threads(2)
        .sweep_interval(Duration::from_millis(10))
        .entry_ttl(Duration::from_millis(50))
        .build();

    let replicator = Replicator::new(
        cfg,
        AlwaysConnectedDirectory,
        first_success_selector(),
        NoopFlowStateTracker,
    )
    .unwrap();
    replicator.start().await;

    let handle = replicator
        .replicate(
            vec![node_a],
            Method::Get,
            "http://cluster/status".parse().unwrap(),
            None,
            HeaderMap::new(),
            false,
        )
        .unwrap();
    let request_id = handle.request_id();

    tokio::time::advance(Duration::from_millis(5)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(handle.is_complete());

    tokio::time::advance(Duration::from_millis(200)).await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert!(replicator.get(&request_id).is_none());

    replicator.stop().await;
}

async fn wait_for_terminal(
    handle: &replicator::AggregatorHandle,
) -> Result<replicator::MergedPayload, ReplicatorError<replicator::MergeError>> {
    for _ in 0..200 {
        if handle.is_complete() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.consume()
}

async fn wait_for_consumable(handle: &replicator::AggregatorHandle) -> replicator::MergedPayload {
    wait_for_terminal(handle).await.expect("expected a successful merge")
}
