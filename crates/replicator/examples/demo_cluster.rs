//! Minimal in-process 3-node cluster exercising scenario S1 end-to-end: a
//! mutating `PUT` runs the verification round against all three nodes, then
//! applies, and the responses are merged by summing a JSON field.
//!
//! Run with `cargo run --example demo_cluster --features json-mergers`.

use bytes::Bytes;
use http::HeaderMap;
use replicator::{
    AlwaysConnectedDirectory, JsonSumMerger, Method, MergedPayload, NodeId, NoopFlowStateTracker,
    Replicator, ReplicatorConfig, ResponseMerger,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spawns a tiny HTTP/1.1 stub that answers every request with `150` to a
/// verification probe (`X-Verify-Intent` present) and `200 {"v":1}`
/// otherwise. Good enough to drive `NodeClient` without pulling in a full
/// server framework for a three-node demo.
async fn spawn_stub_node() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub node");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let Ok(n) = socket.read(&mut buf).await else { return };
                let request = String::from_utf8_lossy(&buf[..n]);
                let verifying = request.to_ascii_lowercase().contains("x-verify-intent");

                let response = if verifying {
                    "HTTP/1.1 150 Node Continue\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                        .to_string()
                } else {
                    let body = r#"{"v":1}"#;
                    format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    )
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

#[tokio::main]
async fn main() -> Result<(), Infallible> {
    let mut targets = Vec::new();
    for name in ["a", "b", "c"] {
        let addr = spawn_stub_node().await;
        targets.push(NodeId::new(name, addr.ip().to_string(), addr.port()));
    }

    let config = ReplicatorConfig::builder().num_threads(4).build();
    let selector = |_method: Method, _path: &str, _headers: &HeaderMap| {
        Arc::new(JsonSumMerger::new("v")) as Arc<dyn ResponseMerger>
    };
    let replicator = Replicator::new(config, AlwaysConnectedDirectory, selector, NoopFlowStateTracker)
        .expect("build replicator");
    replicator.start().await;

    let handle = replicator
        .replicate(
            targets,
            Method::Put,
            "http://cluster/items".parse().unwrap(),
            Some(Bytes::from_static(b"x=1")),
            HeaderMap::new(),
            true,
        )
        .expect("replicate");

    // The caller's synchronous prelude has already returned; poll until the
    // apply round (preceded by a verification round, since this is a
    // mutating call with verify=true) has finished.
    loop {
        if handle.is_complete() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    match handle.consume() {
        Ok(MergedPayload::Json(v)) => println!("merged result: {v}"),
        Ok(other) => println!("merged result: {other:?}"),
        Err(e) => println!("replication failed: {e}"),
    }

    replicator.stop().await;
    Ok(())
}
