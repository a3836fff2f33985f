//! `Replicator`: the two-phase orchestrator (spec §4.5).

use crate::config::ReplicatorConfig;
use crate::events::EngineEvent;
use crate::headers::{self, VERIFY_ACCEPT_STATUS};
use crate::hooks::{DynClusterDirectory, FlowStateTracker, MergerSelector};
use bytes::Bytes;
use http::HeaderMap;
use replicator_aggregator::{
    AggregatorHandle, MergeError, MergedPayload, ResponseAggregator, ResponseMerger,
};
use replicator_client::{NodeClient, NodeClientBuildError};
use replicator_core::{
    EventListeners, Method, NodeId, NodeOutcome, NodeRequest, NodeResponse, NodeTransportError,
    ReplicatorError, RequestId,
};
use replicator_maintenance::{MaintenanceConfig, MaintenanceLoop};
use replicator_registry::{RegistryError, RequestRegistry};
use replicator_stateguard::{ClusterDirectory, StateGuard};
use replicator_outlier::SlowNodeMonitor;
use replicator_workerpool::WorkerPool;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The cluster-wide HTTP request replicator. Owns the worker pool, the
/// request registry, the slow-node monitor, and the maintenance task; holds
/// the host-supplied `ClusterDirectory`, `MergerSelector`, and
/// `FlowStateTracker` as type-erased trait objects so callers do not have to
/// thread generic parameters through every call site.
pub struct Replicator {
    client: NodeClient,
    registry: Arc<RequestRegistry>,
    pool: Arc<WorkerPool>,
    state_guard: StateGuard<DynClusterDirectory>,
    merger_selector: Arc<dyn MergerSelector>,
    flow_tracker: Arc<dyn FlowStateTracker>,
    slow_monitor: Arc<SlowNodeMonitor>,
    maintenance: MaintenanceLoop,
    event_listeners: Arc<EventListeners<EngineEvent>>,
    node_request_budget: Duration,
}

impl Replicator {
    pub fn new(
        config: ReplicatorConfig,
        directory: impl ClusterDirectory + 'static,
        merger_selector: impl MergerSelector + 'static,
        flow_tracker: impl FlowStateTracker + 'static,
    ) -> Result<Self, NodeClientBuildError> {
        Self::with_event_listeners(
            config,
            directory,
            merger_selector,
            flow_tracker,
            EventListeners::new(),
        )
    }

    pub fn with_event_listeners(
        config: ReplicatorConfig,
        directory: impl ClusterDirectory + 'static,
        merger_selector: impl MergerSelector + 'static,
        flow_tracker: impl FlowStateTracker + 'static,
        event_listeners: EventListeners<EngineEvent>,
    ) -> Result<Self, NodeClientBuildError> {
        let node_request_budget = config.node_client.total_budget();
        let client = NodeClient::new(config.node_client)?;
        let registry = Arc::new(RequestRegistry::new(config.registry));
        let pool = Arc::new(WorkerPool::new(config.worker_pool));
        let directory: DynClusterDirectory = Arc::new(directory);
        let state_guard = StateGuard::new(directory);
        let slow_monitor = Arc::new(SlowNodeMonitor::new(config.slow_node));
        let maintenance = MaintenanceLoop::new(
            Arc::clone(&registry),
            MaintenanceConfig::builder()
                .sweep_interval(config.sweep_interval)
                .entry_ttl(config.entry_ttl)
                .build(),
        );

        Ok(Self {
            client,
            registry,
            pool,
            state_guard,
            merger_selector: Arc::new(merger_selector),
            flow_tracker: Arc::new(flow_tracker),
            slow_monitor,
            maintenance,
            event_listeners: Arc::new(event_listeners),
            node_request_budget,
        })
    }

    /// Starts the background maintenance sweep. The worker pool is already
    /// live once `Replicator` is constructed.
    pub async fn start(&self) {
        self.maintenance.start().await;
    }

    /// Stops the maintenance sweep and drains the worker pool, awaiting
    /// every in-flight `NodeRequest`.
    pub async fn stop(&self) {
        self.maintenance.stop().await;
        self.pool.stop().await;
    }

    /// Polling lookup; returns `None` once the entry has been consumed or
    /// swept.
    pub fn get(&self, request_id: &RequestId) -> Option<AggregatorHandle> {
        self.registry.lookup(request_id)
    }

    /// `Replicate(targets, method, uri, body, headers, verify) ->
    /// AggregatorHandle` (spec §4.5). Runs the synchronous prelude
    /// (validation, `StateGuard`, registry capacity, aggregator
    /// construction) on the caller's thread and returns as soon as dispatch
    /// has been handed to a background task — no node is necessarily
    /// contacted yet by the time this returns.
    pub fn replicate(
        &self,
        targets: Vec<NodeId>,
        method: Method,
        uri: http::Uri,
        body: Option<Bytes>,
        mut headers: HeaderMap,
        verify: bool,
    ) -> Result<AggregatorHandle, ReplicatorError<MergeError>> {
        if targets.is_empty() {
            self.reject_synchronously("empty target node set");
            return Err(ReplicatorError::InvalidArgument {
                message: "target node set must not be empty".to_string(),
            });
        }
        if uri.scheme().is_none() {
            self.reject_synchronously("uri is not absolute");
            return Err(ReplicatorError::InvalidArgument {
                message: format!("uri {uri} is not absolute"),
            });
        }

        let request_id = headers::extract_or_generate_request_id(&mut headers);
        let uri_path = uri.path().to_string();

        if verify {
            if let Err(err) = self.state_guard.check::<MergeError>(method, &targets) {
                self.reject_synchronously("cluster in transition");
                return Err(err);
            }
        }

        let merger = self.merger_selector.select(method, &uri_path, &headers);
        let expected: HashSet<NodeId> = targets.iter().cloned().collect();
        let aggregator = ResponseAggregator::new(
            request_id.clone(),
            method,
            uri_path.clone(),
            expected,
            merger,
        );

        self.wire_hooks(&aggregator, method, &uri_path);

        self.registry
            .insert(request_id.clone(), aggregator.clone())
            .map_err(|RegistryError::Overloaded { max_concurrent }| {
                self.reject_synchronously("request registry at capacity");
                ReplicatorError::Overloaded { max_concurrent }
            })?;

        let two_phase = verify && method.is_mutating();
        self.event_listeners.emit(&EngineEvent::Dispatched {
            request_id: request_id.clone(),
            timestamp: Instant::now(),
            method,
            node_count: targets.len(),
            two_phase,
        });

        let pool = Arc::clone(&self.pool);
        let client = self.client.clone();
        let flow_tracker = Arc::clone(&self.flow_tracker) as Arc<dyn FlowStateTracker>;
        let event_listeners = Arc::clone(&self.event_listeners);
        let budget = self.node_request_budget;
        let dispatch_aggregator = aggregator.clone();

        tokio::spawn(async move {
            if two_phase {
                run_two_phase(
                    pool,
                    client,
                    targets,
                    method,
                    uri,
                    uri_path,
                    body,
                    headers,
                    budget,
                    dispatch_aggregator,
                    flow_tracker,
                    event_listeners,
                )
                .await;
            } else {
                run_apply(pool, client, targets, method, uri, body, headers, budget, dispatch_aggregator).await;
            }
        });

        Ok(aggregator)
    }

    fn reject_synchronously(&self, reason: &'static str) {
        self.event_listeners.emit(&EngineEvent::RejectedSynchronously {
            timestamp: Instant::now(),
            reason,
        });
    }

    /// Wires `onComplete = notifyFlowStateTracker + slowNodeEvaluation +
    /// operator event` and `onConsume = registry.Remove(requestId)` (§4.5
    /// step 4), once, before the aggregator is shared with any worker.
    fn wire_hooks(&self, aggregator: &AggregatorHandle, method: Method, uri_path: &str) {
        let flow_tracker = Arc::clone(&self.flow_tracker);
        let slow_monitor = Arc::clone(&self.slow_monitor);
        let event_listeners = Arc::clone(&self.event_listeners);
        let uri_path_owned = uri_path.to_string();
        // Captured up front: calling back into the aggregator from inside
        // its own `on_complete` hook would re-lock a mutex already held by
        // `complete_locked` and deadlock.
        let expected_node_count = aggregator.expected_nodes().len();

        aggregator.on_complete(move |request_id, responses| {
            flow_tracker.mutation_completes(method, &uri_path_owned);

            let durations: Vec<(NodeId, Duration)> =
                responses.iter().map(|r| (r.node.clone(), r.duration)).collect();
            let _ = slow_monitor.evaluate(&durations);

            event_listeners.emit(&EngineEvent::Completed {
                request_id: request_id.clone(),
                timestamp: Instant::now(),
                fatal: responses.len() < expected_node_count,
            });
        });

        let registry = Arc::clone(&self.registry);
        aggregator.on_consume(move |request_id| {
            registry.remove(request_id);
        });
    }
}

/// Rewrites `uri`'s authority against `node`'s host/port, keeping the
/// scheme and path/query (spec §3: "targetURI reconstructed against that
/// node's host/port").
fn rewrite_uri_for_node(uri: &http::Uri, node: &NodeId) -> Result<http::Uri, String> {
    let scheme = uri.scheme_str().unwrap_or("http");
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    format!("{scheme}://{}:{}{}", node.api_host, node.api_port, path_and_query)
        .parse::<http::Uri>()
        .map_err(|e| e.to_string())
}

/// Consumes the single-consumer body (or the transport error) of a
/// verification dissent into a human-readable explanation, matching
/// scenario S2's `"Node B is unable to fulfill this request due to:
/// conflict"`.
fn dissent_explanation(response: &NodeResponse) -> String {
    match &response.outcome {
        NodeOutcome::Success { body, .. } => {
            let bytes = body.take().unwrap_or_default();
            String::from_utf8_lossy(&bytes).into_owned()
        }
        NodeOutcome::Error(err) => err.to_string(),
    }
}

/// Dispatches one `NodeRequest` per target node and wires its completion to
/// `aggregator.Add`. Used for both the single-phase path and the apply
/// round that follows a unanimous verification.
async fn run_apply(
    pool: Arc<WorkerPool>,
    client: NodeClient,
    targets: Vec<NodeId>,
    method: Method,
    uri: http::Uri,
    body: Option<Bytes>,
    headers: HeaderMap,
    budget: Duration,
    aggregator: AggregatorHandle,
) {
    for node in targets {
        dispatch_one(&pool, &client, &node, method, &uri, body.clone(), &headers, budget, &aggregator).await;
    }
}

/// Builds, submits, and (on submission failure) synthesizes the error
/// response for one node's request against `aggregator`.
async fn dispatch_one(
    pool: &WorkerPool,
    client: &NodeClient,
    node: &NodeId,
    method: Method,
    uri: &http::Uri,
    body: Option<Bytes>,
    headers: &HeaderMap,
    budget: Duration,
    aggregator: &AggregatorHandle,
) {
    let target_uri = match rewrite_uri_for_node(uri, node) {
        Ok(u) => u,
        Err(e) => {
            aggregator.add(NodeResponse::error(
                node.clone(),
                method,
                uri.clone(),
                Instant::now(),
                NodeTransportError::InvalidUri(node.to_string(), e),
            ));
            return;
        }
    };

    let mut per_node_headers = headers.clone();
    headers::stamp_attempt_id(&mut per_node_headers);
    let deadline = Instant::now() + budget;

    let node_request = NodeRequest {
        node: node.clone(),
        method,
        target_uri: target_uri.clone(),
        body,
        headers: per_node_headers,
        deadline,
    };

    let client = client.clone();
    let job_aggregator = aggregator.clone();
    let submitted = pool
        .submit(move || async move {
            let response = client.do_request(node_request).await;
            job_aggregator.add(response);
        })
        .await;

    if submitted.is_err() {
        aggregator.add(NodeResponse::error(
            node.clone(),
            method,
            target_uri,
            Instant::now(),
            NodeTransportError::Other(node.to_string(), "worker pool is stopped".to_string()),
        ));
    }
}

struct NullMerger;

impl ResponseMerger for NullMerger {
    fn merge(&self, _responses: &[NodeResponse]) -> Result<MergedPayload, MergeError> {
        Err(MergeError::new(
            "the verification-round aggregator is never consumed",
        ))
    }

    fn name(&self) -> &str {
        "verification-round-null-merger"
    }
}

/// The two-phase verification round (spec §4.5 step 7), modeled as an
/// explicit continuation rather than literal recursion through `Replicate`
/// (per the design note in §9): on unanimous 150 acceptance, falls through
/// to `run_apply` against the same public aggregator; on any dissent,
/// synthesizes `VerificationRejected` and completes the public aggregator
/// without ever dispatching an apply-round request.
#[allow(clippy::too_many_arguments)]
async fn run_two_phase(
    pool: Arc<WorkerPool>,
    client: NodeClient,
    targets: Vec<NodeId>,
    method: Method,
    uri: http::Uri,
    uri_path: String,
    body: Option<Bytes>,
    headers: HeaderMap,
    budget: Duration,
    public_aggregator: AggregatorHandle,
    flow_tracker: Arc<dyn FlowStateTracker>,
    event_listeners: Arc<EventListeners<EngineEvent>>,
) {
    public_aggregator.set_phase(replicator_aggregator::Phase::Verifying);
    flow_tracker.mutation_begins(method, &uri_path);

    let verify_headers = headers::with_verify_intent(&headers);
    let expected: HashSet<NodeId> = targets.iter().cloned().collect();
    let verification_aggregator = ResponseAggregator::new(
        public_aggregator.request_id(),
        method,
        uri_path.clone(),
        expected,
        Arc::new(NullMerger) as Arc<dyn ResponseMerger>,
    );

    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let done_tx = std::sync::Mutex::new(Some(done_tx));
    verification_aggregator.on_complete(move |_, _| {
        if let Some(tx) = done_tx.lock().expect("oneshot guard mutex poisoned").take() {
            let _ = tx.send(());
        }
    });

    for node in &targets {
        dispatch_one(
            &pool,
            &client,
            node,
            method,
            &uri,
            body.clone(),
            &verify_headers,
            budget,
            &verification_aggregator,
        )
        .await;
    }

    let _ = done_rx.await;

    let mut responses = verification_aggregator.received_snapshot();
    responses.sort_by_key(|r| targets.iter().position(|n| n == &r.node).unwrap_or(usize::MAX));

    let dissenting: Vec<(NodeId, String)> = responses
        .iter()
        .filter(|r| r.status() != VERIFY_ACCEPT_STATUS)
        .map(|r| (r.node.clone(), dissent_explanation(r)))
        .collect();

    if dissenting.is_empty() {
        public_aggregator.set_phase(replicator_aggregator::Phase::Applying);
        run_apply(pool, client, targets, method, uri, body, headers, budget, public_aggregator).await;
    } else {
        event_listeners.emit(&EngineEvent::VerificationRejected {
            request_id: public_aggregator.request_id(),
            timestamp: Instant::now(),
            dissenting_nodes: dissenting.len(),
        });

        let primary = format!(
            "Node {} is unable to fulfill this request due to: {}",
            dissenting[0].0.id, dissenting[0].1
        );
        public_aggregator.set_fatal(ReplicatorError::VerificationRejected { primary, dissenting });
    }
}
