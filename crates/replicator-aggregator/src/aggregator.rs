//! `ResponseAggregator`: per-cluster-request collector and merge driver.

use crate::events::AggregatorEvent;
use crate::merger::{MergeError, MergedPayload, ResponseMerger};
use replicator_core::{EventListeners, Method, NodeId, NodeResponse, ReplicatorError, RequestId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Phase of the public aggregator's lifecycle, per the state machine:
/// `Open -> (Verifying -> Applying) -> Complete -> Consumed`, with `Failed`
/// and `Expired` as the other two terminal states.
///
/// `Verifying`/`Applying` are pushed explicitly by the engine running the
/// two-phase protocol; everything else is derived by the aggregator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Open,
    Verifying,
    Applying,
    Complete,
    Failed,
    Expired,
    Consumed,
}

type CompleteHook = Box<dyn Fn(&RequestId, &[NodeResponse]) + Send + Sync>;
type ConsumeHook = Box<dyn Fn(&RequestId) + Send + Sync>;

struct Inner {
    request_id: RequestId,
    method: Method,
    uri_path: String,
    expected_nodes: HashSet<NodeId>,
    received: HashMap<NodeId, NodeResponse>,
    created_at: Instant,
    completed_at: Option<Instant>,
    consumed_at: Option<Instant>,
    fatal_error: Option<ReplicatorError<MergeError>>,
    merge_result: Option<Result<MergedPayload, ReplicatorError<MergeError>>>,
    phase: Phase,
    merger: Arc<dyn ResponseMerger>,
    on_complete: Option<CompleteHook>,
    on_consume: Option<ConsumeHook>,
}

/// Per-cluster-request state: collects `NodeResponse`s as they arrive, knows
/// when the expected set is complete, and lazily merges on first
/// consumption.
///
/// Internally an `Arc<Mutex<Inner>>`, following the teacher's
/// `Bulkhead`/`Circuit` precedent of one shared mutex guarding all mutable
/// state rather than field-level synchronization — `Add`, `SetFatal`, and
/// completion-hook invocation all serialize through the same lock.
#[derive(Clone)]
pub struct ResponseAggregator {
    inner: Arc<Mutex<Inner>>,
    event_listeners: Arc<EventListeners<AggregatorEvent>>,
}

/// The handle callers hold after `Replicate` returns; an alias rather than a
/// distinct type since the aggregator is already cheaply cloneable.
pub type AggregatorHandle = ResponseAggregator;

impl ResponseAggregator {
    pub fn new(
        request_id: RequestId,
        method: Method,
        uri_path: impl Into<String>,
        expected_nodes: HashSet<NodeId>,
        merger: Arc<dyn ResponseMerger>,
    ) -> Self {
        Self::with_event_listeners(
            request_id,
            method,
            uri_path,
            expected_nodes,
            merger,
            EventListeners::new(),
        )
    }

    pub fn with_event_listeners(
        request_id: RequestId,
        method: Method,
        uri_path: impl Into<String>,
        expected_nodes: HashSet<NodeId>,
        merger: Arc<dyn ResponseMerger>,
        event_listeners: EventListeners<AggregatorEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                request_id,
                method,
                uri_path: uri_path.into(),
                expected_nodes,
                received: HashMap::new(),
                created_at: Instant::now(),
                completed_at: None,
                consumed_at: None,
                fatal_error: None,
                merge_result: None,
                phase: Phase::Open,
                merger,
                on_complete: None,
                on_consume: None,
            })),
            event_listeners: Arc::new(event_listeners),
        }
    }

    /// Registers the hook run exactly once when the aggregator completes
    /// (full receipt or fatal error). Must be called before the aggregator
    /// is shared with worker tasks.
    pub fn on_complete<F>(&self, hook: F)
    where
        F: Fn(&RequestId, &[NodeResponse]) + Send + Sync + 'static,
    {
        self.inner.lock().expect("aggregator mutex poisoned").on_complete = Some(Box::new(hook));
    }

    /// Registers the hook run exactly once on first consumption (explicit
    /// `consume()` or maintenance-sweep eviction).
    pub fn on_consume<F>(&self, hook: F)
    where
        F: Fn(&RequestId) + Send + Sync + 'static,
    {
        self.inner.lock().expect("aggregator mutex poisoned").on_consume = Some(Box::new(hook));
    }

    pub fn request_id(&self) -> RequestId {
        self.inner.lock().expect("aggregator mutex poisoned").request_id.clone()
    }

    pub fn method(&self) -> Method {
        self.inner.lock().expect("aggregator mutex poisoned").method
    }

    pub fn uri_path(&self) -> String {
        self.inner.lock().expect("aggregator mutex poisoned").uri_path.clone()
    }

    pub fn expected_nodes(&self) -> HashSet<NodeId> {
        self.inner.lock().expect("aggregator mutex poisoned").expected_nodes.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().expect("aggregator mutex poisoned").phase
    }

    /// Pushes an explicit phase transition (`Verifying`/`Applying`); no-op
    /// once the aggregator has reached a terminal phase.
    pub fn set_phase(&self, phase: Phase) {
        let mut inner = self.inner.lock().expect("aggregator mutex poisoned");
        if !is_terminal(inner.phase) {
            inner.phase = phase;
        }
    }

    /// Marks this entry evicted by the maintenance sweep. Only meaningful
    /// before an explicit `consume()`; a no-op otherwise.
    pub fn mark_expired(&self) {
        let mut inner = self.inner.lock().expect("aggregator mutex poisoned");
        if inner.consumed_at.is_none() {
            inner.phase = Phase::Expired;
        }
    }

    /// Records one `NodeResponse`. Ignores duplicates and responses from
    /// nodes outside `expectedNodes`. Returns `true` if this call completed
    /// the aggregator.
    pub fn add(&self, response: NodeResponse) -> bool {
        let mut inner = self.inner.lock().expect("aggregator mutex poisoned");

        if !inner.expected_nodes.contains(&response.node) {
            self.event_listeners.emit(&AggregatorEvent::DuplicateOrUnexpectedResponse {
                request_id: inner.request_id.clone(),
                node: response.node.clone(),
                timestamp: Instant::now(),
            });
            return false;
        }
        if inner.received.contains_key(&response.node) {
            self.event_listeners.emit(&AggregatorEvent::DuplicateOrUnexpectedResponse {
                request_id: inner.request_id.clone(),
                node: response.node.clone(),
                timestamp: Instant::now(),
            });
            return false;
        }

        inner.received.insert(response.node.clone(), response);

        let now_complete =
            inner.completed_at.is_none() && inner.received.len() == inner.expected_nodes.len();
        if now_complete {
            complete_locked(&mut inner, &self.event_listeners, false);
        }
        now_complete
    }

    /// Marks the aggregator failed. Further `add()` calls still record
    /// responses, but no merge will be attempted. Completes the aggregator
    /// if it was not already complete.
    pub fn set_fatal(&self, error: ReplicatorError<MergeError>) {
        let mut inner = self.inner.lock().expect("aggregator mutex poisoned");
        if inner.fatal_error.is_some() {
            return;
        }
        inner.fatal_error = Some(error);
        if inner.completed_at.is_none() {
            complete_locked(&mut inner, &self.event_listeners, true);
        }
    }

    pub fn get(&self, node: &NodeId) -> Option<NodeResponse> {
        self.inner
            .lock()
            .expect("aggregator mutex poisoned")
            .received
            .get(node)
            .cloned()
    }

    pub fn is_complete(&self) -> bool {
        self.inner.lock().expect("aggregator mutex poisoned").completed_at.is_some()
    }

    pub fn is_older_than(&self, age: Duration) -> bool {
        let inner = self.inner.lock().expect("aggregator mutex poisoned");
        match inner.completed_at {
            Some(completed_at) => completed_at.elapsed() >= age,
            None => false,
        }
    }

    pub fn created_at(&self) -> Instant {
        self.inner.lock().expect("aggregator mutex poisoned").created_at
    }

    /// Snapshot of every response received so far, in arrival order is not
    /// preserved (the map has no order); callers needing arrival order must
    /// track it themselves via `add`'s return value.
    pub fn received_snapshot(&self) -> Vec<NodeResponse> {
        self.inner
            .lock()
            .expect("aggregator mutex poisoned")
            .received
            .values()
            .cloned()
            .collect()
    }

    /// Idempotent. Runs the merger on first call, closes any body handles
    /// the merger did not consume, fires the consume hook exactly once, and
    /// returns the merged payload or the fatal error on every call
    /// thereafter.
    pub fn consume(&self) -> Result<MergedPayload, ReplicatorError<MergeError>> {
        let mut inner = self.inner.lock().expect("aggregator mutex poisoned");

        if let Some(result) = inner.merge_result.clone() {
            return result;
        }

        let result = if let Some(fatal) = inner.fatal_error.clone() {
            Err(fatal)
        } else {
            let responses: Vec<NodeResponse> = inner.received.values().cloned().collect();
            inner.merger.merge(&responses).map_err(ReplicatorError::Merge)
        };

        for response in inner.received.values() {
            if let replicator_core::NodeOutcome::Success { body, .. } = &response.outcome {
                let _ = body.take();
            }
        }

        inner.merge_result = Some(result.clone());
        inner.consumed_at = Some(Instant::now());
        inner.phase = Phase::Consumed;

        if let Some(hook) = inner.on_consume.take() {
            hook(&inner.request_id);
        }

        self.event_listeners.emit(&AggregatorEvent::Consumed {
            request_id: inner.request_id.clone(),
            timestamp: Instant::now(),
            merge_succeeded: result.is_ok(),
        });

        result
    }
}

fn is_terminal(phase: Phase) -> bool {
    matches!(phase, Phase::Complete | Phase::Failed | Phase::Expired | Phase::Consumed)
}

fn complete_locked(
    inner: &mut Inner,
    event_listeners: &EventListeners<AggregatorEvent>,
    fatal: bool,
) {
    inner.completed_at = Some(Instant::now());
    inner.phase = if fatal { Phase::Failed } else { Phase::Complete };

    let responses: Vec<NodeResponse> = inner.received.values().cloned().collect();
    if let Some(hook) = inner.on_complete.take() {
        hook(&inner.request_id, &responses);
    }

    event_listeners.emit(&AggregatorEvent::Completed {
        request_id: inner.request_id.clone(),
        timestamp: Instant::now(),
        node_count: responses.len(),
        fatal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merger::FirstSuccessMerger;
    use replicator_core::NodeTransportError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn node(n: &str) -> NodeId {
        NodeId::new(n, "127.0.0.1", 9000)
    }

    fn success(n: &str) -> NodeResponse {
        NodeResponse::success(
            node(n),
            Method::Get,
            "http://127.0.0.1:9000/x".parse().unwrap(),
            Instant::now(),
            200,
            http::HeaderMap::new(),
            bytes::Bytes::from_static(b"ok"),
        )
    }

    fn expected(nodes: &[&str]) -> HashSet<NodeId> {
        nodes.iter().map(|n| node(n)).collect()
    }

    #[test]
    fn completes_exactly_when_every_expected_node_reports() {
        let agg = ResponseAggregator::new(
            RequestId::generate(),
            Method::Get,
            "/x",
            expected(&["a", "b"]),
            Arc::new(FirstSuccessMerger),
        );

        assert!(!agg.add(success("a")));
        assert!(!agg.is_complete());
        assert!(agg.add(success("b")));
        assert!(agg.is_complete());
    }

    #[test]
    fn duplicate_and_unexpected_responses_are_ignored() {
        let agg = ResponseAggregator::new(
            RequestId::generate(),
            Method::Get,
            "/x",
            expected(&["a"]),
            Arc::new(FirstSuccessMerger),
        );

        assert!(agg.add(success("a")));
        assert!(!agg.add(success("a")));
        assert!(!agg.add(success("stranger")));
        assert_eq!(agg.received_snapshot().len(), 1);
    }

    #[test]
    fn consume_is_idempotent_and_single_consumer_on_bodies() {
        let agg = ResponseAggregator::new(
            RequestId::generate(),
            Method::Get,
            "/x",
            expected(&["a"]),
            Arc::new(FirstSuccessMerger),
        );
        agg.add(success("a"));

        let first = agg.consume();
        let second = agg.consume();
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(agg.phase(), Phase::Consumed);
    }

    #[test]
    fn set_fatal_prevents_merge_and_completes_once() {
        let agg = ResponseAggregator::new(
            RequestId::generate(),
            Method::Get,
            "/x",
            expected(&["a", "b"]),
            Arc::new(FirstSuccessMerger),
        );

        let complete_count = Arc::new(AtomicUsize::new(0));
        let cc = Arc::clone(&complete_count);
        agg.on_complete(move |_, _| {
            cc.fetch_add(1, Ordering::SeqCst);
        });

        agg.set_fatal(ReplicatorError::VerificationRejected {
            primary: "dissent".into(),
            dissenting: vec![],
        });
        agg.add(success("a"));
        agg.add(success("b"));

        assert_eq!(complete_count.load(Ordering::SeqCst), 1);
        assert!(agg.consume().is_err());
        assert_eq!(agg.phase(), Phase::Consumed);
    }

    #[test]
    fn onconsume_hook_fires_exactly_once() {
        let agg = ResponseAggregator::new(
            RequestId::generate(),
            Method::Get,
            "/x",
            expected(&["a"]),
            Arc::new(FirstSuccessMerger),
        );
        agg.add(success("a"));

        let fired = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fired);
        agg.on_consume(move |_| {
            assert!(!f.swap(true, Ordering::SeqCst), "onConsume fired twice");
        });

        let _ = agg.consume();
        let _ = agg.consume();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn error_node_response_does_not_block_completion() {
        let agg = ResponseAggregator::new(
            RequestId::generate(),
            Method::Get,
            "/x",
            expected(&["a", "b"]),
            Arc::new(FirstSuccessMerger),
        );
        agg.add(success("a"));
        let err = NodeResponse::error(
            node("b"),
            Method::Get,
            "http://127.0.0.1:9000/x".parse().unwrap(),
            Instant::now(),
            NodeTransportError::Timeout("b".into()),
        );
        assert!(agg.add(err));
        assert!(agg.is_complete());
    }
}
