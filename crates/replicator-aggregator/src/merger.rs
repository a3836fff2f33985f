//! The `ResponseMerger` plugin seam and the two reference implementations.

use replicator_core::NodeResponse;
use std::fmt;

/// The payload a merger produces. Kept as a small closed set rather than a
/// fully generic associated type so `ResponseMerger` stays object-safe and
/// hosts can select a merger per content-type/path/method at runtime, the
/// same way the teacher's `FailureClassifier` trait object is selected per
/// circuit breaker instance.
#[derive(Debug, Clone)]
pub enum MergedPayload {
    #[cfg(feature = "json-mergers")]
    Json(serde_json::Value),
    Bytes(bytes::Bytes),
}

/// The application error a `ResponseMerger` can fail with. Carried as the
/// `M` parameter of `replicator_core::ReplicatorError<M>`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MergeError(pub String);

impl MergeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Folds the per-node responses of a completed cluster request into one
/// payload. Selected by the host per content-type/path/method; real mergers
/// are application-specific and are not shipped here.
pub trait ResponseMerger: Send + Sync {
    fn merge(&self, responses: &[NodeResponse]) -> Result<MergedPayload, MergeError>;

    /// Name used in logs/metrics. Default: the type name.
    fn name(&self) -> &str {
        "response-merger"
    }
}

impl fmt::Debug for dyn ResponseMerger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseMerger").field("name", &self.name()).finish()
    }
}

/// Passes through the first 2xx body encountered, tolerating partial
/// failures among the rest of the node set. Drives scenario S3/S4's
/// read-only path; an illustrative example, not a general-purpose merge
/// strategy.
#[derive(Debug, Default)]
pub struct FirstSuccessMerger;

impl ResponseMerger for FirstSuccessMerger {
    fn merge(&self, responses: &[NodeResponse]) -> Result<MergedPayload, MergeError> {
        let success = responses
            .iter()
            .find(|r| !r.is_error() && (200..300).contains(&r.status()));

        match success {
            Some(resp) => {
                let body = match &resp.outcome {
                    replicator_core::NodeOutcome::Success { body, .. } => body.take(),
                    replicator_core::NodeOutcome::Error(_) => None,
                };
                Ok(MergedPayload::Bytes(body.unwrap_or_default()))
            }
            None => Err(MergeError::new("no node returned a successful response")),
        }
    }

    fn name(&self) -> &str {
        "first-success"
    }
}

/// Sums a named numeric JSON field across every successful response body.
/// Drives scenario S4; an illustrative example merger used by tests and the
/// demo binary, not a general-purpose merge library.
#[cfg(feature = "json-mergers")]
#[derive(Debug, Clone)]
pub struct JsonSumMerger {
    field: String,
}

#[cfg(feature = "json-mergers")]
impl JsonSumMerger {
    pub fn new(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

#[cfg(feature = "json-mergers")]
impl ResponseMerger for JsonSumMerger {
    fn merge(&self, responses: &[NodeResponse]) -> Result<MergedPayload, MergeError> {
        let mut sum = 0f64;
        let mut any_success = false;

        for resp in responses {
            if resp.is_error() || !(200..300).contains(&resp.status()) {
                continue;
            }
            let replicator_core::NodeOutcome::Success { body, .. } = &resp.outcome else {
                continue;
            };
            let Some(bytes) = body.take() else { continue };
            let value: serde_json::Value = serde_json::from_slice(&bytes)
                .map_err(|e| MergeError::new(format!("invalid json body: {e}")))?;
            let Some(n) = value.get(&self.field).and_then(|v| v.as_f64()) else {
                return Err(MergeError::new(format!(
                    "response body missing numeric field {:?}",
                    self.field
                )));
            };
            sum += n;
            any_success = true;
        }

        if !any_success {
            return Err(MergeError::new("no node returned a successful response"));
        }

        let mut map = serde_json::Map::new();
        map.insert(self.field.clone(), serde_json::json!(sum));
        Ok(MergedPayload::Json(serde_json::Value::Object(map)))
    }

    fn name(&self) -> &str {
        "json-sum"
    }
}
