//! Wire-level header handling (spec §6): transaction id extraction,
//! per-attempt request id stamping, and the verification-round intent
//! header. `http::HeaderMap` is already case-insensitive, so "normalizing"
//! here means "ensure these specific headers are present", not re-keying.

use http::{HeaderMap, HeaderName, HeaderValue};
use replicator_core::RequestId;

pub static X_REQUEST_TRANSACTION_ID: HeaderName =
    HeaderName::from_static("x-request-transaction-id");
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub static X_VERIFY_INTENT: HeaderName = HeaderName::from_static("x-verify-intent");
pub static X_CLUSTER_CONTEXT: HeaderName = HeaderName::from_static("x-cluster-context");

pub const VERIFY_INTENT_VALUE: &str = "150-NodeContinue";

/// Sentinel status a node returns to accept the verification round.
pub const VERIFY_ACCEPT_STATUS: u16 = 150;
/// Sentinel status a node returns to reject the verification round.
pub const VERIFY_REJECT_STATUS: u16 = 417;

/// Step 1 of `Replicate`: read `X-Request-Transaction-Id` off the caller's
/// headers if present, generating a fresh `RequestId` (and stamping the
/// header) otherwise. Stable for the life of the request.
pub fn extract_or_generate_request_id(headers: &mut HeaderMap) -> RequestId {
    if let Some(value) = headers.get(&X_REQUEST_TRANSACTION_ID) {
        if let Ok(s) = value.to_str() {
            return RequestId::from_header_value(s.to_string());
        }
    }

    let request_id = RequestId::generate();
    headers.insert(
        X_REQUEST_TRANSACTION_ID.clone(),
        HeaderValue::from_str(request_id.as_str()).expect("uuid is a valid header value"),
    );
    request_id
}

/// `X-Request-Id`: a second identifier stamped fresh on every replication
/// attempt (unlike the transaction id, never caller-supplied), so the
/// verification round and the apply round that follows it carry distinct
/// attempt ids even though both share one `RequestId`.
pub fn stamp_attempt_id(headers: &mut HeaderMap) {
    let attempt_id = uuid::Uuid::new_v4().to_string();
    headers.insert(
        X_REQUEST_ID.clone(),
        HeaderValue::from_str(&attempt_id).expect("uuid is a valid header value"),
    );
}

/// Clones `headers` and adds `X-Verify-Intent: 150-NodeContinue`, for
/// verification-round requests only.
pub fn with_verify_intent(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    headers.insert(
        X_VERIFY_INTENT.clone(),
        HeaderValue::from_static(VERIFY_INTENT_VALUE),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_a_request_id_and_stamps_the_header_when_absent() {
        let mut headers = HeaderMap::new();
        let id = extract_or_generate_request_id(&mut headers);
        assert_eq!(
            headers.get(&X_REQUEST_TRANSACTION_ID).unwrap().to_str().unwrap(),
            id.as_str()
        );
    }

    #[test]
    fn reuses_a_caller_supplied_transaction_id() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_TRANSACTION_ID.clone(), HeaderValue::from_static("caller-1"));
        let id = extract_or_generate_request_id(&mut headers);
        assert_eq!(id.as_str(), "caller-1");
    }

    #[test]
    fn verify_intent_is_only_added_to_the_clone() {
        let headers = HeaderMap::new();
        let verify_headers = with_verify_intent(&headers);
        assert!(headers.get(&X_VERIFY_INTENT).is_none());
        assert_eq!(
            verify_headers.get(&X_VERIFY_INTENT).unwrap(),
            VERIFY_INTENT_VALUE
        );
    }
}
