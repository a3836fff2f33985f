//! Single-consumer response bodies.

use bytes::Bytes;
use std::sync::Mutex;

/// A response body that may be read at most once.
///
/// The merger (or, in the verification round, the dissent-explanation path)
/// is the sole consumer. Calling [`BodyHandle::take`] a second time returns
/// `None` rather than the bytes again, matching the spec's "read at most
/// once" invariant on `NodeResponse`.
#[derive(Debug)]
pub struct BodyHandle(Mutex<Option<Bytes>>);

impl BodyHandle {
    pub fn new(bytes: Bytes) -> Self {
        Self(Mutex::new(Some(bytes)))
    }

    pub fn empty() -> Self {
        Self(Mutex::new(Some(Bytes::new())))
    }

    /// Consumes the body, returning `None` if it was already taken.
    pub fn take(&self) -> Option<Bytes> {
        self.0.lock().expect("body handle mutex poisoned").take()
    }

    /// Returns `true` if nothing has consumed this body yet, without
    /// consuming it.
    pub fn is_unread(&self) -> bool {
        self.0
            .lock()
            .expect("body handle mutex poisoned")
            .is_some()
    }
}
