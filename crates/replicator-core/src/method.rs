//! The six HTTP verbs the replicator understands.

use std::fmt;

/// A method accepted by [`crate::NodeRequest`].
///
/// Only the six verbs the protocol is defined over; anything else is an
/// `InvalidArgument` at the `Replicate` boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Options,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Mutating methods trigger `StateGuard` checks and, when `verify` is
    /// requested, the two-phase protocol. Everything else is read-only.
    pub fn is_mutating(self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Delete)
    }

    /// `true` for GET/HEAD/OPTIONS/DELETE: parameters are serialized into the
    /// query string. `false` for POST/PUT: parameters become the entity.
    pub fn carries_query_params(self) -> bool {
        matches!(
            self,
            Method::Get | Method::Head | Method::Options | Method::Delete
        )
    }

    /// `true` for body-bearing verbs (POST, PUT); false for side-effect-free
    /// verbs whose parameters are serialized into the query string instead.
    pub fn carries_body(self) -> bool {
        !self.carries_query_params()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<http::Method> for Method {
    type Error = http::Method;

    fn try_from(value: http::Method) -> Result<Self, Self::Error> {
        Method::parse(value.as_str()).ok_or(value)
    }
}

impl From<Method> for http::Method {
    fn from(value: Method) -> Self {
        match value {
            Method::Get => http::Method::GET,
            Method::Head => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}
