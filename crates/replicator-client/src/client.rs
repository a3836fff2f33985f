//! `NodeClient`: one outbound HTTP call to one data-plane node.

use crate::config::NodeClientConfig;
use crate::events::NodeClientEvent;
use replicator_core::{EventListeners, Method, NodeId, NodeRequest, NodeResponse, NodeTransportError};
use std::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

/// Issues one outbound HTTP call to one node and returns a `NodeResponse`.
///
/// Holds one shared `reqwest::Client`, built once with the configured
/// connect/read timeouts, so the underlying connection pool is reused across
/// every worker that shares this client — the teacher's "the underlying HTTP
/// client is shared across workers and must be safe for concurrent use"
/// discipline, here made literal via `reqwest::Client`'s own internal
/// `Arc`-backed connection pool.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    config: std::sync::Arc<NodeClientConfig>,
    event_listeners: std::sync::Arc<EventListeners<NodeClientEvent>>,
}

impl NodeClient {
    pub fn new(config: NodeClientConfig) -> Result<Self, NodeClientBuildError> {
        Self::with_event_listeners(config, EventListeners::new())
    }

    pub fn with_event_listeners(
        config: NodeClientConfig,
        event_listeners: EventListeners<NodeClientEvent>,
    ) -> Result<Self, NodeClientBuildError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.total_budget())
            .build()
            .map_err(|e| NodeClientBuildError(e.to_string()))?;

        Ok(Self {
            http,
            config: std::sync::Arc::new(config),
            event_listeners: std::sync::Arc::new(event_listeners),
        })
    }

    /// Executes one `NodeRequest`, never returning an `Err` — every failure
    /// mode becomes an error `NodeResponse` instead.
    pub async fn do_request(&self, request: NodeRequest) -> NodeResponse {
        let started_at = Instant::now();
        let node = request.node.clone();
        let method = request.method;
        let uri = request.target_uri.clone();

        let built = self.build_reqwest(&request);
        let reqwest_request = match built {
            Ok(req) => req,
            Err(err) => {
                self.emit_failure(&node, started_at, &err);
                return NodeResponse::error(node, method, uri, started_at, err);
            }
        };

        match self.http.execute(reqwest_request).await {
            Ok(response) => {
                let status = response.status().as_u16();
                let mut headers = http::HeaderMap::new();
                headers.extend(response.headers().iter().map(|(k, v)| (k.clone(), v.clone())));

                let body = match response.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let err = NodeTransportError::Other(node.to_string(), e.to_string());
                        self.emit_failure(&node, started_at, &err);
                        return NodeResponse::error(node, method, uri, started_at, err);
                    }
                };

                let duration = started_at.elapsed();
                self.event_listeners.emit(&NodeClientEvent::Completed {
                    node: node.clone(),
                    timestamp: Instant::now(),
                    status,
                    duration,
                });

                #[cfg(feature = "metrics")]
                {
                    counter!("node_client_requests_total", "client" => self.config.name.clone(), "node" => node.to_string())
                        .increment(1);
                    histogram!("node_client_request_duration_seconds", "client" => self.config.name.clone(), "node" => node.to_string())
                        .record(duration.as_secs_f64());
                }

                NodeResponse::success(node, method, uri, started_at, status, headers, body)
            }
            Err(e) => {
                let err = classify_reqwest_error(&node, e);
                self.emit_failure(&node, started_at, &err);
                NodeResponse::error(node, method, uri, started_at, err)
            }
        }
    }

    fn emit_failure(&self, node: &NodeId, started_at: Instant, err: &NodeTransportError) {
        let duration = started_at.elapsed();
        if matches!(err, NodeTransportError::Timeout(_)) {
            self.event_listeners.emit(&NodeClientEvent::TimedOut {
                node: node.clone(),
                timestamp: Instant::now(),
                budget: self.config.total_budget(),
            });
        } else {
            self.event_listeners.emit(&NodeClientEvent::Failed {
                node: node.clone(),
                timestamp: Instant::now(),
                reason: err.to_string(),
                duration,
            });
        }

        #[cfg(feature = "metrics")]
        counter!("node_client_errors_total", "client" => self.config.name.clone(), "node" => node.to_string())
            .increment(1);
    }

    /// Builds the outbound `reqwest::Request`, applying the method-dependent
    /// query-string-vs-entity split and the default `Content-Type`.
    fn build_reqwest(
        &self,
        request: &NodeRequest,
    ) -> Result<reqwest::Request, NodeTransportError> {
        let url = reqwest::Url::parse(&request.target_uri.to_string()).map_err(|e| {
            NodeTransportError::InvalidUri(request.node.to_string(), e.to_string())
        })?;

        let http_method: http::Method = request.method.into();
        let mut builder = self.http.request(http_method, url);
        builder = builder.headers(request.headers.clone());

        if request.method.carries_body() {
            if !request.headers.contains_key(http::header::CONTENT_TYPE) {
                builder = builder.header(
                    http::header::CONTENT_TYPE,
                    self.config.default_content_type.clone(),
                );
            }
            if let Some(body) = &request.body {
                builder = builder.body(body.clone());
            }
        }

        builder
            .build()
            .map_err(|e| NodeTransportError::Other(request.node.to_string(), e.to_string()))
    }
}

fn classify_reqwest_error(node: &NodeId, error: reqwest::Error) -> NodeTransportError {
    if error.is_timeout() {
        NodeTransportError::Timeout(node.to_string())
    } else if error.is_connect() {
        NodeTransportError::Connect(node.to_string(), error.to_string())
    } else if error.to_string().to_lowercase().contains("tls")
        || error.to_string().to_lowercase().contains("certificate")
    {
        NodeTransportError::Tls(node.to_string(), error.to_string())
    } else {
        NodeTransportError::Other(node.to_string(), error.to_string())
    }
}

/// Raised only if the underlying `reqwest::Client` itself cannot be built
/// (e.g. an invalid TLS configuration); never raised per-request.
#[derive(Debug, Clone, thiserror::Error)]
#[error("could not build node client: {0}")]
pub struct NodeClientBuildError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_bytes, method as wm_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_node(server: &MockServer) -> (NodeId, http::Uri) {
        let url = server.uri();
        let parsed: http::Uri = url.parse().unwrap();
        let host = parsed.host().unwrap().to_string();
        let port = parsed.port_u16().unwrap_or(80);
        (NodeId::new("a", &host, port), format!("{url}/x").parse().unwrap())
    }

    #[tokio::test]
    async fn successful_put_returns_success_outcome() {
        let server = MockServer::start().await;
        Mock::given(wm_method("PUT"))
            .and(path("/x"))
            .and(body_bytes(b"x=1".to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"v\":1}"))
            .mount(&server)
            .await;

        let (node, uri) = test_node(&server);
        let client = NodeClient::new(NodeClientConfig::builder().build()).unwrap();

        let request = NodeRequest {
            node: node.clone(),
            method: Method::Put,
            target_uri: uri,
            body: Some(bytes::Bytes::from_static(b"x=1")),
            headers: http::HeaderMap::new(),
            deadline: Instant::now() + std::time::Duration::from_secs(5),
        };

        let response = client.do_request(request).await;
        assert_eq!(response.status(), 200);
        assert!(!response.is_error());
    }

    #[tokio::test]
    async fn timeout_produces_an_error_response_not_a_panic() {
        let server = MockServer::start().await;
        Mock::given(wm_method("GET"))
            .and(path("/x"))
            .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(200)))
            .mount(&server)
            .await;

        let (node, uri) = test_node(&server);
        let client = NodeClient::new(
            NodeClientConfig::builder()
                .connect_timeout(std::time::Duration::from_millis(50))
                .read_timeout(std::time::Duration::from_millis(50))
                .build(),
        )
        .unwrap();

        let request = NodeRequest {
            node,
            method: Method::Get,
            target_uri: uri,
            body: None,
            headers: http::HeaderMap::new(),
            deadline: Instant::now() + std::time::Duration::from_millis(100),
        };

        let response = client.do_request(request).await;
        assert!(response.is_error());
    }
}
