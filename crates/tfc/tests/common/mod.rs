//! Shared helpers for the client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tfc::{ClientConfig, ClientError, HttpRequest, HttpResponse, HttpTransport, TerraformClient};

/// Transport that records every request and answers from a queue.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, ClientError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON response.
    pub fn respond(&self, status: u16, body: Value) -> &Self {
        self.respond_raw(status, body.to_string())
    }

    /// Queue a response with an arbitrary body.
    pub fn respond_raw(&self, status: u16, body: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a transport failure.
    pub fn fail(&self, err: ClientError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The most recent request.
    pub fn last(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("no response queued".into())))
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new("test-token-0123456789", "acme")
}

/// A client for organization `acme` over `mock`.
pub fn client(mock: &Arc<MockTransport>) -> TerraformClient {
    TerraformClient::with_transport(config(), mock.clone())
}

/// Same as [`client`], with the read cache enabled.
pub fn caching_client(mock: &Arc<MockTransport>) -> TerraformClient {
    TerraformClient::with_transport(config().with_caching(true), mock.clone())
}

/// Build an argument map from a JSON object literal.
pub fn args(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}
