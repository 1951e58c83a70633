//! Mock KappaML service shared by the integration tests.
#![allow(dead_code)]

use kappaml::KappaClient;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::Value;
use std::time::Duration;

pub const API_KEY: &str = "test-key";
pub const FAST_POLL: Duration = Duration::from_millis(100);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Test fixture that manages a mock server
pub struct MockService {
    pub server: ServerGuard,
}

impl MockService {
    pub async fn start() -> Self {
        init_tracing();
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Client pointed at the mock server, polling every 100ms.
    pub fn client(&self) -> KappaClient {
        self.client_with_poll(FAST_POLL)
    }

    pub fn client_with_poll(&self, poll_interval: Duration) -> KappaClient {
        KappaClient::builder()
            .api_key(API_KEY)
            .base_url(self.url())
            .poll_interval(poll_interval)
            .request_timeout(Duration::from_secs(5))
            .build_with_env(|_| None)
            .expect("client should build")
    }

    /// An authenticated JSON mock, not yet created; chain `expect` and
    /// `create_async` on it.
    pub fn json(&mut self, method: &str, path: &str, status: usize, body: Value) -> Mock {
        self.server
            .mock(method, path)
            .match_header("x-api-key", API_KEY)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// `GET /models/{id}` answering with the given status string.
    pub fn status(&mut self, model_id: &str, status: &str) -> Mock {
        self.json(
            "GET",
            &format!("/models/{}", model_id),
            200,
            serde_json::json!({ "id": model_id, "status": status }),
        )
    }

    /// `POST /models` returning `model_id` in a pending state.
    pub async fn created(&mut self, name: &str, ml_type: &str, model_id: &str) -> Mock {
        self.json(
            "POST",
            "/models",
            201,
            serde_json::json!({ "id": model_id, "name": name, "status": "Pending" }),
        )
        .match_body(Matcher::Json(
            serde_json::json!({ "name": name, "ml_type": ml_type }),
        ))
        .create_async()
        .await
    }
}
