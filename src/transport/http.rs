use crate::config::ClientConfig;
use crate::{Error, ErrorContext, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, Proxy, StatusCode};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Header carrying the API key, per the KappaML service contract.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Client-generated correlation id attached to every request.
pub const REQUEST_ID_HEADER: &str = "x-kappaml-request-id";

/// Lifecycle state of an [`HttpSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

enum Slot {
    Open(reqwest::Client),
    Closed,
}

/// Raw outcome of one HTTP round trip.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
    pub request_id: String,
}

/// The client's HTTP connection resource.
///
/// Wraps a pooled `reqwest::Client`. Requests clone the inner handle, so the
/// state lock is never held across network I/O and concurrent calls proceed in
/// parallel. `close()` releases the pool exactly once; later requests fail with
/// [`Error::SessionClosed`].
pub struct HttpSession {
    slot: RwLock<Slot>,
    base_url: Url,
    requests_sent: AtomicU64,
    releases: AtomicU32,
}

impl HttpSession {
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(config.api_key.expose()).map_err(|_| {
            Error::configuration_with_context(
                "API key contains characters that are not valid in an HTTP header",
                ErrorContext::new()
                    .with_field_path("api_key")
                    .with_source("transport"),
            )
        })?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("kappaml-rust/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(config.pool_idle_timeout));

        if let Some(proxy_url) = &config.proxy {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("Invalid proxy URL: {}", e),
                    ErrorContext::new().with_field_path("proxy"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to create HTTP client: {}", e),
                ErrorContext::new().with_source("transport"),
            )
        })?;

        debug!(base_url = %config.base_url, "http session opened");
        Ok(Self {
            slot: RwLock::new(Slot::Open(client)),
            base_url: config.base_url.clone(),
            requests_sent: AtomicU64::new(0),
            releases: AtomicU32::new(0),
        })
    }

    pub fn state(&self) -> SessionState {
        match *self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Open(_) => SessionState::Open,
            Slot::Closed => SessionState::Closed,
        }
    }

    /// Releases the connection pool. Returns `true` only for the call that released it.
    pub fn close(&self) -> bool {
        let previous = {
            let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, Slot::Closed)
        };
        match previous {
            Slot::Open(client) => {
                drop(client);
                let releases = self.releases.fetch_add(1, Ordering::SeqCst) + 1;
                info!(
                    requests_sent = self.requests_sent(),
                    releases,
                    "http session closed"
                );
                true
            }
            Slot::Closed => false,
        }
    }

    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> u32 {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn client(&self) -> Result<reqwest::Client> {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Open(client) => Ok(client.clone()),
            Slot::Closed => Err(Error::SessionClosed),
        }
    }

    /// Builds `{base_url}/{segments...}`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::configuration_with_context(
                    "base URL cannot carry a path",
                    ErrorContext::new().with_field_path("base_url"),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends one request with an optional JSON body and reads the full response body.
    ///
    /// Only transport failures are errors here; status interpretation is left to the caller.
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse> {
        let client = self.client()?;
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        let request_id = Uuid::new_v4().to_string();

        let mut req = client
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, request_id.as_str());
        if let Some(body) = body {
            req = req.json(body);
        }

        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        debug!(%method, path = %path, request_id = %request_id, "sending request");

        let resp = req.send().await.map_err(TransportError::Http)?;
        let status = resp.status();
        let body = resp.text().await.map_err(TransportError::Http)?;

        debug!(
            %method,
            path = %path,
            request_id = %request_id,
            status = status.as_u16(),
            "received response"
        );

        Ok(RawResponse {
            status,
            body,
            request_id,
        })
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TransportError {
    /// The per-request timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Http(e) if e.is_timeout())
    }

    /// The connection could not be established (refused, DNS, TLS).
    pub fn is_connect(&self) -> bool {
        matches!(self, TransportError::Http(e) if e.is_connect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;

    fn session(base_url: &str) -> HttpSession {
        let config = ClientConfig::resolve(
            ConfigOverrides {
                api_key: Some("test-key".into()),
                base_url: Some(base_url.into()),
                ..Default::default()
            },
            |_| None,
        )
        .unwrap();
        HttpSession::open(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes_segments() {
        let s = session("https://api.kappaml.com/v1");
        assert_eq!(
            s.endpoint(&["models", "abc", "predict"]).unwrap().as_str(),
            "https://api.kappaml.com/v1/models/abc/predict"
        );
        assert_eq!(
            s.endpoint(&["models", "a/b c"]).unwrap().as_str(),
            "https://api.kappaml.com/v1/models/a%2Fb%20c"
        );

        let trailing = session("http://localhost:9000/v1/");
        assert_eq!(
            trailing.endpoint(&["models"]).unwrap().as_str(),
            "http://localhost:9000/v1/models"
        );
    }

    #[test]
    fn test_close_is_idempotent() {
        let s = session("http://localhost:9000");
        assert_eq!(s.state(), SessionState::Open);
        assert!(s.close());
        assert!(!s.close());
        assert_eq!(s.state(), SessionState::Closed);
        assert_eq!(s.releases(), 1);
        assert!(matches!(s.client(), Err(Error::SessionClosed)));
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let s = session("http://localhost:9000");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _slot = s.slot.write().unwrap();
            panic!("panic while holding the slot lock");
        }));
        assert!(outcome.is_err());
        assert!(s.slot.is_poisoned());

        assert!(s.client().is_ok());
        assert_eq!(s.state(), SessionState::Open);
        assert!(s.close());
        assert!(matches!(s.client(), Err(Error::SessionClosed)));
    }

    #[tokio::test]
    async fn test_send_after_close_fails_without_network() {
        let s = session("http://127.0.0.1:9");
        s.close();
        let err = s.send(Method::GET, &["models", "x"], None).await.unwrap_err();
        assert!(matches!(err, Error::SessionClosed));
        assert_eq!(s.requests_sent(), 0);
    }
}
