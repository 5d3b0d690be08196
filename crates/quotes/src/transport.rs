//! HTTP transport to the quote service

use crate::QuoteError;
use async_trait::async_trait;
use std::sync::Arc;

/// Quote service endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Price for a unit amount of the source asset
    Quote,
    /// Swap transaction call data
    Swap,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Swap => "swap",
        }
    }
}

/// Raw response from the quote service
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Best-effort error text from the body
    pub fn error_text(&self) -> String {
        self.body
            .get("description")
            .or_else(|| self.body.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.body.to_string())
    }
}

/// A GET-style call against the quote service
#[async_trait]
pub trait QuoteTransport: Send + Sync {
    async fn get(
        &self,
        endpoint: Endpoint,
        params: &[(&'static str, String)],
    ) -> Result<TransportResponse, QuoteError>;
}

#[async_trait]
impl<T: QuoteTransport + ?Sized> QuoteTransport for Arc<T> {
    async fn get(
        &self,
        endpoint: Endpoint,
        params: &[(&'static str, String)],
    ) -> Result<TransportResponse, QuoteError> {
        (**self).get(endpoint, params).await
    }
}

/// reqwest-backed transport with bearer authentication
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| QuoteError::ApiError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl QuoteTransport for HttpTransport {
    async fn get(
        &self,
        endpoint: Endpoint,
        params: &[(&'static str, String)],
    ) -> Result<TransportResponse, QuoteError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint.path()))
            .bearer_auth(&self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| QuoteError::ApiError(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| QuoteError::ApiError(format!("Failed to read response: {}", e)))?;

        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays canned responses in order and records when each call landed
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<TransportResponse>>,
        calls: Mutex<Vec<(Endpoint, Instant)>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<TransportResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::default(),
            })
        }

        pub fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    pub fn ok(body: serde_json::Value) -> TransportResponse {
        TransportResponse { status: 200, body }
    }

    pub fn status(status: u16) -> TransportResponse {
        TransportResponse {
            status,
            body: serde_json::json!({ "description": "canned failure" }),
        }
    }

    #[async_trait]
    impl QuoteTransport for ScriptedTransport {
        async fn get(
            &self,
            endpoint: Endpoint,
            _params: &[(&'static str, String)],
        ) -> Result<TransportResponse, QuoteError> {
            self.calls.lock().unwrap().push((endpoint, Instant::now()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| QuoteError::ApiError("script exhausted".to_string()))
        }
    }
}
