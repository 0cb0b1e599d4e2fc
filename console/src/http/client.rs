//! HTTP client implementation

use std::time::Duration;

use openapi_client::models::{ActionResponse, ErrorResponse};
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::ConsoleError;

/// HTTP client for the orchestrator API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConsoleError> {
        let parsed = Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConsoleError::ConfigError(format!(
                "unsupported backend URL scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client without a whole-request timeout, for long-lived streams
    pub fn streaming(&self) -> Result<Self, ConsoleError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: self.base_url.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ConsoleError> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        let body = response.json().await?;
        Ok(body)
    }

    /// Send a request to a mutating endpoint.
    /// Those answer with assorted shapes and sometimes nothing; only an
    /// explicit `"success": false` counts as a rejection.
    pub async fn command(&self, method: Method, path: &str) -> Result<ActionResponse, ConsoleError> {
        let response = self.send(method, path, None::<&()>).await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        debug!("Command {} acknowledged: {}", path, text);
        acknowledgement(status, &text)
    }

    /// Open a streaming GET; the caller reads the body
    pub async fn open_stream(&self, path: &str) -> Result<Response, ConsoleError> {
        let url = self.url(path);
        debug!("GET {} (stream)", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        check_status(response, "GET").await
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ConsoleError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        check_status(response, method.as_str()).await
    }
}

fn acknowledgement(status: u16, body: &str) -> Result<ActionResponse, ConsoleError> {
    let ack = serde_json::from_str::<ActionResponse>(body).unwrap_or_default();
    if ack.success == Some(false) {
        let message = ["error", "message"]
            .iter()
            .find_map(|key| ack.extra.get(*key).and_then(|v| v.as_str()))
            .unwrap_or("request was not acknowledged")
            .to_string();
        return Err(ConsoleError::Remote { status, message });
    }
    Ok(ack)
}

async fn check_status(response: Response, method: &str) -> Result<Response, ConsoleError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);

    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Err(ConsoleError::Remote {
        status: status.as_u16(),
        message,
    })
}
