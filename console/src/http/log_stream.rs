//! Live log subscriptions over SSE

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use openapi_client::models::StreamMessage;
use reqwest::Response;
use tracing::debug;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::http::deployments::deployment_path;
use crate::http::sse::SseDataParser;
use crate::remote::{LogSubscription, LogTransport};

/// Opens `GET /deployments/{id}/logs/stream` subscriptions.
///
/// Uses its own reqwest client without a request timeout; a log tail is
/// expected to outlive any sensible request deadline.
#[derive(Debug, Clone)]
pub struct SseLogTransport {
    http_client: HttpClient,
}

impl SseLogTransport {
    pub fn new(http_client: &HttpClient) -> Result<Self, ConsoleError> {
        Ok(Self {
            http_client: http_client.streaming()?,
        })
    }
}

#[async_trait]
impl LogTransport for SseLogTransport {
    async fn subscribe(&self, deployment_id: &str) -> Result<LogSubscription, ConsoleError> {
        let path = deployment_path(deployment_id, "/logs/stream")?;
        let response = self.http_client.open_stream(&path).await?;
        Ok(into_messages(response))
    }
}

struct StreamState {
    response: Option<Response>,
    parser: SseDataParser,
    pending: VecDeque<StreamMessage>,
}

impl StreamState {
    fn enqueue(&mut self, payloads: Vec<String>) {
        for payload in payloads {
            match serde_json::from_str::<StreamMessage>(&payload) {
                Ok(message) => self.pending.push_back(message),
                Err(e) => debug!("Dropping undecodable log event: {} ({})", payload, e),
            }
        }
    }
}

/// Turn a streaming response body into decoded messages
fn into_messages(response: Response) -> LogSubscription {
    let state = StreamState {
        response: Some(response),
        parser: SseDataParser::default(),
        pending: VecDeque::new(),
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(message) = state.pending.pop_front() {
                return Some((Ok(message), state));
            }

            let response = state.response.as_mut()?;
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let payloads = state.parser.push_chunk(&chunk);
                    state.enqueue(payloads);
                }
                Ok(None) => {
                    state.response = None;
                    let payloads = state.parser.finish();
                    state.enqueue(payloads);
                }
                Err(e) => {
                    state.response = None;
                    return Some((Err(ConsoleError::HttpError(e)), state));
                }
            }
        }
    })
    .boxed()
}
