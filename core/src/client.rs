use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use reqwest::header::ACCEPT;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::USER_AGENT;
use rentlens_protocol::ChatRequest;
use rentlens_protocol::StreamEvent;
use tracing::debug;
use tracing::trace;

use crate::config::Config;
use crate::error::RentlensErr;
use crate::error::Result;
use crate::sse::decode_stream;

/// Ordered events of one analysis stream.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

const USER_AGENT_VALUE: &str = concat!("rentlens/", env!("CARGO_PKG_VERSION"));

/// Shared `reqwest` client for both collaborators. Only the connect timeout
/// is set here: the analysis stream may legitimately stay open for minutes.
pub(crate) fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .build()?)
}

/// Client for `POST {api_base}/chat/stream`.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    api_base: String,
    request_timeout: Duration,
    stream_idle_timeout: Duration,
}

impl AnalysisClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config)?,
            api_base: config.api_base.clone(),
            request_timeout: config.request_timeout,
            stream_idle_timeout: config.stream_idle_timeout,
        })
    }

    pub fn stream_url(&self) -> String {
        format!("{}/chat/stream", self.api_base)
    }

    /// Open an analysis stream. Fails on connection errors, a header timeout
    /// and non-2xx statuses; everything after the headers is reported through
    /// the returned stream.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream> {
        let url = self.stream_url();
        trace!(
            "POST to {url}: {}",
            serde_json::to_string(request).unwrap_or_default()
        );

        let send = self
            .http
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send();
        let resp = match tokio::time::timeout(self.request_timeout, send).await {
            Ok(resp) => resp?,
            Err(_) => {
                return Err(RentlensErr::Stream(format!(
                    "no response headers from {url} within {:?}",
                    self.request_timeout
                )));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!("analysis stream rejected: {status} {body}");
            return Err(RentlensErr::UnexpectedStatus { status, url, body });
        }

        let bytes = Box::pin(resp.bytes_stream());
        Ok(Box::pin(decode_stream(bytes, self.stream_idle_timeout)))
    }
}
