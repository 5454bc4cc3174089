use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use rentlens_protocol::listing::ListingQuery;
use rentlens_protocol::listing::Property;
use rentlens_protocol::listing::PropertyPage;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::build_http_client;
use crate::config::Config;
use crate::error::RentlensErr;
use crate::error::Result;

/// Client for the REST listing service.
#[derive(Debug, Clone)]
pub struct ListingClient {
    http: reqwest::Client,
    api_base: String,
    request_timeout: Duration,
}

impl ListingClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config)?,
            api_base: config.api_base.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// `GET /properties` with `query` as the query string.
    pub async fn list(&self, query: &ListingQuery) -> Result<PropertyPage> {
        let url = format!("{}/properties", self.api_base);
        let req = self.http.get(&url).query(query);
        let body = self.exec_request(req, &url).await?;
        decode_json(&url, &body)
    }

    /// `GET /properties/{id}`.
    pub async fn get(&self, id: &str) -> Result<Property> {
        let url = format!("{}/properties/{}", self.api_base, id.trim());
        let req = self.http.get(&url);
        let body = self.exec_request(req, &url).await?;
        decode_json(&url, &body)
    }

    async fn exec_request(&self, req: reqwest::RequestBuilder, url: &str) -> Result<String> {
        let res = req.timeout(self.request_timeout).send().await?;
        let status = res.status();
        let ct = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = res.text().await.unwrap_or_default();
        debug!("GET {url}: {status}; content-type={ct}");
        if !status.is_success() {
            return Err(RentlensErr::UnexpectedStatus {
                status,
                url: url.to_string(),
                body,
            });
        }
        Ok(body)
    }
}

fn decode_json<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
    serde_json::from_str::<T>(body).map_err(|source| RentlensErr::Decode {
        url: url.to_string(),
        source,
    })
}
