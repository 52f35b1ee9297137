use std::time::Duration;

use ln_core::config::USER_AGENT;
use ln_core::{FetchError, Result};
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

/// Shared HTTP client for every source adapter.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn get(&self, url: &str, budget: Duration) -> RequestBuilder {
        self.client.get(url).timeout(budget)
    }

    /// Sends `request` and turns transport errors and non-success statuses into a `FetchError`.
    pub async fn send(&self, source_name: &str, request: RequestBuilder) -> std::result::Result<Response, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(source_name, &e))?;
        let status = response.status();
        debug!("{} answered HTTP {}", source_name, status);
        if !status.is_success() {
            return Err(FetchError::from_status(source_name, status.as_u16()));
        }
        Ok(response)
    }

    pub async fn get_text(&self, source_name: &str, url: &str, budget: Duration) -> std::result::Result<String, FetchError> {
        let response = self.send(source_name, self.get(url, budget)).await?;
        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(source_name, &e))
    }

    pub async fn get_bytes(&self, source_name: &str, url: &str, budget: Duration) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self.send(source_name, self.get(url, budget)).await?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::from_reqwest(source_name, &e))
    }
}
