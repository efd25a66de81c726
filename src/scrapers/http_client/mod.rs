//! HTTP client shared by the catalog scraper, the PDF harvesters and the
//! NGSI passthrough.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, BROWSER_USER_AGENT, USER_AGENT};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::debug;

/// Header list sent with a single request. Names are sent as given.
pub type RequestHeaders = [(String, String)];

/// HTTP client with a cookie store and an optional post-request delay.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration, request_delay: Duration) -> Result<Self, reqwest::Error> {
        Self::with_user_agent(timeout, request_delay, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use default user agent
    /// - Some("browser"): Use the desktop browser user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        request_delay: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, reqwest::Error> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            request_delay,
        })
    }

    /// Make a GET request with extra headers.
    pub async fn get(
        &self,
        url: &str,
        headers: &RequestHeaders,
    ) -> Result<HttpResponse, reqwest::Error> {
        self.get_with_query(url, headers, &[]).await
    }

    /// Make a GET request with extra headers and query parameters.
    pub async fn get_with_query(
        &self,
        url: &str,
        headers: &RequestHeaders,
        query: &[(String, String)],
    ) -> Result<HttpResponse, reqwest::Error> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        let start = Instant::now();
        let response = request.send().await?;
        debug!(
            "GET {} -> {} ({} ms)",
            url,
            response.status().as_u16(),
            start.elapsed().as_millis()
        );

        // Extract response headers
        let mut response_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                response_headers.insert(name.to_string(), v.to_string());
            }
        }

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        Ok(HttpResponse {
            status: response.status(),
            headers: response_headers,
            response,
        })
    }
}
