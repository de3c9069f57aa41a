//! Proxy-racing HTTP fetcher.
//!
//! Direct requests fail often on CORS-restricted or bot-hostile hosts, so
//! every plain fetch is raced against a set of public CORS relays. The
//! direct attempt gets the shortest timeout (fastest when it works, highest
//! fail rate); the relays get progressively longer ones.

use std::time::Duration;

use reqwest::header::{HeaderMap, USER_AGENT};
use tracing::debug;
use url::form_urlencoded;

use crate::error::{FetchError, FetchResult};
use crate::fetch::race::{race, RaceStrategy};

const DIRECT_TIMEOUT: Duration = Duration::from_secs(4);
const PROXY_TIMEOUT: Duration = Duration::from_secs(8);
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// A fetched HTTP response body.
///
/// Any status below 500 qualifies as a race win; callers inspect `status`
/// when they care about the distinction.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,

    /// Final URL after redirects
    pub final_url: String,
}

/// HTTP fetcher that races a direct request against public CORS relays.
///
/// # Example
///
/// ```rust,ignore
/// use contentops::fetch::ProxyFetcher;
///
/// let fetcher = ProxyFetcher::new();
/// let response = fetcher.fetch("https://example.com/sitemap.xml").await?;
/// ```
#[derive(Clone)]
pub struct ProxyFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for ProxyFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyFetcher {
    /// Create a new fetcher with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            user_agent: "ContentOpsBot/1.0".to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Fetch a URL, racing the direct request against the CORS relays.
    ///
    /// Must not be used for requests carrying credentials; use
    /// [`ProxyFetcher::fetch_authenticated`] for those.
    pub async fn fetch(&self, url: &str) -> FetchResult<FetchedResponse> {
        let encoded: String = form_urlencoded::byte_serialize(url.as_bytes()).collect();

        let strategies = vec![
            RaceStrategy::new(
                "direct",
                fetch_once(self.client.clone(), self.user_agent.clone(), url.to_string()),
            )
            .with_timeout(DIRECT_TIMEOUT),
            RaceStrategy::new(
                "corsproxy",
                fetch_once(
                    self.client.clone(),
                    self.user_agent.clone(),
                    format!("https://corsproxy.io/?{}", encoded),
                ),
            )
            .with_timeout(PROXY_TIMEOUT),
            RaceStrategy::new(
                "allorigins",
                fetch_once(
                    self.client.clone(),
                    self.user_agent.clone(),
                    format!("https://api.allorigins.win/raw?url={}", encoded),
                ),
            )
            .with_timeout(PROXY_TIMEOUT),
            RaceStrategy::new(
                "thingproxy",
                fetch_once(
                    self.client.clone(),
                    self.user_agent.clone(),
                    format!("https://thingproxy.freeboard.io/fetch/{}", url),
                ),
            )
            .with_timeout(FALLBACK_TIMEOUT),
        ];

        race(strategies).await
    }

    /// Fetch a URL with request headers that carry credentials.
    ///
    /// Credentialed requests are never relayed through public proxies:
    /// the strategy list is reduced to the direct request alone. Callers
    /// wrap this in the retry wrapper when resilience is needed.
    pub async fn fetch_authenticated(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> FetchResult<FetchedResponse> {
        debug!(url = %url, "authenticated fetch, relays omitted");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .headers(headers)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        into_fetched(response).await
    }
}

/// Single GET attempt used as one race participant.
async fn fetch_once(
    client: reqwest::Client,
    user_agent: String,
    url: String,
) -> FetchResult<FetchedResponse> {
    let response = client
        .get(&url)
        .header(USER_AGENT, &user_agent)
        .send()
        .await
        .map_err(|e| FetchError::Http(Box::new(e)))?;

    into_fetched(response).await
}

async fn into_fetched(response: reqwest::Response) -> FetchResult<FetchedResponse> {
    let status = response.status();
    if status.is_server_error() {
        return Err(FetchError::ServerError {
            status: status.as_u16(),
        });
    }

    let final_url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Http(Box::new(e)))?;

    Ok(FetchedResponse {
        status: status.as_u16(),
        body,
        final_url,
    })
}
