//! WordPress REST API publisher.
//!
//! Publishes drafts through `/wp-json/wp/v2/posts` using an application
//! password over HTTP basic auth. Create-vs-update is resolved by slug:
//! an existing post with the draft's slug is updated in place, otherwise
//! a new post is created. Calls are rate limited with the governor crate
//! so bulk runs stay polite to the target site.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::security::WordPressCredentials;
use crate::traits::{PublishReceipt, PublishStatus, Publisher};
use crate::types::content::GeneratedContent;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REQUESTS_PER_SECOND: u32 = 2;

/// Publisher backed by a WordPress site's REST API.
pub struct WordPressPublisher {
    client: reqwest::Client,
    credentials: WordPressCredentials,
    limiter: Arc<DefaultRateLimiter>,
}

impl WordPressPublisher {
    /// Create a publisher for the given site.
    pub fn new(credentials: WordPressCredentials) -> Self {
        Self::with_rate(credentials, DEFAULT_REQUESTS_PER_SECOND)
    }

    /// Create a publisher with a custom sustained request rate.
    pub fn with_rate(credentials: WordPressCredentials, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second.max(1)).unwrap_or(nonzero!(1u32)),
        )
        .allow_burst(nonzero!(5u32));

        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            credentials,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    fn posts_endpoint(&self) -> String {
        format!("{}/wp-json/wp/v2/posts", self.credentials.site_url)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(
            &self.credentials.username,
            Some(self.credentials.app_password.expose()),
        )
    }

    /// Look up an existing post id by slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<u64>> {
        self.limiter.until_ready().await;

        let response = self
            .authed(self.client.get(self.posts_endpoint()))
            .query(&[("slug", slug), ("status", "any")])
            .send()
            .await
            .map_err(|e| PipelineError::Publish {
                message: format!("slug lookup failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(PipelineError::Publish {
                message: format!("slug lookup returned HTTP {}", response.status().as_u16()),
            });
        }

        let posts: Vec<serde_json::Value> =
            response.json().await.map_err(|e| PipelineError::Publish {
                message: format!("slug lookup returned invalid JSON: {e}"),
            })?;

        Ok(posts.first().and_then(|p| p["id"].as_u64()))
    }
}

#[async_trait]
impl Publisher for WordPressPublisher {
    async fn publish(
        &self,
        draft: &GeneratedContent,
        status: PublishStatus,
    ) -> Result<PublishReceipt> {
        let existing = self.find_by_slug(&draft.slug).await?;

        let url = match existing {
            Some(id) => format!("{}/{}", self.posts_endpoint(), id),
            None => self.posts_endpoint(),
        };
        debug!(slug = %draft.slug, updating = existing.is_some(), "publishing post");

        let body = json!({
            "title": draft.title,
            "slug": draft.slug,
            "content": draft.content,
            "excerpt": draft.meta_description,
            "status": match status {
                PublishStatus::Draft => "draft",
                PublishStatus::Publish => "publish",
            },
        });

        self.limiter.until_ready().await;

        let response = self
            .authed(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Publish {
                message: format!("publish request failed: {e}"),
            })?;

        let http_status = response.status();
        if !http_status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Ok(PublishReceipt::rejected(format!(
                "HTTP {}: {}",
                http_status.as_u16(),
                detail.chars().take(200).collect::<String>()
            )));
        }

        let post: serde_json::Value =
            response.json().await.map_err(|e| PipelineError::Publish {
                message: format!("publish response was invalid JSON: {e}"),
            })?;

        let link = post["link"].as_str().unwrap_or_default().to_string();
        let verb = if existing.is_some() {
            "updated"
        } else {
            "created"
        };
        info!(slug = %draft.slug, link = %link, "post {verb}");

        Ok(PublishReceipt::accepted(format!("post {verb}"), link))
    }
}
