//! Publisher trait for pushing finished drafts to a site.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::content::GeneratedContent;

/// Target state for a published post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    /// Saved on the site but not publicly visible
    Draft,

    /// Publicly visible immediately
    Publish,
}

/// What the site reported back after a publish call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Whether the site accepted the post
    pub success: bool,

    /// Human-readable status, including any rejection reason
    pub message: String,

    /// Permalink of the created or updated post, when accepted
    pub link: Option<String>,
}

impl PublishReceipt {
    /// Receipt for an accepted post.
    pub fn accepted(message: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            link: Some(link.into()),
        }
    }

    /// Receipt for a rejected post.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            link: None,
        }
    }
}

/// Publisher trait for content targets.
///
/// Implementations handle the target site's API, authentication, and
/// create-vs-update resolution. The pipeline only cares that a draft
/// either landed or came back with a reason.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create or update a post from a finished draft.
    async fn publish(
        &self,
        draft: &GeneratedContent,
        status: PublishStatus,
    ) -> Result<PublishReceipt>;
}
