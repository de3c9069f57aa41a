//! Trait seams for pluggable backends.

mod ai;
mod publisher;

pub use ai::{AiClient, OutputFormat, PromptRequest};
pub use publisher::{PublishReceipt, PublishStatus, Publisher};
