//! Security primitives - credential handling.

mod credentials;

pub use credentials::{AiCredentials, SecretString, WordPressCredentials};
