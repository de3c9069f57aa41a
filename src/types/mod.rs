//! Core data types for content operations.

pub mod content;
pub mod page;
pub mod work;
