//! Publishing backends.

mod wordpress;

pub use wordpress::WordPressPublisher;
