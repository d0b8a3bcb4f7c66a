// src/feed/mod.rs
pub mod providers;
pub mod types;

pub use types::{Event, EventKey, FeedProvider, Play};
