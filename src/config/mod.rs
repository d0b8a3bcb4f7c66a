pub mod tracker;

pub use tracker::{
    FeedConfig, Mode, PublisherConfig, PublisherKind, ServerConfig, Subject, TrackerConfig,
};
