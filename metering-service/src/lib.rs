pub mod config;
pub mod http;
pub mod metrics_server;
pub mod observability;
pub mod service;
pub mod store;

pub use service::{BatchService, ProfileInput, ReadingStatus};
