//! Bing Web Search v7 client: site-restricted web search over HTTP.

pub mod client;
pub mod results;
pub mod types;

pub use client::{BingClient, BingError, WebSearch};
pub use types::SearchResult;
