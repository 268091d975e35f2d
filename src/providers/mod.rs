//! Document fetchers for the index sources.

pub mod http;

pub use http::HttpFetcher;
