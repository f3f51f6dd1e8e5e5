//! Fetch implementations.
//!
//! [`HttpFetcher`] is the built-in HTTP JSON fetch used for every request
//! without a custom [`crate::traits::Fetcher`]. [`MockFetcher`] is a
//! configurable test double.

mod http;
mod mock;

pub use http::HttpFetcher;
pub use mock::MockFetcher;
