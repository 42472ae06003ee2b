//! Spotify integration: HTTP client, wire types and the page collector.

pub mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod models;
pub mod pagination;

pub use client::{SpotifyClient, TokenEndpoint, TokenGrant};
pub use pagination::{collect, typed, PageSource};
