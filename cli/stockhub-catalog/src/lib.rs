//! HTTP client for the remote product catalog.
//!
//! This crate provides:
//! - HTTP client construction and the [`ClientTrait`] operations the
//!   front end consumes (listing, search, single product, categories)
//! - The wire types returned by the catalog ([`Product`], [`ListingPage`], ...)
//! - A uniform error type for transport and HTTP status failures
//! - A [`MockClient`] serving canned responses for tests
//!
//! ## Usage
//!
//! ```ignore
//! use stockhub_catalog::{CatalogClient, CatalogClientConfig, ClientTrait};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let page = client.list(20, 0, Some("beauty")).await?;
//! ```

mod client;
mod config;
mod error;
mod mock;
pub mod types;

pub use client::{CatalogClient, Client, ClientTrait, DEFAULT_PAGE_SIZE, DEFAULT_PEER_LIMIT};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::CatalogClientError;
pub use mock::{MockClient, MockDataError, Response, STOCKHUB_CATALOG_MOCK_DATA_VAR};
pub use types::*;
