//! Catalog client issuing plain HTTP GET requests against the catalog API.

use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;

use enum_dispatch::enum_dispatch;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, map_reqwest_error};
use crate::mock::MockClient;
use crate::types::{ListingPage, Product, ProductId};

/// Number of products requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Number of products requested when looking up products of a category.
pub const DEFAULT_PEER_LIMIT: u32 = 6;

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

/// The complete catalog API interface.
///
/// Every operation issues exactly one request.
/// Retries are the responsibility of the caller.
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Fetch one page of the product listing,
    /// optionally restricted to a single category.
    async fn list(
        &self,
        limit: u32,
        skip: u64,
        category: Option<&str>,
    ) -> Result<ListingPage, CatalogClientError>;

    /// Free text search. The catalog answers with a single page.
    async fn search(&self, query: &str) -> Result<ListingPage, CatalogClientError>;

    /// Fetch a single product.
    async fn product(&self, id: ProductId) -> Result<Product, CatalogClientError>;

    /// List the slugs of all categories.
    async fn categories(&self) -> Result<Vec<String>, CatalogClientError>;

    /// Fetch the first `limit` products of a category.
    async fn products_by_category(
        &self,
        category: &str,
        limit: u32,
    ) -> Result<Vec<Product>, CatalogClientError>;
}

/// A client for the catalog service.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url = Url::parse(&config.catalog_url).map_err(|e| {
            CatalogClientError::Other(format!(
                "invalid catalog url '{}': {e}",
                config.catalog_url
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogClientError::Other(format!(
                "catalog url '{}' cannot be used as a base url",
                config.catalog_url
            )));
        }

        let http = build_http_client(&config)?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // `cannot_be_a_base` urls are rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> Result<T, CatalogClientError> {
        debug!(%url, operation, "sending catalog request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, operation, "catalog responded with an error status");
            return Err(CatalogClientError::fetch(operation, status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| map_reqwest_error(operation, e))
    }
}

impl ClientTrait for CatalogClient {
    #[instrument(skip(self))]
    async fn list(
        &self,
        limit: u32,
        skip: u64,
        category: Option<&str>,
    ) -> Result<ListingPage, CatalogClientError> {
        let mut url = match category {
            Some(category) => self.endpoint(["products", "category", category]),
            None => self.endpoint(["products"]),
        };
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("skip", &skip.to_string());

        let page: ListingPage = self.get_json("fetch products", url).await?;
        debug!(
            n_products = page.products.len(),
            total = page.total,
            "received listing page"
        );
        Ok(page.normalize())
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<ListingPage, CatalogClientError> {
        let mut url = self.endpoint(["products", "search"]);
        url.query_pairs_mut().append_pair("q", query);

        let page: ListingPage = self.get_json("search products", url).await?;
        debug!(
            n_products = page.products.len(),
            total = page.total,
            "received search results"
        );
        Ok(page.normalize())
    }

    #[instrument(skip(self))]
    async fn product(&self, id: ProductId) -> Result<Product, CatalogClientError> {
        let url = self.endpoint(["products", &id.to_string()]);
        let product: Product = self.get_json("fetch product", url).await?;
        Ok(product.normalize())
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<String>, CatalogClientError> {
        let url = self.endpoint(["products", "category-list"]);
        self.get_json("fetch categories", url).await
    }

    #[instrument(skip(self))]
    async fn products_by_category(
        &self,
        category: &str,
        limit: u32,
    ) -> Result<Vec<Product>, CatalogClientError> {
        let mut url = self.endpoint(["products", "category", category]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let page: ListingPage = self.get_json("fetch products by category", url).await?;
        Ok(page.normalize().products)
    }
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build the HTTP client used for all catalog requests.
fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        "building catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(60));

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
