//! A catalog client that serves canned responses.
//!
//! Responses are consumed in order, one per request,
//! regardless of which operation is called.
//! They can be pushed by tests or read from a JSON file.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientTrait;
use crate::error::CatalogClientError;
use crate::types::{ListingPage, Product, ProductId};

type MockField<T> = Arc<Mutex<T>>;

/// Path to a JSON file of [Response]s to serve instead of the catalog
pub const STOCKHUB_CATALOG_MOCK_DATA_VAR: &str = "_STOCKHUB_USE_CATALOG_MOCK";

/// A canned response for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Response {
    Page(ListingPage),
    Product(Product),
    Categories(Vec<String>),
    Products(Vec<Product>),
    /// Respond with the given HTTP status
    Error(u16),
}

#[derive(Debug, Error)]
pub enum MockDataError {
    /// Failed to read the JSON file pointed to by the mock data path
    #[error("failed to read mock response file")]
    ReadMockFile(#[source] std::io::Error),
    /// Failed to parse the contents of the mock data file as JSON
    #[error("failed to parse mock data as JSON")]
    ParseJson(#[source] serde_json::Error),
}

/// Reads a list of mock responses from disk.
fn read_mock_responses(path: impl AsRef<Path>) -> Result<VecDeque<Response>, MockDataError> {
    let contents = std::fs::read_to_string(path).map_err(MockDataError::ReadMockFile)?;
    let deserialized: Vec<Response> =
        serde_json::from_str(&contents).map_err(MockDataError::ParseJson)?;
    Ok(deserialized.into())
}

/// A catalog client that can be seeded with mock responses
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_responses: MockField<VecDeque<Response>>,
    /// Human readable log of the requests received, in order
    requests: MockField<Vec<String>>,
    calls: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl MockClient {
    /// Create a new mock client, potentially reading mock responses from disk
    pub fn new(mock_data_path: Option<impl AsRef<Path>>) -> Result<Self, MockDataError> {
        let mock_responses = match mock_data_path {
            Some(path) => read_mock_responses(path)?,
            None => VecDeque::new(),
        };
        Ok(Self {
            mock_responses: Arc::new(Mutex::new(mock_responses)),
            ..Default::default()
        })
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Push a new response into the list of mock responses
    pub fn push_response(&mut self, resp: Response) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(resp);
    }

    pub fn push_page_response(&mut self, page: ListingPage) {
        self.push_response(Response::Page(page));
    }

    pub fn push_product_response(&mut self, product: Product) {
        self.push_response(Response::Product(product));
    }

    pub fn push_categories_response(&mut self, categories: Vec<String>) {
        self.push_response(Response::Categories(categories));
    }

    pub fn push_products_response(&mut self, products: Vec<Product>) {
        self.push_response(Response::Products(products));
    }

    /// Push an HTTP error status into the list of mock responses
    pub fn push_error_response(&mut self, status_code: u16) {
        self.push_response(Response::Error(status_code));
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The requests received so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }

    /// Number of responses not consumed yet.
    pub fn remaining(&self) -> usize {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .len()
    }

    async fn next_response(&self, request: String) -> Option<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(request);
        let resp = self
            .mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front();
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        resp
    }
}

fn error_response(operation: &'static str, status_code: u16) -> CatalogClientError {
    let status = StatusCode::from_u16(status_code).expect("mock status code should be valid");
    CatalogClientError::fetch(operation, status)
}

impl ClientTrait for MockClient {
    async fn list(
        &self,
        limit: u32,
        skip: u64,
        category: Option<&str>,
    ) -> Result<ListingPage, CatalogClientError> {
        let request = format!(
            "list limit={limit} skip={skip} category={}",
            category.unwrap_or("")
        );
        match self.next_response(request).await {
            Some(Response::Page(page)) => Ok(page.normalize()),
            Some(Response::Error(status)) => Err(error_response("fetch products", status)),
            other => panic!("expected page response, found {other:?}"),
        }
    }

    async fn search(&self, query: &str) -> Result<ListingPage, CatalogClientError> {
        match self.next_response(format!("search q={query}")).await {
            Some(Response::Page(page)) => Ok(page.normalize()),
            Some(Response::Error(status)) => Err(error_response("search products", status)),
            other => panic!("expected page response, found {other:?}"),
        }
    }

    async fn product(&self, id: ProductId) -> Result<Product, CatalogClientError> {
        match self.next_response(format!("product id={id}")).await {
            Some(Response::Product(product)) => Ok(product.normalize()),
            Some(Response::Error(status)) => Err(error_response("fetch product", status)),
            other => panic!("expected product response, found {other:?}"),
        }
    }

    async fn categories(&self) -> Result<Vec<String>, CatalogClientError> {
        match self.next_response("categories".to_string()).await {
            Some(Response::Categories(categories)) => Ok(categories),
            Some(Response::Error(status)) => Err(error_response("fetch categories", status)),
            other => panic!("expected categories response, found {other:?}"),
        }
    }

    async fn products_by_category(
        &self,
        category: &str,
        limit: u32,
    ) -> Result<Vec<Product>, CatalogClientError> {
        let request = format!("products_by_category category={category} limit={limit}");
        match self.next_response(request).await {
            Some(Response::Products(products)) => {
                Ok(products.into_iter().map(Product::normalize).collect())
            },
            Some(Response::Page(page)) => Ok(page.normalize().products),
            Some(Response::Error(status)) => {
                Err(error_response("fetch products by category", status))
            },
            other => panic!("expected products response, found {other:?}"),
        }
    }
}
