//! Catalog access for the orchestrators.
//!
//! [CachedCatalog] puts a [QueryCache] in front of a catalog client,
//! so every view asks for data by key and identical requests are
//! shared instead of repeated.

use std::sync::Arc;

pub use stockhub_catalog::{
    CatalogClient,
    CatalogClientConfig,
    CatalogClientError,
    Client,
    ClientTrait,
    DEFAULT_CATALOG_URL,
    DEFAULT_PAGE_SIZE,
    DEFAULT_PEER_LIMIT,
    ListingPage,
    MockClient,
    MockDataError,
    Product,
    ProductId,
    Response,
    STOCKHUB_CATALOG_MOCK_DATA_VAR,
};

use crate::utils::query_cache::{QueryCache, QueryKey, QueryPolicy, SharedError};

/// A catalog client together with the request cache owned by the session.
#[derive(Debug)]
pub struct CachedCatalog<C> {
    client: Arc<C>,
    pages: QueryCache<Arc<ListingPage>>,
    products: QueryCache<Arc<Product>>,
    categories: QueryCache<Arc<Vec<String>>>,
    category_products: QueryCache<Arc<Vec<Product>>>,
}

impl<C: ClientTrait + 'static> CachedCatalog<C> {
    pub fn new(client: C, policy: QueryPolicy) -> Self {
        Self {
            client: Arc::new(client),
            pages: QueryCache::new(policy.clone()),
            products: QueryCache::new(policy.clone()),
            categories: QueryCache::new(policy.clone()),
            category_products: QueryCache::new(policy),
        }
    }

    pub async fn list(
        &self,
        limit: u32,
        skip: u64,
        category: Option<&str>,
    ) -> Result<Arc<ListingPage>, SharedError> {
        let category = category.map(str::to_string);
        let key = QueryKey::List {
            limit,
            skip,
            category: category.clone(),
        };
        let client = self.client.clone();
        self.pages
            .fetch(key, move || {
                let client = client.clone();
                let category = category.clone();
                async move {
                    client
                        .list(limit, skip, category.as_deref())
                        .await
                        .map(Arc::new)
                }
            })
            .await
    }

    pub async fn search(&self, query: &str) -> Result<Arc<ListingPage>, SharedError> {
        let query = query.to_string();
        let key = QueryKey::Search {
            query: query.clone(),
        };
        let client = self.client.clone();
        self.pages
            .fetch(key, move || {
                let client = client.clone();
                let query = query.clone();
                async move { client.search(&query).await.map(Arc::new) }
            })
            .await
    }

    pub async fn product(&self, id: ProductId) -> Result<Arc<Product>, SharedError> {
        let client = self.client.clone();
        self.products
            .fetch(QueryKey::Product { id }, move || {
                let client = client.clone();
                async move { client.product(id).await.map(Arc::new) }
            })
            .await
    }

    pub async fn categories(&self) -> Result<Arc<Vec<String>>, SharedError> {
        let client = self.client.clone();
        self.categories
            .fetch(QueryKey::Categories, move || {
                let client = client.clone();
                async move { client.categories().await.map(Arc::new) }
            })
            .await
    }

    pub async fn products_by_category(
        &self,
        category: &str,
        limit: u32,
    ) -> Result<Arc<Vec<Product>>, SharedError> {
        let category = category.to_string();
        let key = QueryKey::CategoryProducts {
            category: category.clone(),
            limit,
        };
        let client = self.client.clone();
        self.category_products
            .fetch(key, move || {
                let client = client.clone();
                let category = category.clone();
                async move {
                    client
                        .products_by_category(&category, limit)
                        .await
                        .map(Arc::new)
                }
            })
            .await
    }

    /// Forget the cached result for `key`, whichever operation it belongs to.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        match key {
            QueryKey::List { .. } | QueryKey::Search { .. } => self.pages.invalidate(key),
            QueryKey::Product { .. } => self.products.invalidate(key),
            QueryKey::Categories => self.categories.invalidate(key),
            QueryKey::CategoryProducts { .. } => self.category_products.invalidate(key),
        }
    }

    pub fn clear(&self) {
        self.pages.clear();
        self.products.clear();
        self.categories.clear();
        self.category_products.clear();
    }

    /// Number of cached or in flight requests.
    pub fn len(&self) -> usize {
        self.pages.len() + self.products.len() + self.categories.len() + self.category_products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
