//! The product detail page: one product, its images and similar products.

use std::sync::Arc;

use serde::Serialize;
use stockhub_catalog::{ClientTrait, DEFAULT_PEER_LIMIT, Product, ProductId};
use tracing::{debug, instrument, warn};

use super::stock::StockStatus;
use crate::providers::catalog::CachedCatalog;
use crate::utils::query_cache::SharedError;

/// Cycles through the images of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageGallery {
    images: Vec<String>,
    selected: usize,
}

impl ImageGallery {
    pub fn new(images: Vec<String>) -> Self {
        Self {
            images,
            selected: 0,
        }
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&str> {
        self.images.get(self.selected).map(String::as_str)
    }

    pub fn next(&mut self) {
        if !self.images.is_empty() {
            self.selected = (self.selected + 1) % self.images.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.images.is_empty() {
            self.selected = (self.selected + self.images.len() - 1) % self.images.len();
        }
    }

    /// Select the image at `index`, returns false if there is none.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.images.len() {
            self.selected = index;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub product: Arc<Product>,
    pub stock_status: StockStatus,
    pub similar: Vec<Product>,
    #[serde(skip)]
    pub images: ImageGallery,
}

/// Products of the same category as `id`, without `id` itself.
pub fn similar_products(id: ProductId, peers: &[Product], limit: usize) -> Vec<Product> {
    peers
        .iter()
        .filter(|peer| peer.id != id)
        .take(limit)
        .cloned()
        .collect()
}

/// Loads [ProductDetail]s.
#[derive(Debug)]
pub struct DetailOrchestrator<'a, C> {
    catalog: &'a CachedCatalog<C>,
    similar_limit: u32,
}

impl<'a, C: ClientTrait + 'static> DetailOrchestrator<'a, C> {
    pub fn new(catalog: &'a CachedCatalog<C>) -> Self {
        Self {
            catalog,
            similar_limit: DEFAULT_PEER_LIMIT,
        }
    }

    pub fn with_similar_limit(mut self, similar_limit: u32) -> Self {
        self.similar_limit = similar_limit;
        self
    }

    /// Fetch the product `id` and up to `similar_limit` similar products.
    ///
    /// Only a failure to fetch the product itself is an error,
    /// if the similar products can't be fetched there are none.
    #[instrument(skip(self))]
    pub async fn load(&self, id: ProductId) -> Result<ProductDetail, SharedError> {
        let product = self.catalog.product(id).await?;
        let similar = self.similar(&product).await;
        debug!(%id, similar = similar.len(), "loaded product detail");

        Ok(ProductDetail {
            stock_status: StockStatus::classify(product.stock),
            images: ImageGallery::new(product.images.clone()),
            similar,
            product,
        })
    }

    async fn similar(&self, product: &Product) -> Vec<Product> {
        // one extra, the product itself is usually among its peers
        let lookup = self.similar_limit + 1;
        match self
            .catalog
            .products_by_category(&product.category, lookup)
            .await
        {
            Ok(peers) => similar_products(product.id, &peers, self.similar_limit as usize),
            Err(error) => {
                warn!(category = %product.category, %error, "failed to fetch similar products");
                Vec::new()
            },
        }
    }
}
