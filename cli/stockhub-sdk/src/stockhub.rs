use std::time::Duration;

use stockhub_catalog::{Client, DEFAULT_PAGE_SIZE, DEFAULT_PEER_LIMIT, ProductId};

use crate::models::catalogue::{CategoryTile, catalogue_overview};
use crate::models::detail::{DetailOrchestrator, ProductDetail};
use crate::models::listing::{Listing, ListingOrchestrator};
use crate::providers::catalog::CachedCatalog;
use crate::utils::debounce::DEFAULT_DEBOUNCE;
use crate::utils::query_cache::{QueryPolicy, SharedError};

/// The context of a browsing session.
///
/// A [Stockhub] owns the catalog client and the request cache,
/// both live as long as the session.
/// Views borrow it to create their orchestrators.
#[derive(Debug)]
pub struct Stockhub {
    pub catalog: CachedCatalog<Client>,
    /// Number of products per listing page
    pub page_size: u32,
    /// Maximum number of similar products on a detail page
    pub similar_limit: u32,
    /// How long search input has to settle before it is sent
    pub search_debounce: Duration,
}

impl Stockhub {
    pub fn new(client: impl Into<Client>, policy: QueryPolicy) -> Self {
        Self {
            catalog: CachedCatalog::new(client.into(), policy),
            page_size: DEFAULT_PAGE_SIZE,
            similar_limit: DEFAULT_PEER_LIMIT,
            search_debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// An empty listing using the configured page size.
    pub fn new_listing(&self) -> Listing {
        Listing::new(self.page_size)
    }

    pub fn listing(&self, listing: Listing) -> ListingOrchestrator<'_, Client> {
        ListingOrchestrator::new(&self.catalog, listing)
    }

    pub fn detail(&self) -> DetailOrchestrator<'_, Client> {
        DetailOrchestrator::new(&self.catalog).with_similar_limit(self.similar_limit)
    }

    pub async fn product_detail(&self, id: ProductId) -> Result<ProductDetail, SharedError> {
        self.detail().load(id).await
    }

    pub async fn catalogue(&self) -> Result<Vec<CategoryTile>, SharedError> {
        catalogue_overview(&self.catalog).await
    }
}

#[cfg(any(test, feature = "tests"))]
pub mod test_helpers {
    use stockhub_catalog::MockClient;

    use super::*;

    /// A [Stockhub] backed by `client`, retrying without delay.
    pub fn stockhub_instance(client: MockClient) -> Stockhub {
        Stockhub::new(client, QueryPolicy {
            retry_delay: Duration::ZERO,
            ..QueryPolicy::default()
        })
    }
}
