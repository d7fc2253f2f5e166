//! Paginated product listings.
//!
//! [Listing] is the state of one listing view: the active filters, the
//! products accumulated across "load more" pages, and the request currently
//! in flight. It does no I/O itself, every transition that needs data
//! returns a [ListingRequest] that the caller fetches and hands back to
//! [Listing::apply].
//! [ListingOrchestrator] drives a [Listing] against a [CachedCatalog].

use std::sync::Arc;

use serde::Serialize;
use stockhub_catalog::{ClientTrait, ListingPage, Product};
use tracing::{debug, instrument};

use super::catalogue::Category;
use super::sort::{Sort, SortField};
use crate::providers::catalog::CachedCatalog;
use crate::utils::query_cache::SharedError;

/// Identifies one logical result set.
///
/// A search term takes precedence over the category filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum QuerySignature {
    All,
    Category(String),
    Search(String),
}

/// A request issued by a [Listing].
///
/// `generation` changes every time the listing is reset,
/// so responses to requests issued before a reset can be told apart
/// even if the filters were changed back in the meantime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub signature: QuerySignature,
    pub generation: u64,
    pub skip: u64,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub enum ListingStatus {
    Idle,
    Loading(ListingRequest),
    Ready,
    LoadingMore(ListingRequest),
    Failed {
        error: SharedError,
        request: ListingRequest,
    },
}

/// Outcome of [Listing::load_more].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMore {
    /// The next page has to be fetched.
    Fetch(ListingRequest),
    /// More of the search results were revealed, nothing to fetch.
    Revealed,
    /// There is nothing more to load, or the listing is busy.
    Unavailable,
}

/// Outcome of handing a response (or an action) to the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    Failed,
    /// The response belongs to a request that is no longer current.
    Stale,
    /// Nothing had to be done.
    Unchanged,
}

/// What a listing view should render.
#[derive(Debug, Clone)]
pub enum ListingView {
    Idle,
    Loading,
    Empty,
    Failed(SharedError),
    Ready {
        items: Vec<Product>,
        has_more: bool,
        loading_more: bool,
        total: u64,
    },
}

#[derive(Debug, Clone)]
pub struct Listing {
    page_size: u32,
    category: Option<String>,
    search: Option<String>,
    sort: Sort,
    generation: u64,
    /// Accumulated pages, or the complete response of a search.
    items: Vec<Product>,
    total: u64,
    /// Number of pages of a search response shown so far.
    revealed_pages: u64,
    status: ListingStatus,
}

impl Listing {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            category: None,
            search: None,
            sort: Sort::default(),
            generation: 0,
            items: Vec::new(),
            total: 0,
            revealed_pages: 0,
            status: ListingStatus::Idle,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| !c.is_empty());
        self
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search.and_then(normalize_search);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn status(&self) -> &ListingStatus {
        &self.status
    }

    pub fn signature(&self) -> QuerySignature {
        match (&self.search, &self.category) {
            (Some(search), _) => QuerySignature::Search(search.clone()),
            (None, Some(category)) => QuerySignature::Category(category.clone()),
            (None, None) => QuerySignature::All,
        }
    }

    /// Discard all accumulated products and request the first page.
    pub fn start(&mut self) -> ListingRequest {
        self.generation += 1;
        self.items.clear();
        self.total = 0;
        self.revealed_pages = 0;
        let request = self.request(0);
        debug!(signature = ?request.signature, generation = request.generation, "listing reset");
        self.status = ListingStatus::Loading(request.clone());
        request
    }

    /// Filter by `category`, or show all products for `None`.
    ///
    /// Selecting a category clears the search term.
    /// Returns the request for the first page if the result set changed.
    pub fn set_category(&mut self, category: Option<String>) -> Option<ListingRequest> {
        let before = self.signature();
        self.category = category.filter(|c| !c.is_empty());
        self.search = None;
        self.restart_if_changed(before)
    }

    /// Search for `term`, a blank term ends the search.
    ///
    /// Returns the request for the first page if the result set changed.
    pub fn set_search(&mut self, term: &str) -> Option<ListingRequest> {
        let before = self.signature();
        self.search = normalize_search(term);
        self.restart_if_changed(before)
    }

    fn restart_if_changed(&mut self, before: QuerySignature) -> Option<ListingRequest> {
        if before == self.signature() && !matches!(self.status, ListingStatus::Idle) {
            return None;
        }
        Some(self.start())
    }

    /// Show the next page.
    ///
    /// Only possible while the listing is ready and has more products.
    pub fn load_more(&mut self) -> LoadMore {
        if !matches!(self.status, ListingStatus::Ready) || !self.has_more() {
            return LoadMore::Unavailable;
        }
        if self.search.is_some() {
            self.revealed_pages += 1;
            return LoadMore::Revealed;
        }
        let request = self.request(self.items.len() as u64);
        self.status = ListingStatus::LoadingMore(request.clone());
        LoadMore::Fetch(request)
    }

    /// Issue the failed request again.
    pub fn retry(&mut self) -> Option<ListingRequest> {
        let ListingStatus::Failed { request, .. } = &self.status else {
            return None;
        };
        let request = request.clone();
        self.status = if request.skip == 0 {
            ListingStatus::Loading(request.clone())
        } else {
            ListingStatus::LoadingMore(request.clone())
        };
        Some(request)
    }

    /// Hand the response to `request` to the listing.
    ///
    /// Responses to anything but the request currently in flight are discarded.
    pub fn apply(
        &mut self,
        request: &ListingRequest,
        result: Result<Arc<ListingPage>, SharedError>,
    ) -> Applied {
        let in_flight = match &self.status {
            ListingStatus::Loading(in_flight) | ListingStatus::LoadingMore(in_flight) => in_flight,
            _ => return self.discard(request),
        };
        if in_flight != request {
            return self.discard(request);
        }

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                debug!(skip = request.skip, %error, "listing request failed");
                self.status = ListingStatus::Failed {
                    error,
                    request: request.clone(),
                };
                return Applied::Failed;
            },
        };

        match request.signature {
            QuerySignature::Search(_) => {
                self.items = page.products.clone();
                self.total = page.total;
                self.revealed_pages = 1;
            },
            QuerySignature::All | QuerySignature::Category(_) => {
                if request.skip == 0 {
                    self.items.clear();
                }
                let received = page.products.len();
                self.items.extend(page.products.iter().cloned());
                self.total = page.total;
                // An empty page past the first one means the total was overstated.
                if received == 0 && request.skip > 0 {
                    self.total = self.items.len() as u64;
                }
                self.items.truncate(self.total as usize);
            },
        }
        self.status = ListingStatus::Ready;
        Applied::Updated
    }

    fn discard(&self, request: &ListingRequest) -> Applied {
        debug!(
            signature = ?request.signature,
            generation = request.generation,
            skip = request.skip,
            "discarding stale listing response"
        );
        Applied::Stale
    }

    /// Sort by `field`, flipping the order if it is already the active field.
    pub fn sort_by(&mut self, field: SortField) {
        self.sort.toggle(field);
    }

    /// Number of products that can currently be shown.
    fn visible_len(&self) -> usize {
        match self.search {
            Some(_) => {
                let revealed = self.revealed_pages.saturating_mul(self.page_size as u64);
                self.items.len().min(revealed as usize)
            },
            None => self.items.len(),
        }
    }

    pub fn has_more(&self) -> bool {
        match self.search {
            Some(_) => self.visible_len() < self.items.len(),
            None => (self.items.len() as u64) < self.total,
        }
    }

    /// The products to show, in the active sort order.
    pub fn visible(&self) -> Vec<Product> {
        let mut items = self.items[..self.visible_len()].to_vec();
        self.sort.apply(&mut items);
        items
    }

    pub fn view(&self) -> ListingView {
        match &self.status {
            ListingStatus::Idle => ListingView::Idle,
            ListingStatus::Loading(_) => ListingView::Loading,
            ListingStatus::Failed { error, .. } => ListingView::Failed(error.clone()),
            ListingStatus::Ready if self.items.is_empty() => ListingView::Empty,
            ListingStatus::Ready | ListingStatus::LoadingMore(_) => ListingView::Ready {
                items: self.visible(),
                has_more: self.has_more(),
                loading_more: matches!(self.status, ListingStatus::LoadingMore(_)),
                total: self.total,
            },
        }
    }

    fn request(&self, skip: u64) -> ListingRequest {
        ListingRequest {
            signature: self.signature(),
            generation: self.generation,
            skip,
            limit: self.page_size,
        }
    }
}

fn normalize_search(term: &str) -> Option<String> {
    let term = term.trim();
    (!term.is_empty()).then(|| term.to_string())
}

/// Fetch the page described by `request`.
pub async fn fetch_listing<C: ClientTrait + 'static>(
    catalog: &CachedCatalog<C>,
    request: &ListingRequest,
) -> Result<Arc<ListingPage>, SharedError> {
    match &request.signature {
        QuerySignature::All => catalog.list(request.limit, request.skip, None).await,
        QuerySignature::Category(category) => {
            catalog
                .list(request.limit, request.skip, Some(category))
                .await
        },
        QuerySignature::Search(term) => catalog.search(term).await,
    }
}

/// Drives a [Listing] by fetching every request it issues.
///
/// Each action awaits its request before returning,
/// so pages are always appended in order.
#[derive(Debug)]
pub struct ListingOrchestrator<'a, C> {
    catalog: &'a CachedCatalog<C>,
    listing: Listing,
}

impl<'a, C: ClientTrait + 'static> ListingOrchestrator<'a, C> {
    pub fn new(catalog: &'a CachedCatalog<C>, listing: Listing) -> Self {
        Self { catalog, listing }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn listing_mut(&mut self) -> &mut Listing {
        &mut self.listing
    }

    pub fn view(&self) -> ListingView {
        self.listing.view()
    }

    async fn run(&mut self, request: Option<ListingRequest>) -> Applied {
        let Some(request) = request else {
            return Applied::Unchanged;
        };
        let result = fetch_listing(self.catalog, &request).await;
        self.listing.apply(&request, result)
    }

    #[instrument(skip(self))]
    pub async fn start(&mut self) -> Applied {
        let request = self.listing.start();
        self.run(Some(request)).await
    }

    #[instrument(skip(self))]
    pub async fn set_category(&mut self, category: Option<String>) -> Applied {
        let request = self.listing.set_category(category);
        self.run(request).await
    }

    #[instrument(skip(self))]
    pub async fn set_search(&mut self, term: &str) -> Applied {
        let request = self.listing.set_search(term);
        self.run(request).await
    }

    #[instrument(skip(self))]
    pub async fn load_more(&mut self) -> Applied {
        match self.listing.load_more() {
            LoadMore::Fetch(request) => self.run(Some(request)).await,
            LoadMore::Revealed => Applied::Updated,
            LoadMore::Unavailable => Applied::Unchanged,
        }
    }

    #[instrument(skip(self))]
    pub async fn retry(&mut self) -> Applied {
        let request = self.listing.retry();
        self.run(request).await
    }

    /// Categories offered by the category selector.
    pub async fn categories(&self) -> Result<Vec<Category>, SharedError> {
        let slugs = self.catalog.categories().await?;
        Ok(slugs.iter().map(|slug| Category::from_slug(slug)).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use stockhub_catalog::{CatalogClientError, MockClient};
    use stockhub_test_utils::{numbered_products, page, product};

    use super::*;
    use crate::models::sort::SortOrder;
    use crate::utils::query_cache::QueryPolicy;

    fn catalog(client: &MockClient) -> CachedCatalog<MockClient> {
        CachedCatalog::new(client.clone(), QueryPolicy {
            retries: 0,
            retry_delay: Duration::ZERO,
            stale_after: None,
        })
    }

    fn loaded(products: Vec<Product>, total: u64) -> Result<Arc<ListingPage>, SharedError> {
        Ok(Arc::new(page(products, total)))
    }

    fn failed() -> Result<Arc<ListingPage>, SharedError> {
        Err(Arc::new(CatalogClientError::Other("offline".to_string())))
    }

    fn ready_len(view: &ListingView) -> Option<(usize, bool)> {
        match view {
            ListingView::Ready {
                items, has_more, ..
            } => Some((items.len(), *has_more)),
            _ => None,
        }
    }

    #[tokio::test]
    async fn load_more_accumulates_pages_up_to_total() {
        let mut client = MockClient::default();
        client.push_page_response(page(numbered_products(1..=20), 45));
        client.push_page_response(page(numbered_products(21..=40), 45));
        client.push_page_response(page(numbered_products(41..=45), 45));
        let catalog = catalog(&client);
        let mut orchestrator = ListingOrchestrator::new(&catalog, Listing::new(20));

        assert_eq!(orchestrator.start().await, Applied::Updated);
        assert_eq!(ready_len(&orchestrator.view()), Some((20, true)));

        assert_eq!(orchestrator.load_more().await, Applied::Updated);
        assert_eq!(ready_len(&orchestrator.view()), Some((40, true)));

        assert_eq!(orchestrator.load_more().await, Applied::Updated);
        assert_eq!(ready_len(&orchestrator.view()), Some((45, false)));

        assert_eq!(orchestrator.load_more().await, Applied::Unchanged);
        assert_eq!(client.requests(), vec![
            "list limit=20 skip=0 category=",
            "list limit=20 skip=20 category=",
            "list limit=20 skip=40 category=",
        ]);
    }

    #[test]
    fn accumulated_products_never_exceed_total() {
        let mut listing = Listing::new(20);
        let request = listing.start();
        listing.apply(&request, loaded(numbered_products(1..=20), 5));

        assert_eq!(listing.visible().len(), 5);
        assert!(!listing.has_more());
    }

    #[test]
    fn empty_page_ends_pagination() {
        let mut listing = Listing::new(2);
        let request = listing.start();
        listing.apply(&request, loaded(numbered_products(1..=2), 10));
        let LoadMore::Fetch(request) = listing.load_more() else {
            panic!("expected a request for the next page");
        };
        listing.apply(&request, loaded(vec![], 10));

        assert!(!listing.has_more());
        assert_eq!(listing.load_more(), LoadMore::Unavailable);
    }

    #[test]
    fn late_page_for_previous_category_is_discarded() {
        let mut listing = Listing::new(20).with_category(Some("beauty".to_string()));
        let first = listing.start();
        listing.apply(&first, loaded(numbered_products(1..=20), 45));
        let LoadMore::Fetch(second_page) = listing.load_more() else {
            panic!("expected a request for the next page");
        };

        let groceries = listing
            .set_category(Some("groceries".to_string()))
            .expect("category changed");
        assert_eq!(
            listing.apply(&groceries, loaded(numbered_products(100..=102), 3)),
            Applied::Updated
        );
        assert_eq!(
            listing.apply(&second_page, loaded(numbered_products(21..=40), 45)),
            Applied::Stale
        );

        let ids: Vec<u64> = listing.visible().iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![100, 101, 102]);
        assert_eq!(listing.signature(), QuerySignature::Category("groceries".to_string()));
    }

    #[test]
    fn response_for_earlier_generation_of_same_signature_is_discarded() {
        let mut listing = Listing::new(20);
        let old = listing.start();
        let new = listing.start();
        assert_eq!(old.signature, new.signature);

        assert_eq!(listing.apply(&old, loaded(numbered_products(1..=3), 3)), Applied::Stale);
        assert!(matches!(listing.view(), ListingView::Loading));
        assert_eq!(listing.apply(&new, loaded(numbered_products(1..=2), 2)), Applied::Updated);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_responses_only_apply_to_current_signature() {
        let mut client = MockClient::default().with_latency(Duration::from_millis(50));
        client.push_page_response(page(numbered_products(21..=40), 45));
        client.push_page_response(page(numbered_products(100..=101), 2));
        let catalog = catalog(&client);

        let mut listing = Listing::new(20).with_category(Some("beauty".to_string()));
        let first = listing.start();
        listing.apply(&first, loaded(numbered_products(1..=20), 45));
        let LoadMore::Fetch(old) = listing.load_more() else {
            panic!("expected a request for the next page");
        };
        let new = listing.set_category(Some("laptops".to_string())).unwrap();

        let (old_result, new_result) =
            tokio::join!(fetch_listing(&catalog, &old), fetch_listing(&catalog, &new));
        assert_eq!(listing.apply(&new, new_result), Applied::Updated);
        assert_eq!(listing.apply(&old, old_result), Applied::Stale);

        assert_eq!(ready_len(&listing.view()), Some((2, false)));
    }

    #[tokio::test]
    async fn search_reveals_more_of_one_response() {
        let mut client = MockClient::default();
        client.push_page_response(page(numbered_products(1..=45), 45));
        let catalog = catalog(&client);
        let mut orchestrator = ListingOrchestrator::new(&catalog, Listing::new(20));

        assert_eq!(orchestrator.set_search("phone").await, Applied::Updated);
        assert_eq!(ready_len(&orchestrator.view()), Some((20, true)));
        assert_eq!(orchestrator.load_more().await, Applied::Updated);
        assert_eq!(ready_len(&orchestrator.view()), Some((40, true)));
        assert_eq!(orchestrator.load_more().await, Applied::Updated);
        assert_eq!(ready_len(&orchestrator.view()), Some((45, false)));

        assert_eq!(client.requests(), vec!["search q=phone"]);
    }

    #[tokio::test]
    async fn category_change_clears_search() {
        let mut client = MockClient::default();
        client.push_page_response(page(numbered_products(1..=2), 2));
        client.push_page_response(page(numbered_products(3..=4), 2));
        let catalog = catalog(&client);
        let mut orchestrator = ListingOrchestrator::new(&catalog, Listing::new(20));

        orchestrator.set_search("  lamp ").await;
        assert_eq!(orchestrator.listing().search(), Some("lamp"));
        orchestrator.set_category(Some("furniture".to_string())).await;

        assert_eq!(orchestrator.listing().search(), None);
        assert_eq!(client.requests(), vec![
            "search q=lamp",
            "list limit=20 skip=0 category=furniture",
        ]);
    }

    #[tokio::test]
    async fn unchanged_filters_do_not_refetch() {
        let mut client = MockClient::default();
        client.push_page_response(page(numbered_products(1..=2), 2));
        let catalog = catalog(&client);
        let mut orchestrator = ListingOrchestrator::new(&catalog, Listing::new(20));

        orchestrator.start().await;
        assert_eq!(orchestrator.set_search("   ").await, Applied::Unchanged);
        assert_eq!(orchestrator.set_category(None).await, Applied::Unchanged);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn visible_products_follow_sort() {
        let mut client = MockClient::default();
        client.push_page_response(page(
            vec![
                product(1, "Cherry", 30.0),
                product(2, "banana", 10.0),
                product(3, "apple", 20.0),
            ],
            3,
        ));
        let catalog = catalog(&client);
        let listing = Listing::new(20).with_sort(Sort::new(SortField::Price, SortOrder::Asc));
        let mut orchestrator = ListingOrchestrator::new(&catalog, listing);
        orchestrator.start().await;

        let prices: Vec<f64> = orchestrator.listing().visible().iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![10.0, 20.0, 30.0]);

        orchestrator.listing_mut().sort_by(SortField::Price);
        let prices: Vec<f64> = orchestrator.listing().visible().iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![30.0, 20.0, 10.0]);

        orchestrator.listing_mut().sort_by(SortField::Title);
        let titles: Vec<String> = orchestrator
            .listing()
            .visible()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["apple", "banana", "Cherry"]);
    }

    #[tokio::test]
    async fn empty_result_is_distinct_from_loading_and_failure() {
        let mut client = MockClient::default();
        client.push_page_response(page(vec![], 0));
        let catalog = catalog(&client);
        let mut orchestrator = ListingOrchestrator::new(&catalog, Listing::new(20));

        assert!(matches!(orchestrator.view(), ListingView::Idle));
        orchestrator.set_search("nothing matches").await;
        assert!(matches!(orchestrator.view(), ListingView::Empty));
    }

    #[tokio::test]
    async fn retry_reissues_the_failed_request() {
        let mut client = MockClient::default();
        client.push_page_response(page(numbered_products(1..=20), 25));
        client.push_error_response(503);
        client.push_page_response(page(numbered_products(21..=25), 25));
        let catalog = catalog(&client);
        let mut orchestrator = ListingOrchestrator::new(&catalog, Listing::new(20));

        orchestrator.start().await;
        assert_eq!(orchestrator.load_more().await, Applied::Failed);
        match orchestrator.view() {
            ListingView::Failed(error) => {
                assert_eq!(error.to_string(), "Failed to fetch products: Service Unavailable")
            },
            other => panic!("expected failure, found {other:?}"),
        }

        assert_eq!(orchestrator.retry().await, Applied::Updated);
        assert_eq!(ready_len(&orchestrator.view()), Some((25, false)));
        assert_eq!(client.requests()[1], client.requests()[2]);
    }

    #[test]
    fn load_more_is_unavailable_while_loading() {
        let mut listing = Listing::new(20);
        listing.start();
        assert_eq!(listing.load_more(), LoadMore::Unavailable);
        assert!(listing.retry().is_none());
    }

    #[test]
    fn failed_first_page_shows_error_and_retries_first_page() {
        let mut listing = Listing::new(20);
        let request = listing.start();
        assert_eq!(listing.apply(&request, failed()), Applied::Failed);
        assert!(matches!(listing.view(), ListingView::Failed(_)));

        let retried = listing.retry().unwrap();
        assert_eq!(retried, request);
        assert!(matches!(listing.view(), ListingView::Loading));
    }

    #[tokio::test]
    async fn categories_are_labelled() {
        let mut client = MockClient::default();
        client.push_categories_response(vec!["mens-shirts".to_string()]);
        let catalog = catalog(&client);
        let orchestrator = ListingOrchestrator::new(&catalog, Listing::new(20));

        let categories = orchestrator.categories().await.unwrap();
        assert_eq!(categories[0].name, "Mens Shirts");
        assert_eq!(categories[0].url, "/inventory?category=mens-shirts");
    }
}
