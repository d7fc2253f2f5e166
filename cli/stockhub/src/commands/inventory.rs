use anyhow::{Context, Result};
use bpaf::Bpaf;
use serde::Serialize;
use stockhub_sdk::models::listing::{Applied, ListingView, QuerySignature};
use stockhub_sdk::models::sort::{Sort, SortField, SortOrder};
use stockhub_sdk::providers::catalog::Product;
use stockhub_sdk::stockhub::Stockhub;
use tracing::{debug, instrument};

use crate::utils::render::{self, Layout};

const RETRY_HINT: &str = "Run the command again to retry.";

/// List, filter, search and sort products
#[derive(Debug, Bpaf, Clone)]
pub struct Inventory {
    /// Only list products of this category
    #[bpaf(long, argument("slug"))]
    pub category: Option<String>,

    /// Search products; takes precedence over '--category'
    #[bpaf(long, short, argument("query"))]
    pub search: Option<String>,

    /// Sort by 'title' or 'price'
    #[bpaf(long, argument("field"), fallback(SortField::Title), display_fallback)]
    pub sort: SortField,

    /// Sort in descending order
    #[bpaf(long)]
    pub desc: bool,

    /// Number of pages to load
    #[bpaf(long, argument("N"), fallback(1), display_fallback)]
    pub pages: u32,

    /// Show products as a grid of cards
    #[bpaf(long)]
    pub grid: bool,

    /// Print the products as JSON
    #[bpaf(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct InventoryJson {
    query: QuerySignature,
    sort: Sort,
    total: u64,
    has_more: bool,
    products: Vec<Product>,
}

impl Inventory {
    /// The first page of the inventory, optionally filtered by category.
    pub fn of_category(category: Option<String>) -> Self {
        Self {
            category,
            search: None,
            sort: SortField::Title,
            desc: false,
            pages: 1,
            grid: false,
            json: false,
        }
    }

    #[instrument(name = "inventory", skip_all)]
    pub async fn handle(self, stockhub: &Stockhub) -> Result<()> {
        print!("{}", self.render(stockhub, textwrap::termwidth()).await?);
        Ok(())
    }

    async fn render(&self, stockhub: &Stockhub, width: usize) -> Result<String> {
        let order = if self.desc {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        let listing = stockhub
            .new_listing()
            .with_category(self.category.clone())
            .with_search(self.search.as_deref())
            .with_sort(Sort::new(self.sort, order));

        let mut orchestrator = stockhub.listing(listing);
        // the category selector, loaded ahead of the products
        let categories = if self.json {
            None
        } else {
            Some(orchestrator.categories().await)
        };
        orchestrator.start().await;
        for page in 1..self.pages {
            if orchestrator.load_more().await != Applied::Updated {
                debug!(page, "no more pages to load");
                break;
            }
        }

        let listing = orchestrator.listing();
        let view = listing.view();
        if let ListingView::Failed(error) = view {
            return Err(error).context("Failed to load products");
        }

        if self.json {
            let (products, total, has_more) = match view {
                ListingView::Ready {
                    items,
                    has_more,
                    total,
                    ..
                } => (items, total, has_more),
                _ => (Vec::new(), 0, false),
            };
            let json = InventoryJson {
                query: listing.signature(),
                sort: listing.sort(),
                total,
                has_more,
                products,
            };
            return Ok(serde_json::to_string_pretty(&json)? + "\n");
        }

        let layout = if self.grid {
            Layout::Grid
        } else {
            Layout::Table
        };
        let mut out = match categories {
            Some(Ok(categories)) => render::categories(&categories),
            Some(Err(error)) => {
                render::error_panel("categories", &error, "Filtering by category may not work.")
            },
            None => String::new(),
        };
        out.push_str(&render::listing(
            listing,
            layout,
            width,
            RETRY_HINT,
            "use '--pages' to load more",
        ));
        Ok(out)
    }
}
