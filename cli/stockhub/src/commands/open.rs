use anyhow::Result;
use bpaf::Bpaf;
use stockhub_sdk::stockhub::Stockhub;
use tracing::{debug, instrument};

use super::catalogue::Catalogue;
use super::home::landing_page;
use super::inventory::Inventory;
use super::product::ShowProduct;
use crate::utils::route::Route;

/// Open a view by its path, e.g. '/product/1' or '/inventory?category=beauty'
#[derive(Debug, Bpaf, Clone)]
pub struct Open {
    /// Path of the view
    #[bpaf(positional("route"))]
    pub route: Route,
}

impl Open {
    #[instrument(name = "open", skip_all, fields(route = %self.route))]
    pub async fn handle(self, stockhub: &Stockhub) -> Result<()> {
        debug!("opening {}", self.route);
        match self.route {
            Route::Home => print!("{}", landing_page()),
            Route::Inventory { category } => Inventory::of_category(category).handle(stockhub).await?,
            Route::Product { id } => ShowProduct::new(id).handle(stockhub).await?,
            Route::Catalogue => Catalogue::default().handle(stockhub).await?,
        }
        Ok(())
    }
}
