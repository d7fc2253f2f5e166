use crossterm::style::Stylize;
use indoc::formatdoc;

use crate::utils::route::Route;

/// The landing page, shown when no command is given.
pub fn landing_page() -> String {
    formatdoc! {"
        {title}
        Professional catalog inventory portal

        {inventory}  {inventory_route}
            Browse the complete product inventory,
            filter by category, search, sort and page through results.
            Run 'stockhub inventory' or 'stockhub browse'.

        {catalogue}  {catalogue_route}
            Browse products organized by category.
            Run 'stockhub catalogue'.
        ",
        title = "StockHub".bold(),
        inventory = "Inventory".bold(),
        inventory_route = Route::Inventory { category: None },
        catalogue = "Catalogue".bold(),
        catalogue_route = Route::Catalogue,
    }
}
