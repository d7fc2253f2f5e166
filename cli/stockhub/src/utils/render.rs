//! Terminal renderings of the views.
//!
//! Every function returns the rendered text,
//! printing is left to the commands.

use std::fmt::Write;

use crossterm::style::{StyledContent, Stylize};
use indoc::formatdoc;
use itertools::Itertools;
use stockhub_sdk::models::catalogue::{Category, CategoryTile};
use stockhub_sdk::models::detail::ProductDetail;
use stockhub_sdk::models::labels::{
    format_dimensions,
    format_price,
    format_rating,
    format_review_date,
    normalize_category_label,
};
use stockhub_sdk::models::listing::{Listing, ListingView, QuerySignature};
use stockhub_sdk::models::stock::{BadgeVariant, StockStatus};
use stockhub_sdk::providers::catalog::Product;

use crate::utils::errors::display_chain;
use crate::utils::route::Route;

const CARD_WIDTH: usize = 30;
const CARD_GAP: usize = 2;
const TITLE_WIDTH: usize = 36;
/// Wide enough for a discounted price: `$100.00 (-20% $80.00)`
const PRICE_WIDTH: usize = 22;
/// Descriptions are wrapped to the terminal, but no wider than this
const MAX_TEXT_WIDTH: usize = 80;

/// How listings are laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    Table,
    Grid,
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(width.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

pub fn stock_badge(status: StockStatus) -> StyledContent<&'static str> {
    match status.badge() {
        BadgeVariant::Default => status.label().green(),
        BadgeVariant::Secondary => status.label().yellow(),
        BadgeVariant::Destructive => status.label().red(),
    }
}

/// The price, followed by the discounted price if there is a discount.
fn price(product: &Product) -> String {
    if product.has_discount() {
        format!(
            "{} (-{:.0}% {})",
            format_price(product.price),
            product.discount_percentage,
            format_price(product.discounted_price())
        )
    } else {
        format_price(product.price)
    }
}

/// Products as rows of a table.
pub fn product_table(products: &[Product]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!(
            "{:>5}  {}  {:<20}  {:>PRICE_WIDTH$}  {:>6}  {}",
            "ID",
            pad("TITLE", TITLE_WIDTH),
            "CATEGORY",
            "PRICE",
            "RATING",
            "STOCK"
        )
        .bold()
    );
    for product in products {
        let status = StockStatus::classify(product.stock);
        let _ = writeln!(
            out,
            "{:>5}  {}  {:<20}  {:>PRICE_WIDTH$}  {:>6}  {}",
            product.id.0,
            pad(&truncate(&product.title, TITLE_WIDTH), TITLE_WIDTH),
            truncate(&normalize_category_label(&product.category), 20),
            price(product),
            format_rating(product.rating),
            stock_badge(status)
        );
    }
    out
}

fn card(product: &Product) -> Vec<String> {
    let inner = CARD_WIDTH - 4;
    let line = |text: &str| format!("│ {} │", pad(&truncate(text, inner), inner));
    let border = "─".repeat(CARD_WIDTH - 2);
    vec![
        format!("┌{border}┐"),
        line(&product.title),
        line(&normalize_category_label(&product.category)),
        line(&price(product)),
        line(&format!(
            "★ {}  {}",
            format_rating(product.rating),
            StockStatus::classify(product.stock)
        )),
        line(&Route::Product { id: product.id }.to_string()),
        format!("└{border}┘"),
    ]
}

/// Products as a grid of cards, as many per row as fit into `width` columns.
pub fn product_grid(products: &[Product], width: usize) -> String {
    let per_row = ((width + CARD_GAP) / (CARD_WIDTH + CARD_GAP)).max(1);
    let gap = " ".repeat(CARD_GAP);

    products
        .iter()
        .map(card)
        .chunks(per_row)
        .into_iter()
        .map(|row| {
            let cards = row.collect::<Vec<_>>();
            (0..cards[0].len())
                .map(|i| cards.iter().map(|card| card[i].as_str()).join(&gap))
                .join("\n")
        })
        .join("\n")
        + "\n"
}

pub fn empty_marker() -> String {
    formatdoc! {"
        {}
        Try adjusting your search or filters
    ", "No items found".bold()}
}

/// The panel shown instead of a view that could not be loaded.
pub fn error_panel(what: &str, error: &dyn std::error::Error, retry_hint: &str) -> String {
    formatdoc! {"
        {}
        {}
        {retry_hint}
    ", format!("Failed to load {what}").red().bold(), display_chain(error)}
}

fn listing_header(listing: &Listing) -> String {
    let filter = match listing.signature() {
        QuerySignature::All => "All products".to_string(),
        QuerySignature::Category(category) => normalize_category_label(&category),
        QuerySignature::Search(term) => format!("Results for \"{term}\""),
    };
    let sort = listing.sort();
    format!(
        "{}  (sorted by {} {})",
        filter.bold(),
        sort.field,
        format!("{:?}", sort.order).to_lowercase()
    )
}

/// A listing with its header and footer.
///
/// `retry_hint` and `more_hint` tell the user how to retry and how to load more.
pub fn listing(
    listing: &Listing,
    layout: Layout,
    width: usize,
    retry_hint: &str,
    more_hint: &str,
) -> String {
    let mut out = listing_header(listing);
    out.push('\n');

    match listing.view() {
        ListingView::Idle => {},
        ListingView::Loading => out.push_str("Loading products…\n"),
        ListingView::Empty => out.push_str(&empty_marker()),
        ListingView::Failed(error) => out.push_str(&error_panel("products", &error, retry_hint)),
        ListingView::Ready {
            items,
            has_more,
            loading_more,
            total,
        } => {
            match layout {
                Layout::Table => out.push_str(&product_table(&items)),
                Layout::Grid => out.push_str(&product_grid(&items, width)),
            }
            let _ = write!(out, "Showing {} of {total}", items.len());
            if loading_more {
                out.push_str(", loading more…");
            } else if has_more {
                let _ = write!(out, ", {more_hint}");
            }
            out.push('\n');
        },
    }
    out
}

pub fn categories(categories: &[Category]) -> String {
    let names = categories.iter().map(|category| category.name.as_str());
    format!("{} {}\n", "Categories:".bold(), names.format(", "))
}

pub fn catalogue(tiles: &[CategoryTile]) -> String {
    let width = tiles
        .iter()
        .map(|tile| tile.category.name.chars().count())
        .max()
        .unwrap_or_default();

    let mut out = format!("{}\n", "Catalogue".bold());
    for tile in tiles {
        let _ = writeln!(
            out,
            "  {}  {}  {}",
            pad(&tile.category.name, width),
            tile.category.url,
            tile.thumbnail.as_deref().unwrap_or("No image")
        );
    }
    out
}

fn attribute_line(out: &mut String, label: &str, value: Option<String>) {
    if let Some(value) = value {
        let _ = writeln!(out, "  {:<16}{value}", format!("{label}:"));
    }
}

pub fn product_detail(detail: &ProductDetail, width: usize) -> String {
    let product = &detail.product;
    let text_width = width.clamp(20, MAX_TEXT_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{}", product.title.as_str().bold());
    let by = product
        .brand
        .as_deref()
        .map(|brand| format!("{brand} · "))
        .unwrap_or_default();
    let _ = writeln!(out, "{by}{}", normalize_category_label(&product.category));
    let _ = writeln!(
        out,
        "{}  ★ {}  {}",
        price(product),
        format_rating(product.rating),
        stock_badge(detail.stock_status)
    );
    out.push('\n');

    if !product.description.is_empty() {
        let _ = writeln!(out, "{}\n", textwrap::fill(&product.description, text_width));
    }

    let _ = writeln!(out, "{}", "Specifications".bold());
    attribute_line(&mut out, "SKU", product.sku.clone());
    attribute_line(&mut out, "Stock", Some(product.stock.to_string()));
    attribute_line(&mut out, "Weight", product.weight.map(|w| format!("{w} g")));
    attribute_line(
        &mut out,
        "Dimensions",
        Some(format_dimensions(product.dimensions.as_ref())),
    );
    attribute_line(&mut out, "Warranty", product.warranty_information.clone());
    attribute_line(&mut out, "Shipping", product.shipping_information.clone());
    attribute_line(&mut out, "Returns", product.return_policy.clone());
    attribute_line(
        &mut out,
        "Minimum order",
        product.minimum_order_quantity.map(|q| q.to_string()),
    );
    if let Some(tags) = product.tags.as_ref().filter(|tags| !tags.is_empty()) {
        attribute_line(&mut out, "Tags", Some(tags.join(", ")));
    }
    out.push('\n');

    let gallery = &detail.images;
    if let Some(selected) = gallery.selected() {
        let position = format!(
            "Image {}/{}",
            gallery.selected_index() + 1,
            gallery.images().len()
        );
        let _ = writeln!(out, "{}: {selected}", position.bold());
        out.push('\n');
    }

    let reviews = product.reviews();
    let _ = writeln!(out, "{}", format!("Reviews ({})", reviews.len()).bold());
    for review in reviews {
        let _ = writeln!(
            out,
            "  ★ {}  {}  {}",
            format_rating(review.rating),
            review.reviewer_name,
            format_review_date(&review.date)
        );
        let comment = textwrap::indent(
            &textwrap::fill(&review.comment, text_width.saturating_sub(4)),
            "    ",
        );
        out.push_str(&comment);
        if !comment.ends_with('\n') {
            out.push('\n');
        }
    }

    if !detail.similar.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "{}", "Similar products".bold());
        out.push_str(&product_table(&detail.similar));
    }

    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use stockhub_sdk::models::detail::ImageGallery;
    use stockhub_sdk::providers::catalog::CatalogClientError;
    use stockhub_test_utils::{numbered_products, page, product, review};

    use super::*;

    fn ready_listing(products: Vec<Product>, total: u64) -> Listing {
        let mut listing = Listing::new(2);
        let request = listing.start();
        listing.apply(&request, Ok(Arc::new(page(products, total))));
        listing
    }

    #[test]
    fn truncates_long_titles() {
        assert_eq!(truncate("Lamp", 10), "Lamp");
        assert_eq!(truncate("Essence Mascara Lash Princess", 10), "Essence M…");
    }

    #[test]
    fn table_lists_every_product() {
        let table = product_table(&numbered_products(1..=3));
        assert_eq!(table.lines().count(), 4);
        assert!(table.contains("Product 2"));
        assert!(table.contains("$3.00"));
        assert!(table.contains("Home Decoration"));
    }

    #[test]
    fn table_shows_discounted_price() {
        let mut lamp = product(1, "Lamp", 100.0);
        lamp.discount_percentage = 20.0;
        let table = product_table(&[lamp]);

        let row = table.lines().nth(1).unwrap();
        assert!(row.contains("$100.00 (-20% $80.00)"), "row: {row}");
    }

    #[test]
    fn grid_wraps_cards_into_rows() {
        let products = numbered_products(1..=3);
        // room for two cards per row
        let grid = product_grid(&products, 2 * CARD_WIDTH + CARD_GAP);
        let card_height = card(&products[0]).len();
        assert_eq!(grid.lines().count(), 2 * card_height);
        assert!(grid.lines().next().unwrap().matches('┌').count() == 2);
        assert!(grid.contains("/product/3"));
    }

    #[test]
    fn discounted_price_shows_both_prices() {
        let mut lamp = product(1, "Lamp", 100.0);
        lamp.discount_percentage = 10.0;
        assert_eq!(price(&lamp), "$100.00 (-10% $90.00)");
    }

    #[test]
    fn listing_footer_offers_more() {
        let rendered = listing(
            &ready_listing(numbered_products(1..=2), 5),
            Layout::Table,
            80,
            "retry",
            "more available",
        );
        assert!(rendered.contains("All products"));
        assert!(rendered.contains("Showing 2 of 5, more available"));
    }

    #[test]
    fn empty_listing_shows_marker() {
        let rendered = listing(&ready_listing(vec![], 0), Layout::Grid, 80, "retry", "more");
        assert!(rendered.contains("No items found"));
        assert!(rendered.contains("Try adjusting your search or filters"));
    }

    #[test]
    fn failed_listing_shows_error_panel() {
        let mut listing_state = Listing::new(2);
        let request = listing_state.start();
        listing_state.apply(
            &request,
            Err(Arc::new(CatalogClientError::Other("boom".to_string()))),
        );
        let rendered = listing(&listing_state, Layout::Table, 80, "run again", "more");
        assert!(rendered.contains("Failed to load products"));
        assert!(rendered.contains("boom"));
        assert!(rendered.contains("run again"));
    }

    #[test]
    fn catalogue_marks_missing_images() {
        let tiles = vec![
            CategoryTile {
                category: Category::from_slug("beauty"),
                thumbnail: Some("https://cdn/beauty.png".to_string()),
            },
            CategoryTile {
                category: Category::from_slug("mens-shirts"),
                thumbnail: None,
            },
        ];
        let rendered = catalogue(&tiles);
        assert!(rendered.contains("/inventory?category=beauty"));
        assert!(rendered.contains("https://cdn/beauty.png"));
        assert!(rendered.contains("Mens Shirts"));
        assert!(rendered.contains("No image"));
    }

    #[test]
    fn detail_shows_attributes_reviews_and_similar_products() {
        let mut lamp = product(3, "Lamp", 30.0);
        lamp.brand = Some("Lumen".to_string());
        lamp.reviews = Some(vec![review(4.0, "Bright!", "2024-05-23T08:56:21.618Z")]);
        let lamp = lamp.normalize();
        let detail = ProductDetail {
            stock_status: StockStatus::classify(lamp.stock),
            images: ImageGallery::new(lamp.images.clone()),
            similar: numbered_products(1..=2),
            product: Arc::new(lamp),
        };

        let rendered = product_detail(&detail, 100);
        assert!(rendered.contains("Lumen · Home Decoration"));
        assert!(rendered.contains("Dimensions:     N/A"));
        assert!(rendered.contains("Image 1/1"));
        assert!(rendered.contains("Reviews (1)"));
        assert!(rendered.contains("5/23/2024"));
        assert!(rendered.contains("Bright!"));
        assert!(rendered.contains("Similar products"));
        assert!(rendered.contains("Product 2"));
    }
}
