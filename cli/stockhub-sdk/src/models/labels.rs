//! Human readable renderings of catalog values.

use chrono::{DateTime, Utc};
use stockhub_catalog::Dimensions;

/// Turn a category slug into a display label, `"mens-shirts"` becomes `"Mens Shirts"`.
pub fn normalize_category_label(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Prices are shown in dollars with two decimals.
pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

pub fn format_rating(rating: f64) -> String {
    format!("{rating:.1}")
}

pub fn format_dimensions(dimensions: Option<&Dimensions>) -> String {
    match dimensions {
        Some(dimensions) => dimensions.to_string(),
        None => "N/A".to_string(),
    }
}

pub fn format_review_date(date: &DateTime<Utc>) -> String {
    date.format("%-m/%-d/%Y").to_string()
}
