//! Catalog wire types.
//!
//! These mirror the JSON documents served by the catalog, with a few
//! derived helpers the front end needs on every render.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use derive_more::{Display as DeriveDisplay, From};
use serde::{Deserialize, Serialize};

/// Unique identifier of a product in the catalog.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    DeriveDisplay,
    From,
)]
#[serde(transparent)]
pub struct ProductId(pub u64);

/// A single catalog item.
///
/// Products are immutable once fetched.
/// Use [`Product::normalize`] before handing a product to a view,
/// so that [`Product::images`] is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub discount_percentage: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    // Some catalog entries (groceries, mostly) don't carry a brand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warranty_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Review>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_order_quantity: Option<u32>,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    /// Ensure the image list is usable by galleries:
    /// an empty list falls back to the thumbnail.
    pub fn normalize(mut self) -> Self {
        if self.images.is_empty() && !self.thumbnail.is_empty() {
            self.images.push(self.thumbnail.clone());
        }
        self
    }

    pub fn has_discount(&self) -> bool {
        self.discount_percentage > 0.0
    }

    /// Price after applying [`Product::discount_percentage`].
    pub fn discounted_price(&self) -> f64 {
        self.price * (1.0 - self.discount_percentage / 100.0)
    }

    /// The reviews attached to this product, empty if there are none.
    pub fn reviews(&self) -> &[Review] {
        self.reviews.as_deref().unwrap_or_default()
    }
}

/// Physical dimensions in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} × {} × {} cm", self.width, self.height, self.depth)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub rating: f64,
    pub comment: String,
    pub date: DateTime<Utc>,
    pub reviewer_name: String,
    pub reviewer_email: String,
}

/// One page of a product listing or the (unpaginated) result of a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

impl ListingPage {
    pub(crate) fn normalize(mut self) -> Self {
        self.products = self.products.into_iter().map(Product::normalize).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn product_json() -> serde_json::Value {
        json!({
            "id": 1,
            "title": "Essence Mascara Lash Princess",
            "description": "Popular mascara",
            "category": "beauty",
            "price": 9.99,
            "discountPercentage": 7.17,
            "rating": 4.94,
            "stock": 5,
            "tags": ["beauty", "mascara"],
            "brand": "Essence",
            "sku": "RCH45Q1A",
            "weight": 2,
            "dimensions": { "width": 23.17, "height": 14.43, "depth": 28.01 },
            "warrantyInformation": "1 month warranty",
            "shippingInformation": "Ships in 1 month",
            "availabilityStatus": "Low Stock",
            "reviews": [{
                "rating": 2,
                "comment": "Very unhappy with my purchase!",
                "date": "2024-05-23T08:56:21.618Z",
                "reviewerName": "John Doe",
                "reviewerEmail": "john.doe@x.dummyjson.com"
            }],
            "returnPolicy": "30 days return policy",
            "minimumOrderQuantity": 24,
            "thumbnail": "https://cdn.dummyjson.com/products/images/beauty/1/thumbnail.png",
            "images": []
        })
    }

    #[test]
    fn deserializes_full_product() {
        let product: Product = serde_json::from_value(product_json()).unwrap();
        assert_eq!(product.id, ProductId(1));
        assert_eq!(product.brand.as_deref(), Some("Essence"));
        assert_eq!(product.minimum_order_quantity, Some(24));
        assert_eq!(product.reviews().len(), 1);
        assert_eq!(product.reviews()[0].reviewer_name, "John Doe");
    }

    #[test]
    fn normalize_falls_back_to_thumbnail() {
        let product: Product = serde_json::from_value(product_json()).unwrap();
        let product = product.normalize();
        assert_eq!(product.images, vec![product.thumbnail.clone()]);
    }

    #[test]
    fn normalize_keeps_existing_images() {
        let mut json = product_json();
        json["images"] = json!(["a.png", "b.png"]);
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.normalize().images, vec!["a.png", "b.png"]);
    }

    #[test]
    fn discounted_price_applies_percentage() {
        let mut product: Product = serde_json::from_value(product_json()).unwrap();
        product.price = 100.0;
        product.discount_percentage = 20.0;
        assert!(product.has_discount());
        assert_eq!(format!("{:.2}", product.discounted_price()), "80.00");
    }

    #[test]
    fn dimensions_display() {
        let dimensions = Dimensions {
            width: 10.0,
            height: 20.5,
            depth: 3.0,
        };
        assert_eq!(dimensions.to_string(), "10 × 20.5 × 3 cm");
    }

    #[test]
    fn listing_page_tolerates_missing_products() {
        let page: ListingPage = serde_json::from_value(json!({ "total": 0 })).unwrap();
        assert_eq!(page, ListingPage::default());
    }

    proptest! {
        #[test]
        fn discounted_price_stays_within_price(price in 0.0..10_000.0f64, pct in 0.0..=100.0f64) {
            let mut product: Product = serde_json::from_value(product_json()).unwrap();
            product.price = price;
            product.discount_percentage = pct;
            let discounted = product.discounted_price();
            prop_assert!(discounted >= -1e-9);
            prop_assert!(discounted <= price + 1e-9);
        }
    }
}
