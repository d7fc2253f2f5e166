//! Fixtures shared by the tests of the stockhub crates.

use stockhub_catalog::{ListingPage, Product, ProductId, Review};

pub mod proptest;

/// Category of products created by [product].
pub const FIXTURE_CATEGORY: &str = "home-decoration";

/// A minimal product, as the catalog would serve it.
pub fn product(id: u64, title: &str, price: f64) -> Product {
    Product {
        id: ProductId(id),
        title: title.to_string(),
        description: format!("Description of {title}"),
        category: FIXTURE_CATEGORY.to_string(),
        price,
        discount_percentage: 0.0,
        rating: 4.5,
        stock: 50,
        tags: None,
        brand: None,
        sku: None,
        weight: None,
        dimensions: None,
        warranty_information: None,
        shipping_information: None,
        availability_status: None,
        reviews: None,
        return_policy: None,
        minimum_order_quantity: None,
        thumbnail: format!("https://cdn.dummyjson.com/products/{id}/thumbnail.png"),
        images: Vec::new(),
    }
}

/// Products titled "Product <id>" and priced at `id` dollars.
pub fn numbered_products(ids: impl IntoIterator<Item = u64>) -> Vec<Product> {
    ids.into_iter()
        .map(|id| product(id, &format!("Product {id}"), id as f64))
        .collect()
}

pub fn review(rating: f64, comment: &str, date: &str) -> Review {
    Review {
        rating,
        comment: comment.to_string(),
        date: date.parse().expect("fixture date should be RFC 3339"),
        reviewer_name: "Jane Doe".to_string(),
        reviewer_email: "jane.doe@x.dummyjson.com".to_string(),
    }
}

/// A listing page holding `products` out of `total`.
pub fn page(products: Vec<Product>, total: u64) -> ListingPage {
    ListingPage {
        limit: products.len() as u64,
        products,
        total,
        skip: 0,
    }
}
