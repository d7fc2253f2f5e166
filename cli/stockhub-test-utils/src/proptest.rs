use proptest::prelude::*;
use stockhub_catalog::Product;

use crate::product;

/// Produces strings that only contain alphanumeric characters,
/// in either case.
pub fn alphanum_string(max_size: usize) -> impl Strategy<Value = String> {
    let ranges = vec!['a'..='z', 'A'..='Z', '0'..='9'];
    prop::collection::vec(
        proptest::char::ranges(std::borrow::Cow::Owned(ranges)),
        1..=max_size,
    )
    .prop_map(|v| v.into_iter().collect())
}

/// Produces category slugs such as `mens-shirts`.
pub fn category_slug() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..=3).prop_map(|words| words.join("-"))
}

/// Produces up to `max_len` products with distinct ids,
/// arbitrary titles and prices in cents.
pub fn products_strategy(max_len: usize) -> impl Strategy<Value = Vec<Product>> {
    prop::collection::vec((alphanum_string(12), 0u32..100_000), 0..=max_len).prop_map(
        |entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (title, cents))| product(i as u64 + 1, &title, cents as f64 / 100.0))
                .collect()
        },
    )
}
