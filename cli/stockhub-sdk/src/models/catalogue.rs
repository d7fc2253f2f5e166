//! The category overview.

use futures::future::join_all;
use serde::Serialize;
use stockhub_catalog::ClientTrait;
use tracing::{instrument, warn};

use super::labels::normalize_category_label;
use crate::providers::catalog::CachedCatalog;
use crate::utils::query_cache::SharedError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    /// Route of the inventory filtered by this category.
    pub url: String,
}

impl Category {
    pub fn from_slug(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            name: normalize_category_label(slug),
            url: format!("/inventory?category={slug}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTile {
    #[serde(flatten)]
    pub category: Category,
    /// Thumbnail of the first product in the category, if it could be found.
    pub thumbnail: Option<String>,
}

/// List all categories with a representative thumbnail.
///
/// Thumbnails are looked up concurrently, a failed lookup only leaves its
/// tile without a thumbnail. Failing to list the categories is an error.
#[instrument(skip(catalog))]
pub async fn catalogue_overview<C: ClientTrait + 'static>(
    catalog: &CachedCatalog<C>,
) -> Result<Vec<CategoryTile>, SharedError> {
    let slugs = catalog.categories().await?;

    let lookups = slugs.iter().map(|slug| async move {
        let thumbnail = match catalog.products_by_category(slug, 1).await {
            Ok(products) => products.first().map(|product| product.thumbnail.clone()),
            Err(error) => {
                warn!(category = %slug, %error, "failed to fetch category thumbnail");
                None
            },
        };
        CategoryTile {
            category: Category::from_slug(slug),
            thumbnail: thumbnail.filter(|thumbnail| !thumbnail.is_empty()),
        }
    });

    Ok(join_all(lookups).await)
}
