use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;
use stockhub_catalog::Product;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Title,
    Price,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sort field '{0}', expected 'title' or 'price'")]
pub struct UnknownSortField(pub String);

impl FromStr for SortField {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "price" => Ok(SortField::Price),
            _ => Err(UnknownSortField(s.to_string())),
        }
    }
}

impl Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortField::Title => write!(f, "title"),
            SortField::Price => write!(f, "price"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn flip(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// The active sort of a product listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Selecting the active field flips the order,
    /// selecting another field sorts it ascending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.order = self.order.flip();
        } else {
            *self = Sort::new(field, SortOrder::Asc);
        }
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ordering = match self.field {
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Price => a.price.total_cmp(&b.price),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Sort `products` in place.
    ///
    /// The sort is stable, products comparing equal keep their listing order.
    pub fn apply(&self, products: &mut [Product]) {
        products.sort_by(|a, b| self.compare(a, b));
    }
}
