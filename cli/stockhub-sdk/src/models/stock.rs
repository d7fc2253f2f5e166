use std::fmt::Display;

use serde::Serialize;

/// Products with more than this many items in stock are "In Stock".
pub const LOW_STOCK_THRESHOLD: u32 = 20;

/// Availability of a product, derived from its stock count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

/// How prominent a status badge should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Default,
    Secondary,
    Destructive,
}

impl StockStatus {
    pub fn classify(stock: u32) -> Self {
        match stock {
            0 => StockStatus::OutOfStock,
            1..=LOW_STOCK_THRESHOLD => StockStatus::LowStock,
            _ => StockStatus::InStock,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }

    pub fn badge(&self) -> BadgeVariant {
        match self {
            StockStatus::InStock => BadgeVariant::Default,
            StockStatus::LowStock => BadgeVariant::Secondary,
            StockStatus::OutOfStock => BadgeVariant::Destructive,
        }
    }
}

impl Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
