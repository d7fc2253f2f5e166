pub mod catalogue;
pub mod detail;
pub mod labels;
pub mod listing;
pub mod sort;
pub mod stock;
