pub mod models;
pub mod providers;
pub mod stockhub;
pub mod utils;
