//! The paths of the views, as used by `stockhub open` and the links shown in the views.

use std::fmt::Display;
use std::str::FromStr;

use stockhub_sdk::providers::catalog::ProductId;
use thiserror::Error;
use url::Url;

/// Only used to resolve relative routes, never contacted
const ROUTE_BASE: &str = "stockhub://views/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Inventory { category: Option<String> },
    Product { id: ProductId },
    Catalogue,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route '{0}'")]
    Invalid(String),
    #[error("no view at '{0}'")]
    NotFound(String),
    #[error("invalid product id '{0}'")]
    InvalidProductId(String),
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let base = Url::parse(ROUTE_BASE).map_err(|_| RouteError::Invalid(s.to_string()))?;
        let url = base
            .join(s.trim())
            .map_err(|_| RouteError::Invalid(s.to_string()))?;
        if url.scheme() != base.scheme() || url.host() != base.host() {
            return Err(RouteError::Invalid(s.to_string()));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => Ok(Route::Home),
            ["inventory"] => {
                let category = url
                    .query_pairs()
                    .find(|(key, _)| key == "category")
                    .map(|(_, value)| value.into_owned())
                    .filter(|value| !value.is_empty());
                Ok(Route::Inventory { category })
            },
            ["product", id] => id
                .parse()
                .map(|id| Route::Product { id: ProductId(id) })
                .map_err(|_| RouteError::InvalidProductId(id.to_string())),
            ["catalogue"] => Ok(Route::Catalogue),
            _ => Err(RouteError::NotFound(url.path().to_string())),
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Inventory { category: None } => write!(f, "/inventory"),
            Route::Inventory {
                category: Some(category),
            } => write!(f, "/inventory?category={category}"),
            Route::Product { id } => write!(f, "/product/{id}"),
            Route::Catalogue => write!(f, "/catalogue"),
        }
    }
}
