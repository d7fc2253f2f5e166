//! Error handling for catalog API operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Common error type for catalog API operations.
///
/// Views only distinguish "it failed" from "it worked",
/// but the variants are kept apart so logs can tell a dead network
/// from a misbehaving server.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// The request never produced an HTTP response.
    #[error("network error while trying to {operation}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The catalog responded with a non-success status.
    #[error("Failed to {operation}: {status_text}")]
    Fetch {
        operation: &'static str,
        status: StatusCode,
        status_text: String,
    },
    /// The catalog responded successfully, but with an unexpected body.
    #[error("invalid response while trying to {operation}")]
    InvalidResponse {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{0}")]
    Other(String),
}

impl CatalogClientError {
    /// Build a [CatalogClientError::Fetch] from a status code,
    /// using the canonical reason phrase as status text.
    pub fn fetch(operation: &'static str, status: StatusCode) -> Self {
        let status_text = status
            .canonical_reason()
            .map(ToString::to_string)
            .unwrap_or_else(|| status.as_str().to_string());
        CatalogClientError::Fetch {
            operation,
            status,
            status_text,
        }
    }

    /// The HTTP status of a [CatalogClientError::Fetch] error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Map a transport error to the matching [CatalogClientError] variant.
///
/// reqwest reports body decoding problems through the same error type as
/// connection failures, so they are told apart here.
pub(crate) fn map_reqwest_error(operation: &'static str, err: reqwest::Error) -> CatalogClientError {
    if err.is_decode() {
        CatalogClientError::InvalidResponse {
            operation,
            source: err,
        }
    } else {
        CatalogClientError::Network {
            operation,
            source: err,
        }
    }
}
