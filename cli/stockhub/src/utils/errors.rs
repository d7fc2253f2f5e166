use std::sync::Arc;

use indoc::formatdoc;
use stockhub_sdk::providers::catalog::CatalogClientError;
use tracing::trace;

/// Format an error for the user, adding a hint for catalog failures.
pub fn format_error(err: &anyhow::Error) -> String {
    trace!("formatting error: {err:?}");

    let message = display_chain(&**err);
    let Some(catalog_error) = err.chain().find_map(as_catalog_error) else {
        return message;
    };

    match catalog_error {
        CatalogClientError::Network { .. } => formatdoc! {"
            {message}

            Could not reach the catalog.
            Check your network connection and the configured 'catalog_url'.
        "},
        CatalogClientError::InvalidResponse { .. } => formatdoc! {"
            {message}

            The catalog sent a response that could not be understood.
            Check that 'catalog_url' points to a product catalog.
        "},
        CatalogClientError::Fetch { status, .. } if status.is_server_error() => formatdoc! {"
            {message}

            The catalog is having problems, try again later.
        "},
        CatalogClientError::Fetch { .. } | CatalogClientError::Other(_) => message,
    }
}

fn as_catalog_error<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> Option<&'a CatalogClientError> {
    err.downcast_ref::<Arc<CatalogClientError>>()
        .map(AsRef::as_ref)
        .or_else(|| err.downcast_ref::<CatalogClientError>())
}

/// Join the messages of an error and all its sources with `: `.
pub fn display_chain(mut err: &dyn std::error::Error) -> String {
    let mut fmt = err.to_string();
    while let Some(source) = err.source() {
        let source_message = source.to_string();
        // context added by `anyhow` often repeats the inner message
        if !fmt.ends_with(&source_message) {
            fmt = format!("{fmt}: {source_message}");
        }
        err = source;
    }

    fmt
}
