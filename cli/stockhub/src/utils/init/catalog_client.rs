use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, bail};
use stockhub_sdk::providers::catalog::{
    CatalogClient,
    CatalogClientConfig,
    Client,
    MockClient,
    STOCKHUB_CATALOG_MOCK_DATA_VAR,
};
use tracing::debug;

use crate::config::Config;

/// User agent sent to the catalog unless configured otherwise
pub const DEFAULT_USER_AGENT: &str = concat!("stockhub/", env!("CARGO_PKG_VERSION"));

/// Initialize the catalog client
///
/// - Initialize a mock client if `_STOCKHUB_USE_CATALOG_MOCK` is set to a path to mock data
/// - Initialize a real client otherwise
pub fn init_catalog_client(config: &Config) -> Result<Client, anyhow::Error> {
    if let Ok(path_str) = std::env::var(STOCKHUB_CATALOG_MOCK_DATA_VAR) {
        let path = PathBuf::from(path_str);
        if !path.exists() {
            bail!("path to mock data file doesn't exist: {}", path.display());
        }

        debug!(mock_data_path = %path.display(), "using mock catalog client");
        return Ok(MockClient::new(Some(path))?.into());
    }

    let mut extra_headers: BTreeMap<String, String> = BTreeMap::new();

    // Pass along whether we are running in CI, so requests can reflect this in the headers
    if std::env::var("CI").is_ok() {
        extra_headers.insert("stockhub-ci".to_string(), "true".to_string());
    };

    let client_config = CatalogClientConfig {
        catalog_url: config.stockhub.catalog_url.clone(),
        extra_headers,
        user_agent: Some(
            config
                .stockhub
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        ),
    };

    debug!("using catalog client with url: {}", client_config.catalog_url);
    let client = CatalogClient::new(client_config).context("Could not create catalog client")?;
    Ok(client.into())
}
