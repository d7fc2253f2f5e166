use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use itertools::{Either, Itertools};
use serde::{Deserialize, Serialize};
use stockhub_catalog::{DEFAULT_CATALOG_URL, DEFAULT_PAGE_SIZE, DEFAULT_PEER_LIMIT};
use stockhub_sdk::utils::query_cache::QueryPolicy;
use tracing::debug;

/// Name of stockhub managed directories
pub const STOCKHUB_DIR_NAME: &str = "stockhub";
pub const STOCKHUB_CONFIG_DIR_VAR: &str = "STOCKHUB_CONFIG_DIR";
pub const STOCKHUB_CONFIG_FILE: &str = "stockhub.toml";
const DEFAULT_SEARCH_DEBOUNCE_MS: i64 = 300;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(flatten)]
    pub stockhub: StockhubConfig,

    /// How requests to the catalog are cached and retried
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StockhubConfig {
    /// Directory where stockhub loads its configuration file from (default:
    /// `$XDG_CONFIG_HOME/stockhub`)
    pub config_dir: PathBuf,

    /// The URL of the catalog service
    // Using a URL here adds an extra trailing slash,
    // so just use a String.
    pub catalog_url: String,

    /// Number of products per page of the inventory
    pub page_size: u32,

    /// How long search input has to settle before searching, in milliseconds
    pub search_debounce_ms: u64,

    /// Maximum number of similar products shown on a product page
    pub similar_limit: u32,

    /// Override the `User-Agent` sent to the catalog
    pub user_agent: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Number of retries after a failed request
    pub retries: u32,
    /// Pause before retrying, in milliseconds
    pub retry_delay_ms: u64,
    /// Refetch cached results older than this, in seconds.
    /// Cached results are kept for the whole session if unset.
    pub stale_after_secs: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let policy = QueryPolicy::default();
        Self {
            retries: policy.retries,
            retry_delay_ms: policy.retry_delay.as_millis() as u64,
            stale_after_secs: None,
        }
    }
}

impl QueryConfig {
    pub fn policy(&self) -> QueryPolicy {
        QueryPolicy {
            retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            stale_after: self.stale_after_secs.map(Duration::from_secs),
        }
    }
}

impl StockhubConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl Config {
    fn read_raw_config() -> Result<HierarchicalConfig> {
        let config_dir = match env::var(STOCKHUB_CONFIG_DIR_VAR) {
            Ok(v) => {
                debug!("`${STOCKHUB_CONFIG_DIR_VAR}` set: {v}");
                PathBuf::from(v)
            },
            Err(_) => {
                let config_dir = dirs::config_dir()
                    .context("Could not determine the user's config directory")?
                    .join(STOCKHUB_DIR_NAME);
                debug!("`${STOCKHUB_CONFIG_DIR_VAR}` not set, using {config_dir:?}");
                config_dir
            },
        };
        let config_dir_str = config_dir
            .to_str()
            .context("Config directory is not valid UTF-8")?;

        let defaults = QueryConfig::default();
        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", DEFAULT_CATALOG_URL)?
            .set_default("page_size", i64::from(DEFAULT_PAGE_SIZE))?
            .set_default("search_debounce_ms", DEFAULT_SEARCH_DEBOUNCE_MS)?
            .set_default("similar_limit", i64::from(DEFAULT_PEER_LIMIT))?
            .set_default("query.retries", i64::from(defaults.retries))?
            .set_default("query.retry_delay_ms", defaults.retry_delay_ms as i64)?
            // Config dir is added to the config for completeness;
            // the config file cannot change the config dir.
            .set_override("config_dir", config_dir_str)?;

        // read from /etc
        builder = builder.add_source(
            config::File::from(PathBuf::from("/etc").join(STOCKHUB_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        builder = builder.add_source(
            config::File::from(config_dir.join(STOCKHUB_CONFIG_FILE))
                .format(config::FileFormat::Toml)
                .required(false),
        );

        // override via env variables
        let mut stockhub_envs = env::vars()
            .filter_map(|(k, v)| k.strip_prefix("STOCKHUB_").map(|k| (k.to_owned(), v)))
            .filter(|(k, _)| k != "CONFIG_DIR")
            .collect::<Vec<_>>();

        let builder = builder
            .add_source(mk_environment(&mut stockhub_envs, "QUERY"))
            .add_source(
                Environment::default()
                    .source(Some(HashMap::from_iter(stockhub_envs)))
                    .try_parsing(true),
            );

        Ok(builder.build()?)
    }

    /// Creates a [Config] from the environment and config files
    pub fn parse() -> Result<Config> {
        let raw_config = Self::read_raw_config()?;
        let config: Config = raw_config
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(config)
    }

    /// Make sure the config directory exists, so users find where to put their config.
    pub fn ensure_config_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.stockhub.config_dir).context(format!(
            "Could not create config directory: {:?}",
            self.stockhub.config_dir
        ))
    }
}

/// Collect the variables starting with `<prefix>_` into a nested [Environment] source,
/// so that `QUERY_RETRIES` sets `query.retries`.
fn mk_environment(envs: &mut Vec<(String, String)>, prefix: &str) -> Environment {
    let (prefixed_envs, other_envs): (HashMap<String, String>, Vec<(String, String)>) = envs
        .iter()
        .partition_map(|(k, v)| match k.strip_prefix(&format!("{prefix}_")) {
            Some(suffix) => Either::Left((format!("{prefix}#{suffix}"), v.to_owned())),
            None => Either::Right((k.to_owned(), v.to_owned())),
        });
    let environment = Environment::with_prefix(prefix)
        .keep_prefix(true)
        .separator("#")
        .source(Some(prefixed_envs))
        .try_parsing(true);
    *envs = other_envs;
    environment
}
