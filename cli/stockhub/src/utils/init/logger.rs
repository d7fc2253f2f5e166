use std::sync::OnceLock;

use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;
use crate::utils::logger::LogFormatter;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Filter directives for a verbosity level.
///
/// `RUST_LOG` takes precedence, see [update_filters].
pub(crate) fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,stockhub=error,stockhub_sdk=error,stockhub_catalog=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,stockhub=warn,stockhub_sdk=warn,stockhub_catalog=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,stockhub=info,stockhub_sdk=info,stockhub_catalog=info",
        // Also show debug from our libraries
        Verbosity::Verbose(2) => "off,stockhub=debug,stockhub_sdk=debug,stockhub_catalog=debug",
        // Also show requests made by reqwest
        Verbosity::Verbose(3) => {
            "off,stockhub=trace,stockhub_sdk=trace,stockhub_catalog=trace,reqwest=debug"
        },
        Verbosity::Verbose(_) => "trace",
    }
}

/// Install the global subscriber on first use
/// and set its filter according to `verbosity`.
///
/// Called twice by `main`: once with the default verbosity
/// before arguments are parsed, and once with the requested one.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    LogFormatter::set_debug(matches!(verbosity, Verbosity::Verbose(v) if v >= 2));
    update_filters(filter_handle, log_filter(verbosity));
}

pub fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

pub fn create_registry_and_filter_reload_handle() -> (
    impl SubscriberInitExt,
    Handle<EnvFilter, Registry>,
) {
    // Start out permissive, the actual level is set by `update_filters` right after.
    let filter = EnvFilter::new("trace");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(LogFormatter);
    let registry = tracing_subscriber::registry().with(filter).with(log_layer);
    debug!("Initialized logger");

    (registry, filter_reload_handle)
}
