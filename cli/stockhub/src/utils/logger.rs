use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::style::Stylize;

static DEBUG: AtomicBool = AtomicBool::new(false);

#[derive(Default, Debug)]
struct LogFields {
    message: Option<String>,
    /// Structured fields other than `message`, as `key=value`
    rest: Vec<String>,
}

struct LoggerVisitor<'a>(&'a mut LogFields);

impl tracing::field::Visit for LoggerVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.0.message = Some(value.to_string()),
            name => self.0.rest.push(format!("{name}={value}")),
        }
    }

    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.record_str(field, &value.to_string());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

/// Formats tracing events for the terminal.
///
/// By default only the message and its fields are printed.
/// In debug mode every event is prefixed with its level, time and origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFormatter;

impl LogFormatter {
    pub fn set_debug(debug: bool) {
        DEBUG.store(debug, Ordering::Relaxed);
    }

    fn debug() -> bool {
        DEBUG.load(Ordering::Relaxed)
    }
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for LogFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut f: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let mut fields = LogFields::default();
        let mut visitor = LoggerVisitor(&mut fields);
        event.record(&mut visitor);

        // If for any reason the message is not present,
        // we don't have anything to log
        let Some(mut message) = fields.message else {
            return Ok(());
        };
        if !fields.rest.is_empty() {
            message = format!("{message} {}", fields.rest.join(" "));
        }

        if !Self::debug() {
            writeln!(f, "{message}")?;
            return Ok(());
        }

        // The output will look like this:
        //
        // WARN 2024-08-25 14:00:00.000 +02:00 cli/stockhub-sdk/src/models/detail.rs:130
        // <message>

        let level_prefix = {
            let level = metadata.level();
            let level_prefix = level.as_str();

            match *level {
                tracing::Level::ERROR => level_prefix.red(),
                tracing::Level::WARN => level_prefix.yellow(),
                _ => level_prefix.dark_grey(),
            }
        };

        let time_prefix = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z");

        let origin_prefix = {
            let file = metadata.file().unwrap_or("<unknown file>");
            match metadata.line() {
                Some(line) => format!("{file}:{line}"),
                None => format!("{file}:??"),
            }
        };

        let head = format!("{level_prefix} {time_prefix} {origin_prefix}").bold();

        writeln!(f, "{head}: {message}")?;

        Ok(())
    }
}
