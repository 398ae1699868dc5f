//! A [`tracing_subscriber::Layer`] that renders events in `logfmt`
//! (`key=value key2="quoted value"`) rather than the library's default
//! pretty-printer. This is the workspace's default log format; `czar run`
//! switches to JSON only when asked (`--log-format json`).
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

use std::{
    fmt::Write as _,
    io::Write as _,
    sync::{Arc, Mutex},
};

use observability_deps::tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

/// A `tracing_subscriber` layer that writes one logfmt line per event to the
/// given writer.
#[derive(Debug)]
pub struct LogFmtLayer<W> {
    writer: Arc<Mutex<W>>,
}

impl<W> LogFmtLayer<W>
where
    W: std::io::Write + Send + Sync + 'static,
{
    /// Create a new layer writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }
}

impl<S, W> Layer<S> for LogFmtLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: std::io::Write + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = String::new();
        let meta = event.metadata();

        write_kv(&mut line, "level", level_str(*meta.level()));
        write_kv(&mut line, "target", meta.target());

        let mut visitor = LogFmtVisitor { out: &mut line };
        event.record(&mut visitor);
        line.push('\n');

        if let Ok(mut w) = self.writer.lock() {
            let _ = w.write_all(line.as_bytes());
            let _ = w.flush();
        }
    }
}

fn level_str(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

fn write_kv(out: &mut String, key: &str, value: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    let _ = write!(out, "{key}={}", quote_if_needed(value));
}

/// Quote a value if it contains whitespace or an `=`, escaping embedded quotes.
fn quote_if_needed(value: &str) -> String {
    if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '=' || c == '"') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

struct LogFmtVisitor<'a> {
    out: &'a mut String,
}

impl<'a> Visit for LogFmtVisitor<'a> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        write_kv(self.out, field.name(), &format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        write_kv(self.out, field.name(), value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        write_kv(self.out, field.name(), &value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        write_kv(self.out, field.name(), &value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        write_kv(self.out, field.name(), &value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_values_with_whitespace() {
        assert_eq!(quote_if_needed("hello"), "hello");
        assert_eq!(quote_if_needed("hello world"), "\"hello world\"");
        assert_eq!(quote_if_needed(""), "\"\"");
    }

    #[test]
    fn escapes_embedded_quotes() {
        assert_eq!(quote_if_needed("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn kv_line_building_is_space_separated() {
        let mut line = String::new();
        write_kv(&mut line, "level", "info");
        write_kv(&mut line, "target", "czar::qdisp");
        assert_eq!(line, "level=info target=czar::qdisp");
    }
}
