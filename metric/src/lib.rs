//! A small in-process metric registry.
//!
//! Every long-running component (`qdisp::Executive`, `replica_control`'s
//! health monitor, `httpapi`'s request handlers) registers its counters and
//! histograms once at construction time and then updates them lock-free per
//! request. `GET /meta/metrics` walks the registry to produce a text dump.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(missing_debug_implementations, clippy::explicit_iter_loop, clippy::use_self)]

use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

/// A set of `key=value` pairs distinguishing one time series of a metric
/// from another (e.g. `{"worker": "w1"}`).
pub type Attributes = BTreeMap<String, String>;

/// A monotonically increasing counter, e.g. `jobs_retried_total`.
#[derive(Debug, Default)]
pub struct U64Counter {
    value: AtomicU64,
}

impl U64Counter {
    /// Increment the counter by `delta`.
    pub fn inc(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Current value.
    pub fn fetch(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// A running count + sum of observed u64 values, e.g. merge byte sizes.
/// Exposes only count/sum/min/max rather than full bucketing: callers that
/// need real percentile histograms should export raw observations instead.
#[derive(Debug, Default)]
struct HistogramInner {
    count: u64,
    sum: u64,
    min: u64,
    max: u64,
}

/// A histogram-ish accumulator of u64 observations (durations in millis,
/// byte sizes, row counts).
#[derive(Debug, Default)]
pub struct U64Histogram {
    inner: Mutex<HistogramInner>,
}

/// A read-only snapshot of a [`U64Histogram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramSnapshot {
    /// Number of observations recorded.
    pub count: u64,
    /// Sum of all observations.
    pub sum: u64,
    /// Smallest observation recorded (0 if none yet).
    pub min: u64,
    /// Largest observation recorded.
    pub max: u64,
}

impl U64Histogram {
    /// Record one observation.
    pub fn record(&self, value: u64) {
        let mut inner = self.inner.lock();
        if inner.count == 0 {
            inner.min = value;
            inner.max = value;
        } else {
            inner.min = inner.min.min(value);
            inner.max = inner.max.max(value);
        }
        inner.count += 1;
        inner.sum = inner.sum.saturating_add(value);
    }

    /// Take a consistent snapshot of the current state.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let inner = self.inner.lock();
        HistogramSnapshot {
            count: inner.count,
            sum: inner.sum,
            min: inner.min,
            max: inner.max,
        }
    }
}

trait AnyMetric: Debug + Send + Sync {
    fn render(&self, name: &str, out: &mut String);
}

#[derive(Debug)]
struct CounterSeries {
    attributes: Attributes,
    counter: Arc<U64Counter>,
}

impl AnyMetric for CounterSeries {
    fn render(&self, name: &str, out: &mut String) {
        out.push_str(name);
        render_attributes(&self.attributes, out);
        out.push_str(&format!(" {}\n", self.counter.fetch()));
    }
}

#[derive(Debug)]
struct HistogramSeries {
    attributes: Attributes,
    histogram: Arc<U64Histogram>,
}

impl AnyMetric for HistogramSeries {
    fn render(&self, name: &str, out: &mut String) {
        let snap = self.histogram.snapshot();
        let mut attrs = self.attributes.clone();
        for (suffix, value) in [
            ("count", snap.count),
            ("sum", snap.sum),
            ("min", snap.min),
            ("max", snap.max),
        ] {
            attrs.insert("stat".to_string(), suffix.to_string());
            out.push_str(name);
            render_attributes(&attrs, out);
            out.push_str(&format!(" {value}\n"));
        }
    }
}

fn render_attributes(attrs: &Attributes, out: &mut String) {
    if attrs.is_empty() {
        return;
    }
    out.push('{');
    for (i, (k, v)) in attrs.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{k}=\"{v}\""));
    }
    out.push('}');
}

/// Typed handle to a family of counters or histograms sharing a metric name,
/// distinguished by [`Attributes`]. Mirrors the `recorder.metric::<T>(name)`
/// idiom used throughout the rest of the workspace.
#[derive(Debug)]
pub struct Metric<T> {
    name: &'static str,
    registry: Arc<RegistryInner>,
    _marker: std::marker::PhantomData<T>,
}

impl Metric<U64Counter> {
    /// Get (or create) the counter for the given attribute set.
    pub fn recorder(&self, attributes: Attributes) -> Arc<U64Counter> {
        let mut series = self.registry.counters.lock();
        let entry = series
            .entry((self.name, attr_key(&attributes)))
            .or_insert_with(|| CounterSeries {
                attributes,
                counter: Arc::new(U64Counter::default()),
            });
        Arc::clone(&entry.counter)
    }
}

impl Metric<U64Histogram> {
    /// Get (or create) the histogram for the given attribute set.
    pub fn recorder(&self, attributes: Attributes) -> Arc<U64Histogram> {
        let mut series = self.registry.histograms.lock();
        let entry = series
            .entry((self.name, attr_key(&attributes)))
            .or_insert_with(|| HistogramSeries {
                attributes,
                histogram: Arc::new(U64Histogram::default()),
            });
        Arc::clone(&entry.histogram)
    }
}

fn attr_key(attrs: &Attributes) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Default)]
struct RegistryInner {
    counters: Mutex<BTreeMap<(&'static str, String), CounterSeries>>,
    histograms: Mutex<BTreeMap<(&'static str, String), HistogramSeries>>,
}

/// Process-wide metric registry. Cheap to clone (`Arc` internally); a single
/// instance is constructed at process start and threaded into every
/// component that needs to record metrics.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or look up) a named counter family.
    pub fn register_metric_counter(&self, name: &'static str) -> Metric<U64Counter> {
        Metric {
            name,
            registry: Arc::clone(&self.inner),
            _marker: std::marker::PhantomData,
        }
    }

    /// Register (or look up) a named histogram family.
    pub fn register_metric_histogram(&self, name: &'static str) -> Metric<U64Histogram> {
        Metric {
            name,
            registry: Arc::clone(&self.inner),
            _marker: std::marker::PhantomData,
        }
    }

    /// Render every series in Prometheus-text-exposition-adjacent format for
    /// the `GET /meta/metrics` endpoint.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for ((name, _), series) in self.inner.counters.lock().iter() {
            series.render(name, &mut out);
        }
        for ((name, _), series) in self.inner.histograms.lock().iter() {
            series.render(name, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_recorder_accumulates_by_attributes() {
        let registry = Registry::new();
        let metric = registry.register_metric_counter("jobs_retried_total");

        let mut attrs_a = Attributes::new();
        attrs_a.insert("worker".to_string(), "w1".to_string());
        let mut attrs_b = Attributes::new();
        attrs_b.insert("worker".to_string(), "w2".to_string());

        metric.recorder(attrs_a.clone()).inc(1);
        metric.recorder(attrs_a.clone()).inc(1);
        metric.recorder(attrs_b).inc(5);

        assert_eq!(metric.recorder(attrs_a).fetch(), 2);
        let rendered = registry.render();
        assert!(rendered.contains("jobs_retried_total{worker=\"w1\"} 2"));
        assert!(rendered.contains("jobs_retried_total{worker=\"w2\"} 5"));
    }

    #[test]
    fn histogram_tracks_count_sum_min_max() {
        let registry = Registry::new();
        let metric = registry.register_metric_histogram("merge_bytes");
        let h = metric.recorder(Attributes::new());
        h.record(10);
        h.record(30);
        h.record(20);

        let snap = h.snapshot();
        assert_eq!(snap.count, 3);
        assert_eq!(snap.sum, 60);
        assert_eq!(snap.min, 10);
        assert_eq!(snap.max, 30);
    }
}
