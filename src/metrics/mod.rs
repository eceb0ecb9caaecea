//! Prometheus metrics for the ingestion worker.

use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub ingest_cycles_total: IntCounter,
    pub ingest_cycles_skipped_total: IntCounter,
    pub ingest_cycle_duration_seconds: Histogram,
    pub kp_source_selected_total: IntCounterVec,
    pub kp_source_failures_total: IntCounterVec,
    pub kp_selection_exhausted_total: IntCounter,
    pub rows_written_total: IntCounterVec,
    pub task_failures_total: IntCounterVec,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
    pub database_connected: Gauge,
    pub cache_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ingest_cycles_total =
            IntCounter::new("ingest_cycles_total", "Completed ingestion cycles")?;
        let ingest_cycles_skipped_total = IntCounter::new(
            "ingest_cycles_skipped_total",
            "Cycles skipped because another cycle was still running",
        )?;
        let ingest_cycle_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("ingest_cycle_duration_seconds", "Ingestion cycle wall time")
                .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 80.0]),
        )?;
        let kp_source_selected_total = IntCounterVec::new(
            Opts::new("kp_source_selected_total", "Cycles resolved by each Kp source"),
            &["source"],
        )?;
        let kp_source_failures_total = IntCounterVec::new(
            Opts::new("kp_source_failures_total", "Failed or rejected Kp source attempts"),
            &["source", "reason"],
        )?;
        let kp_selection_exhausted_total = IntCounter::new(
            "kp_selection_exhausted_total",
            "Cycles in which no Kp source produced usable data",
        )?;
        let rows_written_total = IntCounterVec::new(
            Opts::new("rows_written_total", "Rows upserted per table"),
            &["table"],
        )?;
        let task_failures_total = IntCounterVec::new(
            Opts::new("task_failures_total", "Failed ingestion tasks"),
            &["task"],
        )?;
        let http_requests_total = IntCounter::new("http_requests_total", "HTTP requests served")?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests being served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency",
        ))?;
        let database_connected = Gauge::new("database_connected", "QuestDB connection state")?;
        let cache_connected = Gauge::new("cache_connected", "Redis connection state")?;

        registry.register(Box::new(ingest_cycles_total.clone()))?;
        registry.register(Box::new(ingest_cycles_skipped_total.clone()))?;
        registry.register(Box::new(ingest_cycle_duration_seconds.clone()))?;
        registry.register(Box::new(kp_source_selected_total.clone()))?;
        registry.register(Box::new(kp_source_failures_total.clone()))?;
        registry.register(Box::new(kp_selection_exhausted_total.clone()))?;
        registry.register(Box::new(rows_written_total.clone()))?;
        registry.register(Box::new(task_failures_total.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(database_connected.clone()))?;
        registry.register(Box::new(cache_connected.clone()))?;

        Ok(Self {
            registry,
            ingest_cycles_total,
            ingest_cycles_skipped_total,
            ingest_cycle_duration_seconds,
            kp_source_selected_total,
            kp_source_failures_total,
            kp_selection_exhausted_total,
            rows_written_total,
            task_failures_total,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
            database_connected,
            cache_connected,
        })
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn export(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
