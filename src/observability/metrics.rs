use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntGauge, Opts, Registry, TextEncoder,
};
use thiserror::Error;
use tracing::info;

use crate::models::{CartOperation, CatalogEndpoint};

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Status label for a cart operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Changed,
    Unchanged,
    Rejected,
}

impl OperationStatus {
    fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Changed => "changed",
            OperationStatus::Unchanged => "unchanged",
            OperationStatus::Rejected => "rejected",
        }
    }
}

/// Prometheus metrics for the cart store and its collaborators
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // Cart metrics
    pub cart_operations_total: CounterVec,
    pub cart_line_items: IntGauge,
    pub cart_storage_writes_total: CounterVec,

    // Catalog metrics
    pub catalog_requests_total: CounterVec,
    pub catalog_request_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let cart_operations_total = CounterVec::new(
            Opts::new("cart_operations_total", "Total number of cart operations"),
            &["operation", "status"],
        )?;

        let cart_line_items = IntGauge::new(
            "cart_line_items",
            "Number of distinct products currently in the cart",
        )?;

        let cart_storage_writes_total = CounterVec::new(
            Opts::new(
                "cart_storage_writes_total",
                "Total number of writes to the cart persistence slot",
            ),
            &["status"],
        )?;

        let catalog_requests_total = CounterVec::new(
            Opts::new(
                "catalog_requests_total",
                "Total number of catalog API requests",
            ),
            &["endpoint", "status"],
        )?;

        let catalog_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "catalog_request_duration_seconds",
                "Catalog API request duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["endpoint"],
        )?;

        registry.register(Box::new(cart_operations_total.clone()))?;
        registry.register(Box::new(cart_line_items.clone()))?;
        registry.register(Box::new(cart_storage_writes_total.clone()))?;
        registry.register(Box::new(catalog_requests_total.clone()))?;
        registry.register(Box::new(catalog_request_duration_seconds.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            cart_operations_total,
            cart_line_items,
            cart_storage_writes_total,
            catalog_requests_total,
            catalog_request_duration_seconds,
        })
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    pub fn record_cart_operation(&self, operation: CartOperation, status: OperationStatus) {
        self.cart_operations_total
            .with_label_values(&[operation.as_str(), status.as_str()])
            .inc();
    }

    pub fn set_line_items(&self, count: usize) {
        self.cart_line_items
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn record_storage_write(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.cart_storage_writes_total
            .with_label_values(&[status])
            .inc();
    }

    pub fn record_catalog_request(
        &self,
        endpoint: CatalogEndpoint,
        success: bool,
        duration_seconds: f64,
    ) {
        let status = if success { "success" } else { "error" };

        self.catalog_requests_total
            .with_label_values(&[endpoint.as_str(), status])
            .inc();

        self.catalog_request_duration_seconds
            .with_label_values(&[endpoint.as_str()])
            .observe(duration_seconds);
    }
}
