pub mod metrics;
pub mod tracing;

pub use self::metrics::{Metrics, MetricsError, OperationStatus};
pub use self::tracing::{init_observability, ObservabilityError};
