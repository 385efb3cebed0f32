use thiserror::Error;
use tracing::info;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Initialize structured logging on stderr
///
/// `RUST_LOG` takes precedence over `log_level` when it is set.
pub fn init_observability(
    service_name: &str,
    service_version: &str,
    log_level: &str,
    enable_json_logging: bool,
) -> Result<(), ObservabilityError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => default_filter(service_name, log_level)?,
    };

    if enable_json_logging {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_level(true)
            .with_file(false)
            .with_line_number(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_span_events(FmtSpan::NONE)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;
    }

    info!(
        "Observability initialized for service: {} v{}",
        service_name, service_version
    );
    Ok(())
}

/// Filter used when `RUST_LOG` is absent: the crate at `log_level`, HTTP plumbing at warn
fn default_filter(service_name: &str, log_level: &str) -> Result<EnvFilter, ObservabilityError> {
    let directives = format!(
        "{}={},shoecart_rs={},hyper=warn,reqwest=warn",
        service_name.replace('-', "_"),
        log_level,
        log_level
    );

    EnvFilter::try_new(&directives)
        .map_err(|e| ObservabilityError::Config(format!("Invalid log level {}: {}", log_level, e)))
}
