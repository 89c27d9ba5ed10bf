//! Tracing subscriber and optional OpenTelemetry export
//!
//! Logs go to stderr so command output on stdout stays machine readable.
//! Spans and log records are additionally exported over OTLP/HTTP when
//! `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

const SERVICE: &str = "tripcast";
const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Crates capped at `warn` regardless of the configured level
const NOISY_CRATES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "fjall",
    "lsm_tree",
    "opentelemetry",
    "opentelemetry_sdk",
    "opentelemetry_otlp",
];

/// Flushes and shuts down the OpenTelemetry providers when dropped
#[must_use = "telemetry is flushed when the guard is dropped"]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported
    #[must_use]
    pub fn exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down trace exporter: {e}");
            }
        }
        if let Some(provider) = self.logger_provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down log exporter: {e}");
            }
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    let filter = std::env::var("RUST_LOG").map_or_else(
        |_| EnvFilter::new(level),
        |directive| EnvFilter::new(&directive),
    );

    NOISY_CRATES.iter().fold(filter, |filter, krate| {
        filter.add_directive(
            format!("{krate}=warn")
                .parse()
                .unwrap_or_else(|_| tracing::Level::WARN.into()),
        )
    })
}

fn resource() -> Resource {
    Resource::builder()
        .with_attributes([
            KeyValue::new(SERVICE_NAME, SERVICE),
            KeyValue::new(SERVICE_VERSION, crate::VERSION),
        ])
        .build()
}

fn otlp_providers() -> Result<(SdkTracerProvider, SdkLoggerProvider)> {
    let resource = resource();

    let span_exporter = SpanExporter::builder()
        .with_http()
        .build()
        .context("Failed to build OTLP span exporter")?;
    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(span_exporter)
        .with_resource(resource.clone())
        .build();

    let log_exporter = LogExporter::builder()
        .with_http()
        .build()
        .context("Failed to build OTLP log exporter")?;
    let logger_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    Ok((tracer_provider, logger_provider))
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns an error if an exporter cannot be built or a global subscriber
/// is already installed.
pub fn init(config: &LoggingConfig) -> Result<TelemetryGuard> {
    let (tracer_provider, logger_provider) = if std::env::var_os(OTLP_ENDPOINT_VAR).is_some() {
        let (tracer, logger) = otlp_providers()?;
        opentelemetry::global::set_tracer_provider(tracer.clone());
        (Some(tracer), Some(logger))
    } else {
        (None, None)
    };

    let json = config.format == "json";
    let json_layer = json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let pretty_layer = (!json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    let trace_layer = tracer_provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE)));
    let log_layer = logger_provider
        .as_ref()
        .map(|provider| OpenTelemetryTracingBridge::new(provider));

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(json_layer)
        .with(pretty_layer)
        .with(trace_layer)
        .with(log_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(
        level = %config.level,
        format = %config.format,
        otlp = tracer_provider.is_some(),
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        tracer_provider,
        logger_provider,
    })
}
