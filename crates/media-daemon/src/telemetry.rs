use std::env;

use anyhow::Result;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    resource::Resource,
    runtime::Tokio,
    trace::{self, Tracer},
};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the OTLP pipeline alive for the process lifetime and flushes it
/// on shutdown.
#[derive(Debug)]
pub struct TelemetryGuard {
    tracer_installed: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.tracer_installed {
            global::shutdown_tracer_provider();
        }
    }
}

/// Install the tracing subscriber: console logs always, plus an OTLP
/// trace exporter when `MEDIA_OTEL_ENDPOINT` is set. A broken exporter
/// downgrades to console-only rather than failing startup.
pub fn init(service_name: &str) -> Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    let Some(endpoint) = otlp_endpoint() else {
        registry.init();
        return Ok(TelemetryGuard {
            tracer_installed: false,
        });
    };

    match build_tracer(service_name, &endpoint) {
        Ok(tracer) => {
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .init();
            Ok(TelemetryGuard {
                tracer_installed: true,
            })
        }
        Err(error) => {
            registry.init();
            warn!(%error, endpoint, "failed to initialize OTLP exporter; console logs only");
            Ok(TelemetryGuard {
                tracer_installed: false,
            })
        }
    }
}

fn build_tracer(service_name: &str, endpoint: &str) -> Result<Tracer> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_trace_config(trace::Config::default().with_resource(Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
        ])))
        .with_exporter(exporter)
        .install_batch(Tokio)?;

    Ok(tracer)
}

fn otlp_endpoint() -> Option<String> {
    normalize_endpoint(env::var("MEDIA_OTEL_ENDPOINT").ok())
}

fn normalize_endpoint(raw: Option<String>) -> Option<String> {
    raw.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
