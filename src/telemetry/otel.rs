use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{Config, RandomIdGenerator, Sampler, TracerProvider},
};

use crate::config::TelemetryConfig;

use super::ComponentStatus;

/// Install the OTLP/HTTP trace pipeline as the global provider. Every trace
/// is sampled. Must run inside the Tokio runtime that drives the batch
/// exporter.
pub fn start(config: &TelemetryConfig) -> (ComponentStatus, Option<TracerProvider>) {
    if !config.tracing_enabled {
        return (
            ComponentStatus::Disabled("OTEL_TRACING_ENABLED is off".to_string()),
            None,
        );
    }

    match install(config) {
        Ok(provider) => (
            ComponentStatus::Enabled(format!("exporting to {}", config.otlp_endpoint)),
            Some(provider),
        ),
        Err(err) => (ComponentStatus::Failed(err.to_string()), None),
    }
}

fn install(config: &TelemetryConfig) -> Result<TracerProvider, TraceError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = opentelemetry_otlp::new_exporter()
        .http()
        .with_endpoint(config.otlp_endpoint.clone())
        .build_span_exporter()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(
            Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource(config)),
        )
        .build();

    global::set_tracer_provider(provider.clone());
    Ok(provider)
}

fn resource(config: &TelemetryConfig) -> Resource {
    Resource::new(vec![
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            config.service_name.clone(),
        ),
        KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
            env!("CARGO_PKG_VERSION"),
        ),
    ])
}

pub fn shutdown() {
    global::shutdown_tracer_provider();
}
