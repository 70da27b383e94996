use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;
use texttospeech_config::TelemetryConfig;

/// Build the OpenTelemetry resource describing this process
///
/// Configured attributes come last, so they may override the service name
/// and version.
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    let mut attrs = vec![
        KeyValue::new(semconv::SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new("texttospeech.api_version", "v1"),
    ];

    let mut configured: Vec<_> = config.resource_attributes.iter().collect();
    configured.sort();
    attrs.extend(configured.into_iter().map(|(k, v)| KeyValue::new(k.clone(), v.clone())));

    Resource::builder().with_attributes(attrs).build()
}
