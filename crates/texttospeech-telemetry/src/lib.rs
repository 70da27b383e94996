//! Logging and trace export
//!
//! Installs a `tracing` subscriber that writes to stderr and, when an OTLP
//! exporter is configured, ships spans to a collector.

mod metadata;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use texttospeech_config::TelemetryConfig;
use texttospeech_config::telemetry::exporters::{ExportProtocol, ExporterConfig};
use texttospeech_config::telemetry::tracing::TracingConfig;

/// Instrumentation scope of exported spans
const TRACER_NAME: &str = "texttospeech";

/// Keeps the trace pipeline alive; flushes and shuts it down on drop
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported
    pub const fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Export buffered spans now
    ///
    /// # Errors
    ///
    /// Returns an error if the exporter fails to flush
    pub fn force_flush(&self) -> anyhow::Result<()> {
        if let Some(ref provider) = self.tracer_provider {
            provider
                .force_flush()
                .map_err(|e| anyhow::anyhow!("failed to flush spans: {e}"))?;
        }
        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown tracer provider: {e}");
        }
    }
}

/// Initialize logging and optional trace export
///
/// `log_filter` uses `EnvFilter` syntax (e.g. `info,texttospeech_client=debug`);
/// an unparsable filter falls back to `info`. The returned guard must be held
/// until the process exits.
///
/// # Errors
///
/// Returns an error if the OTLP exporter cannot be built
pub fn init(config: Option<&TelemetryConfig>, log_filter: &str) -> anyhow::Result<TelemetryGuard> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let mut guard = TelemetryGuard { tracer_provider: None };

    match config.and_then(|c| c.span_exporter().map(|e| (c, e))) {
        Some((telemetry_config, exporter)) => {
            let resource = metadata::build_resource(telemetry_config);
            let tracer_provider = init_tracer(exporter, telemetry_config.tracing.as_ref(), resource)?;

            let tracer = tracer_provider.tracer(TRACER_NAME);
            let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            global::set_tracer_provider(tracer_provider.clone());
            guard.tracer_provider = Some(tracer_provider);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .with(otel_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        }
    }

    Ok(guard)
}

fn init_tracer(
    exporter: &ExporterConfig,
    tracing: Option<&TracingConfig>,
    resource: opentelemetry_sdk::Resource,
) -> anyhow::Result<SdkTracerProvider> {
    let exporter = build_span_exporter(exporter)?;

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(sampler(tracing))
        .with_batch_exporter(exporter)
        .build();

    Ok(provider)
}

fn sampler(tracing: Option<&TracingConfig>) -> Sampler {
    let sampling_rate = tracing.map_or(1.0, |t| t.sampling_rate);

    let sampler = if sampling_rate >= 1.0 {
        Sampler::AlwaysOn
    } else if sampling_rate <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(sampling_rate)
    };

    if tracing.is_none_or(|t| t.parent_based) {
        Sampler::ParentBased(Box::new(sampler))
    } else {
        sampler
    }
}

fn build_span_exporter(config: &ExporterConfig) -> anyhow::Result<opentelemetry_otlp::SpanExporter> {
    use opentelemetry_otlp::SpanExporter;

    let timeout = config.timeout()?;

    let exporter = match config.protocol {
        ExportProtocol::Grpc => {
            let mut builder = SpanExporter::builder().with_tonic().with_endpoint(config.endpoint.as_str());
            if let Some(timeout) = timeout {
                builder = builder.with_timeout(timeout);
            }
            builder
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build gRPC span exporter: {e}"))?
        }
        ExportProtocol::HttpProto => {
            let mut builder = SpanExporter::builder()
                .with_http()
                .with_endpoint(config.endpoint.as_str())
                .with_headers(config.headers.clone());
            if let Some(timeout) = timeout {
                builder = builder.with_timeout(timeout);
            }
            builder
                .build()
                .map_err(|e| anyhow::anyhow!("failed to build HTTP span exporter: {e}"))?
        }
    };

    Ok(exporter)
}
