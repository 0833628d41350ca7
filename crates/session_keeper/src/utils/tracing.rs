use std::fmt;

use common::configuration::Tracing;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider};
use time::macros::format_description;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format, time::FormatTime, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

struct BracketedTime;

impl FormatTime for BracketedTime {
    fn format_time(&self, w: &mut format::Writer<'_>) -> fmt::Result {
        let now = time::OffsetDateTime::now_utc();
        let stamp = now
            .format(&format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .map_err(|_| fmt::Error)?;
        write!(w, "[{}]", stamp)
    }
}

/// `[2026-01-01 00:00:00.000][info] message key=value`
struct BracketedFormatter;

impl<S, N> FormatEvent<S, N> for BracketedFormatter
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        BracketedTime.format_time(&mut writer)?;

        write!(
            writer,
            "[{}] ",
            event.metadata().level().to_string().to_lowercase()
        )?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Spans are exported over OTLP only when
/// tracing is enabled in the configuration; logs always go to stdout.
pub fn init_tracer(
    config: Option<&Tracing>,
) -> Result<SdkTracerProvider, Box<dyn std::error::Error + Send + Sync>> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let Some(config) = config.filter(|c| c.enabled) else {
        let provider = SdkTracerProvider::builder().build();
        global::set_tracer_provider(provider.clone());

        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .event_format(BracketedFormatter)
            .try_init()?;

        return Ok(provider);
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otel_endpoint())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();
    global::set_tracer_provider(provider.clone());

    let telemetry_layer = tracing_opentelemetry::layer()
        .with_tracer(provider.tracer(config.service_name().to_string()));

    let subscriber = tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().event_format(BracketedFormatter));
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(provider)
}
