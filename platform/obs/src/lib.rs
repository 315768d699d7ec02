use anyhow::{Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

#[derive(Clone, Debug)]
pub struct ObsConfig {
    pub service_name: String,
    pub env_filter: Option<String>,
    pub otlp_endpoint: Option<String>,
}

impl Default for ObsConfig {
    fn default() -> Self {
        Self {
            service_name: "hr-data".to_string(),
            env_filter: None,
            otlp_endpoint: None,
        }
    }
}

impl ObsConfig {
    /// `RUST_LOG` for the filter, `OTLP_ENDPOINT` to enable span export.
    pub fn from_env() -> Self {
        Self {
            env_filter: std::env::var("RUST_LOG").ok(),
            otlp_endpoint: std::env::var("OTLP_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }
}

/// Keeps the span exporter alive; flushes pending spans when dropped.
#[must_use = "dropping the guard shuts down span export"]
#[derive(Default)]
pub struct ObsGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for ObsGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("failed to flush spans: {err}");
            }
        }
    }
}

/// Install the global subscriber. Later calls are no-ops and return an
/// empty guard.
pub fn init_tracing(config: ObsConfig) -> Result<ObsGuard> {
    if INIT.get().is_some() {
        return Ok(ObsGuard::default());
    }

    let filter = config
        .env_filter
        .unwrap_or_else(|| DEFAULT_FILTER.to_string());
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(filter)?)
        .with(tracing_subscriber::fmt::layer().with_target(false));

    let provider = match config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_http()
                .with_protocol(Protocol::HttpBinary)
                .with_endpoint(endpoint)
                .build()?;
            let provider = SdkTracerProvider::builder()
                .with_resource(
                    Resource::builder()
                        .with_service_name(config.service_name.clone())
                        .build(),
                )
                .with_batch_exporter(exporter)
                .build();
            let tracer = provider.tracer(config.service_name);
            registry
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init()?;
            Some(provider)
        }
        None => {
            registry.try_init()?;
            None
        }
    };

    INIT.set(())
        .map_err(|_| anyhow!("tracing already initialized"))?;
    Ok(ObsGuard { provider })
}
