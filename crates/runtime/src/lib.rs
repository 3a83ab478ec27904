use codedash_api::AnalysisBackend;
use codedash_core::config::ConfigOverrides;
use codedash_core::{Dashboard, DashboardConfig, HttpBackend};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

pub use codedash_core::{CoreError, Result};

/// Resolves the effective configuration: defaults, then `CODEDASH_*`
/// environment variables, then explicit overrides.
pub fn load_config(overrides: ConfigOverrides) -> Result<DashboardConfig> {
    let mut config = DashboardConfig::from_env()?;
    config.apply_overrides(overrides)?;
    Ok(config)
}

/// Bootstraps a dashboard talking to the HTTP analysis API.
///
/// This is the central factory used by the CLI; embedders that bring their
/// own backend can call [`build_dashboard`] instead.
pub fn build_default_dashboard(config: DashboardConfig) -> Result<Arc<Dashboard>> {
    let backend = HttpBackend::from_config(&config)?;
    tracing::info!(
        "Using analysis API at {} (timeout {}s)",
        backend.base_url(),
        config.request_timeout_secs
    );
    Ok(build_dashboard(Arc::new(backend), config))
}

pub fn build_dashboard(backend: Arc<dyn AnalysisBackend>, config: DashboardConfig) -> Arc<Dashboard> {
    Dashboard::new(backend, config)
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    codedash_core::logging::init_logging(component, to_stderr)
}
