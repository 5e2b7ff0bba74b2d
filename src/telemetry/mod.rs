//! Process-wide observability bootstrap.
//!
//! [`init`] runs once at startup. Logging always comes up. Tracing export and
//! profiling are optional: a component that fails is reported as
//! [`ComponentStatus::Failed`] and the process keeps running without it.
//! Request metrics are owned by [`crate::metrics::HttpMetrics`] in the
//! application state, so the bootstrap only reports them.

use std::fmt;

use crate::config::TelemetryConfig;

pub mod logging;
pub mod otel;
pub mod profiling;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentStatus {
    Enabled(String),
    Disabled(String),
    Failed(String),
}

impl ComponentStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, ComponentStatus::Failed(_))
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentStatus::Enabled(detail) => write!(f, "enabled ({detail})"),
            ComponentStatus::Disabled(reason) => write!(f, "disabled ({reason})"),
            ComponentStatus::Failed(error) => write!(f, "failed ({error})"),
        }
    }
}

/// Outcome of each optional component, in initialization order.
#[derive(Debug, Clone, Default)]
pub struct StartupReport {
    components: Vec<(&'static str, ComponentStatus)>,
}

impl StartupReport {
    pub fn record(&mut self, component: &'static str, status: ComponentStatus) {
        self.components.push((component, status));
    }

    pub fn status(&self, component: &str) -> Option<&ComponentStatus> {
        self.components
            .iter()
            .find(|(name, _)| *name == component)
            .map(|(_, status)| status)
    }

    pub fn failed(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components
            .iter()
            .filter(|(_, status)| status.is_failed())
            .map(|(name, _)| *name)
    }

    /// At least one component failed; the service runs with reduced
    /// observability.
    pub fn is_degraded(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn log(&self) {
        for (component, status) in &self.components {
            match status {
                ComponentStatus::Failed(_) => {
                    tracing::warn!(component, status = %status, "telemetry component unavailable")
                }
                _ => tracing::info!(component, status = %status, "telemetry component"),
            }
        }
    }
}

/// Handles kept alive for the process lifetime.
pub struct Telemetry {
    pub report: StartupReport,
    tracing_installed: bool,
    profiler: Option<profiling::Profiler>,
}

pub fn init(config: &TelemetryConfig) -> Telemetry {
    let mut report = StartupReport::default();

    let (tracing_status, provider) = otel::start(config);
    let tracing_installed = provider.is_some();
    report.record("tracing", tracing_status);

    logging::init(config, provider.as_ref());

    let (profiling_status, profiler) = profiling::start(config);
    report.record("profiling", profiling_status);

    report.record(
        "metrics",
        ComponentStatus::Enabled("registry held in application state".to_string()),
    );

    report.log();
    if report.is_degraded() {
        tracing::warn!(
            failed = ?report.failed().collect::<Vec<_>>(),
            "continuing with reduced observability"
        );
    }

    Telemetry {
        report,
        tracing_installed,
        profiler,
    }
}

impl Telemetry {
    /// Stop the profiler and flush pending spans.
    pub fn shutdown(self) {
        if let Some(profiler) = self.profiler {
            profiler.stop();
        }
        if self.tracing_installed {
            otel::shutdown();
        }
    }
}
