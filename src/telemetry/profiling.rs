//! Continuous CPU profiling pushed to Pyroscope.
//!
//! Only compiled in with the `profiling` feature; otherwise [`start`] reports
//! the component as disabled.

use crate::config::TelemetryConfig;

use super::ComponentStatus;

#[cfg(feature = "profiling")]
mod agent {
    use pyroscope::{PyroscopeAgent, PyroscopeError, pyroscope::PyroscopeAgentRunning};
    use pyroscope_pprofrs::{PprofConfig, pprof_backend};

    use crate::config::TelemetryConfig;

    const SAMPLE_RATE_HZ: u32 = 100;

    pub struct Profiler {
        agent: PyroscopeAgent<PyroscopeAgentRunning>,
    }

    impl Profiler {
        pub fn start(config: &TelemetryConfig) -> Result<Self, PyroscopeError> {
            let agent = PyroscopeAgent::builder(
                config.pyroscope_endpoint.as_str(),
                config.service_name.as_str(),
            )
            .backend(pprof_backend(PprofConfig::new().sample_rate(SAMPLE_RATE_HZ)))
            .build()?;
            let agent = agent.start()?;
            Ok(Self { agent })
        }

        pub fn stop(self) {
            match self.agent.stop() {
                Ok(ready) => ready.shutdown(),
                Err(err) => tracing::warn!(error = %err, "failed to stop profiler"),
            }
        }
    }
}

#[cfg(feature = "profiling")]
pub use agent::Profiler;

#[cfg(feature = "profiling")]
pub fn start(config: &TelemetryConfig) -> (ComponentStatus, Option<Profiler>) {
    match Profiler::start(config) {
        Ok(profiler) => (
            ComponentStatus::Enabled(format!(
                "pushing cpu samples to {}",
                config.pyroscope_endpoint
            )),
            Some(profiler),
        ),
        Err(err) => (ComponentStatus::Failed(err.to_string()), None),
    }
}

/// Placeholder handle when the binary is built without a profiler.
#[cfg(not(feature = "profiling"))]
pub struct Profiler;

#[cfg(not(feature = "profiling"))]
impl Profiler {
    pub fn stop(self) {}
}

#[cfg(not(feature = "profiling"))]
pub fn start(_config: &TelemetryConfig) -> (ComponentStatus, Option<Profiler>) {
    (
        ComponentStatus::Disabled("built without the `profiling` feature".to_string()),
        None,
    )
}
