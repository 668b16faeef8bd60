use neatscope_engine::EngineError;
use thiserror::Error;

/// Failures surfaced by the viewer core.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Every candidate run number failed to load. Fatal; there is no
    /// degraded mode without a population.
    #[error("no loadable population after {attempts} attempts (last run tried: {last_run})")]
    PopulationLoadExhausted { attempts: u32, last_run: u32 },
    /// Any engine failure during substrate reconstruction aborts the session.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
