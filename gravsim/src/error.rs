use std::{collections::TryReserveError, fmt};

/// Errors surfaced by the simulation core.
#[derive(Debug)]
pub enum SimError {
    /// A parameter failed validation.
    InvalidParameter(String),
    /// A particle reached a non-finite state and the policy is to fail.
    InvalidState { tick: u64, index: usize },
    /// The node arena could not grow.
    OutOfMemory(TryReserveError),
    /// The worker pool could not be created.
    ThreadPool(rayon::ThreadPoolBuildError),
    /// The background loop thread could not be spawned.
    ThreadSpawn(std::io::Error),
    /// The background loop thread panicked.
    ThreadPanicked,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            SimError::InvalidState { tick, index } => {
                write!(f, "Particle {index} is not finite after tick {tick}")
            }
            SimError::OutOfMemory(e) => write!(f, "Octree arena allocation failed: {e}"),
            SimError::ThreadPool(e) => write!(f, "Failed to build thread pool: {e}"),
            SimError::ThreadSpawn(e) => write!(f, "Failed to spawn simulation thread: {e}"),
            SimError::ThreadPanicked => write!(f, "Simulation thread panicked"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::OutOfMemory(e) => Some(e),
            SimError::ThreadPool(e) => Some(e),
            SimError::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TryReserveError> for SimError {
    fn from(value: TryReserveError) -> Self {
        SimError::OutOfMemory(value)
    }
}

impl From<rayon::ThreadPoolBuildError> for SimError {
    fn from(value: rayon::ThreadPoolBuildError) -> Self {
        SimError::ThreadPool(value)
    }
}
