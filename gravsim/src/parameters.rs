use crate::{
    constants::{BARNES_HUT_COEFF, DELTA, G, SOFTENING},
    error::SimError,
};

/// What to do when a particle's position or velocity stops being finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidStatePolicy {
    /// Log a warning and keep stepping. Non-finite particles are left out of
    /// every following tree build, so they cannot disturb the rest.
    #[default]
    LogAndContinue,
    /// Stop the simulation with [`SimError::InvalidState`].
    Fail,
}

/// Tunable parameters of a simulation run.
#[derive(Debug, Clone)]
pub struct SimParameters {
    /// Gravitational constant.
    pub g: f64,
    /// Time advanced per tick.
    pub delta: f64,
    /// Barnes-Hut opening ratio. Zero opens every node.
    pub theta: f64,
    /// Separations at or below this distance contribute no force.
    pub softening: f64,
    pub invalid_state_policy: InvalidStatePolicy,
    /// Maximum number of bodies copied into each published snapshot.
    pub snapshot_cap: Option<usize>,
    /// Worker thread count. Derived from the population size when unset.
    pub threads: Option<usize>,
    /// Stop the loop after this many ticks.
    pub max_ticks: Option<u64>,
}

impl Default for SimParameters {
    fn default() -> Self {
        Self {
            g: G,
            delta: DELTA,
            theta: BARNES_HUT_COEFF,
            softening: SOFTENING,
            invalid_state_policy: InvalidStatePolicy::default(),
            snapshot_cap: None,
            threads: None,
            max_ticks: None,
        }
    }
}

impl SimParameters {
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.g.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "g must be finite, got {}",
                self.g
            )));
        }
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "delta must be positive and finite, got {}",
                self.delta
            )));
        }
        if !(self.theta.is_finite() && self.theta >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "theta must be non-negative and finite, got {}",
                self.theta
            )));
        }
        if !(self.softening.is_finite() && self.softening >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "softening must be non-negative and finite, got {}",
                self.softening
            )));
        }
        if self.threads == Some(0) {
            return Err(SimError::InvalidParameter(
                "threads must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
