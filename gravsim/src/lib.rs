//! Barnes-Hut gravity core.
//!
//! A [`Simulation`] owns two particle buffers and steps them with an octree
//! approximation of mutual gravity. [`SimulationHandle`] runs it on a
//! background thread and publishes every completed tick as an immutable
//! [`Snapshot`] through a [`SnapshotExchange`].

pub mod constants;
mod error;
pub mod parameters;
pub mod presets;
pub mod sim;
mod sim_loop;
mod snapshot;

pub use error::SimError;
pub use parameters::{InvalidStatePolicy, SimParameters};
pub use sim::{
    ObjectInfo, Simulation,
    barnes_hut::{Aabc, Node, NodeData, NodeId, Octree},
};
pub use sim_loop::{SimulationHandle, run_sim_loop};
pub use snapshot::{Snapshot, SnapshotBody, SnapshotExchange};
