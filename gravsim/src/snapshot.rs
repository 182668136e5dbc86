use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use cgmath::Point3;

use crate::{constants::DELTA, error::SimError, sim::Simulation};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotBody {
    pub pos: Point3<f64>,
    pub mass: f64,
}

/// Immutable copy of one completed tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tick: u64,
    pub time: f64,
    pub bodies: Vec<SnapshotBody>,
}

impl Snapshot {
    /// Copy the simulation's completed buffer, keeping at most `cap` bodies.
    pub fn capture(sim: &Simulation, cap: Option<usize>) -> Self {
        let objects = sim.objects();
        let count = cap.map_or(objects.len(), |cap| cap.min(objects.len()));
        Self {
            tick: sim.tick(),
            time: sim.time(),
            bodies: objects[..count]
                .iter()
                .map(|obj| SnapshotBody {
                    pos: obj.pos,
                    mass: obj.mass,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Positions narrowed to `f32`, the layout vertex buffers expect.
    pub fn positions_f32(&self) -> Vec<[f32; 3]> {
        self.bodies
            .iter()
            .map(|b| [b.pos.x as f32, b.pos.y as f32, b.pos.z as f32])
            .collect()
    }
}

/// Primitive for communicating between the simulation and its consumers.
///
/// The simulation publishes a new `Arc<Snapshot>` after each completed tick.
/// Readers clone the `Arc` and keep a consistent generation for as long as
/// they like; the lock is only held to swap the pointer.
pub struct SnapshotExchange {
    latest: Mutex<Arc<Snapshot>>,
    generation: AtomicU64,
    delta: AtomicU64,
}

impl Default for SnapshotExchange {
    fn default() -> Self {
        Self::new(DELTA)
    }
}

impl SnapshotExchange {
    pub fn new(delta: f64) -> Self {
        Self {
            latest: Mutex::new(Arc::new(Snapshot::default())),
            generation: AtomicU64::new(0),
            delta: AtomicU64::new(delta.to_bits()),
        }
    }

    /// Time step the simulation loop uses from its next tick on.
    pub fn delta(&self) -> f64 {
        f64::from_bits(self.delta.load(Ordering::Relaxed))
    }

    pub fn set_delta(&self, delta: f64) -> Result<(), SimError> {
        if !(delta.is_finite() && delta > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "delta must be positive and finite, got {delta}"
            )));
        }
        self.delta.store(delta.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = snapshot;
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Capture and publish the simulation's completed buffer.
    pub fn store(&self, sim: &Simulation) {
        self.publish(Snapshot::capture(sim, sim.params().snapshot_cap));
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of snapshots published so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
