use cgmath::{EuclideanSpace, Point3, Vector3, Zero};
use rayon::{
    ThreadPool, ThreadPoolBuilder,
    iter::{IndexedParallelIterator, IntoParallelRefIterator},
};

use crate::{
    constants::{MAX_THREADS, OBJECTS_PER_THREAD},
    error::SimError,
    parameters::{InvalidStatePolicy, SimParameters},
    sim::{barnes_hut::Octree, buffers::ParticleBuffers, integrate::par_integrate},
};

pub mod barnes_hut;
pub mod buffers;
pub mod integrate;

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub pos: Point3<f64>,
    pub vel: Vector3<f64>,
    pub mass: f64,
}

impl Default for ObjectInfo {
    fn default() -> Self {
        Self {
            pos: Point3::origin(),
            vel: Vector3::zero(),
            mass: 0.0,
        }
    }
}

impl ObjectInfo {
    pub fn new(pos: Point3<f64>, vel: Vector3<f64>, mass: f64) -> Self {
        Self { pos, vel, mass }
    }

    /// Whether position, velocity and mass are all finite.
    pub fn is_valid(&self) -> bool {
        self.pos.x.is_finite()
            && self.pos.y.is_finite()
            && self.pos.z.is_finite()
            && self.vel.x.is_finite()
            && self.vel.y.is_finite()
            && self.vel.z.is_finite()
            && self.mass.is_finite()
    }
}

pub fn compute_target_threads(n_objects: usize) -> usize {
    n_objects.div_ceil(OBJECTS_PER_THREAD).clamp(1, MAX_THREADS)
}

/// Double buffered Barnes-Hut simulation.
///
/// Each tick integrates the current buffer into the next one using the tree
/// built during the previous tick, while a fresh tree is built from the
/// current buffer on another worker. Objects are therefore always pulled by a
/// tree that is one tick old.
pub struct Simulation {
    buffers: ParticleBuffers,
    /// Built from the buffer that was current during the previous tick.
    tree: Octree,
    /// Arena being rebuilt this tick. Swapped with `tree` afterwards.
    spare: Octree,
    params: SimParameters,
    pool: ThreadPool,
    tick: u64,
    time: f64,
    reported_invalid: usize,
}

impl Simulation {
    pub fn new(objects: Vec<ObjectInfo>, params: SimParameters) -> Result<Self, SimError> {
        params.validate()?;
        let n_threads = params
            .threads
            .unwrap_or_else(|| compute_target_threads(objects.len()));
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .thread_name(|i| format!("gravsim-worker-{i}"))
            .build()?;
        let tree = Octree::from_objects(&objects)?;
        log::debug!(
            "Simulation of {} objects on {} threads, initial tree has {} nodes",
            objects.len(),
            n_threads,
            tree.len()
        );

        Ok(Self {
            buffers: ParticleBuffers::new(objects),
            tree,
            spare: Octree::new(),
            params,
            pool,
            tick: 0,
            time: 0.0,
            reported_invalid: 0,
        })
    }

    pub fn exec_iter(&mut self) -> Result<(), SimError> {
        self.exec_iter_with_delta(self.params.delta)
    }

    /// Advance one tick of length `delta`.
    ///
    /// The buffers only flip after both the integration pass and the rebuild
    /// have joined. A failed rebuild leaves the current buffer untouched.
    pub fn exec_iter_with_delta(&mut self, delta: f64) -> Result<(), SimError> {
        let Self {
            buffers,
            tree,
            spare,
            params,
            pool,
            ..
        } = self;
        let (current, next) = buffers.split();
        let tree: &Octree = tree;
        let params: &SimParameters = params;

        let (built, ()) = pool.install(|| {
            rayon::join(
                || spare.build(current),
                || par_integrate(current, next, tree, params, delta),
            )
        });
        built?;

        std::mem::swap(&mut self.tree, &mut self.spare);
        self.buffers.flip();
        self.tick += 1;
        self.time += delta;
        self.check_validity()
    }

    /// Run `ticks` ticks back to back.
    pub fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            self.exec_iter()?;
        }
        Ok(())
    }

    fn check_validity(&mut self) -> Result<(), SimError> {
        let current = self.buffers.current();
        let first = self
            .pool
            .install(|| current.par_iter().position_first(|obj| !obj.is_valid()));
        let Some(index) = first else {
            self.reported_invalid = 0;
            return Ok(());
        };

        match self.params.invalid_state_policy {
            InvalidStatePolicy::Fail => {
                log::error!("Object {index} is not finite after tick {}", self.tick);
                Err(SimError::InvalidState {
                    tick: self.tick,
                    index,
                })
            }
            InvalidStatePolicy::LogAndContinue => {
                let count = current.iter().filter(|obj| !obj.is_valid()).count();
                if count != self.reported_invalid {
                    log::warn!(
                        "{count} objects are not finite after tick {} (first is {index}), excluding them from the tree",
                        self.tick
                    );
                    self.reported_invalid = count;
                }
                Ok(())
            }
        }
    }

    /// The buffer completed by the last tick.
    pub fn objects(&self) -> &[ObjectInfo] {
        self.buffers.current()
    }

    /// The tree the next tick will integrate against.
    pub fn tree(&self) -> &Octree {
        &self.tree
    }

    pub fn params(&self) -> &SimParameters {
        &self.params
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated time elapsed since the start.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
