// PHYSICAL
/// Gravitational constant in simulation units.
pub const G: f64 = 100.0;
/// Default time step per simulation tick.
pub const DELTA: f64 = 1e-3;
/// Minimum separation below which a mass contributes no force.
pub const SOFTENING: f64 = 1e-2;

// SIMULATION
/// Hard cap on number of threads to use.
pub const MAX_THREADS: usize = 20;
/// Minimum number of objects per thread.
pub const OBJECTS_PER_THREAD: usize = 2000;
/// Log a progress line every this many ticks.
pub const CHECK_INTERVAL: u64 = 1000;

/// Barnes-Hut coefficient (theta). Smaller values = more accurate, but slower.
pub const BARNES_HUT_COEFF: f64 = 0.5;
/// Subdivision depth after which colliding particles share a leaf.
/// Halving an f64 extent more often than this stops producing distinct cubes.
pub const MAX_DEPTH: usize = 64;
/// Relative padding applied to the root cube so boundary particles are strictly inside.
pub const ROOT_PADDING: f64 = 1e-6;
