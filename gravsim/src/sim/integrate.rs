use cgmath::Point3;
use rayon::iter::{
    IndexedParallelIterator, IntoParallelRefIterator, IntoParallelRefMutIterator, ParallelIterator,
};

use crate::{
    parameters::SimParameters,
    sim::{ObjectInfo, barnes_hut::Octree},
};

/// Advance every object of `current` by one tick into the same slot of `next`.
///
/// `next` must still hold the objects `tree` was built from: each object's
/// old entry is read before being overwritten and excluded from its own pull.
/// Each slot of `next` is touched by exactly one task and nothing else is
/// written, so the fan-out needs no synchronization.
pub fn par_integrate(
    current: &[ObjectInfo],
    next: &mut [ObjectInfo],
    tree: &Octree,
    params: &SimParameters,
    delta: f64,
) {
    debug_assert_eq!(current.len(), next.len());
    next.par_iter_mut()
        .zip(current.par_iter())
        .for_each(|(out, obj)| {
            let previous = (out.mass > 0.0).then_some(out.pos);
            integrate_object(obj, previous, out, tree, params, delta)
        });
}

/// Semi-implicit Euler step of a single object against `tree`.
///
/// `previous` is where `tree` saw this object, if it saw it at all.
#[inline]
pub fn integrate_object(
    obj: &ObjectInfo,
    previous: Option<Point3<f64>>,
    out: &mut ObjectInfo,
    tree: &Octree,
    params: &SimParameters,
    delta: f64,
) {
    let field = match previous {
        Some(previous) => {
            tree.force_at_excluding(obj.pos, previous, params.theta, params.softening)
        }
        None => tree.force_at(obj.pos, params.theta, params.softening),
    };
    let acc = field * params.g;
    // Integrate the acceleration by multiplying it with the time step
    // and add it to the velocity
    out.vel = obj.vel + acc * delta;
    // Integrate the new velocity and add it to the position
    out.pos = obj.pos + out.vel * delta;
    out.mass = obj.mass;
}
