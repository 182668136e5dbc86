use std::{f64::consts::TAU, ops::Range};

use cgmath::{InnerSpace, Point3, Vector3, Zero};
use rand::Rng;

use crate::ObjectInfo;

/// Heavy body at the origin.
fn central_body(mass: f64) -> ObjectInfo {
    ObjectInfo::new(Point3::new(0.0, 0.0, 0.0), Vector3::zero(), mass)
}

/// Velocity for a circular orbit around the y axis, at `pos`, about `mass`.
fn orbital_velocity(pos: Point3<f64>, mass: f64, g: f64) -> Vector3<f64> {
    let rel = pos - Point3::new(0.0, 0.0, 0.0);
    let dir = (-rel).cross(Vector3::unit_y());
    let r = rel.magnitude();
    if r == 0.0 || dir.magnitude2() == 0.0 {
        return Vector3::zero();
    }
    dir.normalize() * (g * mass / r).sqrt()
}

/// A heavy central body with `count - 1` bodies scattered uniformly through
/// the cube `[-size, size]³`, each set on a circular orbit about the center.
pub fn central_mass_cube(
    rng: &mut impl Rng,
    count: usize,
    size: f64,
    central_mass: f64,
    body_mass: Range<f64>,
    g: f64,
) -> Vec<ObjectInfo> {
    if count == 0 {
        return Vec::new();
    }
    let mut objects = Vec::with_capacity(count);
    objects.push(central_body(central_mass));

    for _ in 1..count {
        let pos = Point3::new(
            rng.random_range(-size..size),
            rng.random_range(-size..size),
            rng.random_range(-size..size),
        );
        let vel = orbital_velocity(pos, central_mass, g);
        objects.push(ObjectInfo::new(pos, vel, rng.random_range(body_mass.clone())));
    }
    objects
}

#[derive(Debug, Clone)]
pub struct DiskParams {
    pub count: usize,
    /// Semi-major axis, along x.
    pub radius: f64,
    /// Ratio of the minor (z) to the major axis, in `(0, 1]`.
    pub aspect: f64,
    /// Half height of the disk along y.
    pub thickness: f64,
    pub central_mass: f64,
    pub body_mass: Range<f64>,
    pub g: f64,
}

impl Default for DiskParams {
    fn default() -> Self {
        Self {
            count: 10_000,
            radius: 1000.0,
            aspect: 1.0,
            thickness: 10.0,
            central_mass: 1_000_000.0,
            body_mass: 1.0..500.0,
            g: crate::constants::G,
        }
    }
}

/// A rotating, possibly elliptical disk in the xz plane around a central body.
///
/// Radii are drawn so the surface density is uniform. Orbital speeds account
/// for the central mass plus the mean disk mass inside each radius.
pub fn disk(rng: &mut impl Rng, params: &DiskParams) -> Vec<ObjectInfo> {
    if params.count == 0 {
        return Vec::new();
    }
    let mut objects = Vec::with_capacity(params.count);
    objects.push(central_body(params.central_mass));

    let bodies = params.count - 1;
    let mean_mass = (params.body_mass.start + params.body_mass.end) / 2.0;
    for _ in 0..bodies {
        let u: f64 = rng.random();
        let r = params.radius * u.sqrt();
        let angle = rng.random_range(0.0..TAU);
        let height = if params.thickness > 0.0 {
            rng.random_range(-params.thickness..params.thickness)
        } else {
            0.0
        };
        let pos = Point3::new(r * angle.cos(), height, r * angle.sin() * params.aspect);

        let enclosed = params.central_mass + mean_mass * bodies as f64 * u;
        let vel = orbital_velocity(pos, enclosed, params.g);
        let mass = rng.random_range(params.body_mass.clone());
        objects.push(ObjectInfo::new(pos, vel, mass));
    }
    objects
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn cube_is_seeded_reproducibly() {
        let a = central_mass_cube(&mut StdRng::seed_from_u64(1), 100, 50.0, 1e6, 1.0..2.0, 100.0);
        let b = central_mass_cube(&mut StdRng::seed_from_u64(1), 100, 50.0, 1e6, 1.0..2.0, 100.0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
        assert_eq!(a[0].mass, 1e6);
        for obj in &a[1..] {
            assert!(obj.pos.x.abs() <= 50.0 && obj.pos.y.abs() <= 50.0 && obj.pos.z.abs() <= 50.0);
            assert!((1.0..2.0).contains(&obj.mass));
            // Orbits lie in planes perpendicular to y.
            assert!(obj.vel.y.abs() < 1e-9);
        }
    }

    #[test]
    fn disk_bodies_orbit_within_radius() {
        let params = DiskParams {
            count: 500,
            radius: 100.0,
            aspect: 0.5,
            thickness: 1.0,
            ..Default::default()
        };
        let objects = disk(&mut StdRng::seed_from_u64(3), &params);
        assert_eq!(objects.len(), 500);
        for obj in &objects[1..] {
            let planar = Vector3::new(obj.pos.x, 0.0, obj.pos.z);
            assert!(planar.magnitude() <= 100.0);
            assert!(obj.pos.y.abs() <= 1.0);
            // Velocity is tangential.
            assert!(planar.dot(obj.vel).abs() < 1e-6 * planar.magnitude() * obj.vel.magnitude() + 1e-9);
        }
    }

    #[test]
    fn empty_presets() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(central_mass_cube(&mut rng, 0, 1.0, 1.0, 1.0..2.0, 1.0).is_empty());
        let params = DiskParams {
            count: 0,
            ..Default::default()
        };
        assert!(disk(&mut rng, &params).is_empty());
    }
}
