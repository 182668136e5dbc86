use cgmath::{Point3, Vector3};

use crate::constants::ROOT_PADDING;

/// Axis aligned bounding cube. `size` is the full edge length, so the cube
/// spans `center ± size / 2` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabc {
    pub center: Point3<f64>,
    pub size: f64,
}

/// Sign of each octant's offset from the parent center, in `octant_index` order.
const OCTANT_SIGNS: [[f64; 3]; 8] = [
    [1.0, 1.0, 1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, 1.0],
    [1.0, -1.0, -1.0],
    [-1.0, 1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, -1.0, -1.0],
];

impl Aabc {
    pub fn new(center: Point3<f64>, size: f64) -> Self {
        Self { center, size }
    }

    /// Smallest padded cube around `points`, or `None` if there are none.
    ///
    /// The edge is the largest axis extent, so every point ends up strictly
    /// inside. Coincident points get a unit cube.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        let mut any = false;
        for p in points {
            any = true;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        if !any {
            return None;
        }

        let center = Point3::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        );
        let extent = (max.x - min.x).max(max.y - min.y).max(max.z - min.z);
        let size = if extent > 0.0 {
            extent * (1.0 + ROOT_PADDING) + 4.0 * f64::EPSILON * center_scale(center)
        } else {
            1.0
        };
        Some(Self { center, size })
    }

    /// True iff `p` lies strictly inside the cube on all three axes.
    pub fn contains(&self, p: Point3<f64>) -> bool {
        let half = 0.5 * self.size;
        let local = p - self.center;
        (-half < local.x && local.x < half)
            && (-half < local.y && local.y < half)
            && (-half < local.z && local.z < half)
    }

    /// Like [`Aabc::contains`], but points on a face count as inside.
    pub fn touches(&self, p: Point3<f64>) -> bool {
        let half = 0.5 * self.size;
        let local = p - self.center;
        local.x.abs() <= half && local.y.abs() <= half && local.z.abs() <= half
    }

    /// Which child of `split_into_octants` contains `p`.
    ///
    /// Bit 2 is set below the center on x, bit 1 on y, bit 0 on z.
    pub fn octant_index(&self, p: Point3<f64>) -> usize {
        (usize::from(p.x < self.center.x) << 2)
            | (usize::from(p.y < self.center.y) << 1)
            | usize::from(p.z < self.center.z)
    }

    pub fn split_into_octants(&self) -> [Aabc; 8] {
        let quarter = 0.25 * self.size;
        OCTANT_SIGNS.map(|[x, y, z]| Aabc {
            center: self.center + Vector3::new(x, y, z) * quarter,
            size: 0.5 * self.size,
        })
    }
}

// Keeps the padding meaningful far from the origin, where `extent * ROOT_PADDING`
// alone can vanish against the magnitude of the coordinates.
fn center_scale(center: Point3<f64>) -> f64 {
    center.x.abs().max(center.y.abs()).max(center.z.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octant_index_is_a_bijection() {
        let s = 2.0;
        let cube = Aabc::new(Point3::new(0.0, 0.0, 0.0), s);
        let mut seen = [false; 8];
        for [x, y, z] in OCTANT_SIGNS {
            let idx = cube.octant_index(Point3::new(x * s / 4.0, y * s / 4.0, z * s / 4.0));
            assert!(idx < 8);
            assert!(!seen[idx], "octant {idx} hit twice");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn split_matches_octant_index() {
        let cube = Aabc::new(Point3::new(1.0, -2.0, 3.0), 4.0);
        for (i, child) in cube.split_into_octants().iter().enumerate() {
            assert_eq!(child.size, 2.0);
            assert_eq!(cube.octant_index(child.center), i);
            assert!(cube.contains(child.center));
        }
    }

    #[test]
    fn contains_is_strict() {
        let cube = Aabc::new(Point3::new(0.0, 0.0, 0.0), 2.0);
        assert!(cube.contains(Point3::new(0.99, -0.99, 0.0)));
        assert!(!cube.contains(Point3::new(1.0, 0.0, 0.0)));
        assert!(!cube.contains(Point3::new(0.0, 0.0, -1.0)));
        assert!(!cube.contains(Point3::new(0.0, 5.0, 0.0)));
    }

    #[test]
    fn enclosing_contains_outliers() {
        // A flat, elongated cloud: the smallest extent would cut off the ends.
        let points = [
            Point3::new(-100.0, 0.0, 0.0),
            Point3::new(100.0, 0.5, 0.0),
            Point3::new(3.0, -0.5, 0.1),
        ];
        let cube = Aabc::enclosing(&points).unwrap();
        for p in points {
            assert!(cube.contains(p), "{p:?} outside {cube:?}");
        }
    }

    #[test]
    fn enclosing_degenerate_inputs() {
        assert!(Aabc::enclosing(&[] as &[Point3<f64>]).is_none());
        let p = Point3::new(5.0, 5.0, 5.0);
        let cube = Aabc::enclosing(&[p]).unwrap();
        assert_eq!(cube.size, 1.0);
        assert!(cube.contains(p));
    }

    #[test]
    fn touches_includes_faces() {
        let cube = Aabc::new(Point3::new(0.0, 0.0, 0.0), 2.0);
        let face = Point3::new(1.0, 0.0, -1.0);
        assert!(!cube.contains(face));
        assert!(cube.touches(face));
        assert!(cube.touches(Point3::new(0.5, -0.5, 0.0)));
        assert!(!cube.touches(Point3::new(1.0 + 1e-9, 0.0, 0.0)));
    }
}
