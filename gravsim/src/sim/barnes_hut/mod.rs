use cgmath::{InnerSpace, Point3, Vector3, Zero};

pub use region::Aabc;
pub use tree::{Node, NodeData, NodeId, Octree};

mod region;
mod tree;

impl Octree {
    /// Approximate gravitational pull at `pos`, per unit mass and before
    /// scaling by G.
    ///
    /// A node is used as a single body when it is a leaf or its size is small
    /// against its distance (`size < dist * theta`), and it is further away
    /// than `softening`. Accepted subtrees are skipped through `next`.
    pub fn force_at(&self, pos: Point3<f64>, theta: f64, softening: f64) -> Vector3<f64> {
        self.traverse(pos, None, theta, softening)
    }

    /// Like [`Octree::force_at`], but ignores the leaf sitting exactly at
    /// `exclude`. Nodes whose region holds `exclude` are always opened, so
    /// its mass never reaches the sum through an aggregate either.
    ///
    /// An object integrated against a tree built one tick earlier finds its
    /// own previous position in it. Excluding that leaf keeps the object from
    /// pulling itself once it moves further than `softening` per tick.
    pub fn force_at_excluding(
        &self,
        pos: Point3<f64>,
        exclude: Point3<f64>,
        theta: f64,
        softening: f64,
    ) -> Vector3<f64> {
        self.traverse(pos, Some(exclude), theta, softening)
    }

    fn traverse(
        &self,
        pos: Point3<f64>,
        exclude: Option<Point3<f64>>,
        theta: f64,
        softening: f64,
    ) -> Vector3<f64> {
        let theta_sq = theta * theta;
        let softening_sq = softening * softening;
        let mut out = Vector3::zero();

        let mut cursor = Some(self.root_id());
        while let Some(id) = cursor {
            let node = self.get(id);

            cursor = match node.data {
                NodeData::Empty => node.next,
                NodeData::Leaf { mass, center_mass } => {
                    let rel = center_mass - pos;
                    let dist_sq = rel.magnitude2();
                    if dist_sq > softening_sq && exclude != Some(center_mass) {
                        out += contribution(mass, rel, dist_sq);
                    }
                    node.next
                }
                NodeData::Internal {
                    first_child,
                    mass,
                    center_mass,
                } => {
                    if mass <= 0.0 {
                        node.next
                    } else {
                        let rel = center_mass - pos;
                        let dist_sq = rel.magnitude2();
                        let size_sq = node.region.size * node.region.size;
                        // An aggregate holding the excluded leaf must be opened.
                        let holds_excluded = exclude.is_some_and(|p| node.region.touches(p));
                        if !holds_excluded
                            && dist_sq > softening_sq
                            && size_sq < dist_sq * theta_sq
                        {
                            // Treat this node as a single body
                            out += contribution(mass, rel, dist_sq);
                            node.next
                        } else {
                            Some(first_child)
                        }
                    }
                }
            };
        }
        out
    }
}

/// `mass / dist² * normalize(rel)`
#[inline]
fn contribution(mass: f64, rel: Vector3<f64>, dist_sq: f64) -> Vector3<f64> {
    rel * (mass / (dist_sq * dist_sq.sqrt()))
}
