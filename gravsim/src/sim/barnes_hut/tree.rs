use cgmath::{EuclideanSpace, Point3, Vector3, Zero};

use crate::{
    constants::MAX_DEPTH,
    error::SimError,
    sim::{ObjectInfo, barnes_hut::region::Aabc},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn to_index(self) -> usize {
        self.0
    }

    fn offset(self, by: usize) -> NodeId {
        NodeId(self.0 + by)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeData {
    Empty,
    Leaf {
        mass: f64,
        center_mass: Point3<f64>,
    },
    /// Children live at `first_child .. first_child + 8`, in octant order.
    Internal {
        first_child: NodeId,
        mass: f64,
        center_mass: Point3<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub region: Aabc,
    /// Node to visit once this subtree is done. `None` ends the traversal.
    pub next: Option<NodeId>,
    pub data: NodeData,
}

impl Node {
    fn empty(region: Aabc, next: Option<NodeId>) -> Self {
        Self {
            region,
            next,
            data: NodeData::Empty,
        }
    }

    pub fn mass(&self) -> f64 {
        match self.data {
            NodeData::Empty => 0.0,
            NodeData::Leaf { mass, .. } | NodeData::Internal { mass, .. } => mass,
        }
    }

    pub fn center_mass(&self) -> Option<Point3<f64>> {
        match self.data {
            NodeData::Empty => None,
            NodeData::Leaf { center_mass, .. } | NodeData::Internal { center_mass, .. } => {
                Some(center_mass)
            }
        }
    }
}

/// Octree stored as a flat arena. Node 0 is the root.
///
/// Every internal node owns eight consecutive children whose `next` pointers
/// chain to each other, with the last one pointing at the parent's `next`.
/// Walking `next` therefore skips a whole subtree without a stack.
#[derive(Debug, Default)]
pub struct Octree {
    nodes: Vec<Node>,
    /// Internal nodes in creation order. Parents always precede their children.
    internal: Vec<NodeId>,
}

impl Octree {
    /// An empty tree with a single massless root.
    pub fn new() -> Self {
        let mut tree = Self::default();
        tree.reset(Aabc::new(Point3::origin(), 1.0));
        tree
    }

    pub fn from_objects(objects: &[ObjectInfo]) -> Result<Self, SimError> {
        let mut tree = Self::default();
        tree.build(objects)?;
        Ok(tree)
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root().mass() == 0.0
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The eight children of an internal node.
    pub fn children(&self, id: NodeId) -> Option<&[Node]> {
        match self.nodes[id.0].data {
            NodeData::Internal { first_child, .. } => {
                Some(&self.nodes[first_child.0..first_child.0 + 8])
            }
            _ => None,
        }
    }

    /// Rebuild the tree from scratch, reusing the arena's allocation.
    ///
    /// Massless and non-finite objects are not inserted.
    pub fn build(&mut self, objects: &[ObjectInfo]) -> Result<(), SimError> {
        let contributes = |obj: &&ObjectInfo| obj.mass > 0.0 && obj.is_valid();

        let region = Aabc::enclosing(objects.iter().filter(contributes).map(|obj| &obj.pos));
        let Some(region) = region else {
            self.reset(Aabc::new(Point3::origin(), 1.0));
            return Ok(());
        };
        self.reset(region);

        for obj in objects.iter().filter(contributes) {
            self.insert(obj.mass, obj.pos)?;
        }
        self.aggregate();
        Ok(())
    }

    fn reset(&mut self, region: Aabc) {
        self.nodes.clear();
        self.internal.clear();
        self.nodes.push(Node::empty(region, None));
    }

    fn insert(&mut self, mass: f64, pos: Point3<f64>) -> Result<(), SimError> {
        let mut id = self.root_id();
        let mut depth = 0;
        loop {
            let node = &mut self.nodes[id.0];
            match node.data {
                NodeData::Internal { first_child, .. } => {
                    id = first_child.offset(node.region.octant_index(pos));
                    depth += 1;
                }
                NodeData::Empty => {
                    node.data = NodeData::Leaf {
                        mass,
                        center_mass: pos,
                    };
                    return Ok(());
                }
                NodeData::Leaf {
                    mass: leaf_mass,
                    center_mass,
                } => {
                    if center_mass == pos || depth >= MAX_DEPTH {
                        // No finite subdivision separates these two any more.
                        let total = leaf_mass + mass;
                        node.data = NodeData::Leaf {
                            mass: total,
                            center_mass: Point3::from_vec(
                                (center_mass.to_vec() * leaf_mass + pos.to_vec() * mass) / total,
                            ),
                        };
                        return Ok(());
                    }
                    let region = node.region;
                    let first_child = self.subdivide(id)?;
                    let occupant = first_child.offset(region.octant_index(center_mass));
                    self.nodes[occupant.0].data = NodeData::Leaf {
                        mass: leaf_mass,
                        center_mass,
                    };
                    // Loop again on the now internal node to place `pos`.
                }
            }
        }
    }

    /// Turn a leaf into an internal node with eight empty children.
    fn subdivide(&mut self, id: NodeId) -> Result<NodeId, SimError> {
        self.nodes.try_reserve(8)?;
        self.internal.try_reserve(1)?;

        let parent = &self.nodes[id.0];
        let regions = parent.region.split_into_octants();
        let parent_next = parent.next;
        let first_child = NodeId(self.nodes.len());

        for (i, region) in regions.into_iter().enumerate() {
            let next = if i < 7 {
                Some(first_child.offset(i + 1))
            } else {
                parent_next
            };
            self.nodes.push(Node::empty(region, next));
        }

        self.nodes[id.0].data = NodeData::Internal {
            first_child,
            mass: 0.0,
            center_mass: Point3::origin(),
        };
        self.internal.push(id);
        Ok(first_child)
    }

    /// Fill in internal masses, deepest nodes first.
    fn aggregate(&mut self) {
        for id in self.internal.iter().rev() {
            let node = &self.nodes[id.0];
            let NodeData::Internal { first_child, .. } = node.data else {
                continue;
            };
            let fallback = node.region.center;

            let mut mass = 0.0;
            let mut weighted = Vector3::zero();
            for child in &self.nodes[first_child.0..first_child.0 + 8] {
                if let Some(center_mass) = child.center_mass() {
                    let m = child.mass();
                    mass += m;
                    weighted += center_mass.to_vec() * m;
                }
            }
            let center_mass = if mass > 0.0 {
                Point3::from_vec(weighted / mass)
            } else {
                fallback
            };

            self.nodes[id.0].data = NodeData::Internal {
                first_child,
                mass,
                center_mass,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    fn object(pos: [f64; 3], mass: f64) -> ObjectInfo {
        ObjectInfo {
            pos: pos.into(),
            vel: Vector3::zero(),
            mass,
        }
    }

    fn random_objects(count: usize, seed: u64) -> Vec<ObjectInfo> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                object(
                    [
                        rng.random_range(-50.0..50.0),
                        rng.random_range(-50.0..50.0),
                        rng.random_range(-5.0..5.0),
                    ],
                    rng.random_range(0.1..10.0),
                )
            })
            .collect()
    }

    #[test]
    fn empty_population_gives_single_empty_root() {
        let tree = Octree::from_objects(&[]).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().mass(), 0.0);
        assert_eq!(tree.root().data, NodeData::Empty);
        assert!(tree.root().next.is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn single_object_is_a_leaf_root() {
        let tree = Octree::from_objects(&[object([1.0, 2.0, 3.0], 4.0)]).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.root().data,
            NodeData::Leaf {
                mass: 4.0,
                center_mass: Point3::new(1.0, 2.0, 3.0)
            }
        );
    }

    #[test]
    fn conserves_mass_and_center_of_mass() {
        let objects = random_objects(500, 7);
        let tree = Octree::from_objects(&objects).unwrap();

        let total: f64 = objects.iter().map(|o| o.mass).sum();
        let weighted = objects
            .iter()
            .fold(Vector3::zero(), |acc, o| acc + o.pos.to_vec() * o.mass);
        let expected = weighted / total;

        let root = tree.root();
        assert!((root.mass() - total).abs() < 1e-9 * total);
        let com = root.center_mass().unwrap();
        assert!((com.to_vec() - expected).magnitude() < 1e-9);
    }

    #[test]
    fn every_internal_node_aggregates_its_children() {
        let tree = Octree::from_objects(&random_objects(200, 3)).unwrap();
        for (i, node) in tree.nodes().iter().enumerate() {
            if let Some(children) = tree.children(NodeId(i)) {
                let sum: f64 = children.iter().map(Node::mass).sum();
                assert!((node.mass() - sum).abs() < 1e-9 * sum.max(1.0));
            }
        }
    }

    #[test]
    fn next_pointers_chain_siblings_to_parent_next() {
        let tree = Octree::from_objects(&random_objects(300, 11)).unwrap();
        assert!(tree.root().next.is_none());
        let mut internal = 0;
        for (i, node) in tree.nodes().iter().enumerate() {
            let NodeData::Internal { first_child, .. } = node.data else {
                continue;
            };
            internal += 1;
            for k in 0..7 {
                assert_eq!(
                    tree.get(first_child.offset(k)).next,
                    Some(first_child.offset(k + 1))
                );
            }
            assert_eq!(tree.get(first_child.offset(7)).next, node.next, "node {i}");
        }
        assert!(internal > 0);
    }

    #[test]
    fn skip_walk_visits_every_node_once() {
        // Descending into every internal node and following `next` otherwise
        // must reach each node exactly once.
        let tree = Octree::from_objects(&random_objects(100, 5)).unwrap();
        let mut visits = vec![0; tree.len()];
        let mut cursor = Some(tree.root_id());
        while let Some(id) = cursor {
            visits[id.to_index()] += 1;
            let node = tree.get(id);
            cursor = match node.data {
                NodeData::Internal { first_child, .. } => Some(first_child),
                _ => node.next,
            };
        }
        assert!(visits.iter().all(|v| *v == 1));
    }

    #[test]
    fn leaves_lie_inside_their_regions() {
        let tree = Octree::from_objects(&random_objects(300, 13)).unwrap();
        for node in tree.nodes() {
            if let NodeData::Leaf { center_mass, .. } = node.data {
                assert!(node.region.contains(center_mass));
            }
        }
    }

    #[test]
    fn coincident_objects_share_a_leaf() {
        let objects = [
            object([1.0, 1.0, 1.0], 2.0),
            object([1.0, 1.0, 1.0], 3.0),
            object([-1.0, 0.0, 0.0], 1.0),
        ];
        let tree = Octree::from_objects(&objects).unwrap();
        let leaf_masses: Vec<f64> = tree
            .nodes()
            .iter()
            .filter_map(|n| match n.data {
                NodeData::Leaf { mass, .. } => Some(mass),
                _ => None,
            })
            .collect();
        assert_eq!(leaf_masses.len(), 2);
        assert!(leaf_masses.contains(&5.0));
        assert!((tree.root().mass() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn nearly_coincident_objects_terminate() {
        let a: f64 = 1.0;
        let b = f64::from_bits(a.to_bits() + 1);
        let objects = [object([a, 0.0, 0.0], 1.0), object([b, 0.0, 0.0], 1.0)];
        let tree = Octree::from_objects(&objects).unwrap();
        assert!((tree.root().mass() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn skips_massless_and_invalid_objects() {
        let objects = [
            object([0.0, 0.0, 0.0], 0.0),
            object([f64::NAN, 0.0, 0.0], 1.0),
            object([2.0, 0.0, 0.0], 3.0),
        ];
        let tree = Octree::from_objects(&objects).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().mass(), 3.0);
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut tree = Octree::from_objects(&random_objects(100, 17)).unwrap();
        tree.build(&[object([0.0, 0.0, 0.0], 1.0)]).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().mass(), 1.0);
        tree.build(&[]).unwrap();
        assert!(tree.is_empty());
    }
}
