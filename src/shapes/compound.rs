use crate::math::Aabb;

#[derive(Debug, Clone)]
enum HierarchyNode {
    Leaf {
        bounds: Aabb,
        child: usize,
    },
    Internal {
        bounds: Aabb,
        left: usize,
        right: usize,
    },
}

impl HierarchyNode {
    fn bounds(&self) -> &Aabb {
        match self {
            Self::Leaf { bounds, .. } | Self::Internal { bounds, .. } => bounds,
        }
    }
}

/// A static bounding-volume hierarchy over the children of a compound
///
/// The topology is fixed at construction by a median split along the longest
/// axis; `refit` updates the boxes in place as children move.
#[derive(Debug, Clone, Default)]
pub struct CompoundHierarchy {
    nodes: Vec<HierarchyNode>,
    leaf_count: usize,
}

impl CompoundHierarchy {
    /// Builds a hierarchy over the given child bounding boxes
    pub fn new(child_bounds: &[Aabb]) -> Self {
        let mut hierarchy = Self {
            nodes: Vec::with_capacity(child_bounds.len() * 2),
            leaf_count: child_bounds.len(),
        };

        if !child_bounds.is_empty() {
            let mut indices: Vec<usize> = (0..child_bounds.len()).collect();
            hierarchy.build(&mut indices, child_bounds);
        }

        hierarchy
    }

    fn build(&mut self, indices: &mut [usize], child_bounds: &[Aabb]) -> usize {
        let node_index = self.nodes.len();

        if let [child] = indices {
            self.nodes.push(HierarchyNode::Leaf {
                bounds: child_bounds[*child],
                child: *child,
            });
            return node_index;
        }

        // Placeholder, children always land at higher indices than their parent
        self.nodes.push(HierarchyNode::Leaf {
            bounds: child_bounds[indices[0]],
            child: indices[0],
        });

        let mut centroid_bounds = Aabb::new(child_bounds[indices[0]].center(), child_bounds[indices[0]].center());
        for &i in indices.iter() {
            centroid_bounds.expand_to_include_point(child_bounds[i].center());
        }
        let axis = centroid_bounds.extents().imax();
        indices.sort_by(|&a, &b| {
            child_bounds[a].center()[axis].total_cmp(&child_bounds[b].center()[axis])
        });

        let mid = indices.len() / 2;
        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.build(left_indices, child_bounds);
        let right = self.build(right_indices, child_bounds);
        let bounds = self.nodes[left].bounds().union(self.nodes[right].bounds());
        self.nodes[node_index] = HierarchyNode::Internal { bounds, left, right };

        node_index
    }

    /// Updates every node's box from the current child boxes
    pub fn refit(&mut self, child_bounds: &[Aabb]) {
        for i in (0..self.nodes.len()).rev() {
            let bounds = match &self.nodes[i] {
                HierarchyNode::Leaf { child, .. } => match child_bounds.get(*child) {
                    Some(bounds) => *bounds,
                    None => continue,
                },
                HierarchyNode::Internal { left, right, .. } => {
                    self.nodes[*left].bounds().union(self.nodes[*right].bounds())
                }
            };
            match &mut self.nodes[i] {
                HierarchyNode::Leaf { bounds: b, .. } | HierarchyNode::Internal { bounds: b, .. } => *b = bounds,
            }
        }
    }

    /// Collects the indices of every child whose box overlaps the query box
    pub fn get_overlaps(&self, query: &Aabb, overlaps: &mut Vec<usize>) {
        overlaps.clear();
        if self.nodes.is_empty() {
            return;
        }

        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds().intersects(query) {
                continue;
            }
            match node {
                HierarchyNode::Leaf { child, .. } => overlaps.push(*child),
                HierarchyNode::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
        overlaps.sort_unstable();
    }

    /// Returns the box enclosing every child
    pub fn get_root_bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|node| *node.bounds())
    }

    /// Returns the number of children indexed by the hierarchy
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn unit_box_at(x: f32) -> Aabb {
        Aabb::from_center_half_extents(Vector3::new(x, 0.0, 0.0), Vector3::repeat(0.5))
    }

    #[test]
    fn finds_only_overlapping_children() {
        let bounds: Vec<Aabb> = (0..7).map(|i| unit_box_at(i as f32 * 2.0)).collect();
        let hierarchy = CompoundHierarchy::new(&bounds);
        let mut overlaps = Vec::new();

        hierarchy.get_overlaps(&unit_box_at(4.2), &mut overlaps);
        assert_eq!(overlaps, vec![2]);

        hierarchy.get_overlaps(&Aabb::new(Vector3::new(-10.0, -1.0, -1.0), Vector3::new(30.0, 1.0, 1.0)), &mut overlaps);
        assert_eq!(overlaps, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn refit_tracks_moved_children() {
        let mut bounds: Vec<Aabb> = (0..4).map(|i| unit_box_at(i as f32 * 2.0)).collect();
        let mut hierarchy = CompoundHierarchy::new(&bounds);
        bounds[0] = unit_box_at(20.0);
        hierarchy.refit(&bounds);

        let mut overlaps = Vec::new();
        hierarchy.get_overlaps(&unit_box_at(20.0), &mut overlaps);
        assert_eq!(overlaps, vec![0]);
        hierarchy.get_overlaps(&unit_box_at(0.0), &mut overlaps);
        assert!(overlaps.is_empty());
    }
}
