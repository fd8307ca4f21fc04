use crate::core::CollidableHandle;
use crate::math::{Aabb, Transform};
use crate::shapes::CompoundHierarchy;

/// A child of a compound collidable
#[derive(Debug, Clone, Copy)]
pub struct CompoundChild {
    /// The child's own collidable
    pub handle: CollidableHandle,

    /// The child's transform relative to the compound
    pub local_transform: Transform,
}

/// The children of a compound collidable and the hierarchy indexing them
#[derive(Debug, Clone)]
pub struct CompoundCollidable {
    children: Vec<CompoundChild>,
    hierarchy: CompoundHierarchy,
}

impl CompoundCollidable {
    pub(crate) fn new(children: Vec<CompoundChild>, child_bounds: &[Aabb]) -> Self {
        Self {
            hierarchy: CompoundHierarchy::new(child_bounds),
            children,
        }
    }

    /// Returns the children of the compound
    pub fn get_children(&self) -> &[CompoundChild] {
        &self.children
    }

    /// Returns the child at an index
    pub fn get_child(&self, index: usize) -> Option<&CompoundChild> {
        self.children.get(index)
    }

    /// Returns the bounding-volume hierarchy over the children
    pub fn get_hierarchy(&self) -> &CompoundHierarchy {
        &self.hierarchy
    }

    /// Collects the children whose boxes overlap the query box
    pub fn get_overlapped_children(&self, query: &Aabb, overlaps: &mut Vec<CollidableHandle>) {
        let mut indices = Vec::new();
        self.hierarchy.get_overlaps(query, &mut indices);
        overlaps.clear();
        overlaps.extend(indices.into_iter().filter_map(|i| self.children.get(i).map(|c| c.handle)));
    }

    pub(crate) fn refit(&mut self, child_bounds: &[Aabb]) {
        self.hierarchy.refit(child_bounds);
    }
}
