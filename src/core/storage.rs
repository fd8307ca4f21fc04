use std::collections::HashMap;
use crate::collidables::{Collidable, CollidableKind, CompoundChild, CompoundCollidable, PositionUpdateMode};
use crate::core::CollidableHandle;
use crate::error::PhysicsError;
use crate::math::{Aabb, Transform, Vector3};
use crate::Result;

/// Generic storage trait for physics objects
pub trait Storage<T, H> {
    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all handles in ascending order
    fn handles(&self) -> Vec<H>;
}

/// Storage for collidables
#[derive(Debug)]
pub struct CollidableStorage {
    items: HashMap<CollidableHandle, Collidable>,
    next_id: u32,
}

impl Default for CollidableStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage<Collidable, CollidableHandle> for CollidableStorage {
    fn add(&mut self, item: Collidable) -> CollidableHandle {
        let handle = CollidableHandle(self.next_id);
        self.next_id += 1;
        self.items.insert(handle, item);
        handle
    }

    fn get(&self, handle: CollidableHandle) -> Option<&Collidable> {
        self.items.get(&handle)
    }

    fn get_mut(&mut self, handle: CollidableHandle) -> Option<&mut Collidable> {
        self.items.get_mut(&handle)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn handles(&self) -> Vec<CollidableHandle> {
        let mut handles: Vec<CollidableHandle> = self.items.keys().copied().collect();
        handles.sort_unstable();
        handles
    }
}

impl CollidableStorage {
    /// Creates a new empty storage
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
            next_id: 1, // Start at 1, so 0 can represent invalid handle
        }
    }

    /// Gets a collidable by its handle, returning an error if not found
    pub fn get_collidable(&self, handle: CollidableHandle) -> Result<&Collidable> {
        self.get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Collidable with handle {:?} not found", handle)))
    }

    /// Gets a mutable reference to a collidable by its handle, returning an error if not found
    pub fn get_collidable_mut(&mut self, handle: CollidableHandle) -> Result<&mut Collidable> {
        self.get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("Collidable with handle {:?} not found", handle)))
    }

    /// Builds a compound from collidables already in the storage
    ///
    /// Each child is placed at `local_transform` relative to the compound and
    /// from then on follows the compound's transform and motion. Children may
    /// themselves be compounds.
    pub fn add_compound(&mut self, transform: Transform, children: Vec<(CollidableHandle, Transform)>) -> Result<CollidableHandle> {
        if children.is_empty() {
            return Err(PhysicsError::InvalidParameter("Compound needs at least one child".to_string()));
        }

        let mut compound_children = Vec::with_capacity(children.len());
        let mut child_bounds = Vec::with_capacity(children.len());
        for (handle, local_transform) in children {
            let child = self.get_collidable(handle)?;
            if child.get_parent().is_some() {
                return Err(PhysicsError::InvalidParameter(format!(
                    "Collidable {:?} already belongs to a compound",
                    handle
                )));
            }
            compound_children.push(CompoundChild { handle, local_transform });
        }

        for child in &compound_children {
            self.place_child(child.handle, child.local_transform.combine(&transform))?;
            child_bounds.push(*self.get_collidable(child.handle)?.get_bounding_box());
        }

        let compound = Collidable::new(
            CollidableKind::Compound(CompoundCollidable::new(compound_children.clone(), &child_bounds)),
            transform,
        );
        let handle = self.add(compound);
        for child in &compound_children {
            self.get_collidable_mut(child.handle)?.set_parent(Some(handle));
        }
        self.propagate_to_children(handle)?;

        Ok(handle)
    }

    /// Adds new collidables and builds a compound from them
    pub fn add_compound_of(&mut self, transform: Transform, children: Vec<(Collidable, Transform)>) -> Result<CollidableHandle> {
        let children = children
            .into_iter()
            .map(|(collidable, local_transform)| (self.add(collidable), local_transform))
            .collect();
        self.add_compound(transform, children)
    }

    /// Removes a collidable, and every child if it is a compound
    pub fn remove(&mut self, handle: CollidableHandle) -> Option<Collidable> {
        let removed = self.items.remove(&handle)?;
        if let Some(compound) = removed.as_compound() {
            for child in compound.get_children() {
                self.remove(child.handle);
            }
        }
        Some(removed)
    }

    /// Sets the world transform of a collidable, moving any children with it
    pub fn set_transform(&mut self, handle: CollidableHandle, transform: Transform) -> Result<()> {
        self.get_collidable_mut(handle)?.set_transform(transform);
        self.propagate_to_children(handle)
    }

    /// Sets the world position of a collidable, moving any children with it
    pub fn set_position(&mut self, handle: CollidableHandle, position: Vector3) -> Result<()> {
        let mut transform = *self.get_collidable(handle)?.get_transform();
        transform.position = position;
        self.set_transform(handle, transform)
    }

    /// Sets the linear velocity of a collidable
    pub fn set_linear_velocity(&mut self, handle: CollidableHandle, velocity: Vector3) -> Result<()> {
        self.get_collidable_mut(handle)?.get_motion_mut().linear_velocity = velocity;
        self.propagate_to_children(handle)
    }

    /// Sets the angular velocity of a collidable
    pub fn set_angular_velocity(&mut self, handle: CollidableHandle, velocity: Vector3) -> Result<()> {
        self.get_collidable_mut(handle)?.get_motion_mut().angular_velocity = velocity;
        self.propagate_to_children(handle)
    }

    /// Sets how a collidable's position is advanced
    pub fn set_position_update_mode(&mut self, handle: CollidableHandle, mode: PositionUpdateMode) -> Result<()> {
        self.get_collidable_mut(handle)?.get_motion_mut().position_update_mode = mode;
        self.propagate_to_children(handle)
    }

    /// Marks a collidable as moving or at rest
    pub fn set_active(&mut self, handle: CollidableHandle, is_active: bool) -> Result<()> {
        self.get_collidable_mut(handle)?.get_motion_mut().is_active = is_active;
        self.propagate_to_children(handle)
    }

    /// Recomputes every bounding box for a step of length `dt`
    ///
    /// Continuous-mode collidables get boxes swept by `velocity * dt`; compound
    /// boxes enclose their children and their hierarchies are refit.
    pub fn update_bounding_boxes(&mut self, dt: f32) {
        // Children always have lower handles than their compound
        for handle in self.handles() {
            let child_bounds: Option<Vec<Aabb>> = match self.items.get(&handle).and_then(|c| c.as_compound()) {
                Some(compound) => compound
                    .get_children()
                    .iter()
                    .map(|child| self.items.get(&child.handle).map(|c| *c.get_bounding_box()))
                    .collect(),
                None => None,
            };

            let Some(collidable) = self.items.get_mut(&handle) else {
                continue;
            };
            if let Some(bounds) = child_bounds {
                if let CollidableKind::Compound(compound) = collidable.get_kind_mut() {
                    compound.refit(&bounds);
                }
                collidable.update_local_bounding_box();
            } else if collidable.as_compound().is_none() {
                collidable.update_local_bounding_box();
                let motion = *collidable.get_motion();
                if motion.is_continuous() {
                    let swept = collidable.get_bounding_box().swept(motion.linear_velocity * dt);
                    collidable.set_bounding_box(swept);
                }
            }
        }
    }

    fn place_child(&mut self, handle: CollidableHandle, world_transform: Transform) -> Result<()> {
        let child = self.get_collidable_mut(handle)?;
        child.set_transform(world_transform);
        child.update_local_bounding_box();
        Ok(())
    }

    fn propagate_to_children(&mut self, root: CollidableHandle) -> Result<()> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let parent = self.get_collidable(handle)?;
            let Some(compound) = parent.as_compound() else {
                continue;
            };
            let parent_transform = *parent.get_transform();
            let parent_motion = *parent.get_motion();
            let children = compound.get_children().to_vec();

            for child in children {
                let world_transform = child.local_transform.combine(&parent_transform);
                let offset = world_transform.position - parent_transform.position;
                self.place_child(child.handle, world_transform)?;

                let motion = self.get_collidable_mut(child.handle)?.get_motion_mut();
                *motion = parent_motion;
                motion.linear_velocity = parent_motion.linear_velocity + parent_motion.angular_velocity.cross(&offset);
                stack.push(child.handle);
            }
        }
        Ok(())
    }
}
