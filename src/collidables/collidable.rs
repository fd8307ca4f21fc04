use crate::collidables::{CompoundCollidable, Material};
use crate::collision::{CollidablePair, CollisionRule, CollisionRules};
use crate::core::{CollidableEvents, CollidableHandle};
use crate::math::{Aabb, Transform, Vector3};
use crate::shapes::{ConvexShape, HeightField};
use std::collections::HashSet;
use std::sync::Arc;

/// How a collidable's position is advanced between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionUpdateMode {
    /// Teleports to the end-of-step position; may tunnel at high speed
    #[default]
    Discrete,

    /// Bounding box is swept and the narrow phase computes time of impact
    Continuous,
}

/// Velocities and update mode of a collidable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// Linear velocity in world space
    pub linear_velocity: Vector3,

    /// Angular velocity in world space
    pub angular_velocity: Vector3,

    /// How the position is advanced
    pub position_update_mode: PositionUpdateMode,

    /// Whether the collidable is moving at all (static geometry is inactive)
    pub is_active: bool,
}

impl MotionState {
    /// Motion state of a collidable that never moves
    pub fn fixed() -> Self {
        Self {
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            position_update_mode: PositionUpdateMode::Discrete,
            is_active: false,
        }
    }

    /// Whether this collidable needs a time-of-impact computation
    pub fn is_continuous(&self) -> bool {
        self.is_active && self.position_update_mode == PositionUpdateMode::Continuous
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            is_active: true,
            ..Self::fixed()
        }
    }
}

/// The geometric kind of a collidable
#[derive(Debug, Clone)]
pub enum CollidableKind {
    /// A single support-mapped convex shape
    Convex(Arc<dyn ConvexShape>),

    /// A set of child collidables indexed by a hierarchy
    Compound(CompoundCollidable),

    /// A height field terrain
    Terrain(Arc<HeightField>),
}

/// The discriminant of a collidable kind, used to select pair handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollidableType {
    Convex,
    Terrain,
    Compound,
}

/// A positioned, shaped object taking part in collision detection
#[derive(Debug, Clone)]
pub struct Collidable {
    kind: CollidableKind,
    world_transform: Transform,
    motion: MotionState,
    bounding_box: Aabb,
    collision_rules: CollisionRules,
    material: Material,
    pairs: HashSet<CollidablePair>,
    events: CollidableEvents,
    parent: Option<CollidableHandle>,
}

impl Collidable {
    /// Creates a new collidable of the given kind
    pub fn new(kind: CollidableKind, world_transform: Transform) -> Self {
        let motion = match kind {
            CollidableKind::Terrain(_) => MotionState::fixed(),
            _ => MotionState::default(),
        };

        let mut collidable = Self {
            kind,
            world_transform,
            motion,
            bounding_box: Aabb::new(world_transform.position, world_transform.position),
            collision_rules: CollisionRules::default(),
            material: Material::default(),
            pairs: HashSet::new(),
            events: CollidableEvents::new(),
            parent: None,
        };
        collidable.update_local_bounding_box();
        collidable
    }

    /// Creates a convex collidable at a position
    pub fn new_convex(shape: Arc<dyn ConvexShape>, position: Vector3) -> Self {
        Self::new(CollidableKind::Convex(shape), Transform::from_position(position))
    }

    /// Creates a continuous-mode convex collidable moving at a velocity
    pub fn new_continuous(shape: Arc<dyn ConvexShape>, position: Vector3, velocity: Vector3) -> Self {
        let mut collidable = Self::new_convex(shape, position);
        collidable.motion.linear_velocity = velocity;
        collidable.motion.position_update_mode = PositionUpdateMode::Continuous;
        collidable
    }

    /// Creates a static terrain collidable
    pub fn new_terrain(height_field: Arc<HeightField>, transform: Transform) -> Self {
        Self::new(CollidableKind::Terrain(height_field), transform)
    }

    /// Sets the material, consuming and returning the collidable
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Sets the collision rules, consuming and returning the collidable
    pub fn with_collision_rules(mut self, rules: CollisionRules) -> Self {
        self.collision_rules = rules;
        self
    }

    /// Sets the personal collision rule, consuming and returning the collidable
    pub fn with_personal_rule(mut self, rule: CollisionRule) -> Self {
        self.collision_rules.personal = rule;
        self
    }

    /// Returns the kind of this collidable
    pub fn get_kind(&self) -> &CollidableKind {
        &self.kind
    }

    pub(crate) fn get_kind_mut(&mut self) -> &mut CollidableKind {
        &mut self.kind
    }

    /// Returns the kind discriminant
    pub fn collidable_type(&self) -> CollidableType {
        match self.kind {
            CollidableKind::Convex(_) => CollidableType::Convex,
            CollidableKind::Terrain(_) => CollidableType::Terrain,
            CollidableKind::Compound(_) => CollidableType::Compound,
        }
    }

    /// Returns the convex shape, if this is a convex collidable
    pub fn as_convex(&self) -> Option<&Arc<dyn ConvexShape>> {
        match &self.kind {
            CollidableKind::Convex(shape) => Some(shape),
            _ => None,
        }
    }

    /// Returns the height field, if this is a terrain collidable
    pub fn as_terrain(&self) -> Option<&Arc<HeightField>> {
        match &self.kind {
            CollidableKind::Terrain(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the compound data, if this is a compound collidable
    pub fn as_compound(&self) -> Option<&CompoundCollidable> {
        match &self.kind {
            CollidableKind::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    /// Returns the world transform
    pub fn get_transform(&self) -> &Transform {
        &self.world_transform
    }

    pub(crate) fn set_transform(&mut self, transform: Transform) {
        self.world_transform = transform;
    }

    /// Returns the position in world space
    pub fn get_position(&self) -> Vector3 {
        self.world_transform.position
    }

    /// Returns the motion state
    pub fn get_motion(&self) -> &MotionState {
        &self.motion
    }

    pub(crate) fn get_motion_mut(&mut self) -> &mut MotionState {
        &mut self.motion
    }

    /// Returns the linear velocity
    pub fn get_linear_velocity(&self) -> Vector3 {
        self.motion.linear_velocity
    }

    /// Returns the velocity of a world-space point rigidly attached to this collidable
    pub fn get_velocity_at_point(&self, point: Vector3) -> Vector3 {
        self.motion.linear_velocity + self.motion.angular_velocity.cross(&(point - self.world_transform.position))
    }

    /// Returns the current world bounding box
    pub fn get_bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    pub(crate) fn set_bounding_box(&mut self, bounding_box: Aabb) {
        self.bounding_box = bounding_box;
    }

    /// Recomputes the bounding box of a convex or terrain collidable at its
    /// current transform, without any sweep
    pub(crate) fn update_local_bounding_box(&mut self) {
        match &self.kind {
            CollidableKind::Convex(shape) => {
                self.bounding_box = shape.get_world_bounds(&self.world_transform);
            }
            CollidableKind::Terrain(field) => {
                self.bounding_box = field.get_world_bounds(&self.world_transform);
            }
            CollidableKind::Compound(compound) => {
                if let Some(bounds) = compound.get_hierarchy().get_root_bounds() {
                    self.bounding_box = bounds;
                }
            }
        }
    }

    /// Returns the collision rules
    pub fn get_collision_rules(&self) -> &CollisionRules {
        &self.collision_rules
    }

    /// Sets the collision rules
    pub fn set_collision_rules(&mut self, rules: CollisionRules) {
        self.collision_rules = rules;
    }

    /// Returns the material
    pub fn get_material(&self) -> &Material {
        &self.material
    }

    /// Sets the material; call `update_material_properties` on the narrow
    /// phase to push it into existing constraints
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    /// Returns the top-level pairs this collidable takes part in
    pub fn get_pairs(&self) -> &HashSet<CollidablePair> {
        &self.pairs
    }

    pub(crate) fn get_pairs_mut(&mut self) -> &mut HashSet<CollidablePair> {
        &mut self.pairs
    }

    /// Returns the attached event listeners
    pub fn get_events(&self) -> &CollidableEvents {
        &self.events
    }

    /// Returns the attached event listeners for modification
    pub fn get_events_mut(&mut self) -> &mut CollidableEvents {
        &mut self.events
    }

    /// Returns the compound this collidable is a child of
    pub fn get_parent(&self) -> Option<CollidableHandle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<CollidableHandle>) {
        self.parent = parent;
    }
}
