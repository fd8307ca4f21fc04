use phys_narrowphase::{
    collidables::{Collidable, CollidableType, Material},
    collision::{
        default_collision_rule_calculator, CollisionRule, ConvexPairHandler, NarrowPhase, NarrowPhaseContext,
        PairFactories, PairHandler, PairHandlerStatus, PairSignature, TerrainConvexPairHandler,
    },
    constraints::{Solver, SolverQueue, SolverUpdateable},
    core::{CollidableHandle, CollidableStorage, CollisionEventType, EventQueue, NarrowPhaseConfig, Storage},
    error::PhysicsError,
    math::{Transform, Vector3},
    shapes::{HeightField, Sphere},
};
use approx::assert_relative_eq;
use std::sync::Arc;

const DT: f32 = 1.0 / 60.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sphere_at(storage: &mut CollidableStorage, position: Vector3) -> CollidableHandle {
    storage.add(Collidable::new_convex(Arc::new(Sphere::new(0.5)), position))
}

fn listen(storage: &mut CollidableStorage, handle: CollidableHandle) -> Arc<EventQueue> {
    let queue = EventQueue::shared();
    storage
        .get_collidable_mut(handle)
        .unwrap()
        .get_events_mut()
        .add_listener(queue.clone());
    queue
}

fn lifecycle(queue: &EventQueue, sender: CollidableHandle) -> Vec<CollisionEventType> {
    queue
        .get_collision_events_for_collidable(sender)
        .into_iter()
        .map(|event| event.event_type)
        .filter(|event_type| {
            !matches!(event_type, CollisionEventType::ContactCreated | CollisionEventType::ContactRemoved)
        })
        .collect()
}

fn contact_balance(queue: &EventQueue, sender: CollidableHandle) -> isize {
    queue.count(sender, CollisionEventType::ContactCreated) as isize
        - queue.count(sender, CollisionEventType::ContactRemoved) as isize
}

fn step(narrow_phase: &mut NarrowPhase, storage: &mut CollidableStorage) {
    storage.update_bounding_boxes(DT);
    narrow_phase.update(storage, DT).unwrap();
}

#[test]
fn test_two_spheres_lifecycle() {
    init_logging();
    use CollisionEventType::*;

    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(2.0, 0.0, 0.0));
    let events = listen(&mut storage, a);

    let mut narrow_phase = NarrowPhase::default();
    assert!(narrow_phase.add_overlap(&mut storage, a, b).unwrap());
    assert!(!narrow_phase.add_overlap(&mut storage, b, a).unwrap());
    assert_eq!(narrow_phase.pair_count(), 1);

    // Approach, touch for a few steps, then separate
    let path = [2.0, 0.9, 0.9, 0.95, 3.0, 3.0];
    for x in path {
        storage.set_position(b, Vector3::new(x, 0.0, 0.0)).unwrap();
        step(&mut narrow_phase, &mut storage);

        let count = narrow_phase.pair(a, b).unwrap().contact_count();
        assert_eq!(contact_balance(&events, a), count as isize);
    }

    narrow_phase.remove_overlap(&mut storage, a, b).unwrap();
    assert_eq!(contact_balance(&events, a), 0);

    assert_eq!(
        lifecycle(&events, a),
        vec![
            PairCreated,
            PairUpdated,
            PairUpdated,
            PairTouching,
            InitialCollisionDetected,
            PairUpdated,
            PairTouching,
            PairUpdated,
            PairTouching,
            PairUpdated,
            CollisionEnded,
            PairUpdated,
            PairRemoved,
        ]
    );
}

#[test]
fn test_events_fire_on_both_sides() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));
    let events_a = listen(&mut storage, a);
    let events_b = listen(&mut storage, b);

    let mut narrow_phase = NarrowPhase::default();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    step(&mut narrow_phase, &mut storage);

    let created = events_b.get_collision_events_of_type(CollisionEventType::ContactCreated);
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].sender, b);
    assert_eq!(created[0].other, a);
    assert!(created[0].contact.is_some());
    assert_eq!(lifecycle(&events_a, a), lifecycle(&events_b, b));
}

#[test]
fn test_contacts_reach_solver_through_queue() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));

    let mut narrow_phase = NarrowPhase::default();
    let mut solver = Solver::new();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    step(&mut narrow_phase, &mut storage);

    // Nothing reaches the solver until the queue is flushed
    assert!(solver.is_empty());
    assert_eq!(narrow_phase.get_solver_queue().get_pending_additions().len(), 1);
    narrow_phase.flush(&mut solver);
    assert_eq!(solver.len(), 1);
    assert_eq!(solver.contact_count(), 1);
    assert!(matches!(solver.get_updateables()[0], SolverUpdateable::Contact(_)));

    storage.set_position(b, Vector3::new(3.0, 0.0, 0.0)).unwrap();
    step(&mut narrow_phase, &mut storage);
    narrow_phase.flush(&mut solver);
    assert!(solver.is_empty());
}

#[test]
fn test_removed_pair_orphans_constraint_in_solver() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));

    let mut narrow_phase = NarrowPhase::default();
    let mut solver = Solver::new();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    step(&mut narrow_phase, &mut storage);
    narrow_phase.flush(&mut solver);

    let held = solver.get_updateables()[0].clone();
    narrow_phase.remove_overlap(&mut storage, a, b).unwrap();
    assert!(held.is_orphaned());
    assert!(held.is_in_solver());

    narrow_phase.flush(&mut solver);
    assert!(solver.is_empty());
    assert!(!held.is_in_solver());
    assert_eq!(held.contact_count(), 0);
}

#[test]
fn test_pool_round_trip() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));
    let signature = PairSignature::new(CollidableType::Convex, CollidableType::Convex);

    let mut narrow_phase = NarrowPhase::default();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    step(&mut narrow_phase, &mut storage);
    assert_eq!(narrow_phase.pair(a, b).unwrap().status(), PairHandlerStatus::BoundInContact);

    narrow_phase.remove_overlap(&mut storage, a, b).unwrap();
    let factory = narrow_phase.get_factories().get_factory(&signature).unwrap();
    assert_eq!(factory.pooled_count(), 1);
    assert!(storage.get_collidable(a).unwrap().get_pairs().is_empty());
    assert!(storage.get_collidable(b).unwrap().get_pairs().is_empty());

    storage.set_position(b, Vector3::new(2.0, 0.0, 0.0)).unwrap();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    let handler = narrow_phase.pair(a, b).unwrap();
    assert_eq!(handler.contact_count(), 0);
    assert_eq!(handler.status(), PairHandlerStatus::BoundNoContact);

    let factory = narrow_phase.get_factories().get_factory(&signature).unwrap();
    assert_eq!(factory.created_count(), 1);
    assert_eq!(factory.pooled_count(), 0);
}

#[test]
fn test_contact_information() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));
    storage.set_linear_velocity(b, Vector3::new(-1.0, 0.0, 0.0)).unwrap();

    let mut narrow_phase = NarrowPhase::default();
    let mut solver = Solver::new();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    step(&mut narrow_phase, &mut storage);
    narrow_phase.flush(&mut solver);

    solver.for_each_contact_constraint(|constraint| {
        let mut constraint = constraint.lock();
        let id = constraint.get_contacts()[0].contact.id;
        constraint.set_accumulated_impulses(&id, 3.0, 0.5);
    });

    // Impulses survive a persistent update
    step(&mut narrow_phase, &mut storage);

    let handler = narrow_phase.pair(a, b).unwrap();
    let info = handler.contact_information(&storage, 0).unwrap();
    assert_relative_eq!(info.contact.normal, Vector3::x(), epsilon = 1.0e-5);
    assert_relative_eq!(info.contact.penetration_depth, 0.1, epsilon = 1.0e-5);
    assert_relative_eq!(info.relative_velocity, Vector3::new(-1.0, 0.0, 0.0));
    assert_eq!(info.normal_impulse, 3.0);
    assert_eq!(info.friction_impulse, 0.5);

    match handler.contact_information(&storage, 5) {
        Err(PhysicsError::ContactIndexOutOfRange { index, count }) => {
            assert_eq!(index, 5);
            assert_eq!(count, 1);
        }
        other => panic!("expected an out-of-range error, got {:?}", other),
    }
}

#[test]
fn test_material_properties_are_blended() {
    let mut storage = CollidableStorage::new();
    let a = storage.add(
        Collidable::new_convex(Arc::new(Sphere::new(0.5)), Vector3::zeros()).with_material(Material::new(0.2, 0.1)),
    );
    let b = storage.add(
        Collidable::new_convex(Arc::new(Sphere::new(0.5)), Vector3::new(0.9, 0.0, 0.0))
            .with_material(Material::new(0.6, 0.7)),
    );

    let mut narrow_phase = NarrowPhase::default();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();

    let friction = |narrow_phase: &NarrowPhase| {
        let handler = narrow_phase.pair(a, b).unwrap();
        let handler = handler.as_any().downcast_ref::<ConvexPairHandler>().unwrap();
        let constraint = handler.get_constraint().lock();
        (constraint.get_friction(), constraint.get_restitution())
    };
    let (f, r) = friction(&narrow_phase);
    assert_relative_eq!(f, 0.4);
    assert_relative_eq!(r, 0.7);

    storage.get_collidable_mut(a).unwrap().set_material(Material::new(1.0, 0.9));
    narrow_phase.update_material_properties(&storage, a).unwrap();
    let (f, r) = friction(&narrow_phase);
    assert_relative_eq!(f, 0.8);
    assert_relative_eq!(r, 0.9);
}

#[test]
fn test_collision_rules() {
    let mut storage = CollidableStorage::new();
    let sensor = storage.add(
        Collidable::new_convex(Arc::new(Sphere::new(0.5)), Vector3::zeros()).with_personal_rule(CollisionRule::NoSolver),
    );
    let ghost = storage.add(
        Collidable::new_convex(Arc::new(Sphere::new(0.5)), Vector3::zeros())
            .with_personal_rule(CollisionRule::NoNarrowPhasePair),
    );
    let frozen = storage.add(
        Collidable::new_convex(Arc::new(Sphere::new(0.5)), Vector3::zeros())
            .with_personal_rule(CollisionRule::NoNarrowPhaseUpdate),
    );
    let other = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));
    let sensor_events = listen(&mut storage, sensor);
    let frozen_events = listen(&mut storage, frozen);

    let mut narrow_phase = NarrowPhase::default();
    assert!(!narrow_phase.add_overlap(&mut storage, ghost, other).unwrap());
    assert!(narrow_phase.add_overlap(&mut storage, sensor, other).unwrap());
    assert!(narrow_phase.add_overlap(&mut storage, frozen, other).unwrap());
    step(&mut narrow_phase, &mut storage);

    // Contacts and events without any solver constraint
    assert_eq!(narrow_phase.pair(sensor, other).unwrap().contact_count(), 1);
    assert_eq!(sensor_events.count(sensor, CollisionEventType::InitialCollisionDetected), 1);
    assert!(narrow_phase.get_solver_queue().is_empty());

    // Never updated
    assert_eq!(narrow_phase.pair(frozen, other).unwrap().contact_count(), 0);
    assert_eq!(frozen_events.count(frozen, CollisionEventType::PairUpdated), 0);
    assert_eq!(frozen_events.count(frozen, CollisionEventType::PairCreated), 1);
}

#[test]
fn test_invalid_overlaps() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let field = Arc::new(HeightField::flat(4, 4, 0.0).unwrap());
    let t1 = storage.add(Collidable::new_terrain(field.clone(), Transform::identity()));
    let t2 = storage.add(Collidable::new_terrain(field, Transform::identity()));

    let mut narrow_phase = NarrowPhase::default();
    assert!(matches!(
        narrow_phase.add_overlap(&mut storage, a, a),
        Err(PhysicsError::InvalidParameter(_))
    ));
    assert!(matches!(
        narrow_phase.add_overlap(&mut storage, t1, t2),
        Err(PhysicsError::NoPairHandler(_))
    ));
    assert!(matches!(
        narrow_phase.add_overlap(&mut storage, a, CollidableHandle::default()),
        Err(PhysicsError::ResourceNotFound(_))
    ));
    assert_eq!(narrow_phase.pair_count(), 0);
}

#[test]
fn test_handler_misuse_is_reported() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));
    let mut factories = PairFactories::new();
    let mut solver_queue = SolverQueue::new();
    let config = NarrowPhaseConfig::default();
    let mut ctx = NarrowPhaseContext {
        collidables: &mut storage,
        factories: &mut factories,
        solver_queue: &mut solver_queue,
        config: &config,
        rule_calculator: default_collision_rule_calculator,
    };

    // Two convexes are not a terrain pair
    let mut terrain_handler = TerrainConvexPairHandler::default();
    assert!(matches!(
        terrain_handler.initialize(&mut ctx, a, b),
        Err(PhysicsError::InappropriatePairTypes(_))
    ));
    assert_eq!(terrain_handler.status(), PairHandlerStatus::Unbound);

    let mut handler = ConvexPairHandler::default();
    handler.initialize(&mut ctx, a, b).unwrap();
    assert!(matches!(handler.initialize(&mut ctx, a, b), Err(PhysicsError::HandlerAlreadyBound)));
    handler.update_collision(&mut ctx, None, DT).unwrap();
    assert_eq!(handler.contact_count(), 1);

    handler.clean_up(&mut ctx, None).unwrap();
    assert_eq!(handler.contact_count(), 0);
    assert!(matches!(handler.clean_up(&mut ctx, None), Err(PhysicsError::HandlerNotBound)));
    assert!(matches!(
        handler.update_collision(&mut ctx, None, DT),
        Err(PhysicsError::HandlerNotBound)
    ));
}

#[test]
fn test_clear_cleans_every_pair() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));
    let c = sphere_at(&mut storage, Vector3::new(-0.9, 0.0, 0.0));
    let events = listen(&mut storage, a);

    let mut narrow_phase = NarrowPhase::default();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    narrow_phase.add_overlap(&mut storage, a, c).unwrap();
    step(&mut narrow_phase, &mut storage);
    assert_eq!(storage.get_collidable(a).unwrap().get_pairs().len(), 2);

    narrow_phase.clear(&mut storage).unwrap();
    assert_eq!(narrow_phase.pair_count(), 0);
    assert_eq!(contact_balance(&events, a), 0);
    assert_eq!(events.count(a, CollisionEventType::PairRemoved), 2);
    assert_eq!(events.count(a, CollisionEventType::CollisionEnded), 2);
}

#[test]
fn test_silent_pair_still_reaches_solver() {
    init_logging();
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));
    let events_a = listen(&mut storage, a);
    let events_b = listen(&mut storage, b);

    let mut narrow_phase = NarrowPhase::default();
    let mut solver = Solver::new();
    assert!(narrow_phase.add_silent_overlap(&mut storage, a, b).unwrap());
    assert!(narrow_phase.pair(a, b).unwrap().state().suppress_events);

    step(&mut narrow_phase, &mut storage);
    narrow_phase.flush(&mut solver);
    assert_eq!(narrow_phase.pair(a, b).unwrap().status(), PairHandlerStatus::BoundInContact);
    assert_eq!(solver.len(), 1);
    assert!(matches!(solver.get_updateables()[0], SolverUpdateable::Contact(_)));

    narrow_phase.remove_overlap(&mut storage, a, b).unwrap();
    narrow_phase.flush(&mut solver);
    assert!(solver.is_empty());
    assert!(events_a.is_empty());
    assert!(events_b.is_empty());

    // A pooled handler comes back able to raise events again
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    assert!(!narrow_phase.pair(a, b).unwrap().state().suppress_events);
    assert_eq!(events_a.count(a, CollisionEventType::PairCreated), 1);
}

#[test]
fn test_separated_pair_removed_before_flush_is_orphaned() {
    let mut storage = CollidableStorage::new();
    let a = sphere_at(&mut storage, Vector3::zeros());
    let b = sphere_at(&mut storage, Vector3::new(0.9, 0.0, 0.0));

    let mut narrow_phase = NarrowPhase::default();
    let mut solver = Solver::new();
    narrow_phase.add_overlap(&mut storage, a, b).unwrap();
    step(&mut narrow_phase, &mut storage);
    narrow_phase.flush(&mut solver);
    let held = solver.get_updateables()[0].clone();

    // The pair separates and is removed while its removal is still queued
    storage.set_position(b, Vector3::new(3.0, 0.0, 0.0)).unwrap();
    step(&mut narrow_phase, &mut storage);
    assert_eq!(narrow_phase.get_solver_queue().get_pending_removals().len(), 1);
    narrow_phase.remove_overlap(&mut storage, a, b).unwrap();

    assert!(held.is_orphaned());
    assert!(held.is_in_solver());
    assert!(solver.contains(&held));
    assert_eq!(narrow_phase.get_solver_queue().get_pending_removals(), &[held.clone()][..]);

    narrow_phase.flush(&mut solver);
    assert!(solver.is_empty());
    assert!(!held.is_in_solver());
}
