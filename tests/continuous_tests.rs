use phys_narrowphase::{
    collidables::{Collidable, PositionUpdateMode},
    collision::{NarrowPhase, PairHandler, TerrainConvexPairHandler},
    core::{CollidableHandle, CollidableStorage, CollisionEventType, EventQueue, NarrowPhaseConfig, Storage},
    math::{Transform, Vector3},
    shapes::{HeightField, Sphere},
};
use approx::assert_relative_eq;
use std::sync::Arc;

const DT: f32 = 0.016;

fn terrain(storage: &mut CollidableStorage) -> CollidableHandle {
    let field = Arc::new(HeightField::flat(16, 16, 0.0).unwrap());
    storage.add(Collidable::new_terrain(
        field,
        Transform::from_position(Vector3::new(-8.0, 0.0, -8.0)),
    ))
}

fn time_of_impact(
    narrow_phase: &mut NarrowPhase,
    storage: &mut CollidableStorage,
    mover: CollidableHandle,
    other: CollidableHandle,
) -> f32 {
    storage.update_bounding_boxes(DT);
    narrow_phase.add_overlap(storage, mover, other).unwrap();
    narrow_phase.update(storage, DT).unwrap();
    narrow_phase.time_of_impact(storage, mover, DT).unwrap()
}

#[test]
fn test_fast_sphere_stops_at_terrain() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut storage = CollidableStorage::new();
    let ground = terrain(&mut storage);
    let bullet = storage.add(Collidable::new_continuous(
        Arc::new(Sphere::new(0.1)),
        Vector3::new(0.3, 5.0, 0.2),
        Vector3::new(0.0, -1000.0, 0.0),
    ));

    let mut narrow_phase = NarrowPhase::default();
    let toi = time_of_impact(&mut narrow_phase, &mut storage, bullet, ground);

    // Falls 16 units this step; the shrunken core touches the ground after 4.92
    assert!(toi > 0.0 && toi < 1.0);
    assert_relative_eq!(toi, 4.92 / 16.0, epsilon = 1.0e-3);
    assert_relative_eq!(narrow_phase.pair(bullet, ground).unwrap().time_of_impact(), toi);

    // Asking on behalf of the terrain gives the same answer
    let from_terrain = narrow_phase.time_of_impact(&storage, ground, DT).unwrap();
    assert_relative_eq!(from_terrain, toi);
}

#[test]
fn test_slow_and_discrete_motion_is_not_swept() {
    let mut storage = CollidableStorage::new();
    let ground = terrain(&mut storage);
    let slow = storage.add(Collidable::new_continuous(
        Arc::new(Sphere::new(0.1)),
        Vector3::new(0.3, 0.5, 0.2),
        Vector3::new(0.0, -1.0, 0.0),
    ));
    let mut narrow_phase = NarrowPhase::default();
    assert_eq!(time_of_impact(&mut narrow_phase, &mut storage, slow, ground), 1.0);

    let mut storage = CollidableStorage::new();
    let ground = terrain(&mut storage);
    let discrete = storage.add(Collidable::new_continuous(
        Arc::new(Sphere::new(0.1)),
        Vector3::new(0.3, 5.0, 0.2),
        Vector3::new(0.0, -1000.0, 0.0),
    ));
    storage
        .set_position_update_mode(discrete, PositionUpdateMode::Discrete)
        .unwrap();
    let mut narrow_phase = NarrowPhase::default();
    assert_eq!(time_of_impact(&mut narrow_phase, &mut storage, discrete, ground), 1.0);
}

#[test]
fn test_disabled_ccd_reports_full_step() {
    let mut storage = CollidableStorage::new();
    let ground = terrain(&mut storage);
    let bullet = storage.add(Collidable::new_continuous(
        Arc::new(Sphere::new(0.1)),
        Vector3::new(0.3, 5.0, 0.2),
        Vector3::new(0.0, -1000.0, 0.0),
    ));

    let mut narrow_phase = NarrowPhase::new(NarrowPhaseConfig::discrete());
    assert_eq!(time_of_impact(&mut narrow_phase, &mut storage, bullet, ground), 1.0);
}

#[test]
fn test_terrain_back_faces_are_ignored() {
    let mut storage = CollidableStorage::new();
    let ground = terrain(&mut storage);
    let bullet = storage.add(Collidable::new_continuous(
        Arc::new(Sphere::new(0.1)),
        Vector3::new(0.3, -5.0, 0.2),
        Vector3::new(0.0, 1000.0, 0.0),
    ));

    let mut narrow_phase = NarrowPhase::default();
    assert_eq!(time_of_impact(&mut narrow_phase, &mut storage, bullet, ground), 1.0);
}

#[test]
fn test_sphere_under_terrain_gets_no_contact() {
    let mut storage = CollidableStorage::new();
    let ground = terrain(&mut storage);
    let bullet = storage.add(Collidable::new_continuous(
        Arc::new(Sphere::new(0.1)),
        Vector3::new(0.3, -5.0, 0.2),
        Vector3::new(0.0, 1000.0, 0.0),
    ));
    let events = EventQueue::shared();
    storage
        .get_collidable_mut(bullet)
        .unwrap()
        .get_events_mut()
        .add_listener(events.clone());

    let mut narrow_phase = NarrowPhase::default();
    assert_eq!(time_of_impact(&mut narrow_phase, &mut storage, bullet, ground), 1.0);

    // The swept box reaches the terrain, the sphere itself does not
    let handler = narrow_phase
        .pair(bullet, ground)
        .unwrap()
        .as_any()
        .downcast_ref::<TerrainConvexPairHandler>()
        .unwrap();
    assert!(!handler.get_manifold().get_overlapped_triangles().is_empty());
    assert!(handler.get_manifold().get_touched_triangles().is_empty());
    assert_eq!(handler.contact_count(), 0);
    assert_eq!(events.count(bullet, CollisionEventType::InitialCollisionDetected), 0);
    assert!(narrow_phase.get_solver_queue().is_empty());
}

#[test]
fn test_fast_sphere_against_sphere() {
    let mut storage = CollidableStorage::new();
    let bullet = storage.add(Collidable::new_continuous(
        Arc::new(Sphere::new(0.5)),
        Vector3::zeros(),
        Vector3::new(1000.0, 0.0, 0.0),
    ));
    let target = storage.add(Collidable::new_convex(Arc::new(Sphere::new(0.5)), Vector3::new(10.0, 0.0, 0.0)));

    let mut narrow_phase = NarrowPhase::default();
    let toi = time_of_impact(&mut narrow_phase, &mut storage, bullet, target);
    assert_relative_eq!(toi, 0.575, epsilon = 1.0e-4);

    // The target itself is not moving continuously
    assert_eq!(narrow_phase.time_of_impact(&storage, target, DT).unwrap(), 1.0);
}

#[test]
fn test_compound_takes_earliest_child_impact() {
    let mut storage = CollidableStorage::new();
    let ground = terrain(&mut storage);
    let compound = storage
        .add_compound_of(
            Transform::identity(),
            vec![
                (
                    Collidable::new_convex(Arc::new(Sphere::new(0.1)), Vector3::zeros()),
                    Transform::from_position(Vector3::new(0.3, 5.0, 0.2)),
                ),
                (
                    Collidable::new_convex(Arc::new(Sphere::new(0.1)), Vector3::zeros()),
                    Transform::from_position(Vector3::new(3.3, 8.0, 0.2)),
                ),
            ],
        )
        .unwrap();
    storage
        .set_position_update_mode(compound, PositionUpdateMode::Continuous)
        .unwrap();
    storage
        .set_linear_velocity(compound, Vector3::new(0.0, -1000.0, 0.0))
        .unwrap();

    let mut narrow_phase = NarrowPhase::default();
    let toi = time_of_impact(&mut narrow_phase, &mut storage, compound, ground);
    assert_relative_eq!(toi, 4.92 / 16.0, epsilon = 1.0e-3);
}
