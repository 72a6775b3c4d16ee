use impulse2d::{
    PhysicsWorld, RigidBody, Vector2, SimulationConfig, BodyHandle, Joint, PinJoint, DistanceJoint,
    core::Storage,
};
use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};

const DT: f32 = 1.0 / 60.0;

fn unit_box(mass: f32, position: Vector2) -> RigidBody {
    let mut body = RigidBody::new_box(Vector2::new(0.5, 0.5), mass).unwrap();
    body.set_position(position);
    body
}

fn ground() -> RigidBody {
    let mut body = RigidBody::new_static(Vector2::new(10.0, 0.5)).unwrap();
    body.set_position(Vector2::new(0.0, -0.5));
    body
}

fn zero_gravity() -> SimulationConfig {
    SimulationConfig {
        gravity: Vector2::zero(),
        ..SimulationConfig::default()
    }
}

/// A box resting on the ground with a centimetre of overlap
fn resting_scene() -> (PhysicsWorld, BodyHandle, BodyHandle) {
    let mut world = PhysicsWorld::new();
    let floor = world.add_body(ground());
    let crate_box = world.add_body(unit_box(1.0, Vector2::new(0.0, 0.49)));
    (world, floor, crate_box)
}

/// Boxes dropped at random positions and angles, reproducible from `seed`
fn random_scene(seed: u64) -> PhysicsWorld {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = PhysicsWorld::new();
    world.add_body(ground());

    for _ in 0..12 {
        let half = Vector2::new(rng.gen_range(0.2..0.6), rng.gen_range(0.2..0.6));
        let mut body = RigidBody::new_box(half, rng.gen_range(0.5..5.0)).unwrap();
        body.set_position(Vector2::new(rng.gen_range(-4.0..4.0), rng.gen_range(0.5..8.0)));
        body.set_rotation(rng.gen_range(-1.0..1.0));
        body.set_friction(rng.gen_range(0.1..0.9));
        world.add_body(body);
    }

    world
}

#[test]
fn test_free_fall_single_step() {
    let mut world = PhysicsWorld::new();
    let handle = world.add_body(unit_box(1.0, Vector2::zero()));

    world.step(1.0);

    // Velocity is integrated first, then position from the new velocity
    let body = world.get_body(handle).unwrap();
    assert_eq!(body.get_linear_velocity(), Vector2::new(0.0, -10.0));
    assert_eq!(body.get_position(), Vector2::new(0.0, -10.0));
    assert_eq!(body.get_rotation(), 0.0);
    assert_eq!(body.get_angular_velocity(), 0.0);
}

#[test]
fn test_gravity_simulation() {
    let mut world = PhysicsWorld::new();
    let handle = world.add_body(unit_box(2.0, Vector2::new(0.0, 10.0)));

    let mut expected_position = Vector2::new(0.0, 10.0);
    let mut expected_velocity = Vector2::zero();

    for _ in 0..60 {
        world.step(DT);

        expected_velocity.y -= 10.0 * DT;
        expected_position.y += expected_velocity.y * DT;

        let body = world.get_body(handle).unwrap();
        assert_relative_eq!(body.get_linear_velocity(), expected_velocity, epsilon = 1e-4);
        assert_relative_eq!(body.get_position(), expected_position, epsilon = 1e-3);
    }
}

#[test]
fn test_forces_are_cleared_after_each_step() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let handle = world.add_body(unit_box(2.0, Vector2::zero()));

    world.get_body_mut(handle).unwrap().add_force(Vector2::new(120.0, 0.0));
    world.get_body_mut(handle).unwrap().add_torque(3.0);
    world.step(DT);

    let body = world.get_body(handle).unwrap();
    assert_relative_eq!(body.get_linear_velocity().x, 1.0, epsilon = 1e-5);
    assert!(body.get_angular_velocity() > 0.0);
    assert!(body.get_force().is_zero());
    assert_eq!(body.get_torque(), 0.0);

    // No force this step, so the velocity is unchanged
    world.step(DT);
    assert_relative_eq!(world.get_body(handle).unwrap().get_linear_velocity().x, 1.0, epsilon = 1e-5);
}

#[test]
fn test_overlapping_bodies_are_pushed_apart() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let a = world.add_body(unit_box(1.0, Vector2::zero()));
    let b = world.add_body(unit_box(1.0, Vector2::new(0.0, 0.9)));

    world.broad_phase();
    let arbiter = world.get_arbiter(a, b).unwrap();
    assert!(arbiter.num_contacts() >= 1);
    assert!(arbiter.contacts().iter().all(|c| c.separation < 0.0));

    world.step(DT);

    let gap = world.get_body(b).unwrap().get_position().y - world.get_body(a).unwrap().get_position().y;
    assert!(gap > 0.9);

    // Equal masses get equal and opposite velocities
    let va = world.get_body(a).unwrap().get_linear_velocity();
    let vb = world.get_body(b).unwrap().get_linear_velocity();
    assert!(vb.y > 0.0);
    assert_relative_eq!(va + vb, Vector2::zero(), epsilon = 1e-5);
}

#[test]
fn test_box_comes_to_rest_on_ground() {
    let (mut world, floor, crate_box) = resting_scene();

    for _ in 0..300 {
        world.step(DT);
    }

    let body = world.get_body(crate_box).unwrap();
    assert!(body.get_linear_velocity().y.abs() < 0.05);
    assert!(body.get_rotation().abs() < 0.01);

    // Penetration stays within the allowed slop plus a little solver error
    let bottom = body.get_position().y - 0.5;
    assert!(bottom > -0.02, "box sank to {}", bottom);
    assert!(bottom < 0.01);

    // Each step the contacts carry the impulse that cancels one step of gravity
    let arbiter = world.get_arbiter(floor, crate_box).unwrap();
    assert_eq!(arbiter.num_contacts(), 2);
    assert_relative_eq!(arbiter.total_normal_impulse(), 10.0 * DT, epsilon = 0.02);

    // The ground never moves
    let floor = world.get_body(floor).unwrap();
    assert_eq!(floor.get_position(), Vector2::new(0.0, -0.5));
    assert!(floor.get_linear_velocity().is_zero());
}

#[test]
fn test_moving_away_erases_arbiter() {
    let (mut world, floor, crate_box) = resting_scene();

    world.step(DT);
    assert!(world.get_arbiter(floor, crate_box).is_some());
    assert!(world.get_body(crate_box).unwrap().is_in_touch());

    world.get_body_mut(crate_box).unwrap().set_position(Vector2::new(100.0, 100.0));
    world.step(DT);

    assert!(world.get_arbiter(floor, crate_box).is_none());
    assert_eq!(world.arbiter_count(), 0);
    assert!(!world.get_body(crate_box).unwrap().is_in_touch());
    assert!(!world.get_body(floor).unwrap().is_in_touch());
}

#[test]
fn test_sliding_box_is_slowed_by_friction() {
    let (mut world, _floor, crate_box) = resting_scene();
    world.get_body_mut(crate_box).unwrap().set_friction(0.5);
    world.get_body_mut(crate_box).unwrap().set_linear_velocity(Vector2::new(2.0, 0.0));

    world.step(DT);
    let after_one = world.get_body(crate_box).unwrap().get_linear_velocity().x;
    assert!(after_one < 2.0);

    for _ in 0..120 {
        world.step(DT);
    }
    assert!(world.get_body(crate_box).unwrap().get_linear_velocity().x.abs() < 0.05);
}

#[test]
fn test_frictionless_box_keeps_sliding() {
    let (mut world, _floor, crate_box) = resting_scene();
    world.get_body_mut(crate_box).unwrap().set_friction(0.0);
    world.get_body_mut(crate_box).unwrap().set_linear_velocity(Vector2::new(2.0, 0.0));

    for _ in 0..30 {
        world.step(DT);
    }
    assert_relative_eq!(world.get_body(crate_box).unwrap().get_linear_velocity().x, 2.0, epsilon = 1e-3);
}

#[test]
fn test_accumulated_impulses_respect_bounds() {
    let mut world = random_scene(7);

    for _ in 0..180 {
        world.step(DT);

        for arbiter in world.arbiters() {
            for contact in arbiter.contacts() {
                assert!(contact.normal_impulse >= 0.0);
                assert!(contact.tangent_impulse.abs() <= arbiter.friction() * contact.normal_impulse + 1e-6);
            }
        }
    }
}

#[test]
fn test_static_bodies_are_immovable() {
    let mut world = random_scene(11);
    let floor = world.bodies().handles()[0];

    for _ in 0..120 {
        world.step(DT);
    }

    let floor = world.get_body(floor).unwrap();
    assert_eq!(floor.get_position(), Vector2::new(0.0, -0.5));
    assert_eq!(floor.get_rotation(), 0.0);
    assert!(floor.get_linear_velocity().is_zero());
    assert_eq!(floor.get_angular_velocity(), 0.0);
}

#[test]
fn test_simulation_is_deterministic() {
    let mut first = random_scene(42);
    let mut second = random_scene(42);

    for _ in 0..240 {
        first.step(DT);
        second.step(DT);
    }

    let left: Vec<(Vector2, f32)> = first.bodies().iter().map(|(_, b)| (b.get_position(), b.get_rotation())).collect();
    let right: Vec<(Vector2, f32)> = second.bodies().iter().map(|(_, b)| (b.get_position(), b.get_rotation())).collect();
    assert_eq!(left, right);

    let left_keys: Vec<_> = first.arbiters().map(|a| a.key()).collect();
    let right_keys: Vec<_> = second.arbiters().map(|a| a.key()).collect();
    assert_eq!(left_keys, right_keys);
}

#[test]
fn test_arbiters_iterate_in_key_order() {
    let mut world = random_scene(3);
    for _ in 0..200 {
        world.step(DT);
    }

    let keys: Vec<_> = world.arbiters().map(|a| a.key()).collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    assert!(keys.iter().all(|k| k.body_a < k.body_b));
}

#[test]
fn test_zero_time_step_is_a_no_op() {
    let (mut world, floor, crate_box) = resting_scene();
    world.get_body_mut(crate_box).unwrap().set_linear_velocity(Vector2::new(1.0, 0.0));
    world.get_body_mut(crate_box).unwrap().add_force(Vector2::new(50.0, 0.0));

    world.step(0.0);

    let body = world.get_body(crate_box).unwrap();
    assert_eq!(body.get_position(), Vector2::new(0.0, 0.49));
    assert_eq!(body.get_linear_velocity(), Vector2::new(1.0, 0.0));
    assert!(body.get_force().is_zero());

    // The broad phase still ran
    assert!(world.get_arbiter(floor, crate_box).is_some());
    assert!(body.is_in_touch());

    // Negative steps are treated the same way
    world.step(-DT);
    assert_eq!(world.get_body(crate_box).unwrap().get_position(), Vector2::new(0.0, 0.49));
    assert_eq!(world.get_time(), 0.0);
}

#[test]
fn test_restitution_makes_box_bounce() {
    let mut world = PhysicsWorld::new();
    world.add_body(ground());
    let mut ball = unit_box(1.0, Vector2::new(0.0, 0.49));
    ball.set_linear_velocity(Vector2::new(0.0, -5.0));
    ball.set_material(impulse2d::Material::new(0.2, 0.8).unwrap());
    let ball = world.add_body(ball);

    world.step(DT);

    let vy = world.get_body(ball).unwrap().get_linear_velocity().y;
    assert!(vy > 0.0, "expected a bounce, got {}", vy);
}

#[test]
fn test_stack_stays_upright() {
    let mut world = PhysicsWorld::new();
    world.add_body(ground());
    let boxes: Vec<BodyHandle> = (0..5)
        .map(|i| world.add_body(unit_box(1.0, Vector2::new(0.0, 0.5 + i as f32))))
        .collect();

    for _ in 0..300 {
        world.step(DT);
    }

    for (i, handle) in boxes.iter().enumerate() {
        let body = world.get_body(*handle).unwrap();
        assert!(body.get_position().x.abs() < 0.05);
        assert!((body.get_position().y - (0.5 + i as f32)).abs() < 0.1);
        assert!(body.get_linear_velocity().length() < 0.1);
    }
}

#[test]
fn test_solver_switches() {
    let config = SimulationConfig {
        warm_starting: false,
        accumulate_impulses: false,
        ..SimulationConfig::default()
    };
    let mut world = PhysicsWorld::with_config(config);
    world.add_body(ground());
    let crate_box = world.add_body(unit_box(1.0, Vector2::new(0.0, 0.49)));

    for _ in 0..120 {
        world.step(DT);
    }

    // Still supported by the ground, just less precisely
    let body = world.get_body(crate_box).unwrap();
    assert!(body.get_position().y > 0.3);
    assert!(body.get_position().y < 0.6);
}

#[test]
fn test_pendulum_keeps_its_length() {
    let mut world = PhysicsWorld::new();
    let pivot = world.add_body(RigidBody::new_static(Vector2::new(0.5, 0.5)).map(|mut b| {
        b.set_position(Vector2::new(0.0, 10.0));
        b
    }).unwrap());
    let bob = world.add_body(unit_box(1.0, Vector2::new(2.0, 10.0)));

    let joint = PinJoint::new(world.bodies(), pivot, bob, Vector2::new(0.0, 10.0)).unwrap();
    let handle = world.add_joint(Box::new(joint)).unwrap();

    // Roughly a quarter swing
    for _ in 0..45 {
        world.step(DT);

        let pin = world.get_joint(handle).unwrap().as_any().downcast_ref::<PinJoint>().unwrap();
        let (anchor_a, anchor_b) = pin.world_anchors(world.bodies()).unwrap();
        assert!(anchor_a.distance(&anchor_b) < 0.1);
    }

    // The bob swung down and the pivot held
    let bob = world.get_body(bob).unwrap();
    assert!(bob.get_position().y < 9.0);
    assert_relative_eq!(bob.get_position().distance(&Vector2::new(0.0, 10.0)), 2.0, epsilon = 0.1);
    assert!(world.get_joint(handle).unwrap().accumulated_impulse() > 0.0);
}

#[test]
fn test_soft_pin_stretches_further() {
    fn sag(softness: f32) -> f32 {
        let mut world = PhysicsWorld::new();
        let mut pivot = RigidBody::new_static(Vector2::new(0.1, 0.1)).unwrap();
        pivot.set_position(Vector2::new(0.0, 10.0));
        let pivot = world.add_body(pivot);
        let bob = world.add_body(unit_box(1.0, Vector2::new(0.0, 8.0)));

        let mut joint = PinJoint::new(world.bodies(), pivot, bob, Vector2::new(0.0, 10.0)).unwrap();
        joint.set_softness(softness);
        world.add_joint(Box::new(joint)).unwrap();

        for _ in 0..120 {
            world.step(DT);
        }
        8.0 - world.get_body(bob).unwrap().get_position().y
    }

    let rigid = sag(0.0);
    let soft = sag(0.5);
    assert!(rigid.abs() < 0.05);
    assert!(soft > rigid);
}

#[test]
fn test_distance_joint_conserves_momentum() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let a = world.add_body(unit_box(1.0, Vector2::zero()));
    let b = world.add_body(unit_box(1.0, Vector2::new(3.0, 0.0)));
    world.get_body_mut(b).unwrap().set_linear_velocity(Vector2::new(5.0, 0.0));

    let joint = DistanceJoint::new(world.bodies(), a, Vector2::zero(), b, Vector2::new(3.0, 0.0)).unwrap();
    assert_relative_eq!(joint.get_rest_length(), 3.0);
    let handle = world.add_joint(Box::new(joint)).unwrap();

    for _ in 0..60 {
        world.step(DT);
    }

    let body_a = world.get_body(a).unwrap();
    let body_b = world.get_body(b).unwrap();

    // The rod drags the first body along
    assert!(body_a.get_linear_velocity().x > 0.0);
    assert_relative_eq!(body_a.get_position().distance(&body_b.get_position()), 3.0, epsilon = 0.1);

    let momentum = body_a.get_linear_velocity() + body_b.get_linear_velocity();
    assert_relative_eq!(momentum, Vector2::new(5.0, 0.0), epsilon = 1e-3);

    // Once both move together the rod carries no load
    let rod = world.get_joint(handle).unwrap().as_any().downcast_ref::<DistanceJoint>().unwrap();
    assert!(rod.get_impulse().abs() < 0.01);
}

#[test]
fn test_warm_starting_reduces_stack_sinking() {
    fn sinking(warm_starting: bool) -> f32 {
        let mut world = PhysicsWorld::with_config(SimulationConfig {
            warm_starting,
            ..SimulationConfig::default()
        });
        world.add_body(ground());
        let boxes: Vec<BodyHandle> = (0..6)
            .map(|i| world.add_body(unit_box(1.0, Vector2::new(0.0, 0.5 + i as f32))))
            .collect();

        for _ in 0..120 {
            world.step(DT);
        }

        boxes
            .iter()
            .enumerate()
            .map(|(i, handle)| (0.5 + i as f32) - world.get_body(*handle).unwrap().get_position().y)
            .sum()
    }

    let warm = sinking(true);
    let cold = sinking(false);
    assert!(warm <= cold + 1e-3, "warm {} cold {}", warm, cold);
}

#[test]
fn test_joints_iterate_in_insertion_order() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let a = world.add_body(unit_box(1.0, Vector2::zero()));
    let b = world.add_body(unit_box(1.0, Vector2::new(3.0, 0.0)));
    let c = world.add_body(unit_box(1.0, Vector2::new(6.0, 0.0)));

    let rod = DistanceJoint::new(world.bodies(), b, Vector2::new(3.0, 0.0), c, Vector2::new(6.0, 0.0)).unwrap();
    let pin = PinJoint::new(world.bodies(), a, b, Vector2::new(1.5, 0.0)).unwrap();
    let first = world.add_joint(Box::new(rod)).unwrap();
    let second = world.add_joint(Box::new(pin)).unwrap();

    let listed: Vec<_> = world.joints().map(|(handle, joint)| (handle, joint.joint_type())).collect();
    assert_eq!(listed, vec![(first, "Distance"), (second, "Pin")]);
}

#[test]
fn test_disabled_position_correction_leaves_overlap_alone() {
    let mut world = PhysicsWorld::with_config(SimulationConfig {
        position_correction: false,
        ..zero_gravity()
    });
    let a = world.add_body(unit_box(1.0, Vector2::zero()));
    let b = world.add_body(unit_box(1.0, Vector2::new(0.0, 0.3)));

    for _ in 0..10 {
        world.step(DT);
    }

    let arbiter = world.get_arbiter(a, b).unwrap();
    assert!(arbiter.num_contacts() >= 1);
    for contact in arbiter.contacts() {
        assert_eq!(contact.bias, 0.0);
        assert!(contact.separation < -0.5);
    }

    // At rest with no bias the velocity solution is zero, so nothing moves
    for (handle, start) in [(a, Vector2::zero()), (b, Vector2::new(0.0, 0.3))] {
        let body = world.get_body(handle).unwrap();
        assert!(body.get_linear_velocity().is_zero());
        assert_relative_eq!(body.get_position(), start, epsilon = 1e-6);
    }
}

#[test]
fn test_contact_bias_is_clamped() {
    let mut world = PhysicsWorld::with_config(zero_gravity());
    let a = world.add_body(unit_box(1.0, Vector2::zero()));
    let b = world.add_body(unit_box(1.0, Vector2::new(0.0, 0.1)));

    world.step(DT);

    // 0.2 * 60 * (0.9 - 0.01) would exceed the limit
    let max_bias = world.get_config().max_bias_velocity;
    let arbiter = world.get_arbiter(a, b).unwrap();
    assert!(arbiter.num_contacts() >= 1);
    for contact in arbiter.contacts() {
        assert!(contact.bias <= max_bias);
        assert_relative_eq!(contact.bias, max_bias);
    }
}
