use approx::assert_relative_eq;
use nalgebra::{Point3, Unit, Vector3};
use pp3d_core::{
    pick_nearest, BoundingVolume, Camera, LineSegment, Projection, Viewport,
};
use proptest::prelude::*;

fn camera_facing_origin() -> Camera {
    Camera::looking_at(Point3::new(0.0, 0.0, 1000.0), &Point3::origin()).unwrap()
}

fn perspective() -> Projection {
    Projection::perspective(60.0, 0.1, 10_000.0, Viewport::new(1280, 720).unwrap()).unwrap()
}

fn assert_orthonormal(camera: &Camera) -> Result<(), TestCaseError> {
    let (f, u, l) = (camera.forward(), camera.up(), camera.left());
    for v in [f, u, l] {
        prop_assert!((v.norm() - 1.0).abs() < 1e-9, "not unit: {v:?}");
    }
    prop_assert!(f.dot(&u).abs() < 1e-9);
    prop_assert!(f.dot(&l).abs() < 1e-9);
    prop_assert!(u.dot(&l).abs() < 1e-9);
    Ok(())
}

#[test]
fn origin_round_trips_through_screen() {
    let camera = camera_facing_origin();
    let projection = perspective();

    let screen = projection.project(&camera, &Point3::origin(), true).unwrap();
    let ray = projection.screen_to_ray(&camera, screen.x, screen.y).unwrap();
    assert!(ray.distance_to_point(&Point3::origin()) < 1.0);
}

#[test]
fn off_center_points_round_trip() {
    let camera = camera_facing_origin().turn(10.0).pitch(-5.0);
    let projection = perspective();

    for target in [Point3::new(150.0, -80.0, 20.0), Point3::new(-40.0, 60.0, -300.0)] {
        let screen = projection.project(&camera, &target, true).unwrap();
        let ray = projection.screen_to_ray(&camera, screen.x, screen.y).unwrap();
        assert!(ray.distance_to_point(&target) < 1e-6);
    }
}

#[test]
fn aabb_entry_at_near_face() {
    let unit_box = BoundingVolume::aabb(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    let start = Point3::new(0.0, 0.0, 5.0);
    let hit = unit_box
        .ray_intersect(&start, &Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0)), 10.0)
        .unwrap();
    let entry = start + Vector3::new(0.0, 0.0, -1.0) * (hit.t * 10.0);
    assert_relative_eq!(entry.z, 1.0, epsilon = 1e-12);

    let miss = unit_box.ray_intersect(
        &Point3::new(5.0, 5.0, 5.0),
        &Unit::new_normalize(Vector3::new(1.0, 0.0, 0.0)),
        100.0,
    );
    assert!(miss.is_none());
}

#[test]
fn sphere_hit_and_offset_miss() {
    let sphere = BoundingVolume::sphere(Point3::origin(), 10.0);
    let down = Unit::new_normalize(Vector3::new(0.0, 0.0, -1.0));
    assert!(sphere.ray_intersect(&Point3::new(0.0, 0.0, 20.0), &down, 30.0).is_some());
    assert!(sphere.ray_intersect(&Point3::new(10.0, 0.0, 20.0), &down, 30.0).is_none());
}

#[test]
fn picking_through_the_screen_finds_nearest_box() {
    let camera = camera_facing_origin();
    let projection = perspective();
    let near = BoundingVolume::aabb(Point3::new(-10.0, -10.0, 90.0), Point3::new(10.0, 10.0, 110.0));
    let far = BoundingVolume::aabb(Point3::new(-50.0, -50.0, -50.0), Point3::new(50.0, 50.0, 50.0));

    let ray = projection.screen_to_ray(&camera, 640.0, 360.0).unwrap();
    let candidates = [far, near];
    assert_eq!(pick_nearest(&ray, &candidates), Some(&near));

    // Off the small box but still on the large one.
    let ray = projection.screen_to_ray(&camera, 640.0 + 30.0, 360.0).unwrap();
    assert_eq!(pick_nearest(&ray, &candidates), Some(&far));
}

#[test]
fn pitch_clamp_holds_under_repetition() {
    let mut camera = camera_facing_origin();
    for _ in 0..100 {
        camera = camera.pitch(90.0);
        assert!(camera.pitch_angle() <= 89.0 + 1e-9);
        for v in [camera.forward(), camera.up(), camera.left()] {
            assert!((v.norm() - 1.0).abs() < 1e-6);
        }
    }
}

#[derive(Debug, Clone)]
enum Control {
    Turn(f64),
    Pitch(f64),
    Orbit(f64, f64),
    Direction(f64, f64, f64),
}

fn control() -> impl Strategy<Value = Control> {
    prop_oneof![
        (-180.0..180.0f64).prop_map(Control::Turn),
        (-180.0..180.0f64).prop_map(Control::Pitch),
        ((-90.0..90.0f64), (-90.0..90.0f64)).prop_map(|(y, p)| Control::Orbit(y, p)),
        ((-1.0..1.0f64), (-1.0..1.0f64), (-1.0..1.0f64)).prop_map(|(x, y, z)| Control::Direction(x, y, z)),
    ]
}

fn coordinate() -> impl Strategy<Value = f64> {
    -3000.0..3000.0f64
}

proptest! {
    #[test]
    fn basis_stays_orthonormal(controls in prop::collection::vec(control(), 1..40)) {
        let pivot = Point3::new(0.0, 0.0, 0.0);
        let mut camera = camera_facing_origin();
        for c in controls {
            camera = match c {
                Control::Turn(d) => camera.turn(d),
                Control::Pitch(d) => camera.pitch(d),
                Control::Orbit(y, p) => camera.orbit_around_point(&pivot, y, p),
                Control::Direction(x, y, z) => camera
                    .set_direction(&Vector3::new(x, y, z))
                    .unwrap_or(camera),
            };
            assert_orthonormal(&camera)?;
        }
    }

    #[test]
    fn clipped_segments_stay_inside_the_frustum(
        ax in coordinate(), ay in coordinate(), az in coordinate(),
        bx in coordinate(), by in coordinate(), bz in coordinate(),
    ) {
        let camera = camera_facing_origin();
        let projection = perspective();
        let segment = LineSegment::new(Point3::new(ax, ay, az), Point3::new(bx, by, bz));

        if let Some((a, b)) = projection.clip_line_segment(&camera, &segment) {
            for p in [a, b] {
                let tolerance = 1e-6 * p.w.abs().max(1.0);
                prop_assert!(p.x >= -p.w - tolerance && p.x <= p.w + tolerance, "x out: {p:?}");
                prop_assert!(p.y >= -p.w - tolerance && p.y <= p.w + tolerance, "y out: {p:?}");
                prop_assert!(p.z >= -tolerance && p.z <= p.w + tolerance, "z out: {p:?}");
            }
        }
    }
}
