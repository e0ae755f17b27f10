use std::f32::consts::FRAC_PI_2;

use stagelight::lighting::FrameLights;
use stagelight::showcase::{CAMERA_POSITION, MATERIAL_COLOR, Showcase};
use stagelight::{
    Color, LightKind, NodeKind, OrbitControls, PerspectiveCamera, Scene, ShadowCamera, Shadows,
    UVec2, Vec3, Viewport,
};

fn build() -> (Scene, PerspectiveCamera, OrbitControls, Showcase) {
    let mut scene = Scene::new();
    let mut camera = PerspectiveCamera::new(50.0, 1.0, 0.1, 2000.0);
    let mut controls = OrbitControls::new(Vec3::ZERO);
    let showcase = Showcase::build(&mut scene, &mut camera, &mut controls, 16.0 / 9.0).unwrap();
    (scene, camera, controls, showcase)
}

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

#[test]
fn primitives_sit_in_a_row() {
    let (scene, _, _, showcase) = build();

    assert!(approx(scene.world_position(showcase.sphere).unwrap(), Vec3::new(-1.5, 0.0, 0.0)));
    assert!(approx(scene.world_position(showcase.cube).unwrap(), Vec3::ZERO));
    assert!(approx(scene.world_position(showcase.torus).unwrap(), Vec3::new(1.5, 0.0, 0.0)));

    for mesh in [showcase.sphere, showcase.cube, showcase.torus] {
        assert_eq!(scene.shadows(mesh).unwrap(), Shadows::CAST);
    }
}

#[test]
fn floor_is_flat_below_the_primitives() {
    let (scene, _, _, showcase) = build();

    let transform = scene.transform(showcase.plane).unwrap();
    assert_eq!(transform.position, Vec3::new(0.0, -0.5, 0.0));
    assert!((transform.rotation.x + FRAC_PI_2).abs() < 1e-6);

    // The plane's local +Z normal must point up once rotated.
    let normal = scene.world_matrix(showcase.plane).unwrap().transform_vector3(Vec3::Z);
    assert!(approx(normal, Vec3::Y));

    assert_eq!(scene.shadows(showcase.plane).unwrap(), Shadows::RECEIVE);
}

#[test]
fn one_material_shared_by_every_mesh() {
    let (mut scene, _, _, showcase) = build();

    let material = scene.mesh(showcase.sphere).unwrap().material;
    for mesh in [showcase.cube, showcase.torus, showcase.plane] {
        assert_eq!(scene.mesh(mesh).unwrap().material, material);
    }
    let shared = scene.material(material).unwrap();
    assert_eq!(shared.color, Color::from_hex(MATERIAL_COLOR));
    assert_eq!(shared.roughness, 0.4);

    scene.material_mut(material).unwrap().roughness = 0.9;
    let draws = scene.mesh_draws().unwrap();
    assert_eq!(draws.len(), 4);
    assert!(
        draws
            .iter()
            .all(|draw| scene.material(draw.material).unwrap().roughness == 0.9)
    );
}

#[test]
fn directional_light_shadow_frustum() {
    let (scene, _, _, showcase) = build();

    let light = scene.light(showcase.directional).unwrap();
    assert!(matches!(light.kind, LightKind::Directional));
    assert!(light.cast_shadow);

    let shadow = light.active_shadow().unwrap();
    assert_eq!(shadow.map_size, UVec2::splat(1024));
    assert_eq!(
        shadow.camera,
        ShadowCamera::Orthographic {
            left: -2.0,
            right: 2.0,
            top: 2.0,
            bottom: -2.0,
            near: 1.0,
            far: 6.0,
        }
    );
}

#[test]
fn spot_light_aims_at_its_target() {
    let (scene, _, _, showcase) = build();

    let spot = scene.light(showcase.spot).unwrap();
    assert_eq!(spot.target, Some(showcase.spot_target));
    assert!(approx(
        scene.world_position(showcase.spot_target).unwrap(),
        Vec3::new(-0.75, 0.0, 0.0)
    ));

    let instance = scene
        .lights()
        .unwrap()
        .into_iter()
        .find(|light| light.entity == showcase.spot)
        .unwrap();
    assert!(approx(instance.position, Vec3::new(0.0, 2.0, 3.0)));
    assert!(approx(instance.target, Vec3::new(-0.75, 0.0, 0.0)));
}

#[test]
fn every_node_reaches_the_root() {
    let (scene, _, _, showcase) = build();

    scene.validate().unwrap();
    let root = scene.root();
    for node in [
        showcase.camera,
        showcase.sphere,
        showcase.cube,
        showcase.torus,
        showcase.plane,
        showcase.ambient,
        showcase.directional,
        showcase.spot,
        showcase.spot_target,
        showcase.point,
        showcase.helper,
    ] {
        assert_eq!(scene.ancestors(node).unwrap().last(), Some(&root));
    }
    assert_eq!(scene.kind(showcase.helper).unwrap(), NodeKind::Helper);
    assert_eq!(scene.find("point light"), Some(showcase.point));
}

#[test]
fn camera_starts_above_and_behind() {
    let (scene, camera, controls, showcase) = build();

    assert_eq!(camera.position, CAMERA_POSITION);
    assert_eq!(camera.target, Vec3::ZERO);
    assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    assert!(controls.enable_damping);

    assert_eq!(scene.camera_node(), Some(showcase.camera));
    assert!(approx(scene.world_position(showcase.camera).unwrap(), CAMERA_POSITION));
}

#[test]
fn idle_controls_leave_the_camera_in_place() {
    let (_, mut camera, mut controls, _) = build();

    for _ in 0..10 {
        controls.update(&mut camera);
    }
    assert!(approx(camera.position, CAMERA_POSITION));
}

#[test]
fn lights_fill_eight_shadow_layers() {
    let (scene, _, _, _) = build();

    let lights = FrameLights::gather(&scene.lights().unwrap(), true);
    // Directional and spot take one layer each, the point light six.
    assert_eq!(lights.shadow_views.len(), 8);
    assert_eq!(lights.layer_size, 1024);
    assert_eq!(lights.uniforms.num_directional, 1);
    assert_eq!(lights.uniforms.num_spot, 1);
    assert_eq!(lights.uniforms.num_point, 1);
    assert!(lights.uniforms.ambient.iter().all(|c| (c - 0.5).abs() < 1e-6));

    let helpers = scene.helper_lines().unwrap();
    assert_eq!(helpers.len(), 1);
    assert_eq!(helpers[0].segments.len(), 5);
}

#[test]
fn collapsed_window_still_yields_a_finite_projection() {
    let mut scene = Scene::new();
    let mut camera = PerspectiveCamera::new(50.0, 1.0, 0.1, 2000.0);
    let mut controls = OrbitControls::new(Vec3::ZERO);
    let aspect = Viewport::new(0.0, 0.0, 1.0).aspect();

    Showcase::build(&mut scene, &mut camera, &mut controls, aspect).unwrap();

    assert_eq!(camera.aspect, 1.0);
    assert!(camera.projection_matrix().is_finite());
}
