use approx::assert_abs_diff_eq;
use cgmath::Rotation3;
use flow_aurora::{
    data_structures::scene_graph::{ModelKind, SceneManager},
    world_model::{create_world_model, destroy_model},
};

fn assert_quaternion_eq(a: cgmath::Quaternion<f32>, b: cgmath::Quaternion<f32>) {
    assert_abs_diff_eq!(a.s, b.s, epsilon = 1e-6);
    assert_abs_diff_eq!(a.v.x, b.v.x, epsilon = 1e-6);
    assert_abs_diff_eq!(a.v.y, b.v.y, epsilon = 1e-6);
    assert_abs_diff_eq!(a.v.z, b.v.z, epsilon = 1e-6);
}

fn expected_base() -> cgmath::Quaternion<f32> {
    cgmath::Quaternion::from_axis_angle(cgmath::Vector3::unit_x(), cgmath::Deg(-90.0))
}

#[test]
fn world_models_get_the_corrective_base_orientation() {
    let scene = SceneManager::new();
    let model = create_world_model(&scene, "door02");

    assert_eq!(model.name(), "door02");
    assert_eq!(model.kind(), ModelKind::World);
    assert_quaternion_eq(model.base_orientation(), expected_base());
}

#[test]
fn base_orientation_survives_later_orientation_changes() {
    let scene = SceneManager::new();
    let model = create_world_model(&scene, "door02");
    model.set_orientation(0.0, 0.0, 90.0);
    model.set_position(1.0, 2.0, 3.0);

    assert_quaternion_eq(model.base_orientation(), expected_base());
    assert_eq!(model.orientation(), [0.0, 0.0, 90.0]);
}

#[test]
fn plain_models_have_no_base_orientation() {
    let scene = SceneManager::new();
    let model = scene.create_model("plc_chest1", ModelKind::Generic);
    assert_quaternion_eq(
        model.base_orientation(),
        cgmath::Quaternion::new(1.0, 0.0, 0.0, 0.0),
    );
}

#[test]
fn destroy_model_releases_the_scene_node() {
    let scene = SceneManager::new();
    let keep = create_world_model(&scene, "tile01");
    let gone = create_world_model(&scene, "tile02");
    keep.show();
    gone.show();
    assert_eq!(scene.render_list().len(), 2);

    destroy_model(Some(gone));
    let list = scene.render_list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "tile01");

    destroy_model(None);
    assert_eq!(scene.model_count(), 1);
}

#[test]
fn world_model_axes_are_rotated_into_the_scene() {
    let scene = SceneManager::new();
    let model = create_world_model(&scene, "door02");

    // Asset +Z (up) maps to scene +Y.
    let up = model
        .world_transform()
        .transform_point(cgmath::Vector3::new(0.0, 0.0, 1.0));
    assert_abs_diff_eq!(up.x, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(up.y, 1.0, epsilon = 1e-5);
    assert_abs_diff_eq!(up.z, 0.0, epsilon = 1e-5);
}
