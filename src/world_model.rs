//! Helpers for world models.
//!
//! World model assets are authored Z-up while the scene graph is Y-up, so
//! every world model is created with a fixed base rotation of -90° about X.

use crate::data_structures::scene_graph::{ModelInstance, ModelKind, SceneManager};

/// Base rotation applied to every world model, in degrees about the X axis.
pub const WORLD_BASE_ANGLE: f32 = -90.0;
pub const WORLD_BASE_AXIS: [f32; 3] = [1.0, 0.0, 0.0];

/// Create the world model `name` in `scene`. The caller owns the result.
pub fn create_world_model(scene: &SceneManager, name: &str) -> ModelInstance {
    let model = scene.create_model(name, ModelKind::World);

    let [x, y, z] = WORLD_BASE_AXIS;
    model.set_base_orientation(WORLD_BASE_ANGLE.to_radians(), x, y, z);

    model
}

/// Remove `model` from its scene. Passing `None` does nothing.
pub fn destroy_model(model: Option<ModelInstance>) {
    drop(model);
}
