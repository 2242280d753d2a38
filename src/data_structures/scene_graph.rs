//! Scene graph and model instance lifetime.
//!
//! The [`SceneManager`] owns one node per live model. A node is created by
//! [`SceneManager::create_model`] and handed out as a [`ModelInstance`], the
//! only handle to it. Dropping the handle removes the node, so a model can
//! neither leak out of the scene nor be destroyed twice.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use log::debug;

use crate::data_structures::instance::Instance;

/// The flavour of model a node was created as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    /// Plain model, used as authored.
    Generic,
    /// World model whose asset axes need a corrective base orientation.
    World,
}

/// State of one model inside the scene graph.
#[derive(Clone, Debug)]
pub struct ModelNode {
    pub name: String,
    pub kind: ModelKind,
    pub visible: bool,
    pub position: [f32; 3],
    /// Per-axis angles in degrees.
    pub orientation: [f32; 3],
    pub base_orientation: Instance,
}

impl ModelNode {
    fn new(name: &str, kind: ModelKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            visible: false,
            position: [0.0; 3],
            orientation: [0.0; 3],
            base_orientation: Instance::new(),
        }
    }

    /// Translation, then orientation, then the base orientation closest to the mesh.
    pub fn world_transform(&self) -> Instance {
        let [x, y, z] = self.position;
        let [ox, oy, oz] = self.orientation;
        let translation = Instance::from(cgmath::Vector3::new(x, y, z));
        let orientation = Instance::from_euler_degrees(ox, oy, oz);
        &(&translation * &orientation) * &self.base_orientation
    }
}

/// A visible model as it should be drawn this frame.
#[derive(Clone, Debug)]
pub struct RenderEntry {
    pub id: u32,
    pub name: String,
    pub transform: Instance,
}

impl RenderEntry {
    /// Column-major model matrix of `transform`, ready for a uniform or instance buffer.
    pub fn model_matrix(&self) -> [[f32; 4]; 4] {
        self.transform.to_matrix().into()
    }
}

#[derive(Debug, Default)]
struct SceneGraph {
    next_id: u32,
    nodes: BTreeMap<u32, ModelNode>,
}

/// Shared handle to the scene graph. Cloning it is cheap and every clone
/// refers to the same scene.
#[derive(Clone, Debug, Default)]
pub struct SceneManager {
    graph: Arc<Mutex<SceneGraph>>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SceneGraph> {
        self.graph.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a hidden, untransformed model called `name` to the scene.
    pub fn create_model(&self, name: &str, kind: ModelKind) -> ModelInstance {
        let mut graph = self.lock();
        // Ids wrap around; a wrapped id skips nodes that are still alive.
        let mut id = graph.next_id;
        while graph.nodes.contains_key(&id) {
            id = id.wrapping_add(1);
        }
        graph.next_id = id.wrapping_add(1);
        graph.nodes.insert(id, ModelNode::new(name, kind));
        debug!("created model {} ({:?}) as node {}", name, kind, id);
        ModelInstance {
            id,
            scene: self.clone(),
        }
    }

    /// Remove `model` from the scene. Equivalent to dropping it.
    pub fn destroy(&self, model: ModelInstance) {
        drop(model);
    }

    pub fn model_count(&self) -> usize {
        self.lock().nodes.len()
    }

    /// A copy of the node behind `id`, if it is still alive.
    pub fn node(&self, id: u32) -> Option<ModelNode> {
        self.lock().nodes.get(&id).cloned()
    }

    /// Every visible model with its world transform, ordered by node id.
    pub fn render_list(&self) -> Vec<RenderEntry> {
        self.lock()
            .nodes
            .iter()
            .filter(|(_, node)| node.visible)
            .map(|(&id, node)| RenderEntry {
                id,
                name: node.name.clone(),
                transform: node.world_transform(),
            })
            .collect()
    }

    fn update<R>(&self, id: u32, mutation: impl FnOnce(&mut ModelNode) -> R) -> Option<R> {
        self.lock().nodes.get_mut(&id).map(mutation)
    }

    fn remove(&self, id: u32) {
        if let Some(node) = self.lock().nodes.remove(&id) {
            debug!("destroyed model {} (node {})", node.name, id);
        }
    }
}

/// Owned handle to a live model in the scene graph.
#[derive(Debug)]
pub struct ModelInstance {
    id: u32,
    scene: SceneManager,
}

impl ModelInstance {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> String {
        self.read(|node| node.name.clone())
    }

    pub fn kind(&self) -> ModelKind {
        self.read(|node| node.kind)
    }

    pub fn show(&self) {
        self.scene.update(self.id, |node| node.visible = true);
    }

    pub fn hide(&self) {
        self.scene.update(self.id, |node| node.visible = false);
    }

    pub fn is_visible(&self) -> bool {
        self.read(|node| node.visible)
    }

    pub fn set_position(&self, x: f32, y: f32, z: f32) {
        self.scene.update(self.id, |node| node.position = [x, y, z]);
    }

    pub fn position(&self) -> [f32; 3] {
        self.read(|node| node.position)
    }

    /// Set the orientation as per-axis angles in degrees, replacing the previous one.
    pub fn set_orientation(&self, x: f32, y: f32, z: f32) {
        self.scene.update(self.id, |node| node.orientation = [x, y, z]);
    }

    pub fn orientation(&self) -> [f32; 3] {
        self.read(|node| node.orientation)
    }

    /// Set the rotation applied underneath the orientation: `angle` radians
    /// around the axis `(x, y, z)`.
    pub fn set_base_orientation(&self, angle: f32, x: f32, y: f32, z: f32) {
        let base = Instance::from_axis_angle(cgmath::Rad(angle), cgmath::Vector3::new(x, y, z));
        self.scene
            .update(self.id, |node| node.base_orientation = base);
    }

    pub fn base_orientation(&self) -> cgmath::Quaternion<f32> {
        self.read(|node| node.base_orientation.rotation)
    }

    pub fn world_transform(&self) -> Instance {
        self.read(ModelNode::world_transform)
    }

    // The node lives exactly as long as this handle.
    fn read<R>(&self, read: impl FnOnce(&ModelNode) -> R) -> R {
        let graph = self.scene.lock();
        read(&graph.nodes[&self.id])
    }
}

impl Drop for ModelInstance {
    fn drop(&mut self) {
        self.scene.remove(self.id);
    }
}
