//! Placeables: interactive world objects backed by a model.
//!
//! A placeable is loaded from a `UTP ` record. Its `Appearance` field selects
//! a row of the `placeables` 2DA, whose `modelname` column names the model
//! that is handed to the placeable's [`ModelLoader`].
//!
//! The placeable keeps two frames: its own position and bearing, and a world
//! offset and orientation imposed from outside (the containing area). Every
//! change to either frame is pushed to the model right away.

use std::{str::FromStr, sync::Arc};

use log::{debug, warn};

use crate::{
    data_structures::scene_graph::{ModelInstance, ModelKind, SceneManager},
    error::LoadError,
    resources::{
        ResourceProvider, ResourceType,
        gff::{UTP_ID, load_gff},
        two_da::TwoDaRegistry,
    },
};

/// Appearance id of a placeable that has not been loaded.
pub const APPEARANCE_UNSET: u32 = 0xFFFF_FFFF;

const APPEARANCE_FIELD: &str = "Appearance";
const APPEARANCE_TABLE: &str = "placeables";
const MODEL_COLUMN: &str = "modelname";

/// Turns a model name into a live model, or `None` if the name has no visual.
pub trait ModelLoader {
    fn load_model(&self, name: &str) -> Option<ModelInstance>;
}

impl<F> ModelLoader for F
where
    F: Fn(&str) -> Option<ModelInstance>,
{
    fn load_model(&self, name: &str) -> Option<ModelInstance> {
        self(name)
    }
}

/// Creates plain models in a scene.
#[derive(Clone, Debug, Default)]
pub struct SceneModelLoader {
    scene: SceneManager,
}

impl SceneModelLoader {
    pub fn new(scene: SceneManager) -> Self {
        Self { scene }
    }
}

impl ModelLoader for SceneModelLoader {
    fn load_model(&self, name: &str) -> Option<ModelInstance> {
        if name.is_empty() {
            return None;
        }
        Some(self.scene.create_model(name, ModelKind::Generic))
    }
}

/// How the local position and the world offset combine into the model position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Composition {
    /// `set_position` pushes `local - world`, `move_world` pushes `local + world`.
    ///
    /// The two paths disagree as soon as the world offset is non-zero. This is
    /// the behaviour existing content was placed against.
    Legacy,
    /// Both paths push `local + world`.
    Corrected,
}

impl Default for Composition {
    fn default() -> Self {
        if cfg!(feature = "corrected-composition") {
            Composition::Corrected
        } else {
            Composition::Legacy
        }
    }
}

impl FromStr for Composition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Composition::Legacy),
            "corrected" => Ok(Composition::Corrected),
            _ => Err(()),
        }
    }
}

/// Where placeables get their records and tables from.
pub struct GameData {
    pub resources: Arc<dyn ResourceProvider>,
    pub tables: Arc<TwoDaRegistry>,
}

impl GameData {
    /// Game data whose tables are cached from the same resources.
    pub fn new(resources: Arc<dyn ResourceProvider>) -> Self {
        let tables = Arc::new(TwoDaRegistry::new(resources.clone()));
        Self { resources, tables }
    }
}

pub struct Placeable {
    model_loader: Arc<dyn ModelLoader>,
    composition: Composition,
    appearance: u32,
    model: Option<ModelInstance>,
    position: [f32; 3],
    bearing: f32,
    world_position: [f32; 3],
    world_orientation: [f32; 3],
}

impl Placeable {
    pub fn new(model_loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            model_loader,
            composition: Composition::default(),
            appearance: APPEARANCE_UNSET,
            model: None,
            position: [0.0; 3],
            bearing: 0.0,
            world_position: [0.0; 3],
            world_orientation: [0.0; 3],
        }
    }

    pub fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = composition;
        self
    }

    /// Load the placeable template `name` and create its model.
    ///
    /// On error the placeable is left without appearance and without model
    /// and should not be used.
    pub fn load(&mut self, data: &GameData, name: &str) -> Result<(), LoadError> {
        self.model = None;
        self.appearance = APPEARANCE_UNSET;

        let result = self
            .load_appearance(data, name)
            .and_then(|()| self.load_model(data));
        if result.is_err() {
            self.appearance = APPEARANCE_UNSET;
        }
        result
    }

    fn load_appearance(&mut self, data: &GameData, name: &str) -> Result<(), LoadError> {
        let utp = load_gff(data.resources.as_ref(), name, ResourceType::Utp, UTP_ID)?;

        for field in utp.top_level() {
            if field.label() == APPEARANCE_FIELD {
                self.appearance = field.as_uint()? as u32;
            }
        }

        if self.appearance == APPEARANCE_UNSET {
            return Err(LoadError::MissingRequiredField {
                record: name.to_string(),
                field: APPEARANCE_FIELD.to_string(),
            });
        }
        Ok(())
    }

    fn load_model(&mut self, data: &GameData) -> Result<(), LoadError> {
        let table = data.tables.get(APPEARANCE_TABLE)?;
        let model_name = table.cell_str(self.appearance as usize, MODEL_COLUMN)?;

        if model_name.is_empty() {
            warn!("placeable appearance {} has no model", self.appearance);
            return Ok(());
        }

        self.model = self.model_loader.load_model(model_name);
        debug!(
            "loaded placeable appearance {} with model {}",
            self.appearance, model_name
        );
        // Bring a fresh model in line with state set before loading.
        self.push_position(self.composed_position(true));
        self.push_orientation();
        Ok(())
    }

    pub fn show(&self) {
        if let Some(model) = &self.model {
            model.show();
        }
    }

    pub fn hide(&self) {
        if let Some(model) = &self.model {
            model.hide();
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = [x, y, z];
        let additive = self.composition == Composition::Corrected;
        self.push_position(self.composed_position(additive));
    }

    /// Store the placeable's own facing. It is not applied to the model.
    pub fn set_bearing(&mut self, bearing: f32) {
        self.bearing = bearing;
    }

    pub fn move_world(&mut self, x: f32, y: f32, z: f32) {
        self.world_position = [x, y, z];
        self.push_position(self.composed_position(true));
    }

    /// Replace the world orientation; the model takes it over as is.
    pub fn turn_world(&mut self, x: f32, y: f32, z: f32) {
        self.world_orientation = [x, y, z];
        self.push_orientation();
    }

    fn composed_position(&self, additive: bool) -> [f32; 3] {
        let sign = if additive { 1.0 } else { -1.0 };
        std::array::from_fn(|i| self.position[i] + sign * self.world_position[i])
    }

    fn push_position(&self, [x, y, z]: [f32; 3]) {
        if let Some(model) = &self.model {
            model.set_position(x, y, z);
        }
    }

    fn push_orientation(&self) {
        if let Some(model) = &self.model {
            let [x, y, z] = self.world_orientation;
            model.set_orientation(x, y, z);
        }
    }

    pub fn appearance_id(&self) -> u32 {
        self.appearance
    }

    pub fn model(&self) -> Option<&ModelInstance> {
        self.model.as_ref()
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn bearing(&self) -> f32 {
        self.bearing
    }

    pub fn world_position(&self) -> [f32; 3] {
        self.world_position
    }

    pub fn world_orientation(&self) -> [f32; 3] {
        self.world_orientation
    }

    pub fn composition(&self) -> Composition {
        self.composition
    }
}
