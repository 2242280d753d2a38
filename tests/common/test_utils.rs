use std::sync::{Arc, Mutex};

use flow_aurora::{
    data_structures::scene_graph::{ModelInstance, ModelKind, SceneManager},
    placeable::{GameData, ModelLoader},
    resources::{MemoryResources, ResourceType},
};

/// A top-level field for [`gff`].
#[allow(dead_code)]
pub enum TestField {
    Byte(u8),
    DWord(u32),
    Int(i32),
    Float(f32),
    Str(&'static str),
}

fn le(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Build a GFF V3.2 record of type `file_type` with one top-level struct.
pub fn gff(file_type: &[u8; 4], fields: &[(&str, TestField)]) -> Vec<u8> {
    let mut field_entries = Vec::new();
    let mut labels = Vec::new();
    let mut field_data = Vec::new();

    for (idx, (label, value)) in fields.iter().enumerate() {
        let mut raw_label = label.as_bytes().to_vec();
        raw_label.resize(16, 0);
        labels.extend(raw_label);

        let (kind, data) = match value {
            TestField::Byte(v) => (0, *v as u32),
            TestField::DWord(v) => (4, *v),
            TestField::Int(v) => (5, *v as u32),
            TestField::Float(v) => (8, v.to_bits()),
            TestField::Str(s) => {
                let offset = field_data.len() as u32;
                field_data.extend((s.len() as u32).to_le_bytes());
                field_data.extend(s.as_bytes());
                (10, offset)
            }
        };
        field_entries.extend(le(&[kind, idx as u32, data]));
    }

    let field_indices = if fields.len() > 1 {
        le(&(0..fields.len() as u32).collect::<Vec<_>>())
    } else {
        Vec::new()
    };
    let structs = le(&[0xFFFF_FFFF, 0, fields.len() as u32]);

    let struct_offset = 56u32;
    let field_offset = struct_offset + structs.len() as u32;
    let label_offset = field_offset + field_entries.len() as u32;
    let field_data_offset = label_offset + labels.len() as u32;
    let field_indices_offset = field_data_offset + field_data.len() as u32;
    let list_indices_offset = field_indices_offset + field_indices.len() as u32;

    let mut out = Vec::new();
    out.extend_from_slice(file_type);
    out.extend_from_slice(b"V3.2");
    out.extend(le(&[
        struct_offset,
        1,
        field_offset,
        fields.len() as u32,
        label_offset,
        fields.len() as u32,
        field_data_offset,
        field_data.len() as u32,
        field_indices_offset,
        field_indices.len() as u32,
        list_indices_offset,
        0,
    ]));
    out.extend(structs);
    out.extend(field_entries);
    out.extend(labels);
    out.extend(field_data);
    out.extend(field_indices);
    out
}

/// A placeable template.
pub fn utp(fields: &[(&str, TestField)]) -> Vec<u8> {
    gff(b"UTP ", fields)
}

/// A text `placeables` 2DA whose rows carry the given model names.
pub fn placeables_2da(models: &[&str]) -> String {
    let mut text = String::from("2DA V2.0\n\n      label  modelname\n");
    for (row, model) in models.iter().enumerate() {
        let cell = if model.is_empty() { "****" } else { *model };
        text.push_str(&format!("{row}     plc{row}   {cell}\n"));
    }
    text
}

/// Game data with `placeables.2da` preloaded into memory.
pub fn game_data(models: &[&str]) -> (Arc<MemoryResources>, GameData) {
    let resources = Arc::new(MemoryResources::new());
    resources.insert("placeables", ResourceType::TwoDa, placeables_2da(models));
    let data = GameData::new(resources.clone());
    (resources, data)
}

/// A model loader that creates scene models and remembers every name it was asked for.
pub struct RecordingLoader {
    pub scene: SceneManager,
    pub requested: Mutex<Vec<String>>,
}

impl RecordingLoader {
    pub fn new(scene: SceneManager) -> Arc<Self> {
        Arc::new(Self {
            scene,
            requested: Mutex::new(Vec::new()),
        })
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl ModelLoader for RecordingLoader {
    fn load_model(&self, name: &str) -> Option<ModelInstance> {
        self.requested.lock().unwrap().push(name.to_string());
        Some(self.scene.create_model(name, ModelKind::Generic))
    }
}
