use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{config::EngineConfig, error::LoadError};

/**
 * This module contains all logic for loading records and tables from external files.
 */
pub mod gff;
pub mod two_da;

/// The kinds of game resources this crate knows how to look up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Placeable template (a GFF record tagged `UTP `).
    Utp,
    /// Row/column data table.
    TwoDa,
}

impl ResourceType {
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceType::Utp => "utp",
            ResourceType::TwoDa => "2da",
        }
    }
}

/// Something that can hand out the raw bytes of a named resource.
///
/// `Ok(None)` means the resource does not exist, errors are reserved for
/// failures while reading one that does.
pub trait ResourceProvider: Send + Sync {
    fn load(&self, name: &str, kind: ResourceType) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Fetch a resource or fail with [`LoadError::ResourceNotFound`].
pub fn load_resource(
    resources: &dyn ResourceProvider,
    name: &str,
    kind: ResourceType,
) -> Result<Vec<u8>, LoadError> {
    match resources.load(name, kind) {
        Ok(Some(data)) => Ok(data),
        Ok(None) => {
            log::debug!("resource {}.{} not found", name, kind.extension());
            Err(LoadError::ResourceNotFound {
                name: name.to_string(),
                kind,
            })
        }
        Err(source) => Err(LoadError::Resource {
            name: name.to_string(),
            source,
        }),
    }
}

/// Resources stored as loose files `<root>/<name>.<ext>`.
#[derive(Clone, Debug)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.resource_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Game data names are case-insensitive, files on disk usually aren't.
    fn find(&self, file_name: &str) -> anyhow::Result<Option<PathBuf>> {
        let exact = self.root.join(file_name);
        if exact.is_file() {
            return Ok(Some(exact));
        }
        if !self.root.is_dir() {
            return Ok(None);
        }
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().eq_ignore_ascii_case(file_name) {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }
}

impl ResourceProvider for DirectoryResources {
    fn load(&self, name: &str, kind: ResourceType) -> anyhow::Result<Option<Vec<u8>>> {
        let file_name = format!("{}.{}", name, kind.extension());
        match self.find(&file_name)? {
            Some(path) => Ok(Some(std::fs::read(path)?)),
            None => Ok(None),
        }
    }
}

/// In-memory resources, mostly useful for tools and tests.
#[derive(Debug, Default)]
pub struct MemoryResources {
    entries: Mutex<HashMap<(String, ResourceType), Vec<u8>>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, kind: ResourceType, data: impl Into<Vec<u8>>) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((name.to_ascii_lowercase(), kind), data.into());
    }

    pub fn with(self, name: &str, kind: ResourceType, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, kind, data);
        self
    }
}

impl ResourceProvider for MemoryResources {
    fn load(&self, name: &str, kind: ResourceType) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(name.to_ascii_lowercase(), kind))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_match_the_files_on_disk() {
        assert_eq!(ResourceType::Utp.extension(), "utp");
        assert_eq!(ResourceType::TwoDa.extension(), "2da");
    }

    #[test]
    fn same_name_with_another_type_is_a_different_resource() {
        let resources = MemoryResources::new().with("placeables", ResourceType::TwoDa, vec![1]);
        assert!(load_resource(&resources, "placeables", ResourceType::Utp).is_err());
    }

    #[test]
    fn memory_resources_ignore_name_case() {
        let resources = MemoryResources::new().with("Chest01", ResourceType::Utp, vec![1, 2, 3]);
        let data = load_resource(&resources, "CHEST01", ResourceType::Utp).unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn missing_resource_reports_name_and_type() {
        let resources = MemoryResources::new();
        let err = load_resource(&resources, "nothing", ResourceType::TwoDa).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ResourceNotFound { ref name, kind: ResourceType::TwoDa } if name == "nothing"
        ));
        assert_eq!(err.to_string(), "No such resource: nothing.2da");
    }

    #[test]
    fn directory_resources_find_files_case_insensitively() {
        let root = std::env::temp_dir().join(format!("flow-aurora-res-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("Placeables.2DA"), b"2DA V2.0").unwrap();

        let resources = DirectoryResources::new(&root);
        let data = resources.load("placeables", ResourceType::TwoDa).unwrap();
        assert_eq!(data.as_deref(), Some(&b"2DA V2.0"[..]));
        assert!(resources.load("doors", ResourceType::TwoDa).unwrap().is_none());

        std::fs::remove_dir_all(&root).unwrap();
    }
}
