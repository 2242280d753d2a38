//! Runtime configuration.
//!
//! Defaults come from the build (the `assets/` directory copied by `build.rs`)
//! and can be overridden through the environment:
//!
//! - `FLOW_AURORA_RESOURCE_DIR`: directory holding loose game resources
//! - `FLOW_AURORA_COMPOSITION`: `legacy` or `corrected`

use std::path::{Path, PathBuf};

use crate::placeable::Composition;

pub const RESOURCE_DIR_VAR: &str = "FLOW_AURORA_RESOURCE_DIR";
pub const COMPOSITION_VAR: &str = "FLOW_AURORA_COMPOSITION";

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub resource_dir: PathBuf,
    pub composition: Composition,
}

impl EngineConfig {
    /// The defaults, overridden by whatever is set in the environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(RESOURCE_DIR_VAR) {
            self.resource_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(COMPOSITION_VAR) {
            match value.parse() {
                Ok(composition) => self.composition = composition,
                Err(()) => log::warn!(
                    "ignoring {}={:?}, expected \"legacy\" or \"corrected\"",
                    COMPOSITION_VAR,
                    value
                ),
            }
        }
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        // build.rs copies ./assets next to the build output when it exists
        let bundled = Path::new(env!("OUT_DIR")).join("assets");
        let resource_dir = if bundled.is_dir() {
            bundled
        } else {
            Path::new("./").join("assets")
        };
        Self {
            resource_dir,
            composition: Composition::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let config = EngineConfig::default().with_overrides(|key| match key {
            RESOURCE_DIR_VAR => Some("/srv/game/override".to_string()),
            COMPOSITION_VAR => Some("Corrected".to_string()),
            _ => None,
        });
        assert_eq!(config.resource_dir, PathBuf::from("/srv/game/override"));
        assert_eq!(config.composition, Composition::Corrected);
    }

    #[test]
    fn unknown_composition_is_ignored() {
        let default = EngineConfig::default();
        let config = default.clone().with_overrides(|key| {
            (key == COMPOSITION_VAR).then(|| "sideways".to_string())
        });
        assert_eq!(config, default);
    }
}
