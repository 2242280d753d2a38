//! flow-aurora
//!
//! Data-driven placeables for Aurora-style game data, on top of a small
//! scene graph. Placeable templates are read from binary labeled-field
//! records, their appearance is resolved through shared 2DA tables and the
//! resulting model lives in the scene graph for as long as the placeable does.
//!
//! High-level modules
//! - `config`: runtime configuration (resource directory, composition mode)
//! - `data_structures`: scene graph, model instances and transforms
//! - `error`: the error type shared by every loader
//! - `placeable`: placeables and the model loading strategy they use
//! - `resources`: resource lookup, GFF records and 2DA tables
//! - `world_model`: creation and destruction of world models
//!

pub mod config;
pub mod data_structures;
pub mod error;
pub mod placeable;
pub mod resources;
pub mod world_model;

pub use error::LoadError;

/// Install `env_logger` as the `log` backend.
///
/// Safe to call more than once, later calls only print a warning.
pub fn init_logging() {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };
}
