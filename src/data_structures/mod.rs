//! Engine data structures: scene graph and instances.
//!
//! - `instance` holds per-instance transformation data
//! - `scene_graph` owns the live models and hands out handles to them

pub mod instance;
pub mod scene_graph;
