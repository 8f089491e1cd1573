//! Scene data: geometry, outlines, the scene graph and their GPU buffers.
//!
//! - `geometry` holds triangulated vertex data and normal computation
//! - `edges` derives the outline segments drawn on top of a mesh
//! - `scene_graph` organizes groups, meshes and outlines hierarchically
//! - `instance` holds per-node transforms and their GPU layout
//! - `model` contains vertex layouts and uploaded mesh buffers
//! - `texture` wraps depth, multisample and snapshot render targets

pub mod edges;
pub mod geometry;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
