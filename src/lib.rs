//! Cornifer: a region map editor for Rain World.
//!
//! Re-exports modules for use by the editor binary and tools.

pub mod assets;
pub mod connections;
pub mod dialogs;
pub mod editor;
pub mod errors;
pub mod export;
pub mod geometry;
pub mod objects;
pub mod region;
pub mod render;
pub mod room;
pub mod session;
pub mod state;
pub mod tile;
pub mod ui;
pub mod version;
