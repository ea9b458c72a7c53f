//! Command implementations for the fbxbatch CLI.

pub mod actions;
pub mod export;
pub mod meshes;
pub mod probe;
pub mod scale;
pub mod validate;
