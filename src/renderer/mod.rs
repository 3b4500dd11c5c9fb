//! Draw passes for the instanced population.

pub mod instanced_mesh;
