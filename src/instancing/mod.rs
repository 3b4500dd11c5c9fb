//! Per-instance GPU state: attribute buffers, the resize controller,
//! indirect draw arguments, and the attribute-generator compute pass.
//!
//! The instance population lives entirely on the GPU. [`InstanceBuffers`]
//! owns one 16-byte attribute record per instance (position + size, and
//! color + alpha), [`IndirectArgsBuffer`] owns the draw arguments the GPU
//! reads at draw time, and [`AttributeGenerator`] rewrites positions every
//! frame in a compute pass.

mod attributes;
mod buffers;
mod generator;
mod indirect;

pub use attributes::{seed_ring_attributes, InstanceAttribute};
pub use buffers::{
    applied_instance_count, clamp_instance_count, closest_power_of_two,
    InstanceBuffers, MAX_INSTANCE_COUNT,
};
pub use generator::{workgroup_count, AttributeGenerator, WORKGROUP_SIZE};
pub use indirect::{IndirectArgs, IndirectArgsBuffer};
