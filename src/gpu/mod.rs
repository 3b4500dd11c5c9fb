//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization, shared bind-group and
//! pipeline boilerplate, and WGSL shader composition.

/// Shared wgpu boilerplate for bind group layouts and pipeline state.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
