// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Graphics allowances — casts between float/int widths are intentional
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::float_cmp)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::multiple_crate_versions)]

//! GPU-driven mesh instancing engine built on wgpu.
//!
//! Myriad renders up to millions of mesh instances in a single indirect
//! draw call. Per-instance position, size, and color live in GPU storage
//! buffers; a compute pass rewrites positions every frame and the draw
//! call reads its instance count straight from a GPU-resident argument
//! buffer, so changing the population never round-trips through the CPU.
//!
//! # Key entry points
//!
//! - [`engine::InstancedRenderEngine`] - frame orchestration (resize →
//!   compute → indirect draw)
//! - [`instancing::InstanceBuffers`] - per-instance attribute storage and
//!   the resize controller
//! - [`instancing::IndirectArgsBuffer`] - the GPU-resident draw arguments
//! - [`options::Options`] - runtime configuration (TOML presets)
//!
//! # Architecture
//!
//! Each frame the engine applies any pending instance-count change
//! (release, reallocate, reseed), encodes the attribute-generator compute
//! pass and the indirect draw into one command encoder, and submits both
//! in a single queue submission. wgpu executes passes in submission
//! order on a queue, which is what guarantees the draw observes the
//! positions the same frame's dispatch wrote.

pub mod camera;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod instancing;
pub mod mesh;
pub mod options;
pub mod renderer;
pub mod util;
