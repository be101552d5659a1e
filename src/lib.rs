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
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Interactive 3D asset viewer built on wgpu.
//!
//! Vitrine fetches a glTF/GLB asset from a URL or path, fits it to a
//! canonical size resting on the ground plane, frames an orbit camera
//! around it and keeps presenting frames under a fixed lighting rig.
//!
//! # Key entry points
//!
//! - [`ViewerController`] - reacts to URL changes, owns the session and
//!   suppresses stale load results
//! - [`viewport::Viewport`] - what a host must provide (size, frame
//!   callbacks, resize notifications, a [`SceneRenderer`])
//! - [`options::Options`] - runtime configuration (camera, lighting, stage,
//!   loader), loadable from TOML
//! - `Viewer` - a ready-made winit window (feature `viewer`)
//!
//! # Architecture
//!
//! Each load runs on its own background thread and reports back over a
//! channel tagged with a load ticket; only the newest ticket's result is
//! applied. Applied assets are normalized ([`scene::normalize`]), framed
//! ([`camera::framing`]) and handed to the renderer through a
//! [`FrameView`] each frame. The GPU side ([`gpu`]) bakes geometry once
//! per asset revision and draws a single forward pass.

pub mod camera;
pub mod controller;
pub mod error;
pub mod gpu;
pub mod input;
pub mod loader;
pub mod options;
pub mod scene;
pub mod session;
pub mod util;
pub mod viewport;
#[cfg(feature = "viewer")]
pub mod viewer;

#[cfg(test)]
mod testing;

pub use controller::{AssetState, ViewerController, ViewerStatus};
pub use error::{LoadError, VitrineError};
pub use input::{InputEvent, MouseButton};
pub use options::Options;
#[cfg(feature = "viewer")]
pub use viewer::{Viewer, ViewerBuilder, WindowViewport};
pub use viewport::{FrameScheduler, FrameToken, FrameView, RenderError, SceneRenderer, Viewport};
