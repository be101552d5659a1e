//! Camera system for 3D scene viewing.
//!
//! Provides a perspective camera with a cached projection, damped orbit
//! controls, and the framing rule that places the camera around a freshly
//! normalized asset.

/// Damped orbit controls with distance, polar and azimuth clamps.
pub mod controller;
/// Core camera struct and GPU uniform types.
pub mod core;
/// Camera placement for a normalized asset.
pub mod framing;
