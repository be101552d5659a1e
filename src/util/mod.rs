//! Shared utilities.

/// Smoothed frames-per-second meter.
pub mod frame_timing;
