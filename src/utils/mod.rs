//! Utility functions for image processing
//!
//! This module provides pixel helpers shared by the render stage and the
//! decoding engines:
//! - Luminance conversion (RGBA to Y, sequential or row-parallel)

/// RGBA to luminance
pub mod grayscale;
