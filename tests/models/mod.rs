//! Integration tests for the diffusion models
//!
//! These tests check physical properties that hold across the models
//! rather than individual formulas.

// 1D slab profiles
mod one_d_tests;

// Thin-slab bulk uptake
mod thin_slab_tests;

// 3D block field and whole-block averages
mod block_tests;
