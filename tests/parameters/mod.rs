//! Integration tests for the parameter system
//!
//! These tests verify that parameter sets built by the setup functions
//! behave correctly around a fit.

// Sets built by setup_1d / setup_3d
mod setup_tests;

// Links and JSON snapshots
mod parameter_set_tests;
