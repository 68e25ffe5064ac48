//! Integration tests for the 3D block field and whole-block profiles

use approx::assert_abs_diff_eq;
use hydiff_rs::diffusion::{evaluate_1d, evaluate_3d_npi, evaluate_3d_wb, residuals_3d_wb, Observation, ProfileOptions, RayPaths};
use hydiff_rs::geometry::Axis;
use hydiff_rs::setup::{setup_1d, setup_3d};
use hydiff_rs::DiffusionError;

use crate::test_helpers::count_extrema;

#[test]
fn test_isotropic_cube_slices_match_1d() {
    let params = setup_3d(&[1000.0; 3], &[-13.0; 3], 3600.0).unwrap();
    let options = ProfileOptions::default();
    let npi = evaluate_3d_npi(&params, &options).unwrap();

    let slab = setup_1d(1000.0, -13.0, 3600.0).unwrap();
    let profile = evaluate_1d(&slab, &options).unwrap();

    for slice in &npi.slices {
        assert_eq!(slice.len(), 50);
        for (s, p) in slice.iter().zip(profile.values.iter()) {
            assert_abs_diff_eq!(s, p, epsilon = 1e-12);
        }
    }
    for (n, p) in npi.positions[0].iter().zip(profile.positions.iter()) {
        assert_abs_diff_eq!(n, p, epsilon = 1e-9);
    }
}

#[test]
fn test_whole_block_adds_no_extrema() {
    let params = setup_3d(&[400.0, 600.0, 800.0], &[-12.0, -12.2, -12.4], 18000.0).unwrap();
    let options = ProfileOptions::default().with_sample_points(51);
    let npi = evaluate_3d_npi(&params, &options).unwrap();
    let raypaths: RayPaths = "bca".parse().unwrap();
    let wb = evaluate_3d_wb(&params, &raypaths, &options).unwrap();

    for k in 0..3 {
        let slice = npi.slices[k].to_vec();
        let profile = wb.profiles[k].to_vec();
        assert!(count_extrema(&profile) <= count_extrema(&slice));
        // The ray crosses lower concentrations near the rims
        for (w, s) in profile.iter().zip(slice.iter()) {
            assert!(*w <= s + 1e-12);
        }
    }
    assert_abs_diff_eq!(wb.positions[2][0], 0.0);
    assert_abs_diff_eq!(wb.positions[2][50], 800.0, epsilon = 1e-9);
}

#[test]
fn test_ray_path_along_profile_is_rejected() {
    let err = "acb".parse::<RayPaths>().unwrap_err();
    match err {
        DiffusionError::InvalidRaypath { profile, allowed, .. } => {
            assert_eq!(profile, Axis::A);
            assert_eq!(allowed, [Axis::B, Axis::C]);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!("bxa".parse::<RayPaths>().is_err());
    assert!(RayPaths::new([Axis::B, Axis::B, Axis::B]).is_err());
}

#[test]
fn test_whole_block_residuals_concatenate_axes() {
    let params = setup_3d(&[400.0, 600.0, 800.0], &[-12.0, -12.2, -12.4], 18000.0).unwrap();
    let options = ProfileOptions::default().with_sample_points(21);
    let raypaths: RayPaths = "cab".parse().unwrap();
    let wb = evaluate_3d_wb(&params, &raypaths, &options).unwrap();

    // Off-grid positions map to the nearest model point
    let observed = [
        Observation::new(vec![1.0, 201.0], vec![0.0, 0.0]).unwrap(),
        Observation::new(vec![299.0], vec![0.0]).unwrap(),
        Observation::new(vec![0.0, 400.0, 799.0], vec![0.1, 0.1, 0.1]).unwrap(),
    ];
    let residuals = residuals_3d_wb(&params, &raypaths, &observed, &options).unwrap();

    assert_eq!(residuals.len(), 6);
    assert_abs_diff_eq!(residuals[0], wb.profiles[0][0], epsilon = 1e-12);
    assert_abs_diff_eq!(residuals[1], wb.profiles[0][10], epsilon = 1e-12);
    assert_abs_diff_eq!(residuals[2], wb.profiles[1][10], epsilon = 1e-12);
    assert_abs_diff_eq!(residuals[5], wb.profiles[2][20] - 0.1, epsilon = 1e-12);
}
