//! Integration tests for 1D slab profiles

use approx::assert_abs_diff_eq;
use hydiff_rs::diffusion::{evaluate_1d, residuals_1d, Method, ProfileOptions};
use hydiff_rs::setup::{setup_1d, Profile1dSetup};
use hydiff_rs::DiffusionError;

#[test]
fn test_erf_and_series_agree() {
    let params = setup_1d(200.0, -12.5, 3600.0).unwrap();
    let erf = evaluate_1d(&params, &ProfileOptions::default()).unwrap();
    let series = evaluate_1d(
        &params,
        &ProfileOptions::default()
            .with_method(Method::Series)
            .with_series_terms(200),
    )
    .unwrap();

    assert_eq!(erf.positions, series.positions);
    for (e, s) in erf.values.iter().zip(series.values.iter()) {
        assert_abs_diff_eq!(e, s, epsilon = 0.01);
    }
}

#[test]
fn test_uptake_mirrors_loss() {
    let out = Profile1dSetup::new(300.0, -12.8, 7200.0).build().unwrap();
    let into = Profile1dSetup::new(300.0, -12.8, 7200.0)
        .with_initial_value(0.0)
        .with_final_value(1.0)
        .build()
        .unwrap();

    let options = ProfileOptions::default();
    let out = evaluate_1d(&out, &options).unwrap();
    let into = evaluate_1d(&into, &options).unwrap();

    for (o, i) in out.values.iter().zip(into.values.iter()) {
        assert_abs_diff_eq!(o + i, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_profile_stays_between_levels() {
    let params = Profile1dSetup::new(500.0, -12.0, 36000.0)
        .with_initial_value(2.5)
        .with_final_value(0.4)
        .build()
        .unwrap();
    let profile = evaluate_1d(&params, &ProfileOptions::default().with_sample_points(101)).unwrap();

    assert_eq!(profile.len(), 101);
    assert!(profile.values.iter().all(|&v| (0.4..=2.5).contains(&v)));
    // Symmetric about the slab midpoint
    assert_abs_diff_eq!(profile.values[10], profile.values[90], epsilon = 1e-12);
    assert_abs_diff_eq!(profile.positions[50], 0.0, epsilon = 1e-9);
}

#[test]
fn test_negative_time_is_degenerate() {
    let params = setup_1d(200.0, -13.0, -1.0).unwrap();
    assert!(matches!(
        evaluate_1d(&params, &ProfileOptions::default()),
        Err(DiffusionError::NumericalDegeneracy(_))
    ));
}

#[test]
fn test_residuals_need_paired_observations() {
    let params = setup_1d(200.0, -13.0, 3600.0).unwrap();
    let err = residuals_1d(&params, &[10.0, 20.0], &[0.9], &ProfileOptions::default()).unwrap_err();
    assert!(matches!(err, DiffusionError::DimensionMismatch(_)));
    assert!(err.to_string().contains("2 observed positions but 1"));
}

#[test]
fn test_method_keywords() {
    assert_eq!("erf".parse::<Method>().unwrap(), Method::Erf);
    assert_eq!("infsum".parse::<Method>().unwrap(), Method::Series);
    assert!(matches!(
        "spline".parse::<Method>(),
        Err(DiffusionError::UnknownMethod(_))
    ));
}
