//! Integration tests for fitting diffusivities

use approx::assert_relative_eq;
use hydiff_rs::diffusion::{evaluate_3d_wb, Observation, ProfileOptions, RayPaths};
use hydiff_rs::fit::{diffusion_residuals, fit, fit_profile_1d, fit_whole_block, WholeBlockData};
use hydiff_rs::lm::LmConfig;
use hydiff_rs::parameters::Bounds;
use hydiff_rs::setup::{names, Block3dSetup, Linkage, Profile1dSetup};
use hydiff_rs::DiffusionError;

use crate::test_helpers::{init_logger, synthetic_profile};

#[test]
fn test_round_trip_recovers_diffusivity() {
    init_logger();
    let data = synthetic_profile(&Profile1dSetup::new(200.0, -13.0, 3600.0), 50, 0.0, 0);
    let guess = Profile1dSetup::new(200.0, -14.0, 3600.0);

    let result = fit_profile_1d(&data, &guess, &LmConfig::default()).unwrap();
    assert_relative_eq!(result.log10_diffusivity, -13.0, epsilon = 0.01);
    assert!(result.rss < 1e-10);
    assert!(result.report.success);
}

#[test]
fn test_noisy_profile_has_an_error_bar() {
    init_logger();
    let truth = Profile1dSetup::new(400.0, -12.5, 7200.0).with_initial_value(1.3);
    let data = synthetic_profile(&truth, 60, 0.02, 42);
    let guess = Profile1dSetup::new(400.0, -13.0, 7200.0).with_vary_initial(true);

    let result = fit_profile_1d(&data, &guess, &LmConfig::default()).unwrap();
    let stderr = result.log10_diffusivity_stderr.unwrap();
    assert!(stderr > 0.0 && stderr < 0.2);
    assert!((result.log10_diffusivity + 12.5).abs() < 5.0 * stderr);
    assert_relative_eq!(result.initial_value, 1.3, epsilon = 0.05);
    assert!(result.initial_value_stderr.is_some());

    // Reduced chi-square near the noise variance
    assert!(result.report.redchi > 0.0001 && result.report.redchi < 0.0016);
    assert_eq!(result.report.ndata, 60);
    assert_eq!(result.report.nvarys, 2);
}

#[test]
fn test_bounded_parameter_stays_inside() {
    let data = synthetic_profile(&Profile1dSetup::new(200.0, -13.0, 3600.0), 40, 0.0, 0);
    let mut params = Profile1dSetup::new(200.0, -13.5, 3600.0).build().unwrap();
    params
        .set_bounds(names::LOG10_DIFFUSIVITY, Bounds::new(-15.0, -12.0).unwrap())
        .unwrap();

    let report = fit(&mut params, &data, &LmConfig::default()).unwrap();
    let value = params.value(names::LOG10_DIFFUSIVITY).unwrap();
    assert!((-15.0..=-12.0).contains(&value));
    assert_relative_eq!(value, -13.0, epsilon = 0.01);
    assert!(report.stderr(names::LOG10_DIFFUSIVITY).is_some());
}

#[test]
fn test_failed_fit_is_distinguishable() {
    let data = synthetic_profile(&Profile1dSetup::new(200.0, -13.0, 3600.0), 40, 0.0, 0);
    let mut params = Profile1dSetup::new(200.0, -15.0, 3600.0).build().unwrap();
    let before = params.to_json().unwrap();

    let err = fit(&mut params, &data, &LmConfig::default().with_max_iterations(1)).unwrap_err();
    assert!(matches!(err, DiffusionError::ConvergenceFailure { iterations: 1, .. }));
    assert_eq!(params.to_json().unwrap(), before);

    // A diffusivity so low that nothing moves: the Jacobian is singular
    let mut frozen = Profile1dSetup::new(200.0, -30.0, 3600.0).build().unwrap();
    let err = fit(&mut frozen, &data, &LmConfig::default()).unwrap_err();
    assert!(err.is_fit_failure());
}

fn block_observations(lengths: &[f64; 3], log10_d: &[f64; 3], raypaths: &RayPaths, options: &ProfileOptions) -> Vec<Observation> {
    let params = Block3dSetup::new(lengths, log10_d, 36000.0)
        .unwrap()
        .build()
        .unwrap();
    let wb = evaluate_3d_wb(&params, raypaths, options).unwrap();
    // Every other grid point, as measured from the face
    (0..3)
        .map(|k| {
            let positions = wb.positions[k].iter().step_by(2).copied().collect();
            let values = wb.profiles[k].iter().step_by(2).copied().collect();
            Observation::new(positions, values).unwrap()
        })
        .collect()
}

#[test]
fn test_slow_b_linkage_fit() {
    init_logger();
    let lengths = [800.0, 900.0, 1000.0];
    let options = ProfileOptions::default().with_sample_points(25);
    let raypaths: RayPaths = "cab".parse().unwrap();
    let observed = block_observations(&lengths, &[-12.2, -13.2, -12.2], &raypaths, &options);
    let data = WholeBlockData::new(&observed, raypaths).unwrap().with_options(options);

    let mut params = Block3dSetup::new(&lengths, &[-12.6; 3], 36000.0)
        .unwrap()
        .with_linkage(Linkage::SlowB)
        .build()
        .unwrap();
    let result = fit_whole_block(&data, &mut params, &LmConfig::default()).unwrap();

    assert_eq!(result.report.free_names, vec![names::LOG10_DIFFUSIVITIES[0].to_string()]);
    assert_relative_eq!(result.log10_diffusivities[0], -12.2, epsilon = 0.01);
    assert_relative_eq!(result.log10_diffusivities[1], result.log10_diffusivities[0] - 1.0, epsilon = 1e-12);
    assert_eq!(result.stderrs[1], None);

    let (_, rss) = diffusion_residuals(&params, &data).unwrap();
    assert!(rss < 1e-10);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_jacobian_matches_serial() {
    let lengths = [800.0, 900.0, 1000.0];
    let options = ProfileOptions::default().with_sample_points(15);
    let raypaths: RayPaths = "bca".parse().unwrap();
    let observed = block_observations(&lengths, &[-12.2, -12.5, -12.8], &raypaths, &options);
    let data = WholeBlockData::new(&observed, raypaths).unwrap().with_options(options);
    let start = Block3dSetup::new(&lengths, &[-12.5; 3], 36000.0).unwrap();

    let mut serial = start.build().unwrap();
    let serial_fit = fit_whole_block(&data, &mut serial, &LmConfig::default()).unwrap();

    let mut parallel = start.build().unwrap();
    let config = LmConfig::default().with_parallel_jacobian(true);
    let parallel_fit = fit_whole_block(&data, &mut parallel, &config).unwrap();

    assert_eq!(serial_fit.report.iterations, parallel_fit.report.iterations);
    for k in 0..3 {
        assert_relative_eq!(
            serial_fit.log10_diffusivities[k],
            parallel_fit.log10_diffusivities[k],
            epsilon = 1e-12
        );
    }
}

#[test]
fn test_independent_fits_run_concurrently() {
    let setups: Vec<Profile1dSetup> = [-12.5, -13.0, -13.5]
        .iter()
        .map(|&d| Profile1dSetup::new(300.0, d, 7200.0))
        .collect();

    let results: Vec<f64> = std::thread::scope(|scope| {
        let handles: Vec<_> = setups
            .iter()
            .map(|setup| {
                scope.spawn(move || {
                    let data = synthetic_profile(setup, 40, 0.0, 0);
                    let guess = Profile1dSetup::new(300.0, -13.2, 7200.0);
                    fit_profile_1d(&data, &guess, &LmConfig::default())
                        .unwrap()
                        .log10_diffusivity
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (result, setup) in results.iter().zip(setups.iter()) {
        assert_relative_eq!(*result, setup.log10_diffusivity, epsilon = 0.01);
    }
}
