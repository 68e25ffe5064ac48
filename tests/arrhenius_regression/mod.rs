//! Integration tests for Arrhenius regression and saved diffusivities

use approx::assert_relative_eq;
use hydiff_rs::arrhenius::{solve_ea_d0, what_is_d, Diffusivities, KELVIN_OFFSET};
use hydiff_rs::diffusion::{evaluate_3d_wb, Observation, ProfileOptions, RayPaths};
use hydiff_rs::fit::{fit_profile_1d, fit_whole_block, WholeBlockData};
use hydiff_rs::lm::LmConfig;
use hydiff_rs::record::{DiffusivityRecord, DiffusivityTable};
use hydiff_rs::setup::{Block3dSetup, Profile1dSetup};
use hydiff_rs::Orientation;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::test_helpers::{init_logger, synthetic_profile};

#[test]
fn test_single_point_gives_no_line() {
    init_logger();
    assert!(solve_ea_d0(&[-12.0], &[900.0]).unwrap().is_none());

    let diffusivities = Diffusivities::new()
        .with_orientation(Orientation::Unoriented, &[900.0], &[-12.0], &[0.1])
        .unwrap();
    assert!(diffusivities.solve_ea_d0(Orientation::Unoriented).unwrap().is_none());
    assert_eq!(diffusivities.what_is_d(900.0, Orientation::Unoriented).unwrap(), None);
}

#[test]
fn test_noisy_series_brackets_activation_energy() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.05).unwrap();
    let celsius: Vec<f64> = (0..8).map(|k| 700.0 + 50.0 * k as f64).collect();
    let log10_d: Vec<f64> = celsius
        .iter()
        .map(|&t| what_is_d(180.0, 1e-3, t) + noise.sample(&mut rng))
        .collect();

    let fit = solve_ea_d0(&log10_d, &celsius).unwrap().unwrap();
    let ea = fit.activation_energy;
    assert!(ea.error > 0.0);
    assert!((ea.value - 180.0).abs() < 4.0 * ea.error + 1.0);

    // Predictions follow the fitted line
    let x_mid = 1e4 / (850.0 + KELVIN_OFFSET);
    assert_relative_eq!(fit.slope * x_mid + fit.intercept, fit.log10_d_at(850.0), epsilon = 0.01);
}

fn whole_block_at(log10_d: f64) -> WholeBlockData {
    let lengths = [600.0, 700.0, 800.0];
    let options = ProfileOptions::default().with_sample_points(17);
    let raypaths: RayPaths = "bca".parse().unwrap();
    let params = Block3dSetup::new(&lengths, &[log10_d; 3], 36000.0)
        .unwrap()
        .build()
        .unwrap();
    let wb = evaluate_3d_wb(&params, &raypaths, &options).unwrap();
    let observed: Vec<Observation> = (0..3)
        .map(|k| Observation::new(wb.positions[k].to_vec(), wb.profiles[k].to_vec()).unwrap())
        .collect();
    WholeBlockData::new(&observed, raypaths).unwrap().with_options(options)
}

#[test]
fn test_whole_block_series_to_arrhenius() {
    init_logger();
    let celsius = [800.0, 900.0, 1000.0];
    let mut diffusivities = Diffusivities::new().with_description("synthetic olivine");

    for &t in &celsius {
        let truth = what_is_d(150.0, 1e-6, t);
        let data = whole_block_at(truth);
        let mut params = Block3dSetup::new(&[600.0, 700.0, 800.0], &[truth + 0.3; 3], 36000.0)
            .unwrap()
            .build()
            .unwrap();
        let fit = fit_whole_block(&data, &mut params, &LmConfig::default()).unwrap();
        diffusivities.push_whole_block(t, &fit);
    }

    let x = diffusivities.series(Orientation::X);
    assert_eq!(x.len(), 3);
    assert_eq!(x.celsius, celsius.to_vec());

    let fit = diffusivities.solve_ea_d0(Orientation::Z).unwrap().unwrap();
    assert_relative_eq!(fit.activation_energy.value, 150.0, epsilon = 1.0);

    let at_850 = diffusivities.what_is_d_all(850.0).unwrap();
    assert!(at_850[..3].iter().all(Option::is_some));
    assert_eq!(at_850[3], None);
}

#[test]
fn test_profile_fit_to_saved_table() {
    let data = synthetic_profile(&Profile1dSetup::new(250.0, -12.8, 5400.0), 40, 0.0, 0);
    let fit = fit_profile_1d(&data, &Profile1dSetup::new(250.0, -13.5, 5400.0), &LmConfig::default()).unwrap();

    let mut table = DiffusivityTable::with_peaks(2);
    table.area_wb = DiffusivityRecord::from(&fit);
    table.peaks[1].height_wb = DiffusivityRecord::new(-13.1, 0.2, 0.8);

    let json = table.to_json().unwrap();
    let back = DiffusivityTable::from_json(&json).unwrap();
    assert_eq!(back.peaks.len(), 2);
    assert_eq!(back.area_wb.scaling_max, Some(1.0));
    assert_relative_eq!(back.area_wb.log10_d.unwrap(), -12.8, epsilon = 0.01);
    assert_eq!(back.peaks[1].height_wb, table.peaks[1].height_wb);
    assert_eq!(back.area, DiffusivityRecord::default());
}
