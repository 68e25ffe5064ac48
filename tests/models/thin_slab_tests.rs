//! Integration tests for thin-slab uptake curves

use approx::assert_abs_diff_eq;
use hydiff_rs::diffusion::{thin_slab_uptake, ThinSlabOptions};

#[test]
fn test_uptake_is_monotonic_and_bounded() {
    let curve = thin_slab_uptake(-12.5, 800.0, &ThinSlabOptions::default()).unwrap();

    assert_abs_diff_eq!(curve.uptake[0], 0.0, epsilon = 0.01);
    assert!(curve.uptake.to_vec().windows(2).all(|w| w[1] >= w[0]));
    assert!(curve.uptake.iter().all(|&u| (0.0..=1.0).contains(&u)));
}

#[test]
fn test_uptake_approaches_one() {
    let options = ThinSlabOptions::default().with_max_time_hours(1.0e5);
    let curve = thin_slab_uptake(-12.0, 500.0, &options).unwrap();
    let last = curve.uptake.len() - 1;
    assert_abs_diff_eq!(curve.uptake[last], 1.0, epsilon = 1e-6);

    for (u, r) in curve.uptake.iter().zip(curve.remaining.iter()) {
        assert_abs_diff_eq!(u + r, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_thicker_slab_equilibrates_slower() {
    let options = ThinSlabOptions::default().with_max_time_hours(100.0).with_timesteps(11);
    let thin = thin_slab_uptake(-12.0, 300.0, &options).unwrap();
    let thick = thin_slab_uptake(-12.0, 1200.0, &options).unwrap();
    assert!(thin.uptake[5] > thick.uptake[5]);
}
