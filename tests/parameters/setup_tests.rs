//! Integration tests for the setup builders

use hydiff_rs::parameters::LinkTransform;
use hydiff_rs::setup::{names, setup_3d, Block3dSetup, BlockParams, Linkage, Profile1dSetup};
use hydiff_rs::DiffusionError;

#[test]
fn test_1d_set_has_five_parameters() {
    let params = Profile1dSetup::new(200.0, -13.0, 3600.0)
        .with_initial_value(1.4)
        .with_vary_initial(true)
        .with_vary_final(true)
        .build()
        .unwrap();

    assert_eq!(
        params.names(),
        vec![
            names::LENGTH,
            names::LOG10_DIFFUSIVITY,
            names::TIME,
            names::INITIAL_VALUE,
            names::FINAL_VALUE
        ]
    );
    assert_eq!(params.free_count(), 3);
    assert!(!params.get(names::LENGTH).unwrap().is_free());
    assert!(!params.get(names::TIME).unwrap().is_free());
}

#[test]
fn test_3d_linkage_modes() {
    let isotropic = Block3dSetup::new(&[100.0, 200.0, 300.0], &[-12.0, -14.0, -15.0], 60.0)
        .unwrap()
        .with_linkage(Linkage::Isotropic)
        .build()
        .unwrap();
    let block = BlockParams::from_set(&isotropic).unwrap();
    assert_eq!(block.log10_diffusivities, [-12.0; 3]);
    assert_eq!(block.lengths, [100.0, 200.0, 300.0]);

    let slow_b = Block3dSetup::new(&[100.0; 3], &[-12.0; 3], 60.0)
        .unwrap()
        .with_linkage(Linkage::SlowB)
        .build()
        .unwrap();
    let dy = slow_b.get(names::LOG10_DIFFUSIVITIES[1]).unwrap();
    assert_eq!(dy.link().unwrap().transform(), LinkTransform::Offset(-1.0));
    assert_eq!(slow_b.value(names::LOG10_DIFFUSIVITIES[1]).unwrap(), -13.0);

    let independent = Block3dSetup::new(&[100.0; 3], &[-12.0; 3], 60.0)
        .unwrap()
        .with_vary_diffusivities([true, false, true])
        .build()
        .unwrap();
    assert_eq!(
        independent.free_names(),
        vec![names::LOG10_DIFFUSIVITIES[0], names::LOG10_DIFFUSIVITIES[2]]
    );
}

#[test]
fn test_3d_needs_three_of_each() {
    assert!(matches!(
        setup_3d(&[100.0, 100.0], &[-12.0; 3], 60.0),
        Err(DiffusionError::DimensionMismatch(_))
    ));
    assert!(matches!(
        Block3dSetup::new(&[100.0; 3], &[-12.0; 4], 60.0),
        Err(DiffusionError::DimensionMismatch(_))
    ));
}

#[test]
fn test_missing_parameter_is_named() {
    let params = Profile1dSetup::new(200.0, -13.0, 3600.0).build().unwrap();
    match BlockParams::from_set(&params) {
        Err(DiffusionError::ParameterNotFound(name)) => assert_eq!(name, names::LENGTHS[0]),
        other => panic!("unexpected result: {other:?}"),
    }
}
