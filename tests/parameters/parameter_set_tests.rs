//! Integration tests for ParameterSet links and snapshots

use hydiff_rs::fit::fit;
use hydiff_rs::lm::LmConfig;
use hydiff_rs::parameters::{Link, ParameterError, ParameterSet};
use hydiff_rs::setup::{names, Profile1dSetup};

use crate::test_helpers::synthetic_profile;

#[test]
fn test_text_links_in_a_set() {
    let mut params = ParameterSet::new();
    params.add_free("log10_dx", -12.0).unwrap();
    params
        .add_linked("log10_dy", "log10_dx - 0.5".parse::<Link>().unwrap())
        .unwrap();
    assert_eq!(params.value("log10_dy").unwrap(), -12.5);

    assert!(matches!(
        "log10_dx / 2".parse::<Link>(),
        Err(ParameterError::InvalidLink { .. })
    ));
}

#[test]
fn test_snapshot_after_fit() {
    let data = synthetic_profile(&Profile1dSetup::new(200.0, -13.0, 3600.0), 30, 0.0, 0);
    let mut params = Profile1dSetup::new(200.0, -13.4, 3600.0).build().unwrap();
    fit(&mut params, &data, &LmConfig::default()).unwrap();

    let json = params.to_json().unwrap();
    let restored = ParameterSet::from_json(&json).unwrap();
    assert_eq!(
        restored.value(names::LOG10_DIFFUSIVITY).unwrap(),
        params.value(names::LOG10_DIFFUSIVITY).unwrap()
    );
    assert!(restored.stderr(names::LOG10_DIFFUSIVITY).unwrap().is_some());
    assert_eq!(restored.stderr(names::TIME).unwrap(), None);
}
