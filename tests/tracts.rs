// Integration tests for tract preparation:
//   planar areas, vegetation removal, street-block clipping and dissolve.

mod common;

use approx::assert_relative_eq;
use common::*;
use polars::prelude::*;
use urbdata::{prepare_tracts, Error, Layer, ADJUSTED_AREA_COLUMN};

fn tracts() -> Layer {
    layer(
        vec![
            Column::new("cd_setor".into(), &["355030801000001", "355030801000002"]),
            Column::new("situacao".into(), &["urbana", "urbana"]),
        ],
        vec![rect(0.0, 0.0, 10.0, 10.0), rect(10.0, 0.0, 20.0, 10.0)],
    )
}

fn areas(layer: &Layer) -> Vec<f64> {
    layer.f64_values(ADJUSTED_AREA_COLUMN).unwrap().into_iter().flatten().collect()
}

#[test]
fn without_options_only_the_area_is_added() {
    let result = prepare_tracts(&tracts(), None, None, None).unwrap();

    assert_eq!(result.column_names(), vec!["cd_setor", "situacao", ADJUSTED_AREA_COLUMN]);
    assert_eq!(areas(&result), vec![100.0, 100.0]);
}

#[test]
fn vegetation_is_subtracted() {
    let vegetation = layer(
        vec![Column::new("tipo".into(), &["mata"])],
        vec![rect(0.0, 0.0, 10.0, 4.0)],
    );

    let result = prepare_tracts(&tracts(), Some(&vegetation), None, None).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.column_names(), vec!["cd_setor", "situacao", ADJUSTED_AREA_COLUMN]);
    let areas = areas(&result);
    assert_relative_eq!(areas[0], 60.0);
    assert_relative_eq!(areas[1], 100.0);
}

#[test]
fn fully_vegetated_tracts_are_dropped() {
    let vegetation = layer(
        vec![Column::new("tipo".into(), &["parque"])],
        vec![rect(-1.0, -1.0, 11.0, 11.0)],
    );

    let result = prepare_tracts(&tracts(), Some(&vegetation), None, None).unwrap();

    assert_eq!(strings(&result, "cd_setor"), vec![Some("355030801000002".into())]);
}

#[test]
fn empty_vegetation_layer_changes_nothing() {
    let vegetation = Layer::from_geoms(Vec::new(), Some(EPSG));

    let result = prepare_tracts(&tracts(), Some(&vegetation), None, None).unwrap();

    assert_eq!(areas(&result), vec![100.0, 100.0]);
}

#[test]
fn empty_street_blocks_give_an_empty_result() {
    let blocks = Layer::from_geoms(Vec::new(), Some(EPSG));

    let result = prepare_tracts(&tracts(), None, Some(&blocks), None).unwrap();

    assert!(result.is_empty());
    assert_eq!(result.column_names(), vec!["cd_setor", "situacao", ADJUSTED_AREA_COLUMN]);
}

#[test]
fn blocks_clip_and_dissolve_to_one_record_per_tract() {
    let vegetation = layer(
        vec![Column::new("tipo".into(), &["mata"])],
        vec![rect(0.0, 0.0, 20.0, 2.0)],
    );
    // two blocks inside the first tract, one block straddling both tracts
    let blocks = layer(
        vec![Column::new("cd_quadra".into(), &["q1", "q2", "q3"])],
        vec![rect(0.0, 0.0, 4.0, 10.0), rect(6.0, 0.0, 9.0, 10.0), rect(9.0, 0.0, 15.0, 10.0)],
    );

    let result = prepare_tracts(&tracts(), Some(&vegetation), Some(&blocks), Some("cd_setor")).unwrap();

    assert_eq!(result.len(), 2);
    // block attributes do not leak into the prepared tracts
    assert_eq!(result.column_names(), vec!["cd_setor", "situacao", ADJUSTED_AREA_COLUMN]);
    assert_eq!(
        strings(&result, "cd_setor"),
        vec![Some("355030801000001".into()), Some("355030801000002".into())]
    );
    let areas = areas(&result);
    // first tract: x in [0,4] and [6,10], y in [2,10]
    assert_relative_eq!(areas[0], 64.0, epsilon = 1e-9);
    // second tract: x in [10,15], y in [2,10]
    assert_relative_eq!(areas[1], 40.0, epsilon = 1e-9);
    assert_relative_eq!(result.areas()[0], areas[0], epsilon = 1e-9);
}

#[test]
fn tract_id_defaults_to_the_first_column() {
    let blocks = layer(
        vec![Column::new("cd_quadra".into(), &["q1"])],
        vec![rect(0.0, 0.0, 20.0, 10.0)],
    );

    let result = prepare_tracts(&tracts(), None, Some(&blocks), None).unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(areas(&result), vec![100.0, 100.0]);
}

#[test]
fn unknown_tract_id_is_rejected() {
    let blocks = layer(
        vec![Column::new("cd_quadra".into(), &["q1"])],
        vec![rect(0.0, 0.0, 20.0, 10.0)],
    );

    let err = prepare_tracts(&tracts(), None, Some(&blocks), Some("cd_setor_censitario")).unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn crs_mismatch_is_rejected() {
    let vegetation = Layer::from_geoms(vec![rect(0.0, 0.0, 1.0, 1.0)], Some(4326));

    let err = prepare_tracts(&tracts(), Some(&vegetation), None, None).unwrap_err();

    assert!(matches!(err, Error::GeometryMismatch { .. }));
}
