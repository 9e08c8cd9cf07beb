// Integration tests for the risk-area/subprefecture mapper:
//   grade filtering, composite identifiers, column layout and error cases.

mod common;

use common::*;
use polars::prelude::*;
use urbdata::{prepare_risk_area, Error, Layer, RiskAreaOptions, COMPOSITE_ID_COLUMN};

fn risk_areas() -> Layer {
    layer(
        vec![
            Column::new("id_risco".into(), &[Some("R1"), Some("R2"), Some("R3"), None]),
            Column::new("grau_risco_2020".into(), &["R4 - Muito Alto", "r4 muito alto", "R1 - Baixo", "R4"]),
            Column::new("area_m2".into(), &[20.0, 4.0, 4.0, 1.0]),
        ],
        vec![
            // straddles both subprefectures
            rect(8.0, 0.0, 12.0, 5.0),
            rect(12.0, 1.0, 14.0, 3.0),
            rect(1.0, 1.0, 3.0, 3.0),
            rect(4.0, 4.0, 5.0, 5.0),
        ],
    )
}

fn subprefeituras() -> Layer {
    layer(
        vec![
            Column::new("sg_subprefeitura".into(), &["LA", "PI"]),
            Column::new("nm_subprefeitura".into(), &["LAPA", "PINHEIROS"]),
            Column::new("cd_subprefeitura".into(), &[9i64, 11]),
        ],
        vec![rect(0.0, 0.0, 10.0, 10.0), rect(10.0, 0.0, 20.0, 10.0)],
    )
}

fn options() -> RiskAreaOptions {
    RiskAreaOptions::new("grau_risco", "R4")
}

#[test]
fn active_areas_get_one_record_per_subprefecture() {
    let result = prepare_risk_area(&risk_areas(), &subprefeituras(), &options()).unwrap();

    assert_eq!(
        strings(&result, COMPOSITE_ID_COLUMN),
        vec![
            Some("R1.subpref.LA".into()),
            Some("R1.subpref.PI".into()),
            Some("R2.subpref.PI".into()),
            None,
        ]
    );
    let areas = result.areas();
    assert_eq!(areas[0], 10.0);
    assert_eq!(areas[1], 10.0);
}

#[test]
fn composite_id_comes_first_then_risk_then_subprefecture_columns() {
    let opts = options().with_subprefeitura_additional_cols(["nm_subprefeitura", "geometry", "sg_subprefeitura"]);

    let result = prepare_risk_area(&risk_areas(), &subprefeituras(), &opts).unwrap();

    assert_eq!(
        result.column_names(),
        vec![COMPOSITE_ID_COLUMN, "id_risco", "grau_risco_2020", "area_m2", "sg_subprefeitura", "nm_subprefeitura"]
    );
}

#[test]
fn explicit_identifier_columns() {
    let opts = options()
        .with_risk_area_id_col("id_risco")
        .with_subprefeitura_id_col("cd_subprefeitura");

    let result = prepare_risk_area(&risk_areas(), &subprefeituras(), &opts).unwrap();

    let ids = strings(&result, COMPOSITE_ID_COLUMN);
    // integer identifiers are rendered as text
    assert_eq!(ids[0].as_deref(), Some("R1.subpref.9"));
    assert_eq!(ids[2].as_deref(), Some("R2.subpref.11"));
    assert_eq!(
        result.column_names(),
        vec![COMPOSITE_ID_COLUMN, "id_risco", "grau_risco_2020", "area_m2", "cd_subprefeitura"]
    );
}

#[test]
fn null_grades_are_inactive() {
    let risk = layer(
        vec![
            Column::new("id_risco".into(), &["R1", "R2"]),
            Column::new("grau_risco_2020".into(), &[None, Some("R4 - Muito Alto")]),
        ],
        vec![rect(1.0, 1.0, 3.0, 3.0), rect(12.0, 1.0, 14.0, 3.0)],
    );

    let result = prepare_risk_area(&risk, &subprefeituras(), &options()).unwrap();

    assert_eq!(strings(&result, COMPOSITE_ID_COLUMN), vec![Some("R2.subpref.PI".into())]);
}

#[test]
fn no_active_grade_gives_an_empty_layer() {
    let opts = RiskAreaOptions::new("grau_risco", "R3");

    let result = prepare_risk_area(&risk_areas(), &subprefeituras(), &opts).unwrap();

    assert!(result.is_empty());
    assert_eq!(result.column_names()[0], COMPOSITE_ID_COLUMN);
}

#[test]
fn grade_column_must_exist_once() {
    let err = prepare_risk_area(&risk_areas(), &subprefeituras(), &RiskAreaOptions::new("GRAU", "R4")).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = prepare_risk_area(&risk_areas(), &subprefeituras(), &RiskAreaOptions::new("_", "R4")).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn unknown_additional_column_is_rejected() {
    let opts = options().with_subprefeitura_additional_cols(["populacao"]);

    let err = prepare_risk_area(&risk_areas(), &subprefeituras(), &opts).unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn crs_mismatch_is_rejected() {
    let (geoms, data, _) = subprefeituras().into_parts();
    let subprefs = Layer::new(geoms, data, None).unwrap();

    let err = prepare_risk_area(&risk_areas(), &subprefs, &options()).unwrap_err();

    assert!(matches!(err, Error::GeometryMismatch { .. }));
}
