use std::fs;

use kira_peerqc::error::EngineError;
use kira_peerqc::rules::{
    CenterStatistic, MAX_PRECISION, ThresholdMode, load_builtin, load_rules_tsv,
    load_with_overlay, merge_rules, parse_rules_tsv,
};
use kira_peerqc::scores::RawValue;
use tempfile::TempDir;

const HEADER: &str = "#quantity_id\tdisplay_name\tunits\tcenter\tthreshold\tthreshold_mode\tbelow_delta\tabove_fraction\tprecision\tcenter_precision\tcensored_substitute\tlower_quantile\tupper_quantile\twhisker\talp_note\n";

#[test]
fn builtin_table_covers_every_program() {
    let table = load_builtin().unwrap();
    assert_eq!(table.version, "v1");
    assert_eq!(table.len(), 42);
    assert_eq!(
        table.programs(),
        vec!["istat", "epoc", "lipids", "wbc", "single"]
    );

    let istat = table.get("istat.na").unwrap();
    assert_eq!(istat.center, CenterStatistic::Mean);
    assert_eq!(istat.center_precision, Some(2));
    let wcc = table.get("wbc.wcc").unwrap();
    assert_eq!(wcc.threshold_mode, ThresholdMode::AtOrAbove);
    assert!(table.get("istat.ph").unwrap().threshold.is_infinite());
}

#[test]
fn unknown_quantity_is_reported() {
    let table = load_builtin().unwrap();
    assert_eq!(
        table.get("epoc.xyz").unwrap_err(),
        EngineError::UnknownQuantity("epoc.xyz".to_string())
    );
}

#[test]
fn troponin_below_detection_maps_to_substitute() {
    let table = load_builtin().unwrap();
    let trop = table.get("single.troponin").unwrap();
    assert_eq!(trop.coerce(&RawValue::parse("<40")), Some(39.0));
    assert_eq!(trop.coerce(&RawValue::parse("55")), Some(55.0));
    assert_eq!(trop.coerce(&RawValue::parse("")), None);

    let crp = table.get("single.crp").unwrap();
    assert_eq!(crp.coerce(&RawValue::parse("<5")), None);
    assert_eq!(crp.coerce(&RawValue::parse("n/a")), None);
}

#[test]
fn overlay_replaces_in_place_and_appends_new_ids() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("rules.tsv");
    let content = format!(
        "{}epoc.na\tSodium\tmmol/L\tmean\t150\t>=\t4\t0.02\t1\t-\t-\t0.15\t0.85\t1.5\tlocal\nlocal.x\tX\t-\tmedian\t10\t>\t1\t0.1\t2\t-\t-\t0.1\t0.9\t2\tnew\n",
        HEADER
    );
    fs::write(&path, content).unwrap();

    let user = load_rules_tsv(&path).unwrap();
    assert_eq!(user.len(), 2);

    let table = load_with_overlay(Some(&path)).unwrap();
    assert_eq!(table.len(), 43);
    let na = table.get("epoc.na").unwrap();
    assert_eq!(na.center, CenterStatistic::Mean);
    assert_eq!(na.below_delta, 4.0);
    assert_eq!(table.rules()[15].id, "epoc.na");
    assert_eq!(table.rules().last().unwrap().id, "local.x");
    assert_eq!(table.get("local.x").unwrap().outlier.whisker, 2.0);
}

#[test]
fn merge_keeps_builtin_order() {
    let builtin = load_builtin().unwrap().rules().to_vec();
    let mut replaced = builtin[2].clone();
    replaced.precision = 4;
    let merged = merge_rules(builtin.clone(), vec![replaced]);
    assert_eq!(merged.len(), builtin.len());
    assert_eq!(merged[2].precision, 4);
    assert_eq!(merged[3], builtin[3]);
}

#[test]
fn malformed_rows_are_rejected() {
    let short = format!("{}epoc.na\tSodium\tmmol/L\tmedian\n", HEADER);
    let err = parse_rules_tsv(&short, "test").unwrap_err();
    assert!(err.to_string().contains("expected 16 columns"));

    let dup = format!(
        "{h}a.b\tB\t-\tmedian\t1\t>\t1\t0.1\t1\t-\t-\t0.15\t0.85\t1.5\t-\na.b\tB\t-\tmedian\t1\t>\t1\t0.1\t1\t-\t-\t0.15\t0.85\t1.5\t-\n",
        h = HEADER
    );
    assert!(parse_rules_tsv(&dup, "test").unwrap_err().to_string().contains("duplicate"));

    let bad_fraction = format!(
        "{}a.b\tB\t-\tmedian\t1\t>\t1\t1.5\t1\t-\t-\t0.15\t0.85\t1.5\t-\n",
        HEADER
    );
    assert!(parse_rules_tsv(&bad_fraction, "test").is_err());

    let bad_mode = format!(
        "{}a.b\tB\t-\tmedian\t1\t=>\t1\t0.1\t1\t-\t-\t0.15\t0.85\t1.5\t-\n",
        HEADER
    );
    assert!(parse_rules_tsv(&bad_mode, "test").is_err());
}

#[test]
fn oversized_precision_is_rejected() {
    let wide = format!(
        "{}a.b\tB\t-\tmedian\t1\t>\t1\t0.1\t400\t-\t-\t0.15\t0.85\t1.5\t-\n",
        HEADER
    );
    let err = parse_rules_tsv(&wide, "test").unwrap_err();
    assert!(format!("{:#}", err).contains("precision must be at most 15"));

    let wide_center = format!(
        "{}a.b\tB\t-\tmedian\t1\t>\t1\t0.1\t2\t16\t-\t0.15\t0.85\t1.5\t-\n",
        HEADER
    );
    assert!(parse_rules_tsv(&wide_center, "test").is_err());

    let mut rule = load_builtin().unwrap().get("epoc.na").unwrap().clone();
    rule.precision = MAX_PRECISION;
    assert!(rule.validate().is_ok());
    rule.precision = MAX_PRECISION + 1;
    assert!(matches!(
        rule.validate().unwrap_err(),
        EngineError::InvalidRule { .. }
    ));
}
