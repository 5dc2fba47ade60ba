use std::fs;
use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use kira_peerqc::io::tables::{ParsedTable, parse_timestamp, read_cohort, read_history, read_vitals};
use kira_peerqc::scores::TrendSample;
use kira_peerqc::scores::RawValue;
use tempfile::TempDir;

#[test]
fn cohort_reads_plain_and_gzip() {
    let tmp = TempDir::new().unwrap();
    let content = "site_id\tquantity_id\tcycle_id\tvalue\nA\tepoc.na\tEQA2401\t140\nB\tepoc.na\tEQA2401\t\nC\tsingle.troponin\tEQA2401\t<40\n";

    let plain = tmp.path().join("cohort.tsv");
    fs::write(&plain, content).unwrap();
    let gz = tmp.path().join("cohort.tsv.gz");
    let mut enc = GzEncoder::new(fs::File::create(&gz).unwrap(), Compression::default());
    enc.write_all(content.as_bytes()).unwrap();
    enc.finish().unwrap();

    for path in [&plain, &gz] {
        let table = read_cohort(path).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].value, RawValue::Number(140.0));
        assert_eq!(table.rows[1].value, RawValue::Absent);
        assert_eq!(table.rows[2].value, RawValue::Text("<40".to_string()));
    }
}

#[test]
fn cohort_rejects_wrong_width() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cohort.tsv");
    fs::write(&path, "A\tepoc.na\n").unwrap();
    assert!(read_cohort(&path).is_err());
}

#[test]
fn history_groups_rows_by_quantity() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("history.tsv");
    fs::write(
        &path,
        "# exported history\nsite_id\tquantity_id\tEQA2401\tEQA2402\tEQA2403\nA\tepoc.na\t140\t\t141\nA\tepoc.k\t4.1\t4.2\t4.0\nB\tepoc.na\t139\t140\n",
    )
    .unwrap();
    let table = read_history(&path).unwrap();
    assert_eq!(table.rows.len(), 2);
    let na = &table.rows[0];
    assert_eq!(na.quantity_id, "epoc.na");
    assert_eq!(na.cycles, vec!["EQA2401", "EQA2402", "EQA2403"]);
    assert_eq!(na.rows.len(), 2);
    assert_eq!(na.rows[0].values[1], RawValue::Absent);
    assert_eq!(na.rows[1].values.len(), 2);
    assert_eq!(table.rows[1].quantity_id, "epoc.k");
}

#[test]
fn comment_only_files_yield_empty_tables() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.tsv");
    fs::write(&path, "# nothing submitted\n\n").unwrap();

    let history = read_history(&path).unwrap();
    assert!(history.rows.is_empty());
    assert!(history.warnings.is_empty());
    assert!(read_cohort(&path).unwrap().rows.is_empty());
    assert!(read_vitals(&path).unwrap().rows.is_empty());

    let blank: ParsedTable<TrendSample> = ParsedTable::default();
    assert!(blank.rows.is_empty());
}

#[test]
fn history_requires_header() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("history.tsv");
    fs::write(&path, "A\tepoc.na\t140\n").unwrap();
    assert!(read_history(&path).is_err());
}

#[test]
fn vitals_parse_flags_and_skip_non_numeric() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("vitals.tsv");
    fs::write(
        &path,
        "patient_id\tmetric\ttimestamp\tvalue\twithin_limits\tcomment\nP1\tSystolic\t2024-03-06 08:00:00\t185\tNo\tGP called\nP1\tPulse\t2024-03-06T08:00:00\t72\tYes\nP1\tPulse\t2024-03-06 09:00:00\trefused\tYes\t\n",
    )
    .unwrap();
    let table = read_vitals(&path).unwrap();
    assert_eq!(table.rows.len(), 2);
    assert!(!table.rows[0].within_limits);
    assert_eq!(table.rows[0].comment, "GP called");
    assert!(table.rows[1].within_limits);
    assert_eq!(table.rows[1].comment, "");
    assert_eq!(table.warnings.len(), 1);
}

#[test]
fn timestamp_formats() {
    let a = parse_timestamp("2024-03-06 08:00:00").unwrap();
    let b = parse_timestamp("2024-03-06T08:00:00").unwrap();
    let c = parse_timestamp("06/03/2024 08:00:00 AM").unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert!(parse_timestamp("yesterday").is_none());
}
