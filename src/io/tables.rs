use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;

use crate::io::open_maybe_gz;
use crate::scores::cycle_series::{HistoricalTable, HistoryRow};
use crate::scores::{CohortSample, RawValue, TrendSample};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %I:%M:%S %p",
];

/// Rows read from one table plus any lines that were skipped.
#[derive(Debug, Clone)]
pub struct ParsedTable<T> {
    pub rows: Vec<T>,
    pub warnings: Vec<String>,
}

impl<T> Default for ParsedTable<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Non-empty, non-comment lines with their 1-based line numbers. Trailing
/// line breaks are removed but tabs are kept so empty cells survive.
fn data_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let reader = open_maybe_gz(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = BufReader::new(reader);
    let mut out = Vec::new();
    let mut line = String::new();
    let mut line_no = 0usize;
    while reader.read_line(&mut line)? > 0 {
        line_no += 1;
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            out.push((line_no, content.to_string()));
        }
        line.clear();
    }
    Ok(out)
}

fn is_header(first_cell: &str, name: &str) -> bool {
    first_cell.trim().eq_ignore_ascii_case(name)
}

/// `site_id quantity_id cycle_id value`. An optional header row is skipped.
pub fn read_cohort(path: &Path) -> Result<ParsedTable<CohortSample>> {
    let source = path.display().to_string();
    let mut table = ParsedTable::default();
    for (line_no, line) in data_lines(path)? {
        let parts: Vec<&str> = line.split('\t').collect();
        if is_header(parts[0], "site_id") {
            continue;
        }
        if parts.len() < 3 || parts.len() > 4 {
            bail!(
                "{}:{} cohort rows need 4 columns, got {}",
                source,
                line_no,
                parts.len()
            );
        }
        let value = parts.get(3).map(|c| RawValue::parse(c)).unwrap_or(RawValue::Absent);
        let sample = CohortSample {
            site_id: parts[0].trim().to_string(),
            quantity_id: parts[1].trim().to_string(),
            cycle_id: parts[2].trim().to_string(),
            value,
        };
        if sample.site_id.is_empty() || sample.quantity_id.is_empty() || sample.cycle_id.is_empty() {
            table
                .warnings
                .push(format!("{}:{} row with empty id skipped", source, line_no));
            continue;
        }
        table.rows.push(sample);
    }
    Ok(table)
}

/// `site_id quantity_id <cycle...>` with a mandatory header naming the
/// cycles in order. One table per quantity, in first-seen order. Rows are
/// kept at their given width so the tracker can reject them.
pub fn read_history(path: &Path) -> Result<ParsedTable<HistoricalTable>> {
    let source = path.display().to_string();
    let lines = data_lines(path)?;
    let Some((header_no, header)) = lines.first() else {
        return Ok(ParsedTable::default());
    };
    let head: Vec<&str> = header.split('\t').map(str::trim).collect();
    if head.len() < 3 || !is_header(head[0], "site_id") || !is_header(head[1], "quantity_id") {
        bail!(
            "{}:{} history header must be site_id, quantity_id, then cycle ids",
            source,
            header_no
        );
    }
    let cycles: Vec<String> = head[2..].iter().map(|c| c.to_string()).collect();

    let mut table = ParsedTable::default();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (line_no, line) in lines.iter().skip(1) {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 2 {
            bail!("{}:{} history row needs site_id and quantity_id", source, line_no);
        }
        let site_id = parts[0].trim().to_string();
        let quantity_id = parts[1].trim().to_string();
        let values: Vec<RawValue> = parts[2..].iter().map(|c| RawValue::parse(c)).collect();
        let slot = *index.entry(quantity_id.clone()).or_insert_with(|| {
            table.rows.push(HistoricalTable {
                quantity_id,
                cycles: cycles.clone(),
                rows: Vec::new(),
            });
            table.rows.len() - 1
        });
        table.rows[slot].rows.push(HistoryRow { site_id, values });
    }
    Ok(table)
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// `patient_id metric timestamp value within_limits comment`. Readings with
/// a non-numeric value are skipped with a warning.
pub fn read_vitals(path: &Path) -> Result<ParsedTable<TrendSample>> {
    let source = path.display().to_string();
    let mut table = ParsedTable::default();
    for (line_no, line) in data_lines(path)? {
        let parts: Vec<&str> = line.split('\t').collect();
        if is_header(parts[0], "patient_id") {
            continue;
        }
        if parts.len() < 5 {
            bail!(
                "{}:{} vitals rows need at least 5 columns, got {}",
                source,
                line_no,
                parts.len()
            );
        }
        let timestamp = parse_timestamp(parts[2]).with_context(|| {
            format!("{}:{} invalid timestamp '{}'", source, line_no, parts[2].trim())
        })?;
        let Some(value) = RawValue::parse(parts[3]).as_number() else {
            table.warnings.push(format!(
                "{}:{} non-numeric reading '{}' skipped",
                source,
                line_no,
                parts[3].trim()
            ));
            continue;
        };
        table.rows.push(TrendSample {
            patient_id: parts[0].trim().to_string(),
            metric: parts[1].trim().to_string(),
            timestamp,
            value,
            within_limits: !parts[4].trim().eq_ignore_ascii_case("no"),
            comment: parts.get(5).map(|c| c.trim().to_string()).unwrap_or_default(),
        });
    }
    Ok(table)
}
