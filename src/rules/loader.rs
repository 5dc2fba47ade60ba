use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::rules::{CenterStatistic, DerivedRatio, QuantityRule, ThresholdMode};
use crate::scores::outlier::OutlierFilter;

const COLUMNS: usize = 16;
/// Tables written before the `derived` column still load.
const COLUMNS_WITHOUT_DERIVED: usize = 15;

pub fn load_builtin_v1() -> Result<Vec<QuantityRule>> {
    let content = include_str!("../../assets/rules/quantity_rules_v1.tsv");
    parse_rules_tsv(content, "built-in v1")
}

pub fn load_rules_tsv(path: &Path) -> Result<Vec<QuantityRule>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rules TSV {}", path.display()))?;
    parse_rules_tsv(&content, &path.display().to_string())
}

/// User rules replace built-ins with the same id in place; new ids are
/// appended in their file order.
pub fn merge_rules(builtin: Vec<QuantityRule>, user: Vec<QuantityRule>) -> Vec<QuantityRule> {
    if user.is_empty() {
        return builtin;
    }
    let mut user_order = Vec::with_capacity(user.len());
    let mut user_map: HashMap<String, QuantityRule> = HashMap::new();
    for rule in user {
        if !user_map.contains_key(&rule.id) {
            user_order.push(rule.id.clone());
        }
        user_map.insert(rule.id.clone(), rule);
    }

    let mut merged = Vec::with_capacity(builtin.len() + user_map.len());
    for rule in builtin {
        match user_map.remove(&rule.id) {
            Some(user_rule) => merged.push(user_rule),
            None => merged.push(rule),
        }
    }
    for id in user_order {
        if let Some(rule) = user_map.remove(&id) {
            merged.push(rule);
        }
    }
    merged
}

pub fn parse_rules_tsv(content: &str, source: &str) -> Result<Vec<QuantityRule>> {
    let mut out = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').map(str::trim).collect();
        if parts.len() != COLUMNS && parts.len() != COLUMNS_WITHOUT_DERIVED {
            bail!(
                "{}:{} malformed TSV (expected {} columns, got {})",
                source,
                line_no,
                COLUMNS,
                parts.len()
            );
        }

        let id = parts[0];
        if id.is_empty() {
            bail!("{}:{} empty quantity id", source, line_no);
        }
        if let Some(first) = seen.get(id) {
            bail!(
                "{}:{} duplicate quantity id '{}' (first at line {})",
                source,
                line_no,
                id,
                first
            );
        }

        let center = match parts[3].to_ascii_lowercase().as_str() {
            "median" => CenterStatistic::Median,
            "mean" => CenterStatistic::Mean,
            other => bail!("{}:{} unknown center statistic '{}'", source, line_no, other),
        };
        let threshold_mode = match parts[5] {
            ">" => ThresholdMode::Above,
            ">=" => ThresholdMode::AtOrAbove,
            other => bail!("{}:{} threshold mode must be > or >=, got '{}'", source, line_no, other),
        };

        let rule = QuantityRule {
            id: id.to_string(),
            display_name: parts[1].to_string(),
            units: optional_text(parts[2]),
            center,
            threshold: number(parts[4], "threshold", source, line_no)?,
            threshold_mode,
            below_delta: number(parts[6], "below_delta", source, line_no)?,
            above_fraction: number(parts[7], "above_fraction", source, line_no)?,
            precision: parts[8]
                .parse()
                .with_context(|| format!("{}:{} invalid precision", source, line_no))?,
            center_precision: optional_u32(parts[9], source, line_no)?,
            censored_substitute: optional_f64(parts[10], "censored_substitute", source, line_no)?,
            outlier: OutlierFilter {
                lower_quantile: number(parts[11], "lower_quantile", source, line_no)?,
                upper_quantile: number(parts[12], "upper_quantile", source, line_no)?,
                whisker: number(parts[13], "whisker", source, line_no)?,
            },
            alp_note: parts[14].to_string(),
            derived: optional_ratio(parts.get(15).copied(), source, line_no)?,
        };
        rule.validate()
            .with_context(|| format!("{}:{} rejected rule", source, line_no))?;

        seen.insert(id.to_string(), line_no);
        out.push(rule);
    }

    Ok(out)
}

fn number(s: &str, field: &str, source: &str, line_no: usize) -> Result<f64> {
    s.parse::<f64>()
        .with_context(|| format!("{}:{} invalid {} '{}'", source, line_no, field, s))
}

fn optional_f64(s: &str, field: &str, source: &str, line_no: usize) -> Result<Option<f64>> {
    if s == "-" || s.is_empty() {
        return Ok(None);
    }
    number(s, field, source, line_no).map(Some)
}

fn optional_u32(s: &str, source: &str, line_no: usize) -> Result<Option<u32>> {
    if s == "-" || s.is_empty() {
        return Ok(None);
    }
    s.parse::<u32>()
        .map(Some)
        .with_context(|| format!("{}:{} invalid center_precision '{}'", source, line_no, s))
}

fn optional_ratio(s: Option<&str>, source: &str, line_no: usize) -> Result<Option<DerivedRatio>> {
    match s {
        None | Some("") | Some("-") => Ok(None),
        Some(expr) => match DerivedRatio::parse(expr) {
            Some(ratio) => Ok(Some(ratio)),
            None => bail!(
                "{}:{} derived must look like a/b or a/b*factor, got '{}'",
                source,
                line_no,
                expr
            ),
        },
    }
}

fn optional_text(s: &str) -> String {
    if s == "-" { String::new() } else { s.to_string() }
}
