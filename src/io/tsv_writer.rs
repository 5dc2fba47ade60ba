use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::engine::EvaluationOutcome;
use crate::scores::{CycleScore, TrendDirection, TrendPresence};

fn create(path: &Path) -> Result<BufWriter<std::fs::File>> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

pub fn write_classifications(path: &Path, outcome: &EvaluationOutcome) -> Result<()> {
    let mut w = create(path)?;
    writeln!(
        w,
        "cycle_id\tquantity_id\tsite_id\tvalue\tlower_limit\tcenter\tupper_limit\tinterpretation\tis_outlier"
    )?;
    for c in &outcome.classifications {
        let range = outcome
            .ranges
            .iter()
            .find(|r| r.cycle_id == c.cycle_id && r.quantity_id == c.quantity_id);
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            c.cycle_id,
            c.quantity_id,
            c.site_id,
            fmt_opt(c.value),
            fmt_opt(range.map(|r| r.lower_limit)),
            fmt_opt(range.map(|r| r.center)),
            fmt_opt(range.map(|r| r.upper_limit)),
            c.interpretation.label(),
            c.is_outlier
        )?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_zscores(path: &Path, outcome: &EvaluationOutcome) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "quantity_id\tsite_id\tcycle_id\tz_score")?;
    for series in &outcome.series {
        for r in &series.records {
            let score = match r.score {
                CycleScore::Score(z) => format!("{:.4}", z),
                CycleScore::NoSubmission => "No submission".to_string(),
            };
            writeln!(w, "{}\t{}\t{}\t{}", r.quantity_id, r.site_id, r.cycle_id, score)?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn write_trends(path: &Path, outcome: &EvaluationOutcome) -> Result<()> {
    let mut w = create(path)?;
    writeln!(w, "patient_id\tmetric\ttrend\tdirection\tp_value\tdays_available")?;
    for t in &outcome.trends {
        let trend = match t.trend {
            TrendPresence::Detected => "Detected",
            TrendPresence::Absent => "Absent",
        };
        let direction = match t.direction {
            TrendDirection::Upwards => "Upwards",
            TrendDirection::Downwards => "Downwards",
            TrendDirection::None => "",
        };
        let p_value = t.p_value.map(|p| format!("{:.4}", p)).unwrap_or_default();
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}",
            t.patient_id, t.metric, trend, direction, p_value, t.days_available
        )?;
    }
    w.flush()?;
    Ok(())
}
