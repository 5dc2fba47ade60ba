use chrono::NaiveDate;
use kira_peerqc::background::spawn_evaluation;
use kira_peerqc::ctx::EvalRequest;
use kira_peerqc::engine::{EvalInputs, evaluate};
use kira_peerqc::error::EngineError;
use kira_peerqc::rules::load_builtin;
use kira_peerqc::scores::cycle_series::{HistoricalTable, HistoryRow};
use kira_peerqc::scores::{CohortSample, RawValue};

fn inputs() -> EvalInputs {
    let cohort = [("A", 140.0), ("B", 141.0), ("C", 139.0)]
        .iter()
        .map(|(site, v)| CohortSample {
            site_id: site.to_string(),
            quantity_id: "epoc.na".to_string(),
            cycle_id: "EQA2401".to_string(),
            value: RawValue::Number(*v),
        })
        .collect();
    let history = vec![HistoricalTable {
        quantity_id: "epoc.na".to_string(),
        cycles: vec!["EQA2401".to_string(), "EQA2402".to_string()],
        rows: vec![
            HistoryRow {
                site_id: "A".to_string(),
                values: vec![RawValue::Number(140.0), RawValue::Absent],
            },
            HistoryRow {
                site_id: "B".to_string(),
                values: vec![RawValue::Number(141.0), RawValue::Number(142.0)],
            },
        ],
    }];
    EvalInputs {
        cohort,
        history,
        vitals: Vec::new(),
    }
}

fn request() -> EvalRequest {
    EvalRequest::new(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap())
}

#[test]
fn background_result_matches_direct_evaluation() {
    let rules = load_builtin().unwrap();
    let direct = evaluate(&request(), &inputs(), &rules).unwrap();
    let handle = spawn_evaluation(request(), inputs(), rules);
    let waited = handle.wait().unwrap();
    assert_eq!(direct, waited);
    assert_eq!(waited.ranges.len(), 1);
    assert_eq!(waited.series.len(), 2);
}

#[test]
fn errors_are_delivered_through_wait() {
    let mut req = request();
    req.selected_cycle = Some("EQA2499".to_string());
    let handle = spawn_evaluation(req, inputs(), load_builtin().unwrap());
    assert_eq!(
        handle.wait().unwrap_err(),
        EngineError::UnknownCycle("EQA2499".to_string())
    );
}

#[test]
fn try_wait_eventually_yields() {
    let handle = spawn_evaluation(request(), inputs(), load_builtin().unwrap());
    let result = loop {
        if let Some(result) = handle.try_wait() {
            break result;
        }
        std::thread::yield_now();
    };
    assert!(result.is_ok());
}
