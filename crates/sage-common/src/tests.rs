use crate::dispatch::DispatchResult;
use crate::identity::{series_identity, wallet_key, wallet_label};
use crate::types::{FieldValue, Insight, RuleAction, Severity, MAX_AFFECTED_SERVICES};
use crate::units::{tokens_to_wei, wei_to_tokens, RawBalance};
use std::collections::HashMap;

fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn token_balance_normalizes_to_exact_wei() {
    assert_eq!(tokens_to_wei(250.0), 250_000_000_000_000_000_000);
    assert_eq!(tokens_to_wei(0.0), 0);
}

#[test]
fn token_wei_round_trip_recovers_value() {
    for tokens in [250.0, 0.5, 12_345.678, 1.0] {
        let back = wei_to_tokens(tokens_to_wei(tokens));
        assert!((back - tokens).abs() < 1e-9 * tokens.max(1.0), "{tokens} -> {back}");
    }
}

#[test]
fn negative_tokens_saturate_to_zero_wei() {
    assert_eq!(tokens_to_wei(-5.0), 0);
}

#[test]
fn magnitude_cutoff_is_classified_as_tokens() {
    let raw = RawBalance::classify(1e12);
    assert_eq!(raw, RawBalance::Tokens(1e12));
    assert_eq!(raw.wei(), 1e30 as u128);
}

#[test]
fn just_above_cutoff_is_classified_as_wei() {
    let raw = RawBalance::classify(1e12 + 1.0);
    assert_eq!(raw, RawBalance::Wei(1_000_000_000_001));
    assert_eq!(raw.wei(), 1_000_000_000_001);
    assert!((raw.tokens() - 1.000_000_000_001e-6).abs() < 1e-15);
}

#[test]
fn wallet_label_prefers_wallet_over_address() {
    let l = labels(&[("wallet", "0xAAA"), ("address", "0xBBB")]);
    assert_eq!(wallet_label(&l), Some("0xAAA"));

    let l = labels(&[("address", "0xBBB")]);
    assert_eq!(wallet_label(&l), Some("0xBBB"));

    let l = labels(&[("wallet", ""), ("address", "0xBBB")]);
    assert_eq!(wallet_label(&l), Some("0xBBB"));

    assert_eq!(wallet_label(&labels(&[])), None);
}

#[test]
fn series_identity_falls_back_to_service_then_default() {
    assert_eq!(series_identity(&labels(&[("wallet", "0xAbC")])), "0xabc");
    assert_eq!(
        series_identity(&labels(&[("service", "treasury")])),
        "treasury"
    );
    assert_eq!(series_identity(&labels(&[])), "o2-wallet");
}

#[test]
fn wallet_key_lowercases_address() {
    assert_eq!(wallet_key("0xAbCd"), "o2-wallet:0xabcd");
}

#[test]
fn insight_truncates_affected_services_silently() {
    let affected: Vec<String> = (0..25).map(|i| format!("o2-wallet:{i}")).collect();
    let insight = Insight::new(
        "r",
        "d",
        Severity::Warning,
        RuleAction::Alert,
        0.95,
        affected,
    );
    assert_eq!(insight.affected_services.len(), MAX_AFFECTED_SERVICES);
    assert_eq!(insight.affected_services[19], "o2-wallet:19");
}

#[test]
fn insight_serializes_with_snake_case_action() {
    let insight = Insight::new(
        "hvac_offline",
        "HVAC system offline",
        Severity::Error,
        RuleAction::DispatchDrone,
        0.95,
        vec!["hvac-1".into()],
    );
    let json = serde_json::to_value(&insight).unwrap();
    assert_eq!(json["action"], "dispatch_drone");
    assert_eq!(json["severity"], "error");
    assert!(json.get("details").is_none());
}

#[test]
fn dispatch_result_serializes_with_status_tag() {
    let ok = DispatchResult::Dispatched {
        mission_id: "m-1".into(),
    };
    let json = serde_json::to_value(&ok).unwrap();
    assert_eq!(json["status"], "dispatched");
    assert_eq!(json["missionId"], "m-1");

    let failed = DispatchResult::Failed {
        error: "boom".into(),
    };
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["error"], "boom");
}

#[test]
fn field_value_numeric_view() {
    assert_eq!(FieldValue::Integer(5).as_f64(), Some(5.0));
    assert_eq!(FieldValue::Number(2.5).as_f64(), Some(2.5));
    assert_eq!(FieldValue::from("x").as_f64(), None);
    assert_eq!(FieldValue::from("x").as_text(), Some("x"));
}

#[test]
fn wei_field_serializes_as_integer() {
    let json = serde_json::to_string(&FieldValue::Integer(250_000_000_000_000_000_000)).unwrap();
    assert_eq!(json, "250000000000000000000");
}

#[test]
fn cycle_report_derives_recommendations() {
    use crate::report::{ControlStatus, Convergence, CycleReport};

    let insight = Insight::new(
        "o2_zero_balance",
        "O2 wallet balance is zero",
        Severity::Critical,
        RuleAction::Alert,
        0.95,
        vec!["o2-wallet:a".into()],
    );
    let convergence = Convergence {
        depth: 0,
        converged: false,
        deltas: Vec::new(),
    };
    let report = CycleReport::new(ControlStatus::Down, 0.0, convergence, vec![insight]);

    assert_eq!(report.control_coherence, 0.0);
    assert_eq!(report.recommendations.len(), 1);
    assert_eq!(report.recommendations[0].rule, "o2_zero_balance");
    assert_eq!(report.recommendations[0].severity, Severity::Critical);
}

#[test]
fn heartbeat_body_shape() {
    use crate::report::{ControlStatus, Convergence, CycleReport, Heartbeat};
    use chrono::TimeZone;

    let report = CycleReport::new(
        ControlStatus::Up,
        1.0,
        Convergence {
            depth: 1,
            converged: true,
            deltas: vec![0.0],
        },
        Vec::new(),
    );
    let at = chrono::Utc.timestamp_millis_opt(1_700_000_000_500).unwrap();
    let body = serde_json::to_string(&Heartbeat::new(&report, at)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(value["type"], "sage_heartbeat");
    assert_eq!(value["timestamp"], 1_700_000_000.5);
    assert_eq!(value["insights"]["control_api"], "up");
    assert_eq!(value["insights"]["convergence"]["converged"], true);
    assert!(value["insights"]["recommendations"].as_array().unwrap().is_empty());
}
