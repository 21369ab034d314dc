use crate::channels::webhook::WebhookChannel;
use crate::drone::{default_waypoints, HttpDroneDispatcher, MissionRequest};
use crate::error::{NotifyError, Result};
use crate::heartbeat::{HeartbeatSink, HttpHeartbeat};
use crate::manager::{format_alert_message, should_notify, ActionDispatcher};
use crate::NotificationChannel;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use sage_common::dispatch::{DispatchRequest, DispatchResult, DroneDispatcher};
use sage_common::report::{ControlStatus, Convergence, CycleReport};
use sage_common::types::{FieldValue, Insight, InsightDetails, RuleAction, Severity};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

type Captured = Arc<Mutex<Vec<Value>>>;

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn closed_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Records every JSON body posted to `path` and answers with `status`.
fn capturing_server(path: &str, status: StatusCode) -> (Router, Captured) {
    let captured: Captured = Arc::default();
    let app = Router::new()
        .route(
            path,
            post(
                move |State(seen): State<Captured>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    status
                },
            ),
        )
        .with_state(captured.clone());
    (app, captured)
}

fn insight(rule: &str, severity: Severity, action: RuleAction) -> Insight {
    Insight::new(
        rule,
        "O2 wallet balance critically low",
        severity,
        action,
        0.95,
        vec!["o2-wallet:a".into(), "o2-wallet:b".into()],
    )
}

fn report(insights: Vec<Insight>) -> CycleReport {
    CycleReport::new(
        ControlStatus::Up,
        1.0,
        Convergence {
            depth: 0,
            converged: false,
            deltas: Vec::new(),
        },
        insights,
    )
}

#[derive(Default)]
struct RecordingChannel {
    sent: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl NotificationChannel for Arc<RecordingChannel> {
    async fn send(&self, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(NotifyError::ApiError {
                service: "test".into(),
                status: 500,
                body: String::new(),
            });
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

#[derive(Default)]
struct RecordingSink {
    beats: Mutex<usize>,
    fail: bool,
}

#[async_trait]
impl HeartbeatSink for Arc<RecordingSink> {
    async fn beat(&self, _report: &CycleReport) -> Result<()> {
        *self.beats.lock().unwrap() += 1;
        if self.fail {
            return Err(NotifyError::NotConfigured("control API"));
        }
        Ok(())
    }
}

// --- formatting and routing ---

#[test]
fn alert_message_lists_every_field() {
    let msg = format_alert_message(&insight("o2_low_balance", Severity::Warning, RuleAction::Alert));
    assert!(msg.contains("*Severity:* WARNING"));
    assert!(msg.contains("*Rule:* o2_low_balance"));
    assert!(msg.contains("*Description:* O2 wallet balance critically low"));
    assert!(msg.contains("*Affected Services:* o2-wallet:a, o2-wallet:b"));
    assert!(msg.contains("*Confidence:* 95%"));
}

#[test]
fn only_alert_actions_at_warning_or_above_notify() {
    assert!(should_notify(&insight("r", Severity::Warning, RuleAction::Alert)));
    assert!(should_notify(&insight("r", Severity::Critical, RuleAction::Alert)));
    assert!(!should_notify(&insight("r", Severity::Info, RuleAction::Alert)));
    assert!(!should_notify(&insight("r", Severity::Critical, RuleAction::Log)));
    assert!(!should_notify(&insight("r", Severity::Critical, RuleAction::DispatchDrone)));
}

#[tokio::test]
async fn dispatcher_routes_insights_and_sends_heartbeat() {
    let channel = Arc::new(RecordingChannel::default());
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = ActionDispatcher::new(Box::new(channel.clone()), Box::new(sink.clone()));

    let outcome = dispatcher
        .act(&report(vec![
            insight("o2_low_balance", Severity::Warning, RuleAction::Alert),
            insight("coherence_declining", Severity::Warning, RuleAction::Log),
            insight("hvac_temp_critical", Severity::Critical, RuleAction::DispatchDrone),
            insight("quiet", Severity::Info, RuleAction::Alert),
        ]))
        .await;

    assert_eq!(outcome.notified, 1);
    assert_eq!(outcome.notify_failures, 0);
    assert!(outcome.heartbeat_sent);
    assert_eq!(channel.sent.lock().unwrap().len(), 1);
    assert_eq!(*sink.beats.lock().unwrap(), 1);
}

#[tokio::test]
async fn heartbeat_is_sent_for_empty_cycles() {
    let channel = Arc::new(RecordingChannel::default());
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = ActionDispatcher::new(Box::new(channel.clone()), Box::new(sink.clone()));

    let outcome = dispatcher.act(&report(Vec::new())).await;
    assert!(outcome.heartbeat_sent);
    assert!(channel.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transport_failures_do_not_stop_the_dispatcher() {
    let channel = Arc::new(RecordingChannel {
        fail: true,
        ..Default::default()
    });
    let sink = Arc::new(RecordingSink {
        fail: true,
        ..Default::default()
    });
    let dispatcher = ActionDispatcher::new(Box::new(channel.clone()), Box::new(sink.clone()));

    let outcome = dispatcher
        .act(&report(vec![
            insight("a", Severity::Error, RuleAction::Alert),
            insight("b", Severity::Critical, RuleAction::Alert),
        ]))
        .await;

    assert_eq!(outcome.notify_failures, 2);
    assert_eq!(channel.sent.lock().unwrap().len(), 2);
    assert!(!outcome.heartbeat_sent);
}

#[tokio::test]
async fn disabled_webhook_is_not_a_failure() {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = ActionDispatcher::new(Box::new(WebhookChannel::new("")), Box::new(sink));

    let outcome = dispatcher
        .act(&report(vec![insight("a", Severity::Critical, RuleAction::Alert)]))
        .await;
    assert_eq!(outcome.notified, 0);
    assert_eq!(outcome.notify_failures, 0);
}

// --- webhook channel ---

#[tokio::test]
async fn webhook_posts_text_field() {
    let (app, captured) = capturing_server("/hook", StatusCode::OK);
    let addr = spawn_server(app).await;
    let channel = WebhookChannel::new(format!("http://{addr}/hook"));

    channel.send("hello").await.unwrap();

    let bodies = captured.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0], serde_json::json!({"text": "hello"}));
}

#[tokio::test]
async fn webhook_reports_non_success_without_retry() {
    let (app, captured) = capturing_server("/hook", StatusCode::INTERNAL_SERVER_ERROR);
    let addr = spawn_server(app).await;
    let channel = WebhookChannel::new(format!("http://{addr}/hook"));

    let err = channel.send("hello").await.unwrap_err();
    assert!(matches!(err, NotifyError::ApiError { status: 500, .. }));
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn webhook_connection_failure_is_an_error() {
    let addr = closed_port().await;
    let channel = WebhookChannel::new(format!("http://{addr}/hook"));
    assert!(matches!(
        channel.send("hello").await,
        Err(NotifyError::HttpError(_))
    ));
}

// --- drone dispatcher ---

fn hvac_request(severity: Severity) -> DispatchRequest {
    DispatchRequest {
        entity: "hvac-1".into(),
        rule_id: "hvac_temp_critical".into(),
        description: "HVAC temperature critically high".into(),
        severity,
    }
}

#[test]
fn mission_request_uses_camel_case() {
    let mission = MissionRequest::from_dispatch(
        &hvac_request(Severity::Critical),
        default_waypoints(),
        1_700_000_000,
    );
    let value = serde_json::to_value(&mission).unwrap();

    assert_eq!(value["missionId"], "sage-hvac-1-1700000000");
    assert_eq!(value["priority"], 2);
    assert_eq!(value["reason"], "HVAC temperature critically high");
    assert_eq!(value["waypoints"].as_array().unwrap().len(), 3);
    assert_eq!(value["waypoints"][0]["lat"], -35.363261);

    let warning = MissionRequest::from_dispatch(&hvac_request(Severity::Warning), Vec::new(), 0);
    assert_eq!(warning.priority, 1);
}

#[tokio::test]
async fn drone_dispatch_accepted() {
    let (app, captured) = capturing_server("/api/drone/mission", StatusCode::OK);
    let addr = spawn_server(app).await;
    let dispatcher = HttpDroneDispatcher::new(format!("http://{addr}/"));

    let result = dispatcher.dispatch(&hvac_request(Severity::Critical)).await;
    match result {
        DispatchResult::Dispatched { mission_id } => {
            assert!(mission_id.starts_with("sage-hvac-1-"));
            let bodies = captured.lock().unwrap();
            assert_eq!(bodies[0]["missionId"], mission_id.as_str());
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn drone_dispatch_failure_is_reported() {
    let (app, _) = capturing_server("/api/drone/mission", StatusCode::SERVICE_UNAVAILABLE);
    let addr = spawn_server(app).await;
    let dispatcher = HttpDroneDispatcher::new(format!("http://{addr}"));

    let result = dispatcher.dispatch(&hvac_request(Severity::Error)).await;
    assert_eq!(
        result,
        DispatchResult::Failed {
            error: "HTTP 503".into()
        }
    );

    let unreachable = HttpDroneDispatcher::new(format!("http://{}", closed_port().await));
    assert!(!unreachable
        .dispatch(&hvac_request(Severity::Error))
        .await
        .is_dispatched());

    let unconfigured = HttpDroneDispatcher::new("");
    assert!(!unconfigured
        .dispatch(&hvac_request(Severity::Error))
        .await
        .is_dispatched());
}

// --- heartbeat ---

#[tokio::test]
async fn heartbeat_posts_cycle_report() {
    let (app, captured) = capturing_server("/alerts/ingest", StatusCode::OK);
    let addr = spawn_server(app).await;
    let sink = HttpHeartbeat::new(format!("http://{addr}"));

    let wei = 1_000_000u128 * 1_000_000_000_000_000_000;
    let detailed = insight("hvac_temp_critical", Severity::Critical, RuleAction::DispatchDrone)
        .with_details(InsightDetails::Infrastructure {
            value: FieldValue::Integer(wei),
            threshold: FieldValue::Number(85.0),
            dispatch_result: None,
        });
    sink.beat(&report(vec![detailed])).await.unwrap();

    let bodies = captured.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["type"], "sage_heartbeat");
    assert!(bodies[0]["timestamp"].as_f64().unwrap() > 0.0);
    assert_eq!(bodies[0]["insights"]["control_api"], "up");
    assert_eq!(
        bodies[0]["insights"]["recommendations"][0]["rule"],
        "hvac_temp_critical"
    );
}

#[tokio::test]
async fn heartbeat_without_control_api_fails_softly() {
    let sink = HttpHeartbeat::new("");
    assert!(matches!(
        sink.beat(&report(Vec::new())).await,
        Err(NotifyError::NotConfigured(_))
    ));
}
