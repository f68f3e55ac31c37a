// Unit tests for the run executor's browserless surface

use super::*;
use crate::types::Marker;
use pretty_assertions::assert_eq;
use std::time::Duration;

fn minimal_run(phases: Vec<AnimationPhase>, captures: Vec<PhaseCapture>) -> VerificationRun {
    VerificationRun {
        name: "test".to_string(),
        url: "http://localhost:9999/".to_string(),
        profile: DeviceProfile::new(390, 844),
        browser: BrowserKind::Firefox,
        headless: true,
        ready: vec![ReadinessCondition::css("#slot-deck")],
        interactions: vec![Interaction::Click {
            marker: Marker::Css("#slot-deck".to_string()),
            force: false,
        }],
        phases,
        captures,
        navigation: NavigationPolicy::default(),
        diagnostic_path: PathBuf::from("verification/error_state.png"),
    }
}

#[tokio::test]
async fn test_execute_rejects_bad_plan_before_opening_browser() {
    // The capture references a phase the run never declares; plan validation
    // happens first, so this fails immediately without touching WebDriver.
    let run = minimal_run(
        vec![AnimationPhase::new("split", Duration::from_millis(1000))],
        vec![PhaseCapture {
            phase: "merge".to_string(),
            fraction: 0.5,
            target: CaptureTarget::viewport(),
            path: PathBuf::from("shots/merge.png"),
        }],
    );

    let started = std::time::Instant::now();
    let err = execute(&run).await.unwrap_err();
    assert!(err.to_string().contains("unknown phase 'merge'"));
    // Plan rejection must not wait on a driver handshake
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_execute_rejects_out_of_order_captures_before_opening_browser() {
    let phases = vec![
        AnimationPhase::new("split", Duration::from_millis(1000)),
        AnimationPhase::new("merge", Duration::from_millis(800)),
    ];
    let captures = vec![
        PhaseCapture {
            phase: "merge".to_string(),
            fraction: 0.5,
            target: CaptureTarget::viewport(),
            path: PathBuf::from("shots/merge.png"),
        },
        PhaseCapture {
            phase: "split".to_string(),
            fraction: 0.5,
            target: CaptureTarget::viewport(),
            path: PathBuf::from("shots/split.png"),
        },
    ];
    let err = execute(&minimal_run(phases, captures)).await.unwrap_err();
    assert!(err.to_string().contains("ascending phase order"));
}

#[tokio::test]
async fn test_execute_rejects_invalid_url_before_opening_browser() {
    let mut run = minimal_run(
        vec![AnimationPhase::new("split", Duration::from_millis(1000))],
        Vec::new(),
    );
    run.url = "not-a-url".to_string();

    let started = std::time::Instant::now();
    let err = execute(&run).await.unwrap_err();
    assert!(err.to_string().contains("invalid URL"));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_run_report_serialization() {
    let report = RunReport {
        run: "shuffle".to_string(),
        url: "http://localhost:8080/".to_string(),
        browser: BrowserKind::Firefox,
        viewport: "390x844".to_string(),
        started_at: chrono::Utc::now(),
        finished_at: chrono::Utc::now(),
        captures: vec![CaptureRecord {
            phase: "split".to_string(),
            target_offset_ms: 1200,
            actual_offset_ms: 1203,
            late: false,
            path: PathBuf::from("verification/shuffle_phase_1_split.png"),
            bytes: 48213,
        }],
    };

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["run"], "shuffle");
    assert_eq!(value["browser"], "firefox");
    assert_eq!(value["viewport"], "390x844");
    assert_eq!(value["captures"][0]["phase"], "split");
    assert_eq!(value["captures"][0]["target_offset_ms"], 1200);
    assert_eq!(value["captures"][0]["actual_offset_ms"], 1203);
    assert_eq!(value["captures"][0]["late"], false);
    assert_eq!(value["captures"][0]["bytes"], 48213);
    assert!(value["started_at"].is_string());
    assert!(value["finished_at"].is_string());
}

#[test]
fn test_capture_record_marks_late_captures() {
    let record = CaptureRecord {
        phase: "return".to_string(),
        target_offset_ms: 2150,
        actual_offset_ms: 2310,
        late: true,
        path: PathBuf::from("shots/return.png"),
        bytes: 1024,
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["late"], true);
    assert_eq!(value["path"], "shots/return.png");
}
