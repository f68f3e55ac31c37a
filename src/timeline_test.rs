// Unit tests for the capture timeline math

use super::*;
use pretty_assertions::assert_eq;

fn phases(durations_ms: &[(&str, u64)]) -> Vec<AnimationPhase> {
    durations_ms
        .iter()
        .map(|(name, ms)| AnimationPhase::new(name, Duration::from_millis(*ms)))
        .collect()
}

fn capture(phase: &str, fraction: f64) -> PhaseCapture {
    PhaseCapture {
        phase: phase.to_string(),
        fraction,
        target: CaptureTarget::viewport(),
        path: PathBuf::from(format!("shots/{}.png", phase)),
    }
}

fn three_phase_plan() -> CapturePlan {
    let phases = phases(&[("split", 1000), ("merge", 800), ("return", 700)]);
    let captures = vec![
        capture("split", 0.5),
        capture("merge", 0.5),
        capture("return", 0.5),
    ];
    CapturePlan::build(&phases, &captures).unwrap()
}

#[test]
fn test_target_offsets_accumulate_phase_starts() {
    let plan = three_phase_plan();

    let starts: Vec<u64> = plan
        .captures
        .iter()
        .map(|c| c.phase_start.as_millis() as u64)
        .collect();
    let targets: Vec<u64> = plan
        .captures
        .iter()
        .map(|c| c.target_offset.as_millis() as u64)
        .collect();

    assert_eq!(starts, vec![0, 1000, 1800]);
    assert_eq!(targets, vec![500, 1400, 2150]);
}

#[test]
fn test_waits_shrink_by_measured_elapsed_time() {
    let plan = three_phase_plan();

    // Each capture instant landing exactly on target leaves the next wait
    // at the gap between targets
    assert_eq!(
        wait_before(plan.captures[0].target_offset, Duration::ZERO),
        Duration::from_millis(500)
    );
    assert_eq!(
        wait_before(plan.captures[1].target_offset, Duration::from_millis(500)),
        Duration::from_millis(900)
    );
    assert_eq!(
        wait_before(plan.captures[2].target_offset, Duration::from_millis(1400)),
        Duration::from_millis(750)
    );
}

#[test]
fn test_slow_capture_shortens_the_next_wait() {
    let plan = three_phase_plan();

    // The first capture took 300ms of its own; the second wait absorbs it
    let slot = CapturePlan::slot_for(&plan.captures[1], Duration::from_millis(800));
    assert_eq!(slot.wait, Duration::from_millis(600));
    assert!(!slot.late);
}

#[test]
fn test_late_capture_gets_zero_wait_and_is_flagged() {
    let plan = three_phase_plan();

    let slot = CapturePlan::slot_for(&plan.captures[1], Duration::from_millis(1500));
    assert_eq!(slot.wait, Duration::ZERO);
    assert!(slot.late);
}

#[test]
fn test_exactly_on_target_is_not_late() {
    let plan = three_phase_plan();

    let slot = CapturePlan::slot_for(&plan.captures[0], Duration::from_millis(500));
    assert_eq!(slot.wait, Duration::ZERO);
    assert!(!slot.late);
}

#[test]
fn test_wait_before_never_goes_negative() {
    assert_eq!(
        wait_before(Duration::from_millis(100), Duration::from_millis(100_000)),
        Duration::ZERO
    );
}

#[test]
fn test_shuffle_defaults_resolve() {
    // The animation the harness was built for: split 1600 / merge 1300 /
    // return 1000, captured at three quarters of each phase
    let phases = phases(&[("split", 1600), ("merge", 1300), ("return", 1000)]);
    let captures = vec![
        capture("split", 0.75),
        capture("merge", 0.75),
        capture("return", 0.75),
    ];
    let plan = CapturePlan::build(&phases, &captures).unwrap();

    let targets: Vec<u64> = plan
        .captures
        .iter()
        .map(|c| c.target_offset.as_millis() as u64)
        .collect();
    assert_eq!(targets, vec![1200, 2575, 3650]);
}

#[test]
fn test_subset_of_phases_is_allowed() {
    let phases = phases(&[("split", 1000), ("merge", 800), ("return", 700)]);
    let captures = vec![capture("split", 0.5), capture("return", 0.5)];
    let plan = CapturePlan::build(&phases, &captures).unwrap();

    assert_eq!(plan.captures.len(), 2);
    assert_eq!(plan.captures[1].phase_index, 2);
    assert_eq!(plan.captures[1].target_offset, Duration::from_millis(2150));
}

#[test]
fn test_build_rejects_unknown_phase() {
    let phases = phases(&[("split", 1000)]);
    let err = CapturePlan::build(&phases, &[capture("collapse", 0.5)]).unwrap_err();
    assert!(err.to_string().contains("unknown phase 'collapse'"));
}

#[test]
fn test_build_rejects_out_of_order_captures() {
    let phases = phases(&[("split", 1000), ("merge", 800)]);
    let captures = vec![capture("merge", 0.5), capture("split", 0.5)];
    let err = CapturePlan::build(&phases, &captures).unwrap_err();
    assert!(err.to_string().contains("ascending phase order"));
}

#[test]
fn test_build_rejects_duplicate_phase() {
    let phases = phases(&[("split", 1000), ("merge", 800)]);
    let captures = vec![capture("split", 0.25), capture("split", 0.75)];
    assert!(CapturePlan::build(&phases, &captures).is_err());
}

#[test]
fn test_build_rejects_fraction_outside_open_interval() {
    let phases = phases(&[("split", 1000)]);
    assert!(CapturePlan::build(&phases, &[capture("split", 0.0)]).is_err());
    assert!(CapturePlan::build(&phases, &[capture("split", 1.0)]).is_err());
    assert!(CapturePlan::build(&phases, &[capture("split", 1.5)]).is_err());
    assert!(CapturePlan::build(&phases, &[capture("split", -0.1)]).is_err());
}

#[test]
fn test_empty_captures_build_an_empty_plan() {
    let phases = phases(&[("split", 1000)]);
    let plan = CapturePlan::build(&phases, &[]).unwrap();
    assert!(plan.captures.is_empty());
}

#[test]
fn test_plan_summary_snapshot() {
    let plan = three_phase_plan();
    let summary: Vec<String> = plan
        .captures
        .iter()
        .map(|c| {
            format!(
                "{} (phase {}) starts {}ms, capture at {}ms",
                c.phase,
                c.phase_index,
                c.phase_start.as_millis(),
                c.target_offset.as_millis()
            )
        })
        .collect();

    insta::assert_json_snapshot!(summary, @r###"
    [
      "split (phase 0) starts 0ms, capture at 500ms",
      "merge (phase 1) starts 1000ms, capture at 1400ms",
      "return (phase 2) starts 1800ms, capture at 2150ms"
    ]
    "###);
}
