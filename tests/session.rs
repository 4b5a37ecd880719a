use std::path::Path;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Gauge, Paragraph};
use tui_state_snapshots::{
    CaptureMode, CaptureOutcome, SnapshotConfig, SnapshotError, Snapshotable, Snapshoter, TestContext,
    animations_enabled,
};

struct Progress {
    percent: u16,
}

impl Snapshotable for Progress {
    fn render(&self, f: &mut Frame, area: Rect) {
        f.render_widget(Gauge::default().percent(self.percent), area);
    }

    fn viewport(&self) -> Option<(u16, u16)> {
        Some((20, 1))
    }
}

fn config_from(dir: &Path, record: bool) -> SnapshotConfig {
    let vars = [
        ("SNAPSHOT_RECORD", if record { "1" } else { "0" }.to_string()),
        ("SNAPSHOT_REFERENCE_DIR", dir.join("refs").display().to_string()),
        ("SNAPSHOT_BUNDLE_DIR", dir.join("refs").display().to_string()),
        ("SNAPSHOT_DIFF_DIR", dir.join("diffs").display().to_string()),
    ];
    SnapshotConfig::default().apply_env_overrides(|key| {
        vars.iter().find(|(name, _)| *name == key).map(|(_, value)| value.clone())
    })
}

#[test]
fn test_plain_test_records_then_compares() {
    let dir = tempfile::tempdir().unwrap();

    let mut recorder = Snapshoter::new(TestContext::current("Session"), &config_from(dir.path(), true));
    assert_eq!(recorder.mode(), CaptureMode::Record);
    let outcome = recorder.check_snapshot(&Progress { percent: 40 }).unwrap();
    assert!(matches!(outcome, CaptureOutcome::Recorded { .. }));
    let reference = dir
        .path()
        .join("refs/Session/test_plain_test_records_then_compares_Step1_20x1.snap.json");
    assert!(reference.exists());

    let mut checker = Snapshoter::new(TestContext::current("Session"), &config_from(dir.path(), false));
    let outcome = checker.check_snapshot(&Progress { percent: 40 }).unwrap();
    assert!(outcome.is_match());
    checker.assert_clean();
}

#[test]
fn test_every_step_is_checked_after_a_mismatch() {
    let dir = tempfile::tempdir().unwrap();

    let mut recorder = Snapshoter::new(TestContext::new("Session", "progress"), &config_from(dir.path(), true));
    for percent in [10, 20, 30] {
        recorder.check_snapshot(&Progress { percent }).unwrap();
    }
    assert_eq!(recorder.failures().len(), 3);

    let mut checker = Snapshoter::new(TestContext::new("Session", "progress"), &config_from(dir.path(), false));
    let outcomes: Vec<bool> = [10, 99, 30]
        .into_iter()
        .map(|percent| checker.check_snapshot(&Progress { percent }).unwrap().is_match())
        .collect();

    assert_eq!(outcomes, vec![true, false, true]);
    assert_eq!(checker.failures().len(), 1);
    assert!(
        dir.path()
            .join("diffs/Session/diff_progress_Step2_20x1.txt")
            .exists()
    );
}

#[test]
fn test_make_snapshot_reports_caller_location() {
    let mut snapshoter = Snapshoter::new(TestContext::new("Session", "location"), &SnapshotConfig::default());

    let err = Progress { percent: 5 }.make_snapshot(&mut snapshoter).unwrap_err();
    assert!(matches!(err, SnapshotError::MissingReferenceDirectory));

    let location = snapshoter.failures()[0].location.unwrap();
    assert!(location.file().ends_with("session.rs"));
}

#[test]
fn test_prepare_freezes_animations() {
    struct Spinner;

    impl Snapshotable for Spinner {
        fn render(&self, f: &mut Frame, area: Rect) {
            f.render_widget(Paragraph::new("|"), area);
        }
    }

    let mut spinner = Spinner;
    spinner.prepare_for_snapshot();
    spinner.prepare_for_snapshot();
    assert!(!animations_enabled());
}
