use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tui_state_snapshots::{
    DynamicSuite, RuntimeTest, SnapshotConfig, Snapshoter, SuiteRunner, TestFn, UnitOrigin, list_dynamic_tests, test_fn,
};

/// Suite whose `skip` wrapper replaces the body entirely and whose `e2e`
/// wrapper counts completed runs.
struct Screens {
    bodies_run: Arc<AtomicUsize>,
    wrapped_runs: Arc<AtomicUsize>,
}

impl Screens {
    fn new() -> Self {
        Self {
            bodies_run: Arc::new(AtomicUsize::new(0)),
            wrapped_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn body(&self) -> impl Fn(&mut Snapshoter) -> anyhow::Result<()> + Send + Sync + 'static {
        let bodies_run = Arc::clone(&self.bodies_run);
        move |_| {
            bodies_run.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

impl DynamicSuite for Screens {
    fn name(&self) -> &str {
        "Screens"
    }

    fn runtime_tests(&self) -> Vec<RuntimeTest> {
        vec![RuntimeTest::new("e2e_generated_state", self.body())]
    }

    fn declared_tests(&self) -> Vec<RuntimeTest> {
        vec![
            RuntimeTest::new("e2e_open_detail", self.body()),
            RuntimeTest::new("skip_slow_network", self.body()),
            RuntimeTest::new("test_static_layout", self.body()),
            RuntimeTest::new("fixture_helper", self.body()),
        ]
    }

    fn method_implementation(&self, prefix: &str, current: TestFn) -> Option<TestFn> {
        match prefix {
            "e2e" => {
                let wrapped_runs = Arc::clone(&self.wrapped_runs);
                Some(test_fn(move |snapshoter| {
                    current(snapshoter)?;
                    wrapped_runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }))
            }
            "skip" => Some(test_fn(|_| Ok(()))),
            _ => None,
        }
    }
}

#[test]
fn test_listing_applies_prefix_rules() {
    let units = list_dynamic_tests(&Screens::new());

    let listed: Vec<(&str, &UnitOrigin)> = units.iter().map(|u| (u.name(), u.origin())).collect();
    assert_eq!(listed.len(), 4);
    assert_eq!(listed[0], ("e2e_generated_state", &UnitOrigin::Runtime));
    assert_eq!(listed[1].0, "e2e_open_detail");
    assert_eq!(listed[2].0, "skip_slow_network");
    assert_eq!(
        listed[3],
        (
            "test_static_layout",
            &UnitOrigin::Declared {
                prefix: "test".to_string(),
                wrapped: false
            }
        )
    );
}

#[test]
fn test_wrappers_run_only_around_declared_tests() {
    let suite = Screens::new();
    let report = SuiteRunner::new(SnapshotConfig::default()).run(&suite);

    report.assert_all_passed();
    // Generated, e2e_open_detail and test_static_layout; the skip wrapper drops its body.
    assert_eq!(suite.bodies_run.load(Ordering::SeqCst), 3);
    assert_eq!(suite.wrapped_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_listing_twice_is_stable() {
    let suite = Screens::new();
    let first: Vec<String> = list_dynamic_tests(&suite).iter().map(|u| u.name().to_string()).collect();
    let second: Vec<String> = list_dynamic_tests(&suite).iter().map(|u| u.name().to_string()).collect();
    assert_eq!(first, second);
}
