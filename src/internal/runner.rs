use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jiff::Zoned;

use crate::config::SnapshotConfig;
use crate::error::SnapshotError;
use crate::internal::controller::SnapshotController;
use crate::internal::dynamic::{DynamicSuite, TestUnit, list_dynamic_tests};
use crate::internal::snapshoter::{Failure, Snapshoter, TestContext};

type ControllerFactory = Arc<dyn Fn() -> Box<dyn SnapshotController> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Passed,
    Failed(Vec<Failure>),
}

#[derive(Debug, Clone)]
pub struct UnitReport {
    pub name: String,
    pub status: UnitStatus,
    /// Captures attempted by the unit.
    pub steps: usize,
    pub elapsed: Duration,
}

impl UnitReport {
    pub fn passed(&self) -> bool {
        self.status == UnitStatus::Passed
    }

    pub fn failures(&self) -> &[Failure] {
        match &self.status {
            UnitStatus::Passed => &[],
            UnitStatus::Failed(failures) => failures,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub suite: String,
    pub started_at: Zoned,
    pub units: Vec<UnitReport>,
    pub filtered_out: usize,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.units.iter().filter(|u| u.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.units.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn unit(&self, name: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.name == name)
    }

    /// libtest-style summary, failures first.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for unit in self.units.iter().filter(|u| !u.passed()) {
            out.push_str(&format!("---- {}::{} ----\n", self.suite, unit.name));
            for failure in unit.failures() {
                out.push_str(&format!("{failure}\n"));
            }
        }
        out.push_str(&format!(
            "{} started {}: {}. {} passed; {} failed; {} filtered out",
            self.suite,
            self.started_at.strftime("%Y-%m-%d %H:%M:%S"),
            if self.is_success() { "ok" } else { "FAILED" },
            self.passed(),
            self.failed(),
            self.filtered_out
        ));
        out
    }

    #[track_caller]
    pub fn assert_all_passed(&self) {
        if !self.is_success() {
            panic!("{}", self.summary());
        }
    }
}

/// Runs every unit of a [`DynamicSuite`] in isolation.
///
/// Units are listed once up front, then executed one at a time, each with a
/// fresh [`Snapshoter`]. A unit that panics or returns an error fails on its
/// own and never stops the remaining units.
#[derive(Clone)]
pub struct SuiteRunner {
    config: SnapshotConfig,
    filter: Option<String>,
    controller: Option<ControllerFactory>,
}

impl SuiteRunner {
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            config,
            filter: None,
            controller: None,
        }
    }

    /// Runner configured from `snapshot.ron` and `SNAPSHOT_*` variables.
    pub fn from_env() -> Self {
        Self::new(SnapshotConfig::load())
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Only run units whose name contains `filter`.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Use a custom controller instead of the file-backed one.
    pub fn with_controller<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn SnapshotController> + Send + Sync + 'static,
    {
        self.controller = Some(Arc::new(factory));
        self
    }

    pub fn run<S: DynamicSuite + ?Sized>(&self, suite: &S) -> SuiteReport {
        let started_at = Zoned::now();
        let units = list_dynamic_tests(suite);
        let total = units.len();

        let selected: Vec<&TestUnit> = units
            .iter()
            .filter(|unit| self.filter.as_deref().is_none_or(|f| unit.name().contains(f)))
            .collect();
        let filtered_out = total - selected.len();

        tracing::info!(suite = suite.name(), units = selected.len(), filtered_out, "running suite");

        let reports = selected
            .into_iter()
            .map(|unit| self.run_unit(suite.name(), unit))
            .collect();

        SuiteReport {
            suite: suite.name().to_string(),
            started_at,
            units: reports,
            filtered_out,
        }
    }

    pub fn run_unit(&self, suite: &str, unit: &TestUnit) -> UnitReport {
        let start = Instant::now();
        let context = TestContext::new(suite, unit.name());
        let mut snapshoter = match &self.controller {
            Some(factory) => Snapshoter::with_controller(context, &self.config, factory()),
            None => Snapshoter::new(context, &self.config),
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| unit.run(&mut snapshoter)));
        let steps = snapshoter.steps();
        let mut failures = snapshoter.into_failures();

        match result {
            Ok(Ok(())) => {}
            // A session error is already recorded, with its location, by the session that raised it.
            Ok(Err(e)) if e.downcast_ref::<SnapshotError>().is_some() && !failures.is_empty() => {}
            Ok(Err(e)) => failures.push(Failure::new(format!("test returned an error: {e:#}"))),
            Err(payload) => failures.push(Failure::new(format!("test panicked: {}", panic_message(payload.as_ref())))),
        }

        let elapsed = start.elapsed();
        let status = if failures.is_empty() {
            tracing::info!(suite, test = unit.name(), steps, elapsed = ?elapsed, "unit passed");
            UnitStatus::Passed
        } else {
            tracing::warn!(suite, test = unit.name(), steps, failures = failures.len(), elapsed = ?elapsed, "unit failed");
            UnitStatus::Failed(failures)
        };

        UnitReport {
            name: unit.name().to_string(),
            status,
            steps,
            elapsed,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
