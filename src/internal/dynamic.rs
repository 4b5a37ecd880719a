use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::internal::snapshoter::Snapshoter;

/// Body of a test unit. Receives the unit's own capture session.
pub type TestFn = Arc<dyn Fn(&mut Snapshoter) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure as a [`TestFn`].
pub fn test_fn<F>(f: F) -> TestFn
where
    F: Fn(&mut Snapshoter) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Prefix that makes a declared test runnable even without a wrapper.
pub const DEFAULT_TEST_PREFIX: &str = "test";

#[derive(Clone)]
pub struct RuntimeTest {
    pub name: String,
    pub implementation: TestFn,
}

impl RuntimeTest {
    pub fn new<F>(name: impl Into<String>, implementation: F) -> Self
    where
        F: Fn(&mut Snapshoter) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            implementation: test_fn(implementation),
        }
    }
}

impl fmt::Debug for RuntimeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeTest").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Where a discovered unit came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOrigin {
    /// Generated by `runtime_tests()`; never prefix-wrapped.
    Runtime,
    /// Listed by `declared_tests()`.
    Declared { prefix: String, wrapped: bool },
}

/// A named, runnable test as handed to the host runner.
#[derive(Clone)]
pub struct TestUnit {
    name: String,
    origin: UnitOrigin,
    run: TestFn,
}

impl TestUnit {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &UnitOrigin {
        &self.origin
    }

    pub fn run(&self, snapshoter: &mut Snapshoter) -> anyhow::Result<()> {
        (self.run)(snapshoter)
    }
}

impl fmt::Debug for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestUnit")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// A suite whose tests are enumerated before any of them runs.
pub trait DynamicSuite {
    /// Stable suite name; also the folder that holds the suite's references.
    fn name(&self) -> &str;

    /// Tests generated from data. Runs before declared tests, in order.
    fn runtime_tests(&self) -> Vec<RuntimeTest> {
        Vec::new()
    }

    /// Hand-written tests named `<prefix>_<rest>`.
    fn declared_tests(&self) -> Vec<RuntimeTest> {
        Vec::new()
    }

    /// Wrap every declared test sharing `prefix` with common behaviour.
    ///
    /// Return `None` to leave the prefix alone: tests with the default `test`
    /// prefix then run as written, any other prefix is not a test. Wrappers
    /// usually call `current` themselves, but don't have to.
    ///
    /// Called once per declared test, not once per prefix, since `current` is
    /// that test's own body. Several tests sharing a prefix mean several calls.
    ///
    /// ```
    /// # use tui_state_snapshots::{DynamicSuite, TestFn, test_fn};
    /// struct Ducks;
    ///
    /// impl DynamicSuite for Ducks {
    ///     fn name(&self) -> &str {
    ///         "Ducks"
    ///     }
    ///
    ///     fn method_implementation(&self, prefix: &str, current: TestFn) -> Option<TestFn> {
    ///         if prefix != "duck" {
    ///             return None;
    ///         }
    ///         Some(test_fn(move |snapshoter| {
    ///             current(snapshoter)?;
    ///             println!("quack!");
    ///             Ok(())
    ///         }))
    ///     }
    /// }
    /// ```
    fn method_implementation(&self, _prefix: &str, _current: TestFn) -> Option<TestFn> {
        None
    }
}

/// Substring before the first `_`, e.g. `"e2e"` for `"e2e_detail"`.
pub fn method_prefix(name: &str) -> Option<&str> {
    name.split_once('_').map(|(prefix, _)| prefix).filter(|prefix| !prefix.is_empty())
}

/// Enumerate every runnable unit of `suite`. Call once, before running any of them.
///
/// Names are unique in the result: a later test reusing a name is dropped.
pub fn list_dynamic_tests<S: DynamicSuite + ?Sized>(suite: &S) -> Vec<TestUnit> {
    let mut seen = HashSet::new();
    let mut units = Vec::new();
    let mut ignored = 0usize;

    for test in suite.runtime_tests() {
        if !seen.insert(test.name.clone()) {
            tracing::warn!(suite = suite.name(), test = %test.name, "duplicate runtime test name, skipping");
            continue;
        }
        units.push(TestUnit {
            name: test.name,
            origin: UnitOrigin::Runtime,
            run: test.implementation,
        });
    }

    for test in suite.declared_tests() {
        let Some(prefix) = method_prefix(&test.name).map(str::to_string) else {
            tracing::debug!(suite = suite.name(), test = %test.name, "declared test has no prefix, ignoring");
            ignored += 1;
            continue;
        };

        let (run, wrapped) = match suite.method_implementation(&prefix, Arc::clone(&test.implementation)) {
            Some(wrapper) => (wrapper, true),
            None if prefix == DEFAULT_TEST_PREFIX => (test.implementation, false),
            None => {
                tracing::debug!(suite = suite.name(), test = %test.name, %prefix, "prefix not handled, ignoring");
                ignored += 1;
                continue;
            }
        };

        if !seen.insert(test.name.clone()) {
            tracing::warn!(suite = suite.name(), test = %test.name, "duplicate declared test name, skipping");
            continue;
        }
        units.push(TestUnit {
            name: test.name,
            origin: UnitOrigin::Declared { prefix, wrapped },
            run,
        });
    }

    tracing::debug!(suite = suite.name(), units = units.len(), ignored, "discovered tests");
    units
}
