//! State-driven snapshot testing for ratatui components.
//!
//! A suite declares a component factory and a table of named states; the
//! harness turns every row into its own test unit that builds a fresh
//! component, drives it to the state, renders it through a `TestBackend`
//! and records or compares the captured cell grid against a stored reference.

pub mod config;
pub mod error;
pub mod internal;
pub mod utils;

pub use config::{LoggingConfig, SnapshotConfig};
pub use error::{ComparisonError, SnapshotError, TableError};
pub use internal::artifact::Artifact;
pub use internal::case_table::{CaseTable, CaseTableBuilder, Entry};
pub use internal::controller::{
    CaptureMode, ComparisonRequest, ControllerOutcome, FileSnapshotController, SnapshotController,
};
pub use internal::dynamic::{
    DynamicSuite, RuntimeTest, TestFn, TestUnit, UnitOrigin, list_dynamic_tests, method_prefix, test_fn,
};
pub use internal::runner::{SuiteReport, SuiteRunner, UnitReport, UnitStatus};
pub use internal::snapshotable::{Snapshotable, StatefulComponent, animations_enabled, set_animations_enabled};
pub use internal::snapshoter::{CaptureOutcome, Failure, Snapshoter, TestContext};
pub use internal::stateful_suite::{
    AnyStatefulComponentTests, ComponentFactory, EmptyStatefulComponentTests, StatefulComponentSuite,
    StatefulComponentTests, WrapperRegistry, runtime_tests_for, synthesize,
};
