use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

use crate::config::SnapshotConfig;
use crate::error::SnapshotError;
use crate::internal::artifact::Artifact;
use crate::internal::controller::{
    CaptureMode, ComparisonRequest, ControllerOutcome, FileSnapshotController, SnapshotController,
};
use crate::internal::snapshotable::Snapshotable;

/// Identity of the test a [`Snapshoter`] belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    suite: String,
    test_name: Option<String>,
}

impl TestContext {
    pub fn new(suite: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            test_name: Some(test_name.into()),
        }
    }

    /// Context with no resolvable test; every capture fails with [`SnapshotError::UnknownTest`].
    pub fn detached(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            test_name: None,
        }
    }

    /// Recover the running `#[test]` function from the libtest thread name.
    pub fn current(suite: impl Into<String>) -> Self {
        let test_name = std::thread::current()
            .name()
            .filter(|name| *name != "main")
            .and_then(|name| name.rsplit("::").next())
            .map(str::to_string);

        Self {
            suite: suite.into(),
            test_name,
        }
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn test_name(&self) -> Option<&str> {
        self.test_name.as_deref()
    }
}

/// A reported test failure, with the source location of the call that raised it when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    pub location: Option<&'static Location<'static>>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    pub fn at(location: &'static Location<'static>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: Some(location),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{}:{}: {}", location.file(), location.line(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Matched { identifier: String },
    /// A new reference was written. Still reported as a failure.
    Recorded { identifier: String, path: PathBuf },
    Mismatched { identifier: String, diff_path: Option<PathBuf> },
}

impl CaptureOutcome {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Matched { identifier } | Self::Recorded { identifier, .. } | Self::Mismatched { identifier, .. } => {
                identifier
            }
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

struct Resolved {
    identifier: String,
    test_name: String,
    reference_dir: PathBuf,
    diff_dir: Option<PathBuf>,
}

/// Per-test capture session.
///
/// Numbers captures `Step1`, `Step2`, ... in call order and turns controller
/// results into [`Failure`]s. Mismatches are collected rather than raised so
/// later steps of the same test still run; configuration problems return
/// `Err` so the test stops.
pub struct Snapshoter {
    context: TestContext,
    mode: CaptureMode,
    reference_dir: Option<PathBuf>,
    diff_dir: Option<PathBuf>,
    tolerance: f64,
    viewport: (u16, u16),
    controller: Box<dyn SnapshotController>,
    counter: usize,
    failures: Vec<Failure>,
}

impl Snapshoter {
    pub fn new(context: TestContext, config: &SnapshotConfig) -> Self {
        let controller = FileSnapshotController::new(config.agnostic_screen_size);
        Self::with_controller(context, config, Box::new(controller))
    }

    pub fn with_controller(
        context: TestContext,
        config: &SnapshotConfig,
        controller: Box<dyn SnapshotController>,
    ) -> Self {
        let mode = if config.recording {
            CaptureMode::Record
        } else {
            CaptureMode::Compare
        };

        Self {
            context,
            mode,
            reference_dir: config.resolved_reference_directory().map(PathBuf::from),
            diff_dir: config.image_diff_directory.clone(),
            tolerance: config.tolerance,
            viewport: (config.viewport_width, config.viewport_height),
            controller,
            counter: 0,
            failures: Vec::new(),
        }
    }

    pub fn context(&self) -> &TestContext {
        &self.context
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn is_recording(&self) -> bool {
        self.mode == CaptureMode::Record
    }

    /// Number of captures attempted so far.
    pub fn steps(&self) -> usize {
        self.counter
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    /// Record a failure that did not come from a capture (e.g. a test body error).
    #[track_caller]
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failures.push(Failure::at(Location::caller(), message));
    }

    /// Render `subject` and record or compare it as the next step.
    #[track_caller]
    pub fn check_snapshot<S: Snapshotable + ?Sized>(&mut self, subject: &S) -> Result<CaptureOutcome, SnapshotError> {
        let location = Location::caller();
        let resolved = self.resolve(location)?;

        let (width, height) = subject.viewport().unwrap_or(self.viewport);
        let artifact = match Artifact::capture(width, height, |f, area| subject.render(f, area)) {
            Ok(artifact) => artifact,
            Err(e) => return Err(self.fatal(location, SnapshotError::Render(e.to_string()))),
        };

        Ok(self.judge(location, resolved, &artifact))
    }

    /// Record or compare an already captured artifact as the next step.
    #[track_caller]
    pub fn check_artifact(&mut self, artifact: &Artifact) -> Result<CaptureOutcome, SnapshotError> {
        let location = Location::caller();
        let resolved = self.resolve(location)?;
        Ok(self.judge(location, resolved, artifact))
    }

    /// Panic with every collected failure. For use at the end of an ordinary `#[test]`.
    #[track_caller]
    pub fn assert_clean(&self) {
        if self.failures.is_empty() {
            return;
        }
        let report: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        panic!(
            "{} snapshot failure(s) in {}:\n{}",
            self.failures.len(),
            self.context.test_name().unwrap_or("<unknown test>"),
            report.join("\n")
        );
    }

    fn resolve(&mut self, location: &'static Location<'static>) -> Result<Resolved, SnapshotError> {
        self.counter += 1;
        let identifier = format!("Step{}", self.counter);

        let Some(test_name) = self.context.test_name().map(str::to_string) else {
            return Err(self.fatal(location, SnapshotError::UnknownTest));
        };
        let Some(reference_dir) = self.reference_dir.clone() else {
            return Err(self.fatal(location, SnapshotError::MissingReferenceDirectory));
        };
        if self.mode == CaptureMode::Compare && self.diff_dir.is_none() {
            return Err(self.fatal(location, SnapshotError::MissingDiffDirectory));
        }

        Ok(Resolved {
            identifier,
            test_name,
            reference_dir,
            diff_dir: self.diff_dir.clone(),
        })
    }

    fn fatal(&mut self, location: &'static Location<'static>, error: SnapshotError) -> SnapshotError {
        tracing::error!(
            suite = %self.context.suite(),
            step = self.counter,
            "snapshot configuration error: {}",
            error
        );
        self.failures.push(Failure::at(location, error.to_string()));
        error
    }

    fn judge(&mut self, location: &'static Location<'static>, resolved: Resolved, artifact: &Artifact) -> CaptureOutcome {
        let request = ComparisonRequest {
            artifact,
            suite: self.context.suite(),
            test_name: &resolved.test_name,
            identifier: &resolved.identifier,
            tolerance: self.tolerance,
            mode: self.mode,
            reference_dir: &resolved.reference_dir,
            diff_dir: resolved.diff_dir.as_deref(),
        };

        let result = self.controller.compare_snapshot(&request);
        let identifier = resolved.identifier;

        match result {
            Ok(ControllerOutcome::Matched) => {
                tracing::debug!(test = %resolved.test_name, %identifier, "snapshot.matched");
                CaptureOutcome::Matched { identifier }
            }
            Ok(ControllerOutcome::Recorded { path }) => {
                tracing::info!("Save in: {}", resolved.reference_dir.display());
                self.failures.push(Failure::at(
                    location,
                    format!(
                        "Test ran in record mode. Reference snapshot is now saved at {}. \
                         Disable record mode to perform an actual snapshot comparison!",
                        path.display()
                    ),
                ));
                CaptureOutcome::Recorded { identifier, path }
            }
            Err(e) => {
                tracing::warn!(test = %resolved.test_name, %identifier, mode = %self.mode, "snapshot comparison failed: {}", e);
                let diff_path = e.diff_path().cloned();
                self.failures
                    .push(Failure::at(location, format!("Snapshot comparison failed: {e}")));
                CaptureOutcome::Mismatched { identifier, diff_path }
            }
        }
    }
}
