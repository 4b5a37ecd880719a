use std::fs;
use std::path::{Path, PathBuf};

use strum_macros::Display;

use crate::error::ComparisonError;
use crate::internal::artifact::Artifact;
use crate::utils::naming::file_component;

const REFERENCE_EXTENSION: &str = "snap.json";

/// Whether captures become new references or are checked against stored ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CaptureMode {
    Record,
    Compare,
}

/// Everything a controller needs to judge one capture.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonRequest<'a> {
    pub artifact: &'a Artifact,
    pub suite: &'a str,
    pub test_name: &'a str,
    pub identifier: &'a str,
    pub tolerance: f64,
    pub mode: CaptureMode,
    pub reference_dir: &'a Path,
    pub diff_dir: Option<&'a Path>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerOutcome {
    Matched,
    Recorded { path: PathBuf },
}

/// Storage and comparison backend for captured artifacts.
///
/// The harness decides naming, sequencing and reporting; implementations only
/// persist references and judge a capture against them.
pub trait SnapshotController: Send {
    fn compare_snapshot(&mut self, request: &ComparisonRequest<'_>) -> Result<ControllerOutcome, ComparisonError>;
}

/// Stores references as pretty JSON under `<reference_dir>/<suite>/`.
#[derive(Debug, Clone)]
pub struct FileSnapshotController {
    agnostic_screen_size: bool,
}

impl Default for FileSnapshotController {
    fn default() -> Self {
        Self::new(true)
    }
}

impl FileSnapshotController {
    pub fn new(agnostic_screen_size: bool) -> Self {
        Self { agnostic_screen_size }
    }

    /// File stem shared by the reference and the failure files of one capture.
    pub fn file_stem(&self, request: &ComparisonRequest<'_>) -> String {
        let mut stem = format!(
            "{}_{}",
            file_component(request.test_name),
            file_component(request.identifier)
        );
        if self.agnostic_screen_size {
            let (width, height) = request.artifact.size();
            stem.push_str(&format!("_{width}x{height}"));
        }
        stem
    }

    pub fn reference_path(&self, request: &ComparisonRequest<'_>) -> PathBuf {
        request
            .reference_dir
            .join(file_component(request.suite))
            .join(format!("{}.{REFERENCE_EXTENSION}", self.file_stem(request)))
    }

    fn record(&self, request: &ComparisonRequest<'_>) -> Result<ControllerOutcome, ComparisonError> {
        let path = self.reference_path(request);
        write_artifact(&path, request.artifact)?;
        tracing::debug!(path = %path.display(), "snapshot.recorded");
        Ok(ControllerOutcome::Recorded { path })
    }

    fn compare(&self, request: &ComparisonRequest<'_>) -> Result<ControllerOutcome, ComparisonError> {
        let path = self.reference_path(request);
        if !path.exists() {
            return Err(ComparisonError::MissingReference { path });
        }

        let content = fs::read_to_string(&path).map_err(|source| ComparisonError::Io {
            path: path.clone(),
            source,
        })?;
        let reference: Artifact =
            serde_json::from_str(&content).map_err(|source| ComparisonError::Parse { path: path.clone(), source })?;

        let actual = request.artifact;
        let Some(differing_cells) = reference.differing_cells(actual) else {
            let diff_path = self.write_failure_files(request, &reference)?;
            return Err(ComparisonError::SizeMismatch {
                expected: reference.size(),
                actual: actual.size(),
                diff_path,
            });
        };

        let total_cells = reference.total_cells();
        let allowed = request.tolerance.clamp(0.0, 1.0) * total_cells as f64;
        if differing_cells as f64 > allowed {
            let diff_path = self.write_failure_files(request, &reference)?;
            return Err(ComparisonError::Mismatch {
                diff_path,
                differing_cells,
                total_cells,
            });
        }

        Ok(ControllerOutcome::Matched)
    }

    /// Write `reference_`, `failed_` and `diff_` files for a failed comparison.
    /// Returns the diff report location, or the reference itself when no diff
    /// directory is configured.
    fn write_failure_files(
        &self,
        request: &ComparisonRequest<'_>,
        reference: &Artifact,
    ) -> Result<PathBuf, ComparisonError> {
        let Some(diff_dir) = request.diff_dir else {
            return Ok(self.reference_path(request));
        };

        let folder = diff_dir.join(file_component(request.suite));
        let stem = self.file_stem(request);

        write_artifact(&folder.join(format!("reference_{stem}.{REFERENCE_EXTENSION}")), reference)?;
        write_artifact(&folder.join(format!("failed_{stem}.{REFERENCE_EXTENSION}")), request.artifact)?;

        let diff_path = folder.join(format!("diff_{stem}.txt"));
        fs::write(&diff_path, reference.diff_report(request.artifact)).map_err(|source| ComparisonError::Io {
            path: diff_path.clone(),
            source,
        })?;
        Ok(diff_path)
    }
}

impl SnapshotController for FileSnapshotController {
    fn compare_snapshot(&mut self, request: &ComparisonRequest<'_>) -> Result<ControllerOutcome, ComparisonError> {
        match request.mode {
            CaptureMode::Record => self.record(request),
            CaptureMode::Compare => self.compare(request),
        }
    }
}

fn write_artifact(path: &Path, artifact: &Artifact) -> Result<(), ComparisonError> {
    let io_err = |source| ComparisonError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let content = serde_json::to_string_pretty(artifact).map_err(|e| io_err(std::io::Error::other(e)))?;
    fs::write(path, content).map_err(io_err)
}
