use std::path::PathBuf;

/// Fatal problems that stop the current test unit.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error(
        "Missing value for reference_image_directory - set SNAPSHOT_REFERENCE_DIR when recording, \
         or SNAPSHOT_BUNDLE_DIR / bundle_directory so packaged references can be found"
    )]
    MissingReferenceDirectory,

    #[error("Missing value for image_diff_directory - set SNAPSHOT_DIFF_DIR or image_diff_directory in snapshot.ron")]
    MissingDiffDirectory,

    #[error("Can't find current test name, are you sure you are calling this from a test?")]
    UnknownTest,

    #[error("Failed to render component: {0}")]
    Render(String),
}

/// Errors reported by a snapshot controller while recording or comparing.
#[derive(Debug, thiserror::Error)]
pub enum ComparisonError {
    #[error("Reference snapshot not found at {}", .path.display())]
    MissingReference { path: PathBuf },

    #[error("Snapshot size differs: reference {expected:?}, actual {actual:?}")]
    SizeMismatch {
        expected: (u16, u16),
        actual: (u16, u16),
        diff_path: PathBuf,
    },

    #[error(
        "{differing_cells} of {total_cells} cells differ from the reference, see {}",
        .diff_path.display()
    )]
    Mismatch {
        diff_path: PathBuf,
        differing_cells: usize,
        total_cells: usize,
    },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse reference at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ComparisonError {
    /// Location of the diff report, when the controller produced one.
    pub fn diff_path(&self) -> Option<&PathBuf> {
        match self {
            Self::SizeMismatch { diff_path, .. } | Self::Mismatch { diff_path, .. } => Some(diff_path),
            _ => None,
        }
    }
}

/// Authoring errors in a declarative case table, raised before any test runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("Unexpected type of argument {position}: {found}, expected {expected}")]
    UnexpectedType {
        position: usize,
        found: &'static str,
        expected: &'static str,
    },

    #[error("Argument {position} is a case name without a following state")]
    MissingState { position: usize },

    #[error("Case name {name:?} at argument {position} is not a valid test identifier")]
    InvalidName { position: usize, name: String },

    #[error("Case name {name:?} at argument {position} is already used in this table")]
    DuplicateName { position: usize, name: String },
}
