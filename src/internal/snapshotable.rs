use std::sync::atomic::{AtomicBool, Ordering};

use ratatui::Frame;
use ratatui::layout::Rect;

use crate::error::SnapshotError;
use crate::internal::snapshoter::{CaptureOutcome, Snapshoter};

static ANIMATIONS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Process-wide switch that animated components (spinners, blinking cursors,
/// tick-driven transitions) consult before advancing.
pub fn set_animations_enabled(enabled: bool) {
    ANIMATIONS_ENABLED.store(enabled, Ordering::SeqCst);
}

pub fn animations_enabled() -> bool {
    ANIMATIONS_ENABLED.load(Ordering::SeqCst)
}

/// A component that can be captured by a [`Snapshoter`].
pub trait Snapshotable {
    fn render(&self, f: &mut Frame, area: Rect);

    /// Put the component in a deterministic, capturable state.
    /// Must be idempotent. The default freezes animations.
    fn prepare_for_snapshot(&mut self) {
        set_animations_enabled(false);
    }

    /// Viewport to render into, overriding the configured one.
    fn viewport(&self) -> Option<(u16, u16)> {
        None
    }

    #[track_caller]
    fn make_snapshot(&self, snapshoter: &mut Snapshoter) -> Result<CaptureOutcome, SnapshotError> {
        snapshoter.check_snapshot(self)
    }
}

/// A component whose output is a pure function of an explicit state value.
///
/// After `transit(state)` the rendered output must depend only on `state`,
/// never on earlier transitions.
pub trait StatefulComponent {
    type State;

    fn transit(&mut self, to: &Self::State);
}
