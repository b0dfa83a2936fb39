use crate::api::FileSelection;
use crate::transcript::{NodeId, Transcript, TranscriptStore};

/// Everything the engine mutates, owned per instance and guarded by a single
/// lock. The lock is never held across an await point.
#[derive(Default)]
pub(crate) struct EngineState {
    pub transcript: Transcript,
    pub store: TranscriptStore,
    /// Host-visible input box contents. Cleared on submit, restored when the
    /// submission fails.
    pub input_buffer: String,
    /// Current file-picker selection. Reset after every upload attempt.
    pub pending_file: Option<FileSelection>,
    /// Single-flight guard: at most one submission runs at a time. Held from
    /// acceptance until the round trip, forced resync included, settles.
    pub submission_in_flight: bool,
    /// Handle of the live progress indicator. Tracked by node identity so
    /// removal still works after an interleaved repaint discarded it.
    pub indicator: Option<NodeId>,
}
