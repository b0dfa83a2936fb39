//! The rendered conversation surface and the change-detection bookkeeping
//! that decides when it gets repainted.

use crate::message::{DisplayClass, HistoryEntry};

/// Identity of one rendered node. Ids are never reused within a transcript's
/// lifetime, so a handle taken before a repaint still removes the right node
/// afterwards (or nothing at all, once the repaint discarded it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

/// How the host should move the viewport after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Instant jump to the bottom, used after bulk repaints.
    Jump,
    /// Animated scroll, used after a single appended message.
    Smooth,
}

/// Body of a rendered node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    /// Inert text, escaped at markup time.
    Text(String),
    /// Image card. `failed` switches the markup to the placeholder source.
    Image {
        url: String,
        caption: Option<String>,
        failed: bool,
    },
    /// Transient progress indicator. Never part of the server history.
    Indicator(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptNode {
    pub id: NodeId,
    pub class: DisplayClass,
    pub body: NodeBody,
    /// Auxiliary explanatory text, shown apart from the main content.
    pub reasoning: Option<String>,
    /// Display-only label of the backend that produced the message.
    pub source: Option<String>,
}

/// Ordered container of everything currently on screen.
#[derive(Debug, Default)]
pub struct Transcript {
    nodes: Vec<TranscriptNode>,
    next_id: u64,
    pending_scroll: Option<ScrollMode>,
}

impl Transcript {
    pub(crate) fn push(
        &mut self,
        class: DisplayClass,
        body: NodeBody,
        reasoning: Option<String>,
        source: Option<String>,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push(TranscriptNode {
            id,
            class,
            body,
            reasoning,
            source,
        });
        id
    }

    /// Remove a node by handle. A handle whose node is already gone (for
    /// example cleared by a repaint) removes nothing.
    pub(crate) fn remove(&mut self, id: NodeId) {
        self.nodes.retain(|node| node.id != id);
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    pub(crate) fn mark_image_failed(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.iter_mut().find(|node| node.id == id) {
            if let NodeBody::Image { failed, .. } = &mut node.body {
                *failed = true;
            }
        }
    }

    pub(crate) fn request_scroll(&mut self, mode: ScrollMode) {
        self.pending_scroll = Some(mode);
    }

    /// Consume the pending scroll request. Single-slot: a later request
    /// overwrites an unconsumed earlier one.
    pub fn take_pending_scroll(&mut self) -> Option<ScrollMode> {
        self.pending_scroll.take()
    }

    pub fn nodes(&self) -> &[TranscriptNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Change detection for the authoritative history. Compares full content
/// rather than message count: an edited entry in a same-length history must
/// still trigger a repaint.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    committed: Option<Vec<HistoryEntry>>,
}

impl TranscriptStore {
    /// Whether a freshly fetched history differs from the last committed one.
    /// Nothing has been committed yet counts as changed, so the first poll
    /// always paints.
    pub fn has_changed(&self, history: &[HistoryEntry]) -> bool {
        match &self.committed {
            Some(committed) => committed.as_slice() != history,
            None => true,
        }
    }

    pub(crate) fn mark_committed(&mut self, history: Vec<HistoryEntry>) {
        self.committed = Some(history);
    }

    /// Trailing window of the committed history, raw wire form, used as the
    /// context block of a chat request. Capped to bound request size.
    pub(crate) fn trailing_window(&self, cap: usize) -> Vec<HistoryEntry> {
        match &self.committed {
            Some(committed) => {
                let start = committed.len().saturating_sub(cap);
                committed[start..].to_vec()
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_node(transcript: &mut Transcript, content: &str) -> NodeId {
        transcript.push(
            DisplayClass::User,
            NodeBody::Text(content.into()),
            None,
            None,
        )
    }

    #[test]
    fn ids_stay_unique_across_clear() {
        let mut transcript = Transcript::default();
        let first = text_node(&mut transcript, "a");
        transcript.clear();
        let second = text_node(&mut transcript, "b");
        assert_ne!(first, second);
    }

    #[test]
    fn remove_by_stale_handle_is_a_no_op() {
        let mut transcript = Transcript::default();
        let stale = text_node(&mut transcript, "indicator");
        transcript.clear();
        text_node(&mut transcript, "repainted");

        transcript.remove(stale);
        assert_eq!(transcript.len(), 1);
        assert_eq!(
            transcript.nodes()[0].body,
            NodeBody::Text("repainted".into())
        );
    }

    #[test]
    fn remove_targets_the_node_not_its_position() {
        let mut transcript = Transcript::default();
        let keep = text_node(&mut transcript, "keep");
        let middle = text_node(&mut transcript, "middle");
        text_node(&mut transcript, "tail");

        transcript.remove(middle);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.nodes()[0].id, keep);
    }

    #[test]
    fn image_failure_flips_only_the_target_node() {
        let mut transcript = Transcript::default();
        let image = transcript.push(
            DisplayClass::User,
            NodeBody::Image {
                url: "http://x/a.png".into(),
                caption: None,
                failed: false,
            },
            None,
            None,
        );
        let text = text_node(&mut transcript, "hi");

        transcript.mark_image_failed(image);
        transcript.mark_image_failed(text); // not an image, nothing happens

        match &transcript.nodes()[0].body {
            NodeBody::Image { failed, .. } => assert!(failed),
            other => panic!("expected image, got {other:?}"),
        }
        assert_eq!(transcript.nodes()[1].body, NodeBody::Text("hi".into()));
    }

    #[test]
    fn scroll_request_is_single_slot_and_consumed_once() {
        let mut transcript = Transcript::default();
        transcript.request_scroll(ScrollMode::Smooth);
        transcript.request_scroll(ScrollMode::Jump);
        assert_eq!(transcript.take_pending_scroll(), Some(ScrollMode::Jump));
        assert_eq!(transcript.take_pending_scroll(), None);
    }

    #[test]
    fn store_reports_change_on_first_fetch_and_content_edits() {
        let mut store = TranscriptStore::default();
        let history = vec![HistoryEntry::new("user", "hi")];

        assert!(store.has_changed(&history));
        store.mark_committed(history.clone());
        assert!(!store.has_changed(&history));

        // Same length, different content: still a change.
        let edited = vec![HistoryEntry::new("user", "bye")];
        assert!(store.has_changed(&edited));
    }

    #[test]
    fn trailing_window_keeps_the_newest_entries() {
        let mut store = TranscriptStore::default();
        assert!(store.trailing_window(10).is_empty());

        let history: Vec<_> = (0..5)
            .map(|i| HistoryEntry::new("user", format!("m{i}")))
            .collect();
        store.mark_committed(history);

        let window = store.trailing_window(3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].content, "m2");
        assert_eq!(window[2].content, "m4");

        assert_eq!(store.trailing_window(10).len(), 5);
    }
}
