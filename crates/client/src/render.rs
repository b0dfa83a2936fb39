//! Builds display nodes and serializes them to markup. Everything that lands
//! in the transcript container is appended through this module; removal works
//! by node handle on the transcript itself.

use crate::message::{DisplayClass, HistoryEntry, MessageBody};
use crate::transcript::{NodeBody, NodeId, ScrollMode, Transcript, TranscriptNode};

/// Shown in place of an image whose load failed.
pub const PLACEHOLDER_IMAGE_SRC: &str = "placeholder.png";

/// Escape text for insertion into markup. Neutralizes `&`, `<`, `>`, `"`
/// and `'` so message content can never become live markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn build_body(entry: &HistoryEntry) -> (DisplayClass, NodeBody) {
    let class = DisplayClass::from_role(&entry.role);
    let body = match MessageBody::classify(&entry.content) {
        MessageBody::Text(text) => NodeBody::Text(text),
        MessageBody::Image { url, caption } => NodeBody::Image {
            url,
            caption,
            failed: false,
        },
    };
    (class, body)
}

/// Append one history entry, classifying its content, and request the given
/// scroll. Returns the node handle.
pub(crate) fn append_entry(
    transcript: &mut Transcript,
    entry: &HistoryEntry,
    scroll: ScrollMode,
) -> NodeId {
    let (class, body) = build_body(entry);
    let id = transcript.push(class, body, entry.reasoning.clone(), entry.source.clone());
    transcript.request_scroll(scroll);
    id
}

/// Append a locally generated plain-text node: the optimistic echo of a
/// submission, or an error notice.
pub(crate) fn append_local(
    transcript: &mut Transcript,
    class: DisplayClass,
    text: impl Into<String>,
) -> NodeId {
    let id = transcript.push(class, NodeBody::Text(text.into()), None, None);
    transcript.request_scroll(ScrollMode::Smooth);
    id
}

/// Append a transient progress indicator. Callers keep the handle and remove
/// it by reference once the surrounding operation settles.
pub(crate) fn append_indicator(transcript: &mut Transcript, text: impl Into<String>) -> NodeId {
    let id = transcript.push(DisplayClass::Bot, NodeBody::Indicator(text.into()), None, None);
    transcript.request_scroll(ScrollMode::Smooth);
    id
}

/// Full repaint: clear the container, re-render every entry in order, then
/// request exactly one trailing jump to the bottom.
pub(crate) fn repaint(transcript: &mut Transcript, history: &[HistoryEntry]) {
    transcript.clear();
    for entry in history {
        let (class, body) = build_body(entry);
        transcript.push(class, body, entry.reasoning.clone(), entry.source.clone());
    }
    transcript.request_scroll(ScrollMode::Jump);
}

/// Serialize one node to the markup the host injects. Text, captions and
/// reasoning are escaped here; the image URL lands in the `src` attribute as
/// received, since it comes from the backend rather than message text.
pub fn node_html(node: &TranscriptNode) -> String {
    let mut body = match &node.body {
        NodeBody::Text(text) => escape_html(text),
        NodeBody::Indicator(text) => {
            format!(r#"<em class="indicator">{}</em>"#, escape_html(text))
        }
        NodeBody::Image {
            url,
            caption,
            failed,
        } => {
            let src = if *failed { PLACEHOLDER_IMAGE_SRC } else { url };
            let mut markup = format!(r#"<img src="{src}" alt="">"#);
            if let Some(caption) = caption {
                markup.push_str(&format!(
                    r#"<div class="caption">{}</div>"#,
                    escape_html(caption)
                ));
            }
            markup
        }
    };
    if let Some(source) = &node.source {
        body.push_str(&escape_html(&format!(" ({source})")));
    }

    let mut inner = String::new();
    if let Some(reasoning) = &node.reasoning {
        inner.push_str(&format!(
            r#"<div class="reasoning"><small><strong>Reasoning:</strong></small><br>{}</div>"#,
            escape_html(reasoning).replace('\n', "<br>")
        ));
    }
    inner.push_str(&body);

    format!(r#"<div class="message {}">{inner}</div>"#, node.class.as_str())
}

/// Serialize the whole transcript, oldest node first.
pub fn transcript_html(transcript: &Transcript) -> String {
    transcript
        .nodes()
        .iter()
        .map(node_html)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_metacharacters() {
        assert_eq!(escape_html("&"), "&amp;");
        assert_eq!(escape_html("<"), "&lt;");
        assert_eq!(escape_html(">"), "&gt;");
        assert_eq!(escape_html("\""), "&quot;");
        assert_eq!(escape_html("'"), "&#39;");
        assert_eq!(
            escape_html(r#"<a href="x" onload='y'>&"#),
            "&lt;a href=&quot;x&quot; onload=&#39;y&#39;&gt;&amp;"
        );
    }

    #[test]
    fn script_content_renders_inert() {
        let mut transcript = Transcript::default();
        append_local(
            &mut transcript,
            DisplayClass::User,
            "<script>alert(1)</script>",
        );
        let html = transcript_html(&transcript);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn entry_markup_carries_display_class() {
        let mut transcript = Transcript::default();
        append_entry(
            &mut transcript,
            &HistoryEntry::new("assistant", "hello"),
            ScrollMode::Smooth,
        );
        append_entry(
            &mut transcript,
            &HistoryEntry::new("user", "hi"),
            ScrollMode::Smooth,
        );
        let html = transcript_html(&transcript);
        assert!(html.contains(r#"<div class="message bot">hello</div>"#));
        assert!(html.contains(r#"<div class="message user">hi</div>"#));
    }

    #[test]
    fn image_entry_renders_url_and_escaped_caption() {
        let mut transcript = Transcript::default();
        append_entry(
            &mut transcript,
            &HistoryEntry::new("user", "IMG_CONFIRM:http://x/a.png|hello"),
            ScrollMode::Smooth,
        );
        let html = transcript_html(&transcript);
        assert!(html.contains(r#"<img src="http://x/a.png" alt="">"#));
        assert!(html.contains(r#"<div class="caption">hello</div>"#));
    }

    #[test]
    fn script_tag_in_caption_stays_literal() {
        let mut transcript = Transcript::default();
        append_entry(
            &mut transcript,
            &HistoryEntry::new("user", "IMG_CONFIRM:http://x/a.png|<script>alert(1)</script>"),
            ScrollMode::Smooth,
        );
        let html = transcript_html(&transcript);
        assert!(!html.contains("<script>"));
        assert!(html.contains(
            r#"<div class="caption">&lt;script&gt;alert(1)&lt;/script&gt;</div>"#
        ));
    }

    #[test]
    fn failed_image_swaps_to_placeholder_source() {
        let mut transcript = Transcript::default();
        let id = append_entry(
            &mut transcript,
            &HistoryEntry::new("user", "IMG_CONFIRM:http://x/gone.png"),
            ScrollMode::Smooth,
        );
        transcript.mark_image_failed(id);
        let html = transcript_html(&transcript);
        assert!(html.contains(&format!(r#"<img src="{PLACEHOLDER_IMAGE_SRC}" alt="">"#)));
        assert!(!html.contains("gone.png"));
    }

    #[test]
    fn reasoning_block_precedes_content_with_breaks() {
        let mut entry = HistoryEntry::new("assistant", "answer");
        entry.reasoning = Some("step one\nstep two".into());
        let mut transcript = Transcript::default();
        append_entry(&mut transcript, &entry, ScrollMode::Smooth);
        let html = transcript_html(&transcript);
        assert!(html.contains("<strong>Reasoning:</strong>"));
        assert!(html.contains("step one<br>step two"));
        let reasoning_at = html.find("Reasoning:").unwrap();
        let answer_at = html.find("answer").unwrap();
        assert!(reasoning_at < answer_at);
    }

    #[test]
    fn source_tag_is_appended_to_the_text() {
        let mut entry = HistoryEntry::new("assistant", "answer");
        entry.source = Some("OpenRouter".into());
        let mut transcript = Transcript::default();
        append_entry(&mut transcript, &entry, ScrollMode::Smooth);
        assert!(transcript_html(&transcript).contains("answer (OpenRouter)"));
    }

    #[test]
    fn repaint_replaces_everything_and_requests_one_jump() {
        let mut transcript = Transcript::default();
        append_local(&mut transcript, DisplayClass::User, "optimistic");
        append_indicator(&mut transcript, "thinking");
        assert_eq!(transcript.take_pending_scroll(), Some(ScrollMode::Smooth));

        let history = vec![
            HistoryEntry::new("user", "optimistic"),
            HistoryEntry::new("assistant", "reply"),
        ];
        repaint(&mut transcript, &history);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.take_pending_scroll(), Some(ScrollMode::Jump));
        assert_eq!(transcript.take_pending_scroll(), None);
        let html = transcript_html(&transcript);
        assert!(!html.contains("thinking"));
    }
}
