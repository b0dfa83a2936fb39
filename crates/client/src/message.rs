//! Message model: wire entries as the server reports them, plus the
//! classification step that turns raw content into something renderable.

use serde::{Deserialize, Serialize};

/// Literal prefix marking an image-confirmation entry on the wire.
pub const IMAGE_MARKER: &str = "IMG_CONFIRM:";

/// Separates the image URL from its optional caption.
pub const IMAGE_SEPARATOR: char = '|';

/// One entry of the server-held conversation log, as returned by `GET /history`.
///
/// `content` stays in raw wire form so that history windows echoed back in
/// chat requests are byte-identical to what the server sent. Decoding into a
/// display variant happens exactly once, in [`MessageBody::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl HistoryEntry {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            reasoning: None,
            source: None,
        }
    }
}

/// Display class of a transcript node. Total over all role strings: unknown
/// roles degrade to user styling rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayClass {
    User,
    Bot,
}

impl DisplayClass {
    /// `"assistant"` and `"bot"` map to [`DisplayClass::Bot`]; every other
    /// role string renders as the user.
    pub fn from_role(role: &str) -> Self {
        match role {
            "assistant" | "bot" => Self::Bot,
            _ => Self::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

/// Content variant of a message, decoded from the string-tagged wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Image { url: String, caption: Option<String> },
}

impl MessageBody {
    /// Classify raw wire content. Content starting with [`IMAGE_MARKER`]
    /// splits on the first [`IMAGE_SEPARATOR`] into URL and caption; the
    /// caption is absent when the separator is missing or nothing follows it.
    /// Everything else is plain text, including content where the marker
    /// appears mid-string.
    pub fn classify(content: &str) -> Self {
        let Some(rest) = content.strip_prefix(IMAGE_MARKER) else {
            return Self::Text(content.to_string());
        };
        match rest.split_once(IMAGE_SEPARATOR) {
            Some((url, caption)) if !caption.is_empty() => Self::Image {
                url: url.to_string(),
                caption: Some(caption.to_string()),
            },
            Some((url, _)) => Self::Image {
                url: url.to_string(),
                caption: None,
            },
            None => Self::Image {
                url: rest.to_string(),
                caption: None,
            },
        }
    }
}
