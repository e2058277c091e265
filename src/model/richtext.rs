//! Inline styled text runs.

use serde::{Deserialize, Serialize};

/// One styled run of inline text with an optional link and annotation set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichText {
    /// Unstyled text content as reported by the source
    #[serde(default)]
    pub plain_text: String,

    /// Resolved hyperlink target, if any
    #[serde(default)]
    pub href: Option<String>,

    /// Style annotations applied to this run
    #[serde(default)]
    pub annotations: Annotations,

    /// Variant-specific payload
    #[serde(flatten)]
    pub variant: RichTextVariant,
}

/// Discriminated payload of a rich text run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextVariant {
    /// Ordinary text, possibly carrying an inline link
    Text { text: TextContent },
    /// A mention of a user, page or date
    Mention { mention: serde_json::Value },
    /// An inline equation
    Equation { equation: serde_json::Value },
}

/// Text content of a [`RichTextVariant::Text`] run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(default)]
    pub link: Option<Link>,
}

/// An inline hyperlink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

/// Style annotation set of a text run.
///
/// The combination is reduced to a single wrapper ordering by the formatter:
/// inline code wins outright, then bold/italic, then underline or
/// strikethrough, then color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "default".to_string()
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: default_color(),
        }
    }
}

impl RichText {
    /// Build a plain unannotated text run. Mostly useful in tests.
    pub fn plain(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            plain_text: content.clone(),
            href: None,
            annotations: Annotations::default(),
            variant: RichTextVariant::Text {
                text: TextContent {
                    content,
                    link: None,
                },
            },
        }
    }

    /// Raw text content of this run, ignoring annotations and links.
    pub fn raw_text(&self) -> &str {
        match &self.variant {
            RichTextVariant::Text { text } => &text.content,
            _ => &self.plain_text,
        }
    }
}
