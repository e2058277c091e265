//! Block tree nodes.
//!
//! A block is one node of the content tree: a type tag, a type-specific
//! payload nested under the type name (as the wire format emits it), and a
//! `has_children` flag. Expanded children live outside the wire payload.

use serde::{Deserialize, Serialize};

use super::richtext::RichText;

/// A node in the ordered, rooted content tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,

    /// Whether the source declares nested children for this node
    #[serde(default)]
    pub has_children: bool,

    #[serde(flatten)]
    pub payload: BlockPayload,

    /// Direct children, populated by the fetcher after expansion
    #[serde(skip)]
    pub children: Vec<Block>,
}

/// Closed tagged union over block kinds.
///
/// The payload of each variant sits under a key equal to the type tag,
/// mirroring the wire contract: `{"type": "paragraph", "paragraph": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockPayload {
    Paragraph {
        paragraph: TextPayload,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        heading_1: TextPayload,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        heading_2: TextPayload,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        heading_3: TextPayload,
    },
    BulletedListItem {
        bulleted_list_item: TextPayload,
    },
    NumberedListItem {
        numbered_list_item: TextPayload,
    },
    ToDo {
        to_do: ToDoPayload,
    },
    Toggle {
        toggle: TextPayload,
    },
    Quote {
        quote: TextPayload,
    },
    Callout {
        callout: CalloutPayload,
    },
    Code {
        code: CodePayload,
    },
    Divider {
        divider: serde_json::Value,
    },
    Table {
        table: TablePayload,
    },
    TableRow {
        table_row: TableRowPayload,
    },
    Image {
        image: FileRef,
    },
    Video {
        video: FileRef,
    },
    File {
        file: FileRef,
    },
    Pdf {
        pdf: FileRef,
    },
    Audio {
        audio: FileRef,
    },
    Bookmark {
        bookmark: BookmarkPayload,
    },
    Embed {
        embed: EmbedPayload,
    },
    LinkPreview {
        link_preview: EmbedPayload,
    },
    LinkToPage {
        link_to_page: serde_json::Value,
    },
    ChildPage {
        child_page: TitlePayload,
    },
    ChildDatabase {
        child_database: TitlePayload,
    },
    Breadcrumb {
        breadcrumb: serde_json::Value,
    },
    SyncedBlock {
        synced_block: serde_json::Value,
    },
    Template {
        template: TextPayload,
    },
    Equation {
        equation: serde_json::Value,
    },
    ColumnList {
        column_list: serde_json::Value,
    },
    Column {
        column: serde_json::Value,
    },
    #[serde(other)]
    Unsupported,
}

/// Type identifier of a block, used for dispatch and neighbor comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    BulletedListItem,
    NumberedListItem,
    ToDo,
    Toggle,
    Quote,
    Callout,
    Code,
    Divider,
    Table,
    TableRow,
    Image,
    Video,
    File,
    Pdf,
    Audio,
    Bookmark,
    Embed,
    LinkPreview,
    LinkToPage,
    ChildPage,
    ChildDatabase,
    Breadcrumb,
    SyncedBlock,
    Template,
    Equation,
    ColumnList,
    Column,
    Unsupported,
}

impl BlockKind {
    /// Lower-snake-case name used for template selection.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading1 => "heading_1",
            BlockKind::Heading2 => "heading_2",
            BlockKind::Heading3 => "heading_3",
            BlockKind::BulletedListItem => "bulleted_list_item",
            BlockKind::NumberedListItem => "numbered_list_item",
            BlockKind::ToDo => "to_do",
            BlockKind::Toggle => "toggle",
            BlockKind::Quote => "quote",
            BlockKind::Callout => "callout",
            BlockKind::Code => "code",
            BlockKind::Divider => "divider",
            BlockKind::Table => "table",
            BlockKind::TableRow => "table_row",
            BlockKind::Image => "image",
            BlockKind::Video => "video",
            BlockKind::File => "file",
            BlockKind::Pdf => "pdf",
            BlockKind::Audio => "audio",
            BlockKind::Bookmark => "bookmark",
            BlockKind::Embed => "embed",
            BlockKind::LinkPreview => "link_preview",
            BlockKind::LinkToPage => "link_to_page",
            BlockKind::ChildPage => "child_page",
            BlockKind::ChildDatabase => "child_database",
            BlockKind::Breadcrumb => "breadcrumb",
            BlockKind::SyncedBlock => "synced_block",
            BlockKind::Template => "template",
            BlockKind::Equation => "equation",
            BlockKind::ColumnList => "column_list",
            BlockKind::Column => "column",
            BlockKind::Unsupported => "unsupported",
        }
    }

    /// Whether this kind can carry nested children worth expanding.
    pub fn supports_children(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph
                | BlockKind::BulletedListItem
                | BlockKind::NumberedListItem
                | BlockKind::ToDo
                | BlockKind::Toggle
                | BlockKind::Quote
                | BlockKind::Callout
                | BlockKind::Code
                | BlockKind::Table
                | BlockKind::SyncedBlock
                | BlockKind::Template
        )
    }

    /// Media kinds that reference a downloadable asset.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            BlockKind::Image
                | BlockKind::Video
                | BlockKind::File
                | BlockKind::Pdf
                | BlockKind::Audio
        )
    }
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        self.payload.kind()
    }

    /// Rich text spans of this block's own content, if the kind carries any.
    pub fn rich_text(&self) -> Option<&[RichText]> {
        match &self.payload {
            BlockPayload::Paragraph { paragraph: p }
            | BlockPayload::Heading1 { heading_1: p }
            | BlockPayload::Heading2 { heading_2: p }
            | BlockPayload::Heading3 { heading_3: p }
            | BlockPayload::BulletedListItem {
                bulleted_list_item: p,
            }
            | BlockPayload::NumberedListItem {
                numbered_list_item: p,
            }
            | BlockPayload::Toggle { toggle: p }
            | BlockPayload::Quote { quote: p }
            | BlockPayload::Template { template: p } => Some(&p.rich_text),
            BlockPayload::ToDo { to_do } => Some(&to_do.rich_text),
            BlockPayload::Callout { callout } => Some(&callout.rich_text),
            BlockPayload::Code { code } => Some(&code.rich_text),
            _ => None,
        }
    }

    /// The file reference of a media block, if any.
    pub fn file_ref(&self) -> Option<&FileRef> {
        match &self.payload {
            BlockPayload::Image { image: f }
            | BlockPayload::Video { video: f }
            | BlockPayload::File { file: f }
            | BlockPayload::Pdf { pdf: f }
            | BlockPayload::Audio { audio: f } => Some(f),
            _ => None,
        }
    }

    /// Mutable access to a media block's file reference, for URL rewriting.
    pub fn file_ref_mut(&mut self) -> Option<&mut FileRef> {
        match &mut self.payload {
            BlockPayload::Image { image: f }
            | BlockPayload::Video { video: f }
            | BlockPayload::File { file: f }
            | BlockPayload::Pdf { pdf: f }
            | BlockPayload::Audio { audio: f } => Some(f),
            _ => None,
        }
    }
}

impl BlockPayload {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockPayload::Paragraph { .. } => BlockKind::Paragraph,
            BlockPayload::Heading1 { .. } => BlockKind::Heading1,
            BlockPayload::Heading2 { .. } => BlockKind::Heading2,
            BlockPayload::Heading3 { .. } => BlockKind::Heading3,
            BlockPayload::BulletedListItem { .. } => BlockKind::BulletedListItem,
            BlockPayload::NumberedListItem { .. } => BlockKind::NumberedListItem,
            BlockPayload::ToDo { .. } => BlockKind::ToDo,
            BlockPayload::Toggle { .. } => BlockKind::Toggle,
            BlockPayload::Quote { .. } => BlockKind::Quote,
            BlockPayload::Callout { .. } => BlockKind::Callout,
            BlockPayload::Code { .. } => BlockKind::Code,
            BlockPayload::Divider { .. } => BlockKind::Divider,
            BlockPayload::Table { .. } => BlockKind::Table,
            BlockPayload::TableRow { .. } => BlockKind::TableRow,
            BlockPayload::Image { .. } => BlockKind::Image,
            BlockPayload::Video { .. } => BlockKind::Video,
            BlockPayload::File { .. } => BlockKind::File,
            BlockPayload::Pdf { .. } => BlockKind::Pdf,
            BlockPayload::Audio { .. } => BlockKind::Audio,
            BlockPayload::Bookmark { .. } => BlockKind::Bookmark,
            BlockPayload::Embed { .. } => BlockKind::Embed,
            BlockPayload::LinkPreview { .. } => BlockKind::LinkPreview,
            BlockPayload::LinkToPage { .. } => BlockKind::LinkToPage,
            BlockPayload::ChildPage { .. } => BlockKind::ChildPage,
            BlockPayload::ChildDatabase { .. } => BlockKind::ChildDatabase,
            BlockPayload::Breadcrumb { .. } => BlockKind::Breadcrumb,
            BlockPayload::SyncedBlock { .. } => BlockKind::SyncedBlock,
            BlockPayload::Template { .. } => BlockKind::Template,
            BlockPayload::Equation { .. } => BlockKind::Equation,
            BlockPayload::ColumnList { .. } => BlockKind::ColumnList,
            BlockPayload::Column { .. } => BlockKind::Column,
            BlockPayload::Unsupported => BlockKind::Unsupported,
        }
    }
}

/// Payload of the plain rich-text block kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Payload of a to-do block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToDoPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub checked: bool,
}

/// Payload of a callout block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalloutPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub icon: Option<Icon>,
}

/// Payload of a code block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodePayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub caption: Vec<RichText>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Payload of a table block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TablePayload {
    #[serde(default)]
    pub table_width: u32,
    #[serde(default)]
    pub has_column_header: bool,
    #[serde(default)]
    pub has_row_header: bool,
}

/// Payload of a table row: one rich-text sequence per cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRowPayload {
    #[serde(default)]
    pub cells: Vec<Vec<RichText>>,
}

/// Payload of a bookmark block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkPayload {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub caption: Vec<RichText>,
}

/// Payload of an embed or link-preview block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedPayload {
    #[serde(default)]
    pub url: String,
}

/// Payload of child-page and child-database markers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitlePayload {
    #[serde(default)]
    pub title: String,
}

/// A reference to a remotely hosted file, either externally linked or
/// uploaded to the content source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub caption: Vec<RichText>,
    #[serde(flatten)]
    pub source: FileSource,
}

/// External-URL vs. uploaded-file variants of a file reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileSource {
    External { external: ExternalFile },
    File { file: HostedFile },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedFile {
    pub url: String,
    #[serde(default)]
    pub expiry_time: Option<String>,
}

impl FileRef {
    /// Build an external reference, used for covers and avatar downloads.
    pub fn external(url: impl Into<String>) -> Self {
        Self {
            caption: Vec::new(),
            source: FileSource::External {
                external: ExternalFile { url: url.into() },
            },
        }
    }

    pub fn url(&self) -> &str {
        match &self.source {
            FileSource::External { external } => &external.url,
            FileSource::File { file } => &file.url,
        }
    }

    /// Rewrite the reference in place, e.g. after materializing the asset.
    pub fn set_url(&mut self, url: String) {
        match &mut self.source {
            FileSource::External { external } => external.url = url,
            FileSource::File { file } => file.url = url,
        }
    }
}

/// An icon attached to callouts and pages: an emoji or a file reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    Emoji { emoji: String },
    External { external: ExternalFile },
    File { file: HostedFile },
}

impl Icon {
    pub fn emoji(&self) -> Option<&str> {
        match self {
            Icon::Emoji { emoji } => Some(emoji),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_paragraph() {
        let json = r#"{
            "id": "b1",
            "type": "paragraph",
            "has_children": false,
            "paragraph": { "rich_text": [ { "type": "text", "text": { "content": "hi" } } ] }
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.kind(), BlockKind::Paragraph);
        assert_eq!(block.rich_text().unwrap()[0].raw_text(), "hi");
        assert!(block.children.is_empty());
    }

    #[test]
    fn test_deserialize_hosted_image() {
        let json = r#"{
            "id": "b2",
            "type": "image",
            "has_children": false,
            "image": { "type": "file", "file": { "url": "https://files.example.com/a/b.png" } }
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.kind(), BlockKind::Image);
        assert_eq!(block.file_ref().unwrap().url(), "https://files.example.com/a/b.png");
    }

    #[test]
    fn test_deserialize_table_row() {
        let json = r#"{
            "id": "r1",
            "type": "table_row",
            "table_row": { "cells": [
                [ { "type": "text", "text": { "content": "a" } } ],
                [ { "type": "text", "text": { "content": "b" } } ]
            ] }
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        match &block.payload {
            BlockPayload::TableRow { table_row } => assert_eq!(table_row.cells.len(), 2),
            _ => panic!("expected table_row"),
        }
    }

    #[test]
    fn test_unknown_type_maps_to_unsupported() {
        let json = r#"{ "id": "x", "type": "ai_block", "ai_block": {} }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.kind(), BlockKind::Unsupported);
    }

    #[test]
    fn test_kind_names_are_snake_case() {
        assert_eq!(BlockKind::BulletedListItem.name(), "bulleted_list_item");
        assert_eq!(BlockKind::Heading1.name(), "heading_1");
        assert_eq!(BlockKind::Pdf.name(), "pdf");
    }

    #[test]
    fn test_supports_children() {
        assert!(BlockKind::Paragraph.supports_children());
        assert!(BlockKind::Table.supports_children());
        assert!(!BlockKind::Image.supports_children());
        assert!(!BlockKind::Divider.supports_children());
    }

    #[test]
    fn test_set_url_rewrites_reference() {
        let mut file = FileRef::external("https://cdn.example.com/pic.png");
        file.set_url("media/pic.png".to_string());
        assert_eq!(file.url(), "media/pic.png");
    }
}
