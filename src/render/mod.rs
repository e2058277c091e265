//! Rendering: block trees to markdown documents with a metadata header.

mod frontmatter;
mod markdown;
mod richtext;
mod sidecar;
mod template;

pub use frontmatter::{FmValue, FrontMatter, MetadataExtractor, PageMeta};
pub use markdown::{GalleryAction, MarkdownRenderer, RenderOptions};
pub use richtext::{convert_table, format_span, format_spans, palette_color};
pub use sidecar::{LinkResolver, SideChannel};
pub use template::{template_for, RenderContext};
