//! Per-block-type templates and their dispatch table.
//!
//! Templates are looked up by the lower-snake-case block-kind name; an
//! unknown name is a hard error that aborts the current document. The table
//! also carries the synthetic `gallery`, `mermaid`, `noop` and `setting`
//! entries selected by the engine rather than by block kind.

use crate::error::{Error, Result};
use crate::model::{Block, BlockPayload};

use super::richtext::{convert_table, format_spans};
use super::sidecar::SideChannel;

/// Per-node state handed to a template: the block itself plus traversal
/// position and any side-channel values extracted for it.
pub struct RenderContext<'a> {
    pub block: &'a Block,
    pub depth: usize,
    /// Run index among consecutive same-kind siblings.
    pub same_run_idx: usize,
    pub side: &'a SideChannel,
}

impl RenderContext<'_> {
    fn rich(&self) -> String {
        self.block.rich_text().map(format_spans).unwrap_or_default()
    }

    /// Raw (unformatted) text of the block, used for code bodies.
    fn raw(&self) -> String {
        self.block
            .rich_text()
            .map(|spans| spans.iter().map(|s| s.raw_text()).collect())
            .unwrap_or_default()
    }

    fn indent(&self) -> String {
        "\t".repeat(self.depth)
    }
}

pub type TemplateFn = fn(&RenderContext) -> String;

/// Resolve the template for a block-kind (or synthetic) name.
pub fn template_for(name: &str) -> Result<TemplateFn> {
    let tpl: TemplateFn = match name {
        "paragraph" | "toggle" | "template" => paragraph,
        "heading_1" => |ctx| format!("# {}\n\n", ctx.rich()),
        "heading_2" => |ctx| format!("## {}\n\n", ctx.rich()),
        "heading_3" => |ctx| format!("### {}\n\n", ctx.rich()),
        "bulleted_list_item" => |ctx| format!("{}- {}\n", ctx.indent(), ctx.rich()),
        "numbered_list_item" => {
            |ctx| format!("{}{}. {}\n", ctx.indent(), ctx.same_run_idx + 1, ctx.rich())
        }
        "to_do" => to_do,
        "quote" => |ctx| format!("> {}\n\n", ctx.rich()),
        "callout" => callout,
        "code" => code,
        "divider" => |_| "---\n\n".to_string(),
        "table" => |ctx| format!("{}\n", convert_table(&ctx.block.children)),
        // rows are emitted by the table template
        "table_row" => |_| String::new(),
        "image" => image,
        "video" => video,
        "file" | "pdf" | "audio" => file,
        "bookmark" => bookmark,
        "embed" => embed,
        "link_preview" => link_preview,
        "link_to_page" | "breadcrumb" | "synced_block" | "column_list" | "column" => {
            |_| String::new()
        }
        "child_page" => child_page,
        // processed by the orchestrator, nothing to emit inline
        "child_database" => |_| String::new(),
        "equation" => equation,
        "gallery" => gallery,
        "mermaid" => |ctx| format!("```mermaid\n{}\n```\n\n", ctx.raw()),
        "noop" => |_| String::new(),
        "setting" => |ctx| format!("{}\n", ctx.raw()),
        other => return Err(Error::TemplateNotFound(other.to_string())),
    };
    Ok(tpl)
}

fn paragraph(ctx: &RenderContext) -> String {
    let rich = ctx.rich();
    if rich.is_empty() {
        "\n".to_string()
    } else {
        format!("{}\n\n", rich)
    }
}

fn to_do(ctx: &RenderContext) -> String {
    let mark = match &ctx.block.payload {
        BlockPayload::ToDo { to_do } if to_do.checked => "x",
        _ => " ",
    };
    format!("{}- [{}] {}\n", ctx.indent(), mark, ctx.rich())
}

fn callout(ctx: &RenderContext) -> String {
    match ctx.side {
        SideChannel::Callout { emoji, text } => format!("> {} {}\n\n", emoji, text),
        _ => format!("> {}\n\n", ctx.rich()),
    }
}

fn code(ctx: &RenderContext) -> String {
    let language = match &ctx.block.payload {
        BlockPayload::Code { code } => code.language.as_deref().unwrap_or_default(),
        _ => "",
    };
    format!("```{}\n{}\n```\n\n", language, ctx.raw())
}

fn image(ctx: &RenderContext) -> String {
    let Some(file) = ctx.block.file_ref() else {
        return String::new();
    };
    let caption: String = file.caption.iter().map(|s| s.raw_text()).collect();
    format!("![{}]({})\n\n", caption, file.url())
}

fn video(ctx: &RenderContext) -> String {
    match ctx.side {
        SideChannel::Video { plat, id } if plat == "youtube" => {
            format!("{{{{< youtube {} >}}}}\n\n", id)
        }
        _ => match ctx.block.file_ref() {
            Some(file) if !file.url().is_empty() => {
                format!("[{url}]({url})\n\n", url = file.url())
            }
            _ => String::new(),
        },
    }
}

fn file(ctx: &RenderContext) -> String {
    match ctx.side {
        SideChannel::FileInfo { url, name } if !url.is_empty() => {
            format!("[{}]({})\n\n", name, url)
        }
        _ => String::new(),
    }
}

fn bookmark(ctx: &RenderContext) -> String {
    match ctx.side {
        SideChannel::Bookmark {
            title,
            description,
            image,
            url,
        } => format!(
            "{{{{< bookmark url=\"{}\" title=\"{}\" description=\"{}\" image=\"{}\" >}}}}\n\n",
            url, title, description, image
        ),
        _ => String::new(),
    }
}

fn embed(ctx: &RenderContext) -> String {
    match ctx.side {
        SideChannel::Embed { plat, id, user } => match plat.as_str() {
            "bilibili" => format!("{{{{< bilibili {} >}}}}\n\n", id),
            "twitter" => format!("{{{{< tweet user=\"{}\" id=\"{}\" >}}}}\n\n", user, id),
            "gist" => format!("{{{{< gist {} >}}}}\n\n", id),
            "jsfiddle" => format!("{{{{< jsfiddle {} >}}}}\n\n", id),
            _ => match &ctx.block.payload {
                BlockPayload::Embed { embed } if !embed.url.is_empty() => {
                    format!("[{url}]({url})\n\n", url = embed.url)
                }
                _ => String::new(),
            },
        },
        _ => String::new(),
    }
}

fn link_preview(ctx: &RenderContext) -> String {
    match &ctx.block.payload {
        BlockPayload::LinkPreview { link_preview } if !link_preview.url.is_empty() => {
            format!("[{url}]({url})\n\n", url = link_preview.url)
        }
        _ => String::new(),
    }
}

fn child_page(ctx: &RenderContext) -> String {
    match &ctx.block.payload {
        BlockPayload::ChildPage { child_page } => format!("## {}\n\n", child_page.title),
        _ => String::new(),
    }
}

fn equation(ctx: &RenderContext) -> String {
    match &ctx.block.payload {
        BlockPayload::Equation { equation } => match equation.get("expression") {
            Some(expr) => format!("$$\n{}\n$$\n\n", expr.as_str().unwrap_or_default()),
            None => String::new(),
        },
        _ => String::new(),
    }
}

fn gallery(ctx: &RenderContext) -> String {
    match ctx.side {
        SideChannel::Gallery { images } => {
            let mut out = String::from("{{< gallery >}}\n");
            for image in images {
                out.push_str(&format!("  {{{{< galleryImg src=\"{}\" >}}}}\n", image));
            }
            out.push_str("{{< /gallery >}}\n\n");
            out
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(json: serde_json::Value) -> Block {
        serde_json::from_value(json).unwrap()
    }

    fn ctx<'a>(block: &'a Block, side: &'a SideChannel) -> RenderContext<'a> {
        RenderContext {
            block,
            depth: 0,
            same_run_idx: 0,
            side,
        }
    }

    #[test]
    fn test_unknown_template_is_hard_error() {
        assert!(matches!(
            template_for("unsupported"),
            Err(Error::TemplateNotFound(_))
        ));
        assert!(template_for("paragraph").is_ok());
    }

    #[test]
    fn test_headings() {
        let b = block(serde_json::json!({
            "id": "h", "type": "heading_2",
            "heading_2": { "rich_text": [ { "type": "text", "text": { "content": "Title" } } ] }
        }));
        let side = SideChannel::None;
        let out = template_for("heading_2").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "## Title\n\n");
    }

    #[test]
    fn test_nested_list_indentation_and_numbering() {
        let b = block(serde_json::json!({
            "id": "n", "type": "numbered_list_item",
            "numbered_list_item": { "rich_text": [ { "type": "text", "text": { "content": "item" } } ] }
        }));
        let side = SideChannel::None;
        let context = RenderContext {
            block: &b,
            depth: 2,
            same_run_idx: 3,
            side: &side,
        };
        let out = template_for("numbered_list_item").unwrap()(&context);
        assert_eq!(out, "\t\t4. item\n");
    }

    #[test]
    fn test_todo_checkbox_states() {
        let side = SideChannel::None;
        let checked = block(serde_json::json!({
            "id": "t", "type": "to_do",
            "to_do": { "checked": true, "rich_text": [ { "type": "text", "text": { "content": "done" } } ] }
        }));
        let out = template_for("to_do").unwrap()(&ctx(&checked, &side));
        assert_eq!(out, "- [x] done\n");

        let open = block(serde_json::json!({
            "id": "t", "type": "to_do",
            "to_do": { "checked": false, "rich_text": [ { "type": "text", "text": { "content": "later" } } ] }
        }));
        let out = template_for("to_do").unwrap()(&ctx(&open, &side));
        assert_eq!(out, "- [ ] later\n");
    }

    #[test]
    fn test_code_block_fenced_with_language() {
        let b = block(serde_json::json!({
            "id": "c", "type": "code",
            "code": {
                "language": "rust",
                "rich_text": [ { "type": "text", "text": { "content": "fn main() {}" } } ]
            }
        }));
        let side = SideChannel::None;
        let out = template_for("code").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "```rust\nfn main() {}\n```\n\n");
    }

    #[test]
    fn test_mermaid_uses_diagram_fence() {
        let b = block(serde_json::json!({
            "id": "c", "type": "code",
            "code": {
                "language": "mermaid",
                "rich_text": [ { "type": "text", "text": { "content": "graph TD;" } } ]
            }
        }));
        let side = SideChannel::None;
        let out = template_for("mermaid").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "```mermaid\ngraph TD;\n```\n\n");
    }

    #[test]
    fn test_image_with_caption() {
        let b = block(serde_json::json!({
            "id": "i", "type": "image",
            "image": {
                "type": "external",
                "external": { "url": "media/pic.png" },
                "caption": [ { "type": "text", "text": { "content": "a cat" } } ]
            }
        }));
        let side = SideChannel::None;
        let out = template_for("image").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "![a cat](media/pic.png)\n\n");
    }

    #[test]
    fn test_video_shortcode() {
        let b = block(serde_json::json!({
            "id": "v", "type": "video",
            "video": { "type": "external", "external": { "url": "https://www.youtube.com/watch?v=abc" } }
        }));
        let side = SideChannel::Video {
            plat: "youtube".to_string(),
            id: "abc".to_string(),
        };
        let out = template_for("video").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "{{< youtube abc >}}\n\n");
    }

    #[test]
    fn test_embed_platform_shortcodes() {
        let b = block(serde_json::json!({
            "id": "e", "type": "embed",
            "embed": { "url": "https://twitter.com/rustlang/status/99" }
        }));
        let side = SideChannel::Embed {
            plat: "twitter".to_string(),
            id: "99".to_string(),
            user: "rustlang".to_string(),
        };
        let out = template_for("embed").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "{{< tweet user=\"rustlang\" id=\"99\" >}}\n\n");
    }

    #[test]
    fn test_gallery_template_lists_collected_images() {
        let b = block(serde_json::json!({
            "id": "g", "type": "image",
            "image": { "type": "external", "external": { "url": "media/c.png" } }
        }));
        let side = SideChannel::Gallery {
            images: vec!["media/a.png".to_string(), "media/b.png".to_string()],
        };
        let out = template_for("gallery").unwrap()(&ctx(&b, &side));
        assert!(out.starts_with("{{< gallery >}}\n"));
        assert!(out.contains("src=\"media/a.png\""));
        assert!(out.contains("src=\"media/b.png\""));
        assert!(out.ends_with("{{< /gallery >}}\n\n"));
    }

    #[test]
    fn test_table_template_renders_children() {
        let mut b = block(serde_json::json!({
            "id": "t", "type": "table", "has_children": true,
            "table": { "table_width": 2 }
        }));
        b.children = vec![
            block(serde_json::json!({
                "id": "r1", "type": "table_row",
                "table_row": { "cells": [
                    [ { "type": "text", "text": { "content": "h" } } ]
                ] }
            })),
            block(serde_json::json!({
                "id": "r2", "type": "table_row",
                "table_row": { "cells": [
                    [ { "type": "text", "text": { "content": "v" } } ]
                ] }
            })),
        ];
        let side = SideChannel::None;
        let out = template_for("table").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "| h |\n| --- |\n| v |\n\n");
    }

    #[test]
    fn test_equation_dollar_fence() {
        let b = block(serde_json::json!({
            "id": "q", "type": "equation",
            "equation": { "expression": "e = mc^2" }
        }));
        let side = SideChannel::None;
        let out = template_for("equation").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "$$\ne = mc^2\n$$\n\n");
    }

    #[test]
    fn test_setting_emits_raw_code_content() {
        let b = block(serde_json::json!({
            "id": "s", "type": "code",
            "code": {
                "language": "yaml",
                "rich_text": [ { "type": "text", "text": { "content": "key: value" } } ]
            }
        }));
        let side = SideChannel::None;
        let out = template_for("setting").unwrap()(&ctx(&b, &side));
        assert_eq!(out, "key: value\n");
    }
}
