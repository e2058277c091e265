//! The rendering engine: depth-first walk over a block tree, per-block side
//! effects, template dispatch, and final document assembly.

use std::fs;

use log::debug;

use crate::error::Result;
use crate::media::MediaStore;
use crate::model::{Block, BlockKind, BlockPayload};

use super::frontmatter::FrontMatter;
use super::sidecar::{self, LinkResolver, SideChannel};
use super::template::{template_for, RenderContext};

/// Body length past which the excerpt marker is inserted after the next
/// rendered block.
const TRUNCATION_THRESHOLD: usize = 60;
const TRUNCATION_MARKER: &str = "<!--more-->";

/// Gallery-run classification for one position in a sibling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryAction {
    /// Part of a run flushed later; collect, emit nothing.
    Skip,
    /// Run end; emit the consolidated gallery block here.
    Write,
    /// Render normally.
    Nothing,
}

/// Classify position `i` of a sibling kind sequence.
///
/// A run of two or more adjacent images collapses into one gallery emitted
/// at the run's last image. Pure in (kinds, i).
pub fn gallery_action(kinds: &[BlockKind], i: usize) -> GalleryAction {
    let image = BlockKind::Image;
    if kinds[i] != image || kinds.len() == 1 {
        return GalleryAction::Nothing;
    }
    if i == 0 {
        return if kinds[1] == image {
            GalleryAction::Skip
        } else {
            GalleryAction::Nothing
        };
    }
    if i == kinds.len() - 1 {
        return if kinds[i - 1] == image {
            GalleryAction::Write
        } else {
            GalleryAction::Nothing
        };
    }
    match (kinds[i - 1] == image, kinds[i + 1] == image) {
        (_, true) => GalleryAction::Skip,
        (true, false) => GalleryAction::Write,
        (false, false) => GalleryAction::Nothing,
    }
}

/// Per-page rendering policy derived from config and page metadata.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Render bookmark and callout blocks; when off they are skipped
    /// entirely.
    pub extended_syntax: bool,
    /// Setting pages emit only their embedded code blocks, no header.
    pub is_setting: bool,
    /// Folder pages produce no document at all.
    pub is_folder: bool,
    /// Declared content type of the page; `"gallery"` enables run grouping.
    pub page_type: String,
    /// Path to a page-level template the assembled document is passed
    /// through as final step.
    pub content_template: Option<String>,
}

/// Walks a block tree and produces the final markdown document.
pub struct MarkdownRenderer<'a> {
    media: &'a MediaStore,
    resolver: &'a LinkResolver,
    options: RenderOptions,
    body: String,
    truncated: bool,
    gallery_run: Vec<String>,
}

impl<'a> MarkdownRenderer<'a> {
    pub fn new(media: &'a MediaStore, resolver: &'a LinkResolver, options: RenderOptions) -> Self {
        Self {
            media,
            resolver,
            options,
            body: String::new(),
            truncated: false,
            gallery_run: Vec::new(),
        }
    }

    /// Render the full document: header (unless suppressed), body, optional
    /// page-level template pass.
    pub fn render(mut self, blocks: &mut [Block], fm: &mut FrontMatter) -> Result<String> {
        let mut out = String::new();
        if !self.options.is_setting && !self.options.is_folder && !fm.is_empty() {
            fm.resolve_banners(self.media);
            out.push_str(&fm.to_yaml());
        }

        self.walk(blocks, 0)?;

        // folder pages exist for their directory only; side effects above
        // still ran
        if self.options.is_folder {
            return Ok(String::new());
        }
        out.push_str(&self.body);

        if let Some(path) = &self.options.content_template {
            let template = fs::read_to_string(path)?;
            return Ok(apply_content_template(&template, &out));
        }
        Ok(out)
    }

    fn walk(&mut self, blocks: &mut [Block], depth: usize) -> Result<()> {
        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind()).collect();
        let mut same_run_idx: usize = 0;
        let mut last_kind: Option<BlockKind> = None;

        for i in 0..blocks.len() {
            let kind = kinds[i];
            if !self.options.extended_syntax
                && matches!(kind, BlockKind::Bookmark | BlockKind::Callout)
            {
                continue;
            }

            same_run_idx += 1;
            if last_kind != Some(kind) {
                same_run_idx = 0;
            }
            last_kind = Some(kind);

            if self.options.is_setting {
                if kind == BlockKind::Code {
                    let side = SideChannel::None;
                    let ctx = RenderContext {
                        block: &blocks[i],
                        depth,
                        same_run_idx,
                        side: &side,
                    };
                    self.body.push_str(&template_for("setting")?(&ctx));
                }
                continue;
            }

            let mut side = self.side_effects(&mut blocks[i]);

            let mut template_name = kind.name();
            if self.options.page_type == "gallery" {
                match gallery_action(&kinds, i) {
                    GalleryAction::Skip => {
                        if let Some(file) = blocks[i].file_ref() {
                            self.gallery_run.push(file.url().to_string());
                        }
                        continue;
                    }
                    GalleryAction::Write => {
                        let mut images = std::mem::take(&mut self.gallery_run);
                        if let Some(file) = blocks[i].file_ref() {
                            images.push(file.url().to_string());
                        }
                        side = SideChannel::Gallery { images };
                        template_name = "gallery";
                    }
                    GalleryAction::Nothing => {}
                }
            }
            if is_mermaid(&blocks[i]) {
                template_name = "mermaid";
            }

            let add_marker = !self.truncated && self.body.len() > TRUNCATION_THRESHOLD;

            debug!("rendering block {} as {}", blocks[i].id, template_name);
            let ctx = RenderContext {
                block: &blocks[i],
                depth,
                same_run_idx,
                side: &side,
            };
            self.body.push_str(&template_for(template_name)?(&ctx));

            if add_marker {
                self.body.push_str(TRUNCATION_MARKER);
                self.truncated = true;
            }

            if !blocks[i].children.is_empty() {
                self.walk(&mut blocks[i].children, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Media rewriting and side-channel extraction. Failures are recovered
    /// inside; rendering always proceeds.
    fn side_effects(&self, block: &mut Block) -> SideChannel {
        if block.kind().is_media() {
            if let Some(file) = block.file_ref_mut() {
                self.media.rewrite(file);
            }
        }
        sidecar::extract(block, self.resolver)
    }
}

fn is_mermaid(block: &Block) -> bool {
    matches!(
        &block.payload,
        BlockPayload::Code { code } if code.language.as_deref() == Some("mermaid")
    )
}

/// Substitute the assembled document into a page-level template.
fn apply_content_template(template: &str, document: &str) -> String {
    template
        .replace("{{ content }}", document)
        .replace("{{content}}", document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::frontmatter::FmValue;

    fn paragraph(id: &str, text: &str) -> Block {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "paragraph",
            "paragraph": { "rich_text": [ { "type": "text", "text": { "content": text } } ] }
        }))
        .unwrap()
    }

    fn image(id: &str) -> Block {
        // unreachable host so materialization fails fast and blanks the url
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "image",
            "image": { "type": "external", "external": { "url": format!("http://127.0.0.1:9/{}.png", id) } }
        }))
        .unwrap()
    }

    fn numbered(id: &str, text: &str) -> Block {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "type": "numbered_list_item",
            "numbered_list_item": { "rich_text": [ { "type": "text", "text": { "content": text } } ] }
        }))
        .unwrap()
    }

    fn kinds_of(blocks: &[Block]) -> Vec<BlockKind> {
        blocks.iter().map(|b| b.kind()).collect()
    }

    fn render(blocks: &mut [Block], options: RenderOptions) -> String {
        let media = MediaStore::new(std::env::temp_dir().join("notedown-render-test"), "media");
        let resolver = LinkResolver::new();
        let mut fm = FrontMatter::new();
        MarkdownRenderer::new(&media, &resolver, options)
            .render(blocks, &mut fm)
            .unwrap()
    }

    #[test]
    fn test_gallery_classification_five_image_run() {
        let blocks: Vec<Block> = (0..5).map(|i| image(&format!("i{}", i))).collect();
        let kinds = kinds_of(&blocks);
        assert_eq!(gallery_action(&kinds, 0), GalleryAction::Skip);
        for i in 1..4 {
            assert_eq!(gallery_action(&kinds, i), GalleryAction::Skip);
        }
        assert_eq!(gallery_action(&kinds, 4), GalleryAction::Write);
    }

    #[test]
    fn test_gallery_classification_singles_and_boundaries() {
        let blocks = vec![image("a")];
        assert_eq!(gallery_action(&kinds_of(&blocks), 0), GalleryAction::Nothing);

        let blocks = vec![image("a"), paragraph("p", "x")];
        let kinds = kinds_of(&blocks);
        assert_eq!(gallery_action(&kinds, 0), GalleryAction::Nothing);
        assert_eq!(gallery_action(&kinds, 1), GalleryAction::Nothing);

        // run bounded by text on both sides
        let blocks = vec![
            paragraph("p1", "x"),
            image("a"),
            image("b"),
            paragraph("p2", "y"),
        ];
        let kinds = kinds_of(&blocks);
        assert_eq!(gallery_action(&kinds, 1), GalleryAction::Skip);
        assert_eq!(gallery_action(&kinds, 2), GalleryAction::Write);
    }

    #[test]
    fn test_gallery_page_collapses_run_into_one_block() {
        let mut blocks: Vec<Block> = (0..3).map(|i| image(&format!("g{}", i))).collect();
        let out = render(
            &mut blocks,
            RenderOptions {
                page_type: "gallery".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(out.matches("{{< gallery >}}").count(), 1);
        assert_eq!(out.matches("galleryImg").count(), 3);
        // no standalone image markdown
        assert!(!out.contains("!["));
    }

    #[test]
    fn test_non_gallery_page_renders_images_normally() {
        let mut blocks: Vec<Block> = (0..2).map(|i| image(&format!("n{}", i))).collect();
        let out = render(&mut blocks, RenderOptions::default());
        assert!(!out.contains("gallery"));
        assert_eq!(out.matches("![").count(), 2);
    }

    #[test]
    fn test_truncation_marker_inserted_once_after_threshold() {
        let long = "a".repeat(40);
        let mut blocks = vec![
            paragraph("p1", &long),
            paragraph("p2", &long),
            paragraph("p3", &long),
        ];
        let out = render(&mut blocks, RenderOptions::default());
        assert_eq!(out.matches(TRUNCATION_MARKER).count(), 1);
        // threshold is crossed before the third block renders, so the marker
        // follows that block's output
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(out.matches(&long).count(), 3);
    }

    #[test]
    fn test_run_index_numbers_consecutive_items_and_resets() {
        let mut blocks = vec![
            numbered("n1", "first"),
            numbered("n2", "second"),
            paragraph("p", "break"),
            numbered("n3", "restart"),
        ];
        let out = render(&mut blocks, RenderOptions::default());
        assert!(out.contains("1. first"));
        assert!(out.contains("2. second"));
        assert!(out.contains("1. restart"));
        assert!(!out.contains("3. restart"));
    }

    #[test]
    fn test_setting_page_emits_only_code_content() {
        let code: Block = serde_json::from_value(serde_json::json!({
            "id": "c",
            "type": "code",
            "code": {
                "language": "yaml",
                "rich_text": [ { "type": "text", "text": { "content": "baseURL: /" } } ]
            }
        }))
        .unwrap();
        let mut blocks = vec![paragraph("p", "ignored"), code, paragraph("q", "also ignored")];

        let media = MediaStore::new(std::env::temp_dir().join("notedown-render-test"), "media");
        let resolver = LinkResolver::new();
        let mut fm = FrontMatter::new();
        fm.insert("title", FmValue::String("config".to_string()));
        let out = MarkdownRenderer::new(
            &media,
            &resolver,
            RenderOptions {
                is_setting: true,
                ..Default::default()
            },
        )
        .render(&mut blocks, &mut fm)
        .unwrap();

        assert_eq!(out, "baseURL: /\n");
    }

    #[test]
    fn test_extended_syntax_gates_callout() {
        let callout: Block = serde_json::from_value(serde_json::json!({
            "id": "c",
            "type": "callout",
            "callout": {
                "icon": { "type": "emoji", "emoji": "💡" },
                "rich_text": [ { "type": "text", "text": { "content": "note this" } } ]
            }
        }))
        .unwrap();

        let out = render(&mut [callout.clone()], RenderOptions::default());
        assert_eq!(out, "");

        let out = render(
            &mut [callout],
            RenderOptions {
                extended_syntax: true,
                ..Default::default()
            },
        );
        assert_eq!(out, "> 💡 note this\n\n");
    }

    #[test]
    fn test_header_precedes_body() {
        let media = MediaStore::new(std::env::temp_dir().join("notedown-render-test"), "media");
        let resolver = LinkResolver::new();
        let mut fm = FrontMatter::new();
        fm.insert("title", FmValue::String("Post".to_string()));

        let mut blocks = vec![paragraph("p", "body text")];
        let out = MarkdownRenderer::new(&media, &resolver, RenderOptions::default())
            .render(&mut blocks, &mut fm)
            .unwrap();
        assert!(out.starts_with("---\ntitle: \"Post\"\n---\n"));
        assert!(out.ends_with("body text\n\n"));
    }

    #[test]
    fn test_folder_page_produces_no_document() {
        let mut blocks = vec![paragraph("p", "hidden")];
        let out = render(
            &mut blocks,
            RenderOptions {
                is_folder: true,
                ..Default::default()
            },
        );
        assert_eq!(out, "");
    }

    #[test]
    fn test_nested_children_rendered_depth_first() {
        let mut parent = paragraph("p", "parent");
        parent.children = vec![numbered("c", "child")];
        let out = render(&mut [parent], RenderOptions::default());
        let parent_pos = out.find("parent").unwrap();
        let child_pos = out.find("1. child").unwrap();
        assert!(parent_pos < child_pos);
    }

    #[test]
    fn test_content_template_substitution() {
        let out = apply_content_template("<article>{{ content }}</article>", "hello\n");
        assert_eq!(out, "<article>hello\n</article>");
    }

    #[test]
    fn test_mermaid_code_dispatches_to_diagram_fence() {
        let mut blocks = vec![serde_json::from_value::<Block>(serde_json::json!({
            "id": "m",
            "type": "code",
            "code": {
                "language": "mermaid",
                "rich_text": [ { "type": "text", "text": { "content": "graph LR;" } } ]
            }
        }))
        .unwrap()];
        let out = render(&mut blocks, RenderOptions::default());
        assert!(out.contains("```mermaid\ngraph LR;\n```"));
    }
}
