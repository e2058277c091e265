//! Batch orchestration: database query, per-page conversion, child-database
//! discovery, status publishing and the run tally.

use std::fs;
use std::path::Path;

use log::{error, info};

use crate::api::{fetch_tree, NotionClient};
use crate::config::Config;
use crate::error::Result;
use crate::files::{self, MEDIA_DIR};
use crate::media::MediaStore;
use crate::model::{Block, BlockKind, Page};
use crate::render::{
    FrontMatter, LinkResolver, MarkdownRenderer, MetadataExtractor, PageMeta, RenderOptions,
};

/// Per-run outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub published: usize,
}

/// First child-database marker among the page's root blocks, if any.
///
/// A page holding a child database is not converted itself; the database is
/// queued and its pages are processed after the current one.
pub fn find_child_database(blocks: &[Block]) -> Option<String> {
    blocks
        .iter()
        .find(|b| b.kind() == BlockKind::ChildDatabase)
        .map(|b| b.id.clone())
}

/// Convert one fetched page into its on-disk bundle.
pub fn convert_page(config: &Config, page: &Page, blocks: &mut [Block]) -> Result<()> {
    let meta = PageMeta::from_page(page);
    let location = files::locate(
        Path::new(&config.markdown.home_path),
        &meta,
        config.markdown.group_by_month,
    );
    let visit_prefix = if config.markdown.image_public_link.is_empty() {
        MEDIA_DIR.to_string()
    } else {
        config.markdown.image_public_link.clone()
    };
    let media = MediaStore::new(&location.media_dir, visit_prefix);
    let resolver = LinkResolver::new();

    let mut fm = if meta.is_setting() {
        FrontMatter::new()
    } else {
        MetadataExtractor::new(config, &media).extract(page, &meta)
    };

    let options = RenderOptions {
        extended_syntax: config.extended_syntax_enabled(),
        is_setting: meta.is_setting(),
        is_folder: meta.is_folder(),
        page_type: meta.page_type.clone(),
        content_template: if meta.is_setting() {
            None
        } else {
            config.markdown.template.clone()
        },
    };

    let document = MarkdownRenderer::new(&media, &resolver, options).render(blocks, &mut fm)?;
    location.write(&document)
}

/// Drives a full conversion run against the content source.
pub struct SiteGenerator<'a> {
    client: &'a NotionClient,
    config: &'a Config,
}

impl<'a> SiteGenerator<'a> {
    pub fn new(client: &'a NotionClient, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Process the configured database and every child database discovered
    /// along the way. Per-page failures are logged and counted; only a
    /// failure of the root database query aborts the run.
    pub fn run(&self) -> Result<RunSummary> {
        fs::create_dir_all(&self.config.markdown.home_path)?;
        let mut summary = RunSummary::default();
        let mut databases = vec![self.config.notion.database_id.clone()];

        let mut idx = 0;
        while idx < databases.len() {
            let db = databases[idx].clone();
            let is_root = idx == 0;
            idx += 1;
            if let Err(err) = self.process_database(&db, &mut databases, &mut summary) {
                if is_root {
                    return Err(err);
                }
                error!("processing child database {}: {}", db, err);
            }
        }

        info!(
            "run complete: {} succeeded, {} failed, {} published",
            summary.succeeded, summary.failed, summary.published
        );
        Ok(summary)
    }

    fn process_database(
        &self,
        id: &str,
        databases: &mut Vec<String>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let query = self.client.query_database(
            id,
            &self.config.notion.filter_prop,
            &self.config.notion.filter_value,
        )?;
        let total = query.results.len();
        info!("database {}: {} matching pages", id, total);

        for (i, page) in query.results.iter().enumerate() {
            info!("article [{}/{}] {}", i + 1, total, page.url);

            let mut blocks = match fetch_tree(self.client, &page.id) {
                Ok(blocks) => blocks,
                Err(err) => {
                    error!("fetching blocks tree of {}: {}", page.id, err);
                    summary.failed += 1;
                    continue;
                }
            };

            if let Some(child) = find_child_database(&blocks) {
                info!("page {} defers to child database {}", page.id, child);
                databases.push(child);
                continue;
            }

            match convert_page(self.config, page, &mut blocks) {
                Ok(()) => {
                    summary.succeeded += 1;
                    if self.client.publish(
                        page,
                        &self.config.notion.filter_prop,
                        &self.config.notion.published_value,
                    ) {
                        summary.published += 1;
                    }
                }
                Err(err) => {
                    error!("generating page {}: {}", page.id, err);
                    summary.failed += 1;
                }
            }
        }
        Ok(())
    }
}
