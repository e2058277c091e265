//! # notedown
//!
//! Convert a Notion database into a tree of markdown article bundles.
//!
//! The pipeline queries a database, fetches each page's block tree through
//! cursor-based pagination, extracts page properties into a metadata header,
//! downloads referenced media next to the article, and renders the tree into
//! markdown with optional shortcode output for galleries, embeds and
//! bookmarks.
//!
//! ## Quick Start
//!
//! ```no_run
//! use notedown::{Config, NotionClient, SiteGenerator};
//!
//! fn main() -> notedown::Result<()> {
//!     let config = Config::from_path("notedown.toml")?;
//!     let client = NotionClient::new(std::env::var("NOTION_SECRET").unwrap_or_default());
//!
//!     let summary = SiteGenerator::new(&client, &config).run()?;
//!     println!("{} pages converted", summary.succeeded);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Full block coverage**: paragraphs, headings, lists, tables, code,
//!   media, embeds, equations
//! - **Metadata headers**: fixed schema plus operator-declared dynamic fields
//! - **Asset materialization**: media downloaded into the bundle, references
//!   rewritten
//! - **Gallery runs**: adjacent image sequences collapse into one block
//! - **Partial-failure batches**: one broken page never stops the run

pub mod api;
pub mod config;
pub mod error;
pub mod files;
pub mod media;
pub mod model;
pub mod render;
pub mod site;

// Re-export commonly used types
pub use api::{fetch_children, fetch_tree, BlockChildren, BlockSource, NotionClient, QueryResults};
pub use config::{Config, MarkdownConfig, NotionConfig, PropDef};
pub use error::{Error, Result};
pub use media::MediaStore;
pub use model::{Block, BlockKind, BlockPayload, FileRef, Page, PropertyValue, RichText};
pub use render::{
    FmValue, FrontMatter, GalleryAction, LinkResolver, MarkdownRenderer, MetadataExtractor,
    PageMeta, RenderOptions, SideChannel,
};
pub use site::{convert_page, RunSummary, SiteGenerator};

/// Convert a single fetched page with an explicit block tree.
///
/// Convenience wrapper over [`site::convert_page`] for callers that fetch
/// blocks themselves.
///
/// # Example
///
/// ```no_run
/// use notedown::{fetch_tree, Config, NotionClient};
///
/// let config = Config::from_path("notedown.toml").unwrap();
/// let client = NotionClient::new("secret-token");
/// let query = client
///     .query_database(&config.notion.database_id, "", &[])
///     .unwrap();
/// for page in &query.results {
///     let mut blocks = fetch_tree(&client, &page.id).unwrap();
///     notedown::render_page(&config, page, &mut blocks).unwrap();
/// }
/// ```
pub fn render_page(config: &Config, page: &Page, blocks: &mut [Block]) -> Result<()> {
    site::convert_page(config, page, blocks)
}
