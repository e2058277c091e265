//! Output layout: where a page's markdown bundle and its media land on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::render::PageMeta;

/// Media subdirectory inside an article bundle; also the visit prefix
/// written into documents.
pub const MEDIA_DIR: &str = "media";
pub const DEFAULT_MARKDOWN_NAME: &str = "index.md";

/// Resolved on-disk destination for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Directory that must exist before writing.
    pub folder: PathBuf,
    /// Markdown file path; `None` for folder pages, which create the
    /// directory only.
    pub file: Option<PathBuf>,
    /// Destination for materialized media of this page.
    pub media_dir: PathBuf,
}

impl PageLocation {
    /// Create the bundle directory and write the rendered document.
    pub fn write(&self, document: &str) -> Result<()> {
        fs::create_dir_all(&self.folder)?;
        if let Some(file) = &self.file {
            fs::write(file, document)?;
        }
        Ok(())
    }
}

/// Compute the destination of `meta`'s page under `home`.
///
/// Setting pages are laid out flat in their position directory. Everything
/// else becomes a bundle folder named by slug (or lowercased name), holding
/// `index.md` (or the custom file name) and a `media/` subdirectory.
pub fn locate(home: &Path, meta: &PageMeta, group_by_month: bool) -> PageLocation {
    let position = home.join(&meta.position);

    if meta.is_setting() {
        return PageLocation {
            file: Some(position.join(file_name(meta))),
            media_dir: position.join(MEDIA_DIR),
            folder: position,
        };
    }

    let folder = position.join(bundle_folder(meta, group_by_month));
    let file = if meta.is_folder() {
        None
    } else if meta.is_custom_name() {
        Some(folder.join(file_name(meta)))
    } else {
        Some(folder.join(DEFAULT_MARKDOWN_NAME))
    };
    PageLocation {
        media_dir: folder.join(MEDIA_DIR),
        file,
        folder,
    }
}

/// Bundle folder name: the slug when present (already URL-friendly, shared
/// across translations), otherwise the sanitized page name. Grouping by
/// month prefixes the creation date.
fn bundle_folder(meta: &PageMeta, group_by_month: bool) -> PathBuf {
    let name = if meta.slug.is_empty() {
        sanitize_name(&meta.name)
    } else {
        meta.slug.trim().to_string()
    };
    match (group_by_month, meta.create_date()) {
        (true, Some(date)) => PathBuf::from(date).join(name),
        _ => PathBuf::from(name),
    }
}

fn file_name(meta: &PageMeta) -> String {
    let mut name = sanitize_name(meta.output_name());
    if !meta.is_setting() && !name.contains(".md") {
        name.push_str(".md");
    }
    name
}

/// Lowercase, trim, spaces to dashes.
pub fn sanitize_name(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "-")
}
