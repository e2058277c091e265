//! Media materialization: download referenced remote assets into the output
//! tree and rewrite their references to local paths.

use std::fs;
use std::path::PathBuf;

use log::warn;

use crate::error::{Error, Result};
use crate::model::FileRef;

/// Downloads remote assets under a destination directory and hands back the
/// rewritten visit path.
///
/// The destination directory may be shared across pages; directory creation
/// is idempotent. Repeated fetches of the same URL re-download and overwrite.
pub struct MediaStore {
    http: reqwest::blocking::Client,
    save_dir: PathBuf,
    visit_prefix: String,
}

impl MediaStore {
    /// `save_dir` is where bytes land on disk; `visit_prefix` is the path
    /// prefix written into the document (e.g. `media`).
    pub fn new(save_dir: impl Into<PathBuf>, visit_prefix: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            save_dir: save_dir.into(),
            visit_prefix: visit_prefix.into(),
        }
    }

    /// Point the store at a different destination directory. The orchestrator
    /// calls this when moving between article bundles.
    pub fn set_save_dir(&mut self, dir: impl Into<PathBuf>) {
        self.save_dir = dir.into();
    }

    /// Download `url` and persist it, returning the rewritten reference.
    pub fn materialize(&self, url: &str) -> Result<String> {
        let filename = derive_filename(url)?;
        let resp = self.http.get(url).send()?.error_for_status()?;
        let bytes = resp.bytes()?;
        self.save(&bytes, &filename)?;
        let prefix = self.visit_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            Ok(filename)
        } else {
            Ok(format!("{}/{}", prefix, filename))
        }
    }

    /// Rewrite a file reference in place. On failure the reference is
    /// blanked and conversion proceeds.
    pub fn rewrite(&self, file: &mut FileRef) {
        match self.materialize(file.url()) {
            Ok(local) => file.set_url(local),
            Err(err) => {
                warn!("failed to materialize {}: {}", file.url(), err);
                file.set_url(String::new());
            }
        }
    }

    /// Download an asset referenced from the metadata header (cover, banner,
    /// avatar). Returns an empty string on failure.
    pub fn materialize_or_empty(&self, url: &str) -> String {
        match self.materialize(url) {
            Ok(local) => local,
            Err(err) => {
                warn!("failed to materialize {}: {}", url, err);
                String::new()
            }
        }
    }

    fn save(&self, bytes: &[u8], filename: &str) -> Result<()> {
        fs::create_dir_all(&self.save_dir)?;
        fs::write(self.save_dir.join(filename), bytes)?;
        Ok(())
    }
}

/// Derive the destination filename for an asset URL.
///
/// Takes the final path segment as the base name; auto-generated
/// `Untitled.*` uploads substitute the parent segment to avoid collisions.
/// The source host is prefixed to reduce collisions across origins.
pub fn derive_filename(raw_url: &str) -> Result<String> {
    let url = reqwest::Url::parse(raw_url)
        .map_err(|e| Error::MalformedUrl(format!("{}: {}", raw_url, e)))?;

    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    let last = segments.last().copied().unwrap_or_default();

    let base = match last.strip_prefix("Untitled.") {
        Some(ext) if segments.len() >= 2 => {
            format!("{}.{}", segments[segments.len() - 2], ext)
        }
        _ => last.to_string(),
    };

    let host = url.host_str().unwrap_or("unknown");
    Ok(format!("{}_{}", host, base))
}
