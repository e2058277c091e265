//! Pipeline configuration.
//!
//! The configuration object is loaded once and passed explicitly into the
//! extractor and renderer; there is no global state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration loaded from `notedown.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub notion: NotionConfig,

    pub markdown: MarkdownConfig,

    /// Operator-declared extra header fields extracted from page properties
    #[serde(default)]
    pub dynamic_props: Vec<PropDef>,
}

/// Content-source settings: which database to convert and how to filter it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotionConfig {
    pub database_id: String,

    /// Select property used to filter pages (e.g. "Status")
    #[serde(default)]
    pub filter_prop: String,

    /// Option names a page must match to be converted
    #[serde(default)]
    pub filter_value: Vec<String>,

    /// Option name to advance the filter property to after conversion
    #[serde(default)]
    pub published_value: String,
}

/// Output-side settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Root directory the generated bundles are written under
    pub home_path: String,

    /// Public link prefix for rewritten media references
    #[serde(default)]
    pub image_public_link: String,

    /// Group article folders under a per-creation-date directory
    #[serde(default)]
    pub group_by_month: bool,

    /// Optional page-level content template applied as the final pass
    #[serde(default)]
    pub template: Option<String>,

    /// Shortcode dialect for extended-syntax blocks; unset disables them
    #[serde(default)]
    pub shortcode_syntax: Option<String>,
}

/// Declaration of a dynamic header field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropDef {
    /// Property name on the page, also the emitted header key (lower-cased)
    pub name: String,

    /// Source property type: richtext, select, multiselect, number,
    /// checkbox, date or title
    #[serde(rename = "type")]
    pub prop_type: String,

    /// Value used when the page does not carry the property
    #[serde(default)]
    pub default_value: Option<toml::Value>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Whether extended-syntax (shortcode) blocks should be rendered.
    pub fn extended_syntax_enabled(&self) -> bool {
        self.markdown.shortcode_syntax.is_some()
    }

    /// Write a starter configuration file for `init`.
    pub fn write_default(path: impl AsRef<Path>) -> Result<()> {
        let default = Config {
            notion: NotionConfig {
                database_id: "YOUR-NOTION-DATABASE-ID".to_string(),
                filter_prop: "Status".to_string(),
                filter_value: vec!["Finished".to_string(), "Published".to_string()],
                published_value: "Published".to_string(),
            },
            markdown: MarkdownConfig {
                home_path: "site".to_string(),
                ..Default::default()
            },
            dynamic_props: Vec::new(),
        };
        let out = toml::to_string_pretty(&default)
            .map_err(|e| crate::error::Error::Config(e.to_string()))?;
        fs::write(path, out)?;
        Ok(())
    }
}
