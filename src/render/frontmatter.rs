//! Metadata extraction: page properties to the document header record.

use chrono::DateTime;
use log::warn;

use super::richtext::format_spans;
use crate::config::{Config, PropDef};
use crate::media::MediaStore;
use crate::model::{Page, PropertyValue};

/// Marker prefix for banner-image candidates whose materialization is
/// deferred until header emission.
const BANNER_TAG: &str = "image|";

/// A header field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FmValue {
    String(String),
    Bool(bool),
    Number(f64),
    List(Vec<String>),
}

impl FmValue {
    fn emit(&self) -> String {
        match self {
            FmValue::String(s) => format!("\"{}\"", escape_yaml(s)),
            FmValue::Bool(b) => b.to_string(),
            FmValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            FmValue::List(items) => {
                let inner: Vec<String> = items
                    .iter()
                    .map(|i| format!("\"{}\"", escape_yaml(i)))
                    .collect();
                format!("[{}]", inner.join(", "))
            }
        }
    }
}

/// The normalized per-document metadata record.
///
/// Keys are compared case-insensitively; a later insert with an equal key
/// overrides the earlier value in place. Emission lower-cases all keys and
/// serializes lists in flow style.
#[derive(Debug, Clone, Default)]
pub struct FrontMatter {
    entries: Vec<(String, FmValue)>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a field, overriding any existing field with the same key
    /// (case-insensitive) while keeping its position.
    pub fn insert(&mut self, key: impl Into<String>, value: FmValue) {
        let key = key.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&FmValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// String value of a field, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FmValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Materialize any deferred banner-image fields, replacing the
    /// `image|<url>` tag with the local reference.
    pub fn resolve_banners(&mut self, media: &MediaStore) {
        for (_, value) in self.entries.iter_mut() {
            if let FmValue::String(s) = value {
                if let Some(url) = s.strip_prefix(BANNER_TAG) {
                    *value = FmValue::String(media.materialize_or_empty(url));
                }
            }
        }
    }

    /// Serialize the record as a delimited YAML header block.
    pub fn to_yaml(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.entries {
            out.push_str(&key.to_lowercase());
            out.push_str(": ");
            out.push_str(&value.emit());
            out.push('\n');
        }
        out.push_str("---\n");
        out
    }
}

fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Fixed-schema page attributes driving naming and rendering policy.
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    pub name: String,
    pub title: String,
    pub status: String,
    pub position: String,
    pub file_name: String,
    pub slug: String,
    pub page_type: String,
    pub create_at: Option<String>,
}

impl PageMeta {
    pub fn from_page(page: &Page) -> Self {
        let mut meta = Self {
            name: get_text(page, "Name"),
            title: get_text(page, "Title"),
            status: get_select(page, "Status"),
            position: get_select(page, "Position"),
            file_name: get_text(page, "FileName"),
            slug: get_text(page, "Slug"),
            page_type: get_select(page, "Type"),
            create_at: get_timestamp(page, "CreateAt"),
        };
        if meta.position.is_empty() {
            meta.position = "content/post".to_string();
        }
        meta
    }

    /// A "setting" page emits only its embedded code block.
    pub fn is_setting(&self) -> bool {
        self.page_type == "setting"
    }

    /// A "folder" page is a directory-only marker with no content body.
    pub fn is_folder(&self) -> bool {
        self.page_type == "folder"
    }

    pub fn is_custom_name(&self) -> bool {
        !self.is_setting() && !self.file_name.is_empty()
    }

    /// Document title precedence: title > name, with the filename as final
    /// fallback for setting pages.
    pub fn document_title(&self) -> &str {
        if self.is_setting() && !self.file_name.is_empty() {
            return &self.file_name;
        }
        if !self.title.is_empty() {
            return &self.title;
        }
        &self.name
    }

    /// Output file name precedence: filename > name > title.
    pub fn output_name(&self) -> &str {
        if !self.file_name.is_empty() {
            &self.file_name
        } else if !self.name.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    /// Date component of the creation timestamp, for grouped folders.
    pub fn create_date(&self) -> Option<&str> {
        self.create_at.as_deref().map(|s| &s[..s.len().min(10)])
    }
}

fn get_text(page: &Page, key: &str) -> String {
    match page.property(key) {
        Some(PropertyValue::Title { title }) => format_spans(title),
        Some(PropertyValue::RichText { rich_text }) => format_spans(rich_text),
        _ => String::new(),
    }
}

fn get_select(page: &Page, key: &str) -> String {
    match page.property(key) {
        Some(PropertyValue::Select { select: Some(s) }) => s.name.clone(),
        _ => String::new(),
    }
}

fn get_timestamp(page: &Page, key: &str) -> Option<String> {
    match page.property(key) {
        Some(PropertyValue::CreatedTime { created_time }) => Some(created_time.clone()),
        Some(PropertyValue::Date { date: Some(d) }) => Some(d.start.clone()),
        _ => None,
    }
}

/// Maps a page's property bag into a [`FrontMatter`] record.
pub struct MetadataExtractor<'a> {
    config: &'a Config,
    media: &'a MediaStore,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(config: &'a Config, media: &'a MediaStore) -> Self {
        Self { config, media }
    }

    /// Build the header record for `page`.
    ///
    /// Fixed-schema extraction runs first, then the document title, then the
    /// operator-declared dynamic fields, which override fixed fields of the
    /// same (case-insensitive) key.
    pub fn extract(&self, page: &Page, meta: &PageMeta) -> FrontMatter {
        let mut fm = FrontMatter::new();

        if let Some(cover) = &page.cover {
            fm.insert(
                "image",
                FmValue::String(self.media.materialize_or_empty(cover.url())),
            );
        }

        for (key, prop) in &page.properties {
            self.inject(&mut fm, key, &prop.value);
        }

        fm.insert(
            "title",
            FmValue::String(meta.document_title().to_string()),
        );

        for def in &self.config.dynamic_props {
            self.inject_dynamic(&mut fm, page, def);
        }

        fm
    }

    /// Type-directed conversion of one property into a header field.
    fn inject(&self, fm: &mut FrontMatter, key: &str, value: &PropertyValue) {
        let fmv = match value {
            PropertyValue::Title { title } => Some(FmValue::String(format_spans(title))),
            PropertyValue::RichText { rich_text } => {
                Some(FmValue::String(format_spans(rich_text)))
            }
            PropertyValue::Select { select } => {
                select.as_ref().map(|s| FmValue::String(s.name.clone()))
            }
            PropertyValue::MultiSelect { multi_select } => Some(FmValue::List(
                multi_select.iter().map(|s| s.name.clone()).collect(),
            )),
            PropertyValue::Checkbox { checkbox } => Some(FmValue::Bool(*checkbox)),
            PropertyValue::Number { number } => number.map(FmValue::Number),
            PropertyValue::Date { date } => date
                .as_ref()
                .map(|d| FmValue::String(wire_timestamp(&d.start))),
            PropertyValue::CreatedTime { created_time } => {
                Some(FmValue::String(wire_timestamp(created_time)))
            }
            PropertyValue::LastEditedTime { last_edited_time } => {
                Some(FmValue::String(wire_timestamp(last_edited_time)))
            }
            PropertyValue::People { people } => match people.first() {
                Some(user) => {
                    if let Some(avatar) = &user.avatar_url {
                        fm.insert(
                            "avatar",
                            FmValue::String(self.media.materialize_or_empty(avatar)),
                        );
                    }
                    user.name.clone().map(FmValue::String)
                }
                None => None,
            },
            // The last file of a file list is the banner-image candidate;
            // its download is deferred until header emission.
            PropertyValue::Files { files } => files
                .last()
                .map(|f| FmValue::String(format!("{}{}", BANNER_TAG, f.url()))),
            PropertyValue::Url { url } => url.clone().map(FmValue::String),
            PropertyValue::Unsupported => {
                warn!("unsupported property shape, skipping: {}", key);
                None
            }
        };

        if let Some(fmv) = fmv {
            fm.insert(key, fmv);
        }
    }

    /// Secondary pass: one operator-declared dynamic field.
    fn inject_dynamic(&self, fm: &mut FrontMatter, page: &Page, def: &PropDef) {
        let value = dynamic_value(page, def);
        let key = def.name.to_lowercase();
        match value {
            Some(v) => fm.insert(key, v),
            None => {
                if let Some(default) = def.default_value.as_ref().and_then(toml_to_fm) {
                    fm.insert(key, default);
                }
            }
        }
    }
}

fn dynamic_value(page: &Page, def: &PropDef) -> Option<FmValue> {
    let prop = page.property(&def.name)?;
    match def.prop_type.to_lowercase().as_str() {
        "richtext" => match prop {
            PropertyValue::RichText { rich_text } if !rich_text.is_empty() => {
                Some(FmValue::String(format_spans(rich_text)))
            }
            _ => None,
        },
        "select" => match prop {
            PropertyValue::Select { select: Some(s) } => Some(FmValue::String(s.name.clone())),
            _ => None,
        },
        "multiselect" => match prop {
            PropertyValue::MultiSelect { multi_select } if !multi_select.is_empty() => Some(
                FmValue::List(multi_select.iter().map(|s| s.name.clone()).collect()),
            ),
            _ => None,
        },
        "number" => match prop {
            PropertyValue::Number { number } => number.map(FmValue::Number),
            _ => None,
        },
        "checkbox" => match prop {
            PropertyValue::Checkbox { checkbox } => Some(FmValue::Bool(*checkbox)),
            _ => None,
        },
        "date" => match prop {
            PropertyValue::Date { date: Some(d) } => {
                Some(FmValue::String(wire_timestamp(&d.start)))
            }
            _ => None,
        },
        "title" => match prop {
            PropertyValue::Title { title } if !title.is_empty() => {
                Some(FmValue::String(format_spans(title)))
            }
            _ => None,
        },
        other => {
            // Unknown source type: fall back to any textual content.
            warn!("unknown dynamic property type: {}", other);
            match prop {
                PropertyValue::RichText { rich_text } if !rich_text.is_empty() => {
                    Some(FmValue::String(format_spans(rich_text)))
                }
                PropertyValue::Title { title } if !title.is_empty() => {
                    Some(FmValue::String(format_spans(title)))
                }
                _ => None,
            }
        }
    }
}

fn toml_to_fm(value: &toml::Value) -> Option<FmValue> {
    match value {
        toml::Value::String(s) => Some(FmValue::String(s.clone())),
        toml::Value::Integer(i) => Some(FmValue::Number(*i as f64)),
        toml::Value::Float(f) => Some(FmValue::Number(*f)),
        toml::Value::Boolean(b) => Some(FmValue::Bool(*b)),
        toml::Value::Array(items) => Some(FmValue::List(
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect(),
        )),
        toml::Value::Datetime(d) => Some(FmValue::String(d.to_string())),
        toml::Value::Table(_) => None,
    }
}

/// Normalize a wire timestamp to RFC 3339 where parseable.
fn wire_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.to_rfc3339(),
        Err(_) => raw.to_string(),
    }
}
