//! Pages and their typed property bags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::block::{FileRef, FileSource, Icon};
use super::richtext::RichText;

/// An externally-owned page: identifier, property bag, optional cover.
///
/// Read-only from this crate's perspective, except for the status mutation
/// performed through [`crate::api::NotionClient::publish`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub cover: Option<FileRef>,

    #[serde(default)]
    pub icon: Option<Icon>,

    /// Named, typed attributes of the page
    #[serde(default)]
    pub properties: BTreeMap<String, Property>,
}

impl Page {
    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name).map(|p| &p.value)
    }
}

/// One named property of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(flatten)]
    pub value: PropertyValue,
}

/// Discriminated union of property values, keyed by a type tag like blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        title: Vec<RichText>,
    },
    RichText {
        rich_text: Vec<RichText>,
    },
    Select {
        select: Option<SelectOption>,
    },
    MultiSelect {
        multi_select: Vec<SelectOption>,
    },
    Checkbox {
        checkbox: bool,
    },
    Number {
        number: Option<f64>,
    },
    Date {
        date: Option<DateValue>,
    },
    People {
        people: Vec<User>,
    },
    Files {
        files: Vec<PropertyFile>,
    },
    CreatedTime {
        created_time: String,
    },
    LastEditedTime {
        last_edited_time: String,
    },
    Url {
        url: Option<String>,
    },
    #[serde(other)]
    Unsupported,
}

/// A single- or multi-select option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A date range value. `start` and `end` are ISO 8601 strings on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

impl DateValue {
    /// The effective timestamp: the end of the range when present, else the start.
    pub fn effective(&self) -> &str {
        self.end.as_deref().unwrap_or(&self.start)
    }
}

/// A person reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// One entry of a file-list property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub source: FileSource,
}

impl PropertyFile {
    pub fn url(&self) -> &str {
        match &self.source {
            FileSource::External { external } => &external.url,
            FileSource::File { file } => &file.url,
        }
    }
}
