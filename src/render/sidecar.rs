//! Side-channel extraction for blocks that need data beyond their own
//! payload: link previews, embed platform detection, file naming, callouts.
//!
//! Every extraction failure is recovered locally; the channel is left empty
//! and rendering proceeds.

use log::warn;
use regex::Regex;

use crate::model::{Block, BlockPayload};

const GIST_HOST: &str = "gist.github.com";
const TWITTER_HOST: &str = "twitter.com";
const JSFIDDLE_HOST: &str = "jsfiddle.net";
const BILIBILI_HOST: &str = "bilibili.com";

/// Per-block auxiliary values handed to the template for the current node
/// only.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SideChannel {
    #[default]
    None,
    /// Link preview scraped from the target page.
    Bookmark {
        title: String,
        description: String,
        image: String,
        url: String,
    },
    /// Hosted video reference.
    Video { plat: String, id: String },
    /// Embedded widget with a recognized platform.
    Embed {
        plat: String,
        id: String,
        user: String,
    },
    /// Downloadable file with a display name.
    FileInfo { url: String, name: String },
    Callout { emoji: String, text: String },
    /// Consolidated image run.
    Gallery { images: Vec<String> },
}

/// Extract the side channel for `block` after media rewriting has run.
pub fn extract(block: &Block, resolver: &LinkResolver) -> SideChannel {
    match &block.payload {
        BlockPayload::Bookmark { bookmark } => resolver.resolve(&bookmark.url),
        BlockPayload::Video { video } => video_info(video.url()),
        BlockPayload::Embed { embed } => embed_info(&embed.url),
        BlockPayload::File { file } | BlockPayload::Pdf { pdf: file } => file_info(file.url()),
        BlockPayload::Audio { audio } => file_info(audio.url()),
        BlockPayload::Callout { callout } => SideChannel::Callout {
            emoji: callout
                .icon
                .as_ref()
                .and_then(|i| i.emoji())
                .unwrap_or_default()
                .to_string(),
            text: callout.rich_text.iter().map(|s| s.raw_text()).collect(),
        },
        _ => SideChannel::None,
    }
}

fn video_info(url: &str) -> SideChannel {
    if url.contains("youtube") {
        let re = Regex::new(r"\.com/watch\?v=(.*)").unwrap();
        if let Some(c) = re.captures(url) {
            return SideChannel::Video {
                plat: "youtube".to_string(),
                id: c[1].to_string(),
            };
        }
    }
    SideChannel::Video {
        plat: String::new(),
        id: String::new(),
    }
}

fn embed_info(url: &str) -> SideChannel {
    if url.is_empty() {
        return SideChannel::None;
    }

    let mut plat = String::new();
    let mut id = String::new();
    let mut user = String::new();

    if url.contains(BILIBILI_HOST) {
        plat = "bilibili".to_string();
        let re = Regex::new(r"\.com/video/([^/]+)/|bvid=([^&]+)&").unwrap();
        if let Some(c) = re.captures(url) {
            id = c
                .get(1)
                .or_else(|| c.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
        }
    }
    if url.contains(JSFIDDLE_HOST) {
        plat = "jsfiddle".to_string();
        let re = Regex::new(r"jsfiddle\.net/(.*)/").unwrap();
        if let Some(c) = re.captures(url) {
            id = c[1].to_string();
        }
    }
    if url.contains(TWITTER_HOST) {
        plat = "twitter".to_string();
        let re_id = Regex::new(r"status/([^/?]+)").unwrap();
        let re_user = Regex::new(r"com/([^/]+)/status").unwrap();
        if let Some(c) = re_id.captures(url) {
            id = c[1].to_string();
        }
        if let Some(c) = re_user.captures(url) {
            user = c[1].to_string();
        }
    }
    if url.contains(GIST_HOST) {
        plat = "gist".to_string();
        // everything after the host, path segments joined by spaces
        id = strip_scheme(url)
            .split_once(&format!("{}/", GIST_HOST))
            .map(|(_, rest)| rest.split('/').collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
    }

    SideChannel::Embed { plat, id, user }
}

fn file_info(url: &str) -> SideChannel {
    let base = url.rsplit('/').next().unwrap_or_default();
    let name = match base.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => base.to_string(),
    };
    SideChannel::FileInfo {
        url: url.to_string(),
        name,
    }
}

fn strip_scheme(url: &str) -> &str {
    url.trim_start_matches("https://").trim_start_matches("http://")
}

/// Scrapes OpenGraph metadata from bookmark targets.
pub struct LinkResolver {
    http: reqwest::blocking::Client,
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkResolver {
    pub fn new() -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Fetch the target page and pull its OpenGraph fields. On any failure
    /// the channel carries just the raw URL.
    pub fn resolve(&self, url: &str) -> SideChannel {
        let html = match self.fetch(url) {
            Ok(html) => html,
            Err(err) => {
                warn!("failed to resolve bookmark {}: {}", url, err);
                return SideChannel::Bookmark {
                    title: String::new(),
                    description: String::new(),
                    image: String::new(),
                    url: url.to_string(),
                };
            }
        };
        SideChannel::Bookmark {
            title: og_property(&html, "og:title")
                .or_else(|| html_title(&html))
                .unwrap_or_default(),
            description: og_property(&html, "og:description").unwrap_or_default(),
            image: og_property(&html, "og:image").unwrap_or_default(),
            url: og_property(&html, "og:url").unwrap_or_else(|| url.to_string()),
        }
    }

    fn fetch(&self, url: &str) -> crate::error::Result<String> {
        Ok(self.http.get(url).send()?.error_for_status()?.text()?)
    }
}

fn og_property(html: &str, name: &str) -> Option<String> {
    // meta tags put property/content in either order
    let forward = format!(
        r#"<meta[^>]*property="{}"[^>]*content="([^"]*)""#,
        regex::escape(name)
    );
    let backward = format!(
        r#"<meta[^>]*content="([^"]*)"[^>]*property="{}""#,
        regex::escape(name)
    );
    for pattern in [forward, backward] {
        let re = Regex::new(&pattern).unwrap();
        if let Some(c) = re.captures(html) {
            return Some(c[1].to_string());
        }
    }
    None
}

fn html_title(html: &str) -> Option<String> {
    let re = Regex::new(r"(?s)<title[^>]*>(.*?)</title>").unwrap();
    re.captures(html).map(|c| c[1].trim().to_string())
}
