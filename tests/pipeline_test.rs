//! Integration tests for the fetch-extract-render pipeline.

use std::collections::HashMap;
use std::fs;

use notedown::error::Result;
use notedown::{
    convert_page, fetch_tree, Block, BlockChildren, BlockSource, Config, Page,
};

fn page(props: serde_json::Value) -> Page {
    serde_json::from_value(serde_json::json!({
        "id": "page-1",
        "url": "https://notion.example/page-1",
        "properties": props
    }))
    .unwrap()
}

fn block(json: serde_json::Value) -> Block {
    serde_json::from_value(json).unwrap()
}

fn text_block(id: &str, kind: &str, text: &str) -> Block {
    let mut value = serde_json::json!({ "id": id, "type": kind });
    value[kind] = serde_json::json!({
        "rich_text": [ { "type": "text", "text": { "content": text } } ]
    });
    serde_json::from_value(value).unwrap()
}

fn config_for(home: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.markdown.home_path = home.to_string_lossy().into_owned();
    config
}

/// In-memory block source with one page of children per parent.
struct StaticSource {
    children: HashMap<String, Vec<Block>>,
}

impl BlockSource for StaticSource {
    fn block_children(&self, block_id: &str, _cursor: Option<&str>) -> Result<BlockChildren> {
        Ok(BlockChildren {
            results: self.children.get(block_id).cloned().unwrap_or_default(),
            has_more: false,
            next_cursor: None,
        })
    }
}

#[test]
fn test_full_page_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let page = page(serde_json::json!({
        "Name": { "type": "title", "title": [ { "type": "text", "text": { "content": "Field Notes" } } ] },
        "Status": { "type": "select", "select": { "name": "Published" } },
        "Tags": { "type": "multi_select", "multi_select": [ { "name": "rust" }, { "name": "notes" } ] }
    }));

    let mut table = block(serde_json::json!({
        "id": "tbl", "type": "table", "has_children": true,
        "table": { "table_width": 2 }
    }));
    table.children = vec![
        block(serde_json::json!({
            "id": "r1", "type": "table_row",
            "table_row": { "cells": [
                [ { "type": "text", "text": { "content": "name" } } ],
                [ { "type": "text", "text": { "content": "value" } } ]
            ] }
        })),
        block(serde_json::json!({
            "id": "r2", "type": "table_row",
            "table_row": { "cells": [
                [ { "type": "text", "text": { "content": "answer" } } ],
                [ { "type": "text", "text": { "content": "42" } } ]
            ] }
        })),
    ];

    let mut blocks = vec![
        text_block("h", "heading_1", "Overview"),
        text_block("p1", "paragraph", "An opening paragraph that crosses the excerpt threshold."),
        // the threshold is crossed above, so this block gets the marker
        text_block("p2", "paragraph", "More prose."),
        text_block("b1", "bulleted_list_item", "first point"),
        text_block("b2", "bulleted_list_item", "second point"),
        text_block("n1", "numbered_list_item", "step one"),
        text_block("n2", "numbered_list_item", "step two"),
        block(serde_json::json!({
            "id": "todo", "type": "to_do",
            "to_do": { "checked": true, "rich_text": [ { "type": "text", "text": { "content": "ship it" } } ] }
        })),
        text_block("q", "quote", "a wise remark"),
        block(serde_json::json!({ "id": "d", "type": "divider", "divider": {} })),
        block(serde_json::json!({
            "id": "c", "type": "code",
            "code": {
                "language": "rust",
                "rich_text": [ { "type": "text", "text": { "content": "let x = 1;" } } ]
            }
        })),
        table,
    ];

    convert_page(&config, &page, &mut blocks).unwrap();

    let written =
        fs::read_to_string(dir.path().join("content/post/field-notes/index.md")).unwrap();

    // header first, with extracted and listed properties
    assert!(written.starts_with("---\n"));
    assert!(written.contains("title: \"Field Notes\""));
    assert!(written.contains("status: \"Published\""));
    assert!(written.contains("tags: [\"rust\", \"notes\"]"));

    // body structure
    assert!(written.contains("# Overview"));
    assert!(written.contains("- first point\n- second point\n"));
    assert!(written.contains("1. step one\n2. step two\n"));
    assert!(written.contains("- [x] ship it"));
    assert!(written.contains("> a wise remark"));
    assert!(written.contains("```rust\nlet x = 1;\n```"));
    assert!(written.contains("| name | value |\n| --- | --- |\n| answer | 42 |"));

    // excerpt marker exactly once
    assert_eq!(written.matches("<!--more-->").count(), 1);
}

#[test]
fn test_fetch_then_render_nested_lists() {
    let mut children = HashMap::new();
    let mut parent = text_block("li", "bulleted_list_item", "parent");
    parent.has_children = true;
    children.insert("page-1".to_string(), vec![parent]);
    children.insert(
        "li".to_string(),
        vec![text_block("li-child", "bulleted_list_item", "child")],
    );
    let source = StaticSource { children };

    let mut blocks = fetch_tree(&source, "page-1").unwrap();
    assert_eq!(blocks[0].children.len(), 1);

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let page = page(serde_json::json!({
        "Name": { "type": "title", "title": [ { "type": "text", "text": { "content": "Nested" } } ] }
    }));
    convert_page(&config, &page, &mut blocks).unwrap();

    let written = fs::read_to_string(dir.path().join("content/post/nested/index.md")).unwrap();
    assert!(written.contains("- parent\n\t- child\n"));
}

#[test]
fn test_custom_file_name_and_position() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let page = page(serde_json::json!({
        "Name": { "type": "title", "title": [ { "type": "text", "text": { "content": "About" } } ] },
        "FileName": { "type": "rich_text", "rich_text": [ { "type": "text", "text": { "content": "About Page" } } ] },
        "Position": { "type": "select", "select": { "name": "content/pages" } }
    }));
    let mut blocks = vec![text_block("p", "paragraph", "who we are")];

    convert_page(&config, &page, &mut blocks).unwrap();

    let written =
        fs::read_to_string(dir.path().join("content/pages/about/about-page.md")).unwrap();
    assert!(written.contains("who we are"));
}

#[test]
fn test_dynamic_props_reach_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    let extra: Config = toml::from_str(
        r#"
        [notion]
        database_id = "db"

        [markdown]
        home_path = "unused"

        [[dynamic_props]]
        name = "Weight"
        type = "number"
        default_value = 5

        [[dynamic_props]]
        name = "Draft"
        type = "checkbox"
    "#,
    )
    .unwrap();
    config.dynamic_props = extra.dynamic_props;

    let page = page(serde_json::json!({
        "Name": { "type": "title", "title": [ { "type": "text", "text": { "content": "Weighted" } } ] },
        "Draft": { "type": "checkbox", "checkbox": false }
    }));
    let mut blocks = vec![text_block("p", "paragraph", "content")];

    convert_page(&config, &page, &mut blocks).unwrap();

    let written = fs::read_to_string(dir.path().join("content/post/weighted/index.md")).unwrap();
    assert!(written.contains("weight: 5"));
    assert!(written.contains("draft: false"));
}
