//! Inline formatting of rich text spans and table conversion.
//!
//! Pure functions: a span sequence formats to the concatenation of its
//! independently formatted spans.

use crate::model::{Annotations, Block, BlockPayload, RichText, RichTextVariant, TableRowPayload};

/// Convert an ordered span sequence into one inline string.
pub fn format_spans(spans: &[RichText]) -> String {
    spans.iter().map(format_span).collect()
}

/// Convert a single span.
///
/// Whitespace-only spans without a link are dropped entirely. Inline code
/// takes absolute precedence over every other annotation.
pub fn format_span(span: &RichText) -> String {
    match &span.variant {
        RichTextVariant::Text { text } => {
            if let Some(link) = &text.link {
                return apply_annotations(
                    &format!("[{}]({})", text.content, link.url),
                    &span.annotations,
                );
            }
            let trimmed = text.content.trim();
            if trimmed.is_empty() {
                return String::new();
            }
            apply_annotations(trimmed, &span.annotations)
        }
        RichTextVariant::Mention { .. } => match &span.href {
            Some(href) => format!("[{}]({})", span.plain_text, href),
            None => span.plain_text.clone(),
        },
        RichTextVariant::Equation { .. } => String::new(),
    }
}

fn apply_annotations(text: &str, a: &Annotations) -> String {
    if a.code {
        return format!("`{}`", text);
    }

    let mut s = match (a.bold, a.italic) {
        (true, true) => format!("***{}***", text),
        (true, false) => format!("**{}**", text),
        (false, true) => format!("*{}*", text),
        (false, false) => text.to_string(),
    };

    // underline and strikethrough are mutually exclusive; underline wins
    if a.underline {
        s = format!("__{}__", s);
    } else if a.strikethrough {
        s = format!("~~{}~~", s);
    }

    wrap_color(&s, &a.color)
}

fn wrap_color(text: &str, color: &str) -> String {
    if color == "default" {
        return text.to_string();
    }
    let Some(value) = palette_color(color) else {
        return text.to_string();
    };
    let css_key = if color.contains("_background") {
        "background-color"
    } else {
        "color"
    };
    format!(r#"<span style="{}: {};">{}</span>"#, css_key, value, text)
}

/// Fixed palette mapping annotation color names to CSS values.
pub fn palette_color(name: &str) -> Option<&'static str> {
    let value = match name {
        "gray" => "rgba(120, 119, 116, 1)",
        "brown" => "rgba(159, 107, 83, 1)",
        "orange" => "rgba(217, 115, 13, 1)",
        "yellow" => "rgba(203, 145, 47, 1)",
        "green" => "rgba(68, 131, 97, 1)",
        "blue" => "rgba(51, 126, 169, 1)",
        "purple" => "rgba(144, 101, 176, 1)",
        "pink" => "rgba(193, 76, 138, 1)",
        "red" => "rgba(212, 76, 71, 1)",
        "gray_background" => "rgba(241, 241, 239, 1)",
        "brown_background" => "rgba(244, 238, 238, 1)",
        "orange_background" => "rgba(251, 236, 221, 1)",
        "yellow_background" => "rgba(251, 243, 219, 1)",
        "green_background" => "rgba(237, 243, 236, 1)",
        "blue_background" => "rgba(231, 243, 248, 1)",
        "purple_background" => "rgba(244, 240, 247, 0.8)",
        "pink_background" => "rgba(249, 238, 243, 0.8)",
        "red_background" => "rgba(253, 235, 236, 1)",
        _ => return None,
    };
    Some(value)
}

/// Convert a table's row blocks into markdown, synthesizing the header
/// separator before the second physical row.
pub fn convert_table(rows: &[Block]) -> String {
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        let BlockPayload::TableRow { table_row } = &row.payload else {
            continue;
        };
        if i == 1 {
            out.push_str(&convert_row(table_row, Some("---")));
        }
        out.push_str(&convert_row(table_row, None));
    }
    out
}

fn convert_row(row: &TableRowPayload, filler: Option<&str>) -> String {
    let mut md = String::from("|");
    for cell in &row.cells {
        let content = match filler {
            Some(f) => f.to_string(),
            None => format_spans(cell),
        };
        md.push(' ');
        md.push_str(&content);
        md.push_str(" |");
    }
    md.push('\n');
    md
}
