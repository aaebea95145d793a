//! HTML minification.
//!
//! A single scan over the document that only touches text between tags:
//!
//! - whitespace runs collapse to one space
//! - whitespace next to block-level tags is dropped
//! - `<pre>` and `<textarea>` bodies are copied verbatim
//! - inline `<style>` and JavaScript `<script>` bodies are minified, keeping
//!   the original body when minification fails
//!
//! Comments and attribute values are left as written.

use oxc::span::SourceType;

use crate::asset::AssetFile;
use crate::error::StageError;
use crate::utils::html::{
    attribute, find_closing_tag, find_tag_end, is_block_element, is_preformatted_element,
    is_raw_text_element, starts_tag, tag_name,
};

use super::minify::{minify_css, minify_js};
use super::{Transform, require_text};

#[derive(Debug, Clone, Copy)]
pub struct HtmlOptions {
    pub minify_css: bool,
    pub minify_js: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            minify_css: true,
            minify_js: true,
        }
    }
}

/// Minify an HTML document.
pub fn minify_html(html: &str, options: &HtmlOptions) -> String {
    let bytes = html.as_bytes();
    let mut out = String::with_capacity(html.len());
    // Whitespace before the first tag is insignificant
    let mut after_block = true;
    let mut i = 0;

    while i < bytes.len() {
        if html[i..].starts_with("<!--") {
            let end = html[i + 4..].find("-->").map_or(html.len(), |e| i + 4 + e + 3);
            out.push_str(&html[i..end]);
            after_block = false;
            i = end;
            continue;
        }

        if starts_tag(bytes, i) {
            let Some(end) = find_tag_end(html, i) else {
                out.push_str(&html[i..]);
                break;
            };
            let tag = &html[i..end];
            let name = tag_name(tag);
            out.push_str(tag);
            after_block = is_block_element(&name) || name.starts_with('!');
            i = end;

            let closing = tag.starts_with("</") || tag.ends_with("/>");
            if !closing && (is_raw_text_element(&name) || is_preformatted_element(&name)) {
                let close = find_closing_tag(html, i, &name).unwrap_or(html.len());
                out.push_str(&raw_body(&name, tag, &html[i..close], options));
                after_block = false;
                i = close;
            }
            continue;
        }

        // Text run up to the next tag or comment
        let mut j = i + 1;
        while j < bytes.len() && !starts_tag(bytes, j) {
            j += 1;
        }
        let before_block = j >= bytes.len() || {
            let next = tag_name(&html[j..]);
            is_block_element(&next) || next.starts_with("!doctype")
        };
        push_text(&mut out, &html[i..j], after_block, before_block);
        after_block = false;
        i = j;
    }

    out
}

/// Append text with whitespace runs collapsed, trimmed at block boundaries.
fn push_text(out: &mut String, text: &str, trim_start: bool, trim_end: bool) {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                collapsed.push(' ');
            }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }

    let mut slice = collapsed.as_str();
    if trim_start {
        slice = slice.trim_start_matches(' ');
    }
    if trim_end {
        slice = slice.trim_end_matches(' ');
    }
    out.push_str(slice);
}

/// Body of a `<script>`, `<style>`, `<pre>` or `<textarea>` element.
fn raw_body(name: &str, tag: &str, body: &str, options: &HtmlOptions) -> String {
    if body.trim().is_empty() {
        return if is_preformatted_element(name) {
            body.to_string()
        } else {
            String::new()
        };
    }

    let minified = match name {
        "style" if options.minify_css => minify_css(body).ok(),
        "script" if options.minify_js => {
            script_type(tag).and_then(|source_type| minify_js(body, source_type).ok())
        }
        _ => None,
    };
    minified.unwrap_or_else(|| body.to_string())
}

/// Source type of an inline script, or `None` when it is not JavaScript.
fn script_type(tag: &str) -> Option<SourceType> {
    match attribute(tag, "type").map(|t| t.trim().to_ascii_lowercase()) {
        None => Some(SourceType::script()),
        Some(t) if t.is_empty() || t == "text/javascript" || t == "application/javascript" => {
            Some(SourceType::script())
        }
        Some(t) if t == "module" => Some(SourceType::mjs()),
        Some(_) => None,
    }
}

/// Minify the HTML class.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyHtml {
    options: HtmlOptions,
}

impl MinifyHtml {
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }
}

impl Transform for MinifyHtml {
    fn name(&self) -> &'static str {
        "minify-html"
    }

    fn apply(&self, mut file: AssetFile) -> Result<AssetFile, StageError> {
        let html = minify_html(require_text(&file, self.name())?, &self.options);
        file.set_text(html);
        Ok(file)
    }
}
