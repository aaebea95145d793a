//! HTML tag tables and tag scanning helpers.
//!
//! - `is_block_element()` - elements around which whitespace is insignificant
//! - `is_preformatted_element()` - elements whose text is kept verbatim
//! - `is_raw_text_element()` - script/style bodies
//! - `tag_name()` - lowercase name of a raw tag (`<Div class=x>` -> `div`)
//! - `find_tag_end()` - end of a tag, skipping quoted attribute values
//! - `attribute()` - one attribute value of a raw tag

/// Check if tag is a block-level or document-level element.
///
/// Whitespace adjacent to these tags does not render.
#[inline]
pub fn is_block_element(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "base"
            | "blockquote"
            | "body"
            | "canvas"
            | "caption"
            | "col"
            | "colgroup"
            | "dd"
            | "details"
            | "dialog"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "head"
            | "header"
            | "hgroup"
            | "hr"
            | "html"
            | "li"
            | "link"
            | "main"
            | "meta"
            | "nav"
            | "noscript"
            | "ol"
            | "optgroup"
            | "option"
            | "p"
            | "pre"
            | "script"
            | "section"
            | "style"
            | "summary"
            | "table"
            | "tbody"
            | "td"
            | "tfoot"
            | "th"
            | "thead"
            | "title"
            | "tr"
            | "ul"
            | "video"
    )
}

/// Check if tag keeps its text content byte-for-byte.
#[inline]
pub fn is_preformatted_element(tag: &str) -> bool {
    matches!(tag, "pre" | "textarea")
}

/// Check if tag is a raw text element (body is not HTML).
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Lowercase tag name of a raw tag, without `<` or `/`.
///
/// `<!DOCTYPE html>` yields `!doctype`.
pub fn tag_name(raw: &str) -> String {
    raw.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '>' && *c != '/')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Byte offset just past the `>` closing the tag that starts at `start`.
///
/// Quoted attribute values may contain `>`. Returns `None` if unterminated.
pub fn find_tag_end(html: &str, start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (i, &b) in html.as_bytes()[start..].iter().enumerate() {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(start + i + 1),
            _ => {}
        }
    }
    None
}

/// Find a case-insensitive closing tag `</name` at or after `from`.
pub fn find_closing_tag(html: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{name}");
    let haystack = html.get(from..)?.to_ascii_lowercase();
    haystack.find(&needle).map(|i| from + i)
}

/// Whether `bytes[i..]` starts a tag or comment: `<` followed by a letter, `/`, `!` or `?`.
#[inline]
pub fn starts_tag(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'<'
        && bytes
            .get(i + 1)
            .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

/// Value of attribute `name` in a raw opening tag, unquoted.
///
/// Bare attributes (`<script async>`) yield an empty string.
pub fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let bytes = tag.as_bytes();
    let mut i = tag.find(|c: char| c.is_whitespace())?;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && !matches!(bytes[i], b'=' | b'>' | b'/') && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let key = &tag[start..i];
        if key.is_empty() {
            return None;
        }

        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            match bytes.get(i) {
                Some(&q @ (b'"' | b'\'')) => {
                    let end = tag[i + 1..].find(q as char).map_or(tag.len(), |e| i + 1 + e);
                    let value = &tag[i + 1..end];
                    i = end + 1;
                    value
                }
                _ => {
                    let start = i;
                    while i < bytes.len() && bytes[i] != b'>' && !bytes[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    &tag[start..i]
                }
            }
        } else {
            ""
        };

        if key.eq_ignore_ascii_case(name) {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_name() {
        assert_eq!(tag_name("<Div class=\"x\">"), "div");
        assert_eq!(tag_name("</P>"), "p");
        assert_eq!(tag_name("<br/>"), "br");
        assert_eq!(tag_name("<!DOCTYPE html>"), "!doctype");
    }

    #[test]
    fn test_find_tag_end_skips_quotes() {
        let html = r#"<a title="a > b" href='x'>text"#;
        let end = find_tag_end(html, 0).unwrap();
        assert_eq!(&html[..end], r#"<a title="a > b" href='x'>"#);
        assert_eq!(find_tag_end("<a href=\"x", 0), None);
    }

    #[test]
    fn test_find_closing_tag_case_insensitive() {
        let html = "<script>let a = 1;</SCRIPT>";
        assert_eq!(find_closing_tag(html, 8, "script"), Some(18));
    }

    #[test]
    fn test_attribute() {
        let tag = r#"<script async TYPE="module" data-x='a b' src=app.js>"#;
        assert_eq!(attribute(tag, "type"), Some("module"));
        assert_eq!(attribute(tag, "data-x"), Some("a b"));
        assert_eq!(attribute(tag, "src"), Some("app.js"));
        assert_eq!(attribute(tag, "async"), Some(""));
        assert_eq!(attribute(tag, "defer"), None);
        assert_eq!(attribute("<script>", "type"), None);
    }

    #[test]
    fn test_starts_tag() {
        let bytes = b"a < b <p>";
        assert!(!starts_tag(bytes, 2));
        assert!(starts_tag(bytes, 6));
    }
}
