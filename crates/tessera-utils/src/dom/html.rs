//! Minimal HTML serialization and fragment parsing for the headless DOM.

use pulldown_cmark_escape::{escape_html, escape_html_body_text};

use super::node::is_void_element;
use super::{Document, Node, NodeKind};

pub(super) fn serialize(node: &Node, out: &mut String) {
    match node.kind() {
        NodeKind::Text => {
            let text = node.raw_text();
            for (index, run) in text.split('\u{a0}').enumerate() {
                if index > 0 {
                    out.push_str("&nbsp;");
                }
                let _ = escape_html_body_text(&mut *out, run);
            }
        }
        NodeKind::Element => {
            out.push('<');
            out.push_str(node.local_name());
            for (name, value) in node.attributes() {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                let _ = escape_html(&mut *out, &value);
                out.push('"');
            }
            out.push('>');
            if is_void_element(node.local_name()) {
                return;
            }
            for child in node.children() {
                serialize(&child, out);
            }
            out.push_str("</");
            out.push_str(node.local_name());
            out.push('>');
        }
        NodeKind::Document | NodeKind::Window => {
            for child in node.children() {
                serialize(&child, out);
            }
        }
    }
}

/// Parse `html` into detached top-level nodes.
///
/// Handles start/end/self-closing tags, quoted and bare attributes, comments
/// and the common character references. Mismatched end tags close up to the
/// nearest matching open element and are otherwise ignored.
pub(super) fn parse_fragment(document: &Document, html: &str) -> Vec<Node> {
    let mut top: Vec<Node> = Vec::new();
    let mut open: Vec<Node> = Vec::new();
    let mut rest = html;

    let push = |node: Node, open: &Vec<Node>, top: &mut Vec<Node>| match open.last() {
        Some(parent) => parent.append_child(&node),
        None => top.push(node),
    };

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            rest = after.find("-->").map(|end| &after[end + 3..]).unwrap_or("");
            continue;
        }
        if let Some(after) = rest.strip_prefix("</") {
            let end = after.find('>').unwrap_or(after.len());
            let name = after[..end].trim().to_ascii_lowercase();
            if let Some(position) = open.iter().rposition(|node| node.local_name() == name) {
                open.truncate(position);
            }
            rest = after.get(end + 1..).unwrap_or("");
            continue;
        }
        if rest.starts_with('<')
            && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
        {
            let (tag, after) = parse_start_tag(&rest[1..]);
            let element = document.create_element(&tag.name);
            for (name, value) in &tag.attributes {
                element.set_attribute(name, value.as_str());
            }
            let is_void = tag.self_closing || is_void_element(element.local_name());
            push(element.clone(), &open, &mut top);
            if !is_void {
                open.push(element);
            }
            rest = after;
            continue;
        }

        // Text runs up to the next tag-like `<`.
        let end = rest
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '<')
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        let text = decode_entities(&rest[..end]);
        if !text.is_empty() {
            push(document.create_text_node(&text), &open, &mut top);
        }
        rest = &rest[end..];
    }

    top
}

struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

/// Parse the inside of a start tag. `input` starts right after `<`.
fn parse_start_tag(input: &str) -> (StartTag, &str) {
    let name_end = input
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(input.len());
    let mut tag = StartTag {
        name: input[..name_end].to_ascii_lowercase(),
        attributes: Vec::new(),
        self_closing: false,
    };
    let mut rest = &input[name_end..];

    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("/>") {
            tag.self_closing = true;
            return (tag, after);
        }
        if let Some(after) = rest.strip_prefix('>') {
            return (tag, after);
        }
        if let Some(after) = rest.strip_prefix('/') {
            rest = after;
            continue;
        }
        if rest.is_empty() {
            return (tag, rest);
        }

        let key_end = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let value = if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            match after.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after[1..];
                    let close = body.find(quote).unwrap_or(body.len());
                    rest = body.get(close + 1..).unwrap_or("");
                    decode_entities(&body[..close])
                }
                _ => {
                    let end = after
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(after.len());
                    rest = &after[end..];
                    decode_entities(&after[..end])
                }
            }
        } else {
            String::new()
        };
        if !key.is_empty() {
            tag.attributes.push((key, value));
        }
    }
}

fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match candidate.find(';').filter(|end| *end <= 10) {
            Some(end) => {
                let entity = &candidate[1..end];
                match decode_entity(entity) {
                    Some(c) => out.push(c),
                    None => out.push_str(&candidate[..=end]),
                }
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::Document;

    #[test]
    fn round_trips_nested_markup() {
        let doc = Document::new();
        let host = doc.create_element("div");
        host.set_inner_html(r#"<p class="a">Foo <b>bar</b></p><hr><p>baz</p>"#);

        assert_eq!(host.child_count(), 3);
        insta::assert_snapshot!(host.inner_html(), @r#"<p class="a">Foo <b>bar</b></p><hr><p>baz</p>"#);
    }

    #[test]
    fn decodes_and_escapes_text() {
        let doc = Document::new();
        let host = doc.create_element("div");
        host.set_inner_html("<p>a &amp; b &lt;c&gt; &#65;</p><!-- note -->");

        assert_eq!(host.text_content(), "a & b <c> A");
        assert_eq!(host.inner_html(), "<p>a &amp; b &lt;c&gt; A</p>");
    }

    #[test]
    fn tolerates_unclosed_and_stray_tags() {
        let doc = Document::new();
        let host = doc.create_element("div");
        host.set_inner_html("<ul><li>one<li>two</ul></span>tail<br/>");

        assert_eq!(
            host.inner_html(),
            "<ul><li>one<li>two</li></li></ul>tail<br>"
        );
    }

    #[test]
    fn parses_bare_and_single_quoted_attributes() {
        let doc = Document::new();
        let nodes = doc.parse_fragment("<input type=text disabled data-x='1 2'>");

        assert_eq!(nodes.len(), 1);
        let input = &nodes[0];
        assert_eq!(input.get_attribute("type").as_deref(), Some("text"));
        assert_eq!(input.get_attribute("disabled").as_deref(), Some(""));
        assert_eq!(input.get_attribute("data-x").as_deref(), Some("1 2"));
    }
}
