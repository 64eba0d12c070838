//! Pretty serializer for [`XmlDocument`].
//!
//! Elements whose children are all elements are laid out one child per
//! line; anything carrying text (and table rows, links, list items) is
//! written inline so no whitespace leaks into rendered content.

use super::dom::{XmlDocument, XmlNodeData, XmlNodeId};

/// XHTML 1.1 doctype line.
pub const XHTML11_DOCTYPE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#;

const INLINE_ELEMENTS: &[&str] = &[
    "title", "h1", "h2", "h3", "h4", "h5", "h6", "span", "a", "td", "th", "tr",
];

/// Serialize a whole document with an XML declaration.
pub fn serialize(doc: &XmlDocument, encoding: &str, doctype: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<?xml version=\"1.0\" encoding=\"{}\"?>\n",
        escape_attr(encoding)
    ));
    if let Some(doctype) = doctype {
        out.push_str(doctype);
        out.push('\n');
    }
    if let Some(root) = doc.root_element() {
        walk_node(doc, root, 0, false, &mut out);
        out.push('\n');
    }
    out
}

/// Serialize a single subtree without declaration.
pub fn serialize_node(doc: &XmlDocument, id: XmlNodeId) -> String {
    let mut out = String::new();
    walk_node(doc, id, 0, false, &mut out);
    out
}

fn walk_node(doc: &XmlDocument, id: XmlNodeId, depth: usize, inline: bool, out: &mut String) {
    let Some(node) = doc.get(id) else {
        return;
    };

    match &node.data {
        XmlNodeData::Document => {
            for child in doc.children(id) {
                walk_node(doc, child, depth, inline, out);
            }
        }
        XmlNodeData::Text(text) => out.push_str(&escape_text(text)),
        XmlNodeData::Element { name, attrs } => {
            out.push('<');
            out.push_str(name);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&escape_attr(&attr.value));
                out.push('"');
            }

            if node.first_child.is_none() {
                out.push_str("/>");
                return;
            }
            out.push('>');

            if inline || is_inline(doc, id, name) {
                for child in doc.children(id) {
                    walk_node(doc, child, depth + 1, true, out);
                }
            } else {
                for child in doc.children(id) {
                    if is_blank_text(doc, child) {
                        continue;
                    }
                    out.push('\n');
                    indent(out, depth + 1);
                    walk_node(doc, child, depth + 1, false, out);
                }
                out.push('\n');
                indent(out, depth);
            }

            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn is_inline(doc: &XmlDocument, id: XmlNodeId, name: &str) -> bool {
    let local = super::dom::local_name(name);
    if INLINE_ELEMENTS.contains(&local) {
        return true;
    }
    if local == "li" {
        return !doc
            .child_elements(id)
            .any(|c| matches!(doc.local_name(c), Some("ul") | Some("ol")));
    }
    doc.children(id).any(|c| {
        matches!(doc.get(c).map(|n| &n.data), Some(XmlNodeData::Text(t)) if !t.trim().is_empty())
    })
}

fn is_blank_text(doc: &XmlDocument, id: XmlNodeId) -> bool {
    matches!(doc.get(id).map(|n| &n.data), Some(XmlNodeData::Text(t)) if t.trim().is_empty())
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// Escape character data.
///
/// Well-formed entity references already present are kept, and U+00A0 is
/// written as a character reference so it survives any later re-encoding.
pub fn escape_text(s: &str) -> String {
    escape(s, false)
}

/// Escape an attribute value for a double-quoted attribute.
pub fn escape_attr(s: &str) -> String {
    escape(s, true)
}

fn escape(s: &str, attribute: bool) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '&' if is_entity_ref(&s[i..]) => result.push('&'),
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if attribute => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&#xA0;"),
            _ => result.push(c),
        }
    }
    result
}

/// True when `s` starts with `&name;`, `&#123;` or `&#x1F;`.
fn is_entity_ref(s: &str) -> bool {
    let Some(body) = s.strip_prefix('&') else {
        return false;
    };
    let Some(end) = body.find(';') else {
        return false;
    };
    let name = &body[..end];

    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(dec) = name.strip_prefix('#') {
        return !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit());
    }

    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}
