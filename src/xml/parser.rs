//! quick-xml event loop building an [`XmlDocument`].

use std::borrow::Cow;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::dom::{XmlDocument, XmlNodeId};
use crate::error::{Error, Result};
use crate::util::decode_xml;

/// Read and parse an XML file, honouring its declared encoding.
pub fn parse_file(path: &Path) -> Result<XmlDocument> {
    let bytes = std::fs::read(path)?;
    parse_str(&decode_xml(&bytes))
}

/// Parse a complete XML document.
///
/// Whitespace is kept verbatim; entity references are resolved, unknown
/// ones are kept as written.
pub fn parse_str(content: &str) -> Result<XmlDocument> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = Reader::from_str(content);

    let mut doc = XmlDocument::new();
    let mut stack = vec![doc.document()];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let id = open_element(&mut doc, &stack, &e)?;
                stack.push(id);
            }
            Event::Empty(e) => {
                open_element(&mut doc, &stack, &e)?;
            }
            Event::End(_) => {
                if stack.len() <= 1 {
                    return Err(Error::Parse("unexpected closing tag".into()));
                }
                stack.pop();
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(&e);
                push_text(&mut doc, &stack, &text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                push_text(&mut doc, &stack, &text)?;
            }
            Event::GeneralRef(e) => {
                let name = String::from_utf8_lossy(e.as_ref());
                let text = match resolve_entity(&name) {
                    Some(resolved) => resolved,
                    None => format!("&{name};"),
                };
                push_text(&mut doc, &stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack
            .last()
            .and_then(|&id| doc.element_name(id))
            .unwrap_or("?")
            .to_string();
        return Err(Error::Parse(format!("unclosed element <{open}>")));
    }
    if doc.root_element().is_none() {
        return Err(Error::Parse("no root element".into()));
    }

    Ok(doc)
}

fn open_element(
    doc: &mut XmlDocument,
    stack: &[XmlNodeId],
    e: &BytesStart<'_>,
) -> Result<XmlNodeId> {
    let parent = *stack.last().unwrap_or(&doc.document());
    if parent == doc.document() && doc.root_element().is_some() {
        return Err(Error::Parse("multiple root elements".into()));
    }

    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let id = doc.create_element(&name);
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref());
        let raw = String::from_utf8_lossy(&attr.value);
        doc.set_attr(id, &key, &unescape(&raw));
    }
    doc.append(parent, id);
    Ok(id)
}

fn push_text(doc: &mut XmlDocument, stack: &[XmlNodeId], text: &str) -> Result<()> {
    let parent = *stack.last().unwrap_or(&doc.document());
    if parent == doc.document() {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(Error::Parse("text outside the root element".into()));
    }
    doc.append_text(parent, text);
    Ok(())
}

/// Resolve `&name;` references inside an attribute value.
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        match tail.find(';') {
            Some(end) => match resolve_entity(&tail[..end]) {
                Some(resolved) => {
                    out.push_str(&resolved);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = tail;
                }
            },
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}
