//! Validation of raw XHTML includes.

use std::path::{Path, PathBuf};

use crate::error::{BuildError, BuildErrors};
use crate::tree::{NodeId, NodeKind, Songbook};
use crate::util::{is_external_href, resolve_source};
use crate::xml::{XmlDocument, XmlNodeId, parse_file};

/// An XHTML document copied verbatim into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlInclude {
    pub node: NodeId,
    /// Resolved path of the source document.
    pub source: PathBuf,
    /// Local resources it references, relative to its directory.
    pub resources: Vec<String>,
}

/// Check every `<html>` include and settle its title.
///
/// The title comes from `/html/head/title`; an include without a `title`
/// attribute adopts it, a differing one is an error. Every local stylesheet,
/// image and anchor target must exist next to the document.
pub fn set_html_titles(
    book: &mut Songbook,
    base_dir: &Path,
    errors: &mut BuildErrors,
) -> Vec<HtmlInclude> {
    let mut includes = Vec::new();

    for id in book.find_all(|n| n.kind == NodeKind::Html) {
        let path = book.path(id);
        let mut fail = |message: String| {
            errors.push(BuildError::InvalidHtmlSubdocument {
                path: path.clone(),
                message,
            })
        };

        let title = book.attr(id, "title").map(str::to_string);
        let Some(src) = book.attr(id, "src").map(str::to_string) else {
            fail("missing src attribute".to_string());
            continue;
        };
        let Some(file) = resolve_source(base_dir, &src) else {
            fail(format!(
                "{} src=\"{src}\" - file not found!",
                title.as_deref().unwrap_or_default()
            ));
            continue;
        };
        let doc = match parse_file(&file) {
            Ok(doc) => doc,
            Err(e) => {
                fail(format!("{src} is not a valid HTML file! ({e})"));
                continue;
            }
        };
        let Some(html) = doc.root_element().filter(|&r| doc.local_name(r) == Some("html")) else {
            fail(format!("{src} is not a valid HTML file! (root element is not <html>)"));
            continue;
        };

        let Some(document_title) = document_title(&doc, html) else {
            fail(format!("{src}: undefined document title"));
            continue;
        };
        match title {
            None => book.set_attr(id, "title", &document_title),
            Some(title) if title != document_title => {
                fail(format!(
                    "title mismatch! (\"{title}\" vs \"{document_title}\" in {src})"
                ));
                continue;
            }
            Some(_) => {}
        }

        let dir = file.parent().unwrap_or(Path::new("."));
        let mut resources = Vec::new();
        for href in referenced_resources(&doc, html) {
            if !dir.join(&href).is_file() {
                fail(format!("Resource file {href} not found"));
            } else if !resources.contains(&href) {
                resources.push(href);
            }
        }

        includes.push(HtmlInclude {
            node: id,
            source: file,
            resources,
        });
    }

    includes
}

fn document_title(doc: &XmlDocument, html: XmlNodeId) -> Option<String> {
    let title = doc.select(html, &["head", "title"])?;
    let text = doc.text_content(title).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Local stylesheet, image and anchor targets, fragments stripped.
fn referenced_resources(doc: &XmlDocument, html: XmlNodeId) -> Vec<String> {
    let mut hrefs = Vec::new();
    for id in doc.descendants(html) {
        let href = match doc.local_name(id) {
            Some("link") if doc.get_attr(id, "rel") == Some("stylesheet") => {
                doc.get_attr(id, "href")
            }
            Some("img") => doc.get_attr(id, "src"),
            Some("a") => doc.get_attr(id, "href"),
            _ => None,
        };
        let Some(href) = href else {
            continue;
        };
        if is_external_href(href) {
            continue;
        }
        let local = href.split(['#', '?']).next().unwrap_or(href);
        if !local.is_empty() {
            hrefs.push(local.to_string());
        }
    }
    hrefs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    #[test]
    fn test_document_title_ignores_namespaces() {
        let doc = parse_str(
            r#"<h:html xmlns:h="http://www.w3.org/1999/xhtml"><h:head><h:title> HTML Subdocument </h:title></h:head></h:html>"#,
        )
        .unwrap();
        let html = doc.root_element().unwrap();
        assert_eq!(document_title(&doc, html), Some("HTML Subdocument".to_string()));
    }

    #[test]
    fn test_missing_title_is_none() {
        let doc = parse_str("<html><head/><body/></html>").unwrap();
        let html = doc.root_element().unwrap();
        assert_eq!(document_title(&doc, html), None);
    }

    #[test]
    fn test_referenced_resources() {
        let doc = parse_str(
            r##"<html><head>
  <link rel="stylesheet" type="text/css" href="style.css"/>
  <link rel="icon" href="favicon.ico"/>
</head><body>
  <img src="img/photo.png"/>
  <a href="notes.xhtml#part2">notes</a>
  <a href="#top">top</a>
  <a href="http://example.com/">web</a>
</body></html>"##,
        )
        .unwrap();
        let html = doc.root_element().unwrap();
        assert_eq!(
            referenced_resources(&doc, html),
            vec!["style.css", "img/photo.png", "notes.xhtml"]
        );
    }
}
