//! Section pages: heading plus a nested list of everything inside.

use crate::settings::RenderSettings;
use crate::tree::{NodeId, NodeKind, Songbook};
use crate::xml::{XmlDocument, XmlNodeId};

use super::page::XhtmlPage;

pub fn render_section(book: &Songbook, section: NodeId, settings: &RenderSettings) -> XhtmlPage {
    let mut page = XhtmlPage::new(settings);
    let body = page.body;

    let title = match book.title(section) {
        "" => settings.section_title.as_str(),
        title => title,
    };
    page.doc.add_text_element(body, "h2", title);
    let p = page.doc.add_element(body, "p");
    let ul = page.doc.add_element(p, "ul");
    write_tree(book, section, &mut page.doc, ul);
    page
}

/// Mirror the page children of `node` as `li > a`, nesting sections.
fn write_tree(book: &Songbook, node: NodeId, doc: &mut XmlDocument, ul: XmlNodeId) {
    for child in book.children(node) {
        let Some(kind) = book.kind(child) else {
            continue;
        };
        if !kind.is_page() {
            continue;
        }

        let li = doc.add_element(ul, "li");
        let a = doc.add_text_element(li, "a", book.title(child));
        if let Some(href) = book.attr(child, "xhtml") {
            doc.set_attr(a, "href", href);
        }

        let has_pages = book
            .children(child)
            .any(|c| book.kind(c).is_some_and(NodeKind::is_page));
        if kind == NodeKind::Section && has_pages {
            let nested = doc.add_element(li, "ul");
            write_tree(book, child, doc, nested);
        }
    }
}
