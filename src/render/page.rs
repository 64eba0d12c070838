//! XHTML page skeleton shared by every generated file.

use crate::settings::RenderSettings;
use crate::xml::{XHTML11_DOCTYPE, XmlDocument, XmlNodeId, serialize};

const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// An XHTML document under construction.
#[derive(Debug, Clone)]
pub struct XhtmlPage {
    pub doc: XmlDocument,
    pub body: XmlNodeId,
}

impl XhtmlPage {
    /// Create `html/head/{title,link}` and an empty `body`.
    pub fn new(settings: &RenderSettings) -> Self {
        let mut doc = XmlDocument::new();
        let html = doc.add_element(doc.document(), "html");
        doc.set_attr(html, "xmlns", XHTML_NS);

        let head = doc.add_element(html, "head");
        doc.add_text_element(head, "title", &settings.book_title);
        let link = doc.add_element(head, "link");
        doc.set_attr(link, "rel", "stylesheet");
        doc.set_attr(link, "type", "text/css");
        doc.set_attr(link, "href", &settings.stylesheet_href);

        let body = doc.add_element(html, "body");
        Self { doc, body }
    }

    /// Serialize with declaration and doctype.
    pub fn to_xml(&self, encoding: &str) -> String {
        serialize(&self.doc, encoding, Some(XHTML11_DOCTYPE))
    }
}
