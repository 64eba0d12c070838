//! EPUB 2 package files: OPF manifest, NCX table of contents, static
//! container files and optional zip packaging.

mod ncx;
mod opf;
mod package;

pub use ncx::generate_ncx;
pub use opf::generate_opf;
pub use package::{
    CONTAINER_XML, MIMETYPE, SONGBOOK_CSS, book_identifier, write_epub, write_epub_to_writer,
};

/// Package-level metadata shared by the OPF and NCX documents.
#[derive(Debug, Clone, PartialEq)]
pub struct BookInfo {
    pub title: String,
    pub creator: String,
    pub language: String,
    pub identifier: String,
    /// Label of the navigation map.
    pub toc_title: String,
}

/// One navigation point; `href` is relative to the package root.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    pub title: String,
    pub href: String,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    fn depth(&self) -> usize {
        1 + self.children.iter().map(TocEntry::depth).max().unwrap_or(0)
    }
}

/// A manifest item that is not part of the reading order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub href: String,
    pub media_type: String,
}
