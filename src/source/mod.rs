//! Source-tree reconciliation.
//!
//! Turns the loaded songbook (plus any per-song `src` files and XHTML
//! includes) into one pruned tree where every page has a file name. Passes
//! run in a fixed order and collect defects instead of stopping at the first
//! one; failure is signalled once, after the last pass.

pub mod external;
pub mod html;
pub mod prune;
pub mod xhtml;

use std::path::Path;

use log::info;

pub use external::{
    ExternalSong, ExternalSongs, expose_links, find_ambiguous_songs_content,
    pull_attributes_from_srcs,
};
pub use html::{HtmlInclude, set_html_titles};
pub use prune::remove_ignored_content;
pub use xhtml::{assign_xhtml_attributes, escape_attribute_quotes};

use crate::error::{BuildErrors, Result};
use crate::names::FileNameRegistry;
use crate::tree::Songbook;

/// What reconciliation produced besides the mutated tree.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Titled songs left after pruning.
    pub songs_kept: usize,
    pub external_songs: usize,
    pub html_includes: Vec<HtmlInclude>,
}

/// Run every reconciliation pass over `book`.
///
/// `base_dir` is the directory of the root document; `src` references are
/// resolved against it.
pub fn reconcile_sources(
    book: &mut Songbook,
    base_dir: &Path,
    max_songs: usize,
) -> Result<ReconcileReport> {
    let mut errors = BuildErrors::new();

    let songs_kept = remove_ignored_content(book, max_songs);
    find_ambiguous_songs_content(book, &mut errors);
    let externals = pull_attributes_from_srcs(book, base_dir, &mut errors);
    let html_includes = set_html_titles(book, base_dir, &mut errors);

    let mut registry = FileNameRegistry::new();
    assign_xhtml_attributes(book, &mut registry, &mut errors);

    expose_links(book, &externals);
    escape_attribute_quotes(book);

    if !errors.is_empty() {
        info!("Reconciliation found {} error(s)", errors.len());
    }
    errors.into_result()?;

    Ok(ReconcileReport {
        songs_kept,
        external_songs: externals.len(),
        html_includes,
    })
}
