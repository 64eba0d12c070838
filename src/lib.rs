//! # songbook
//!
//! Builds an EPUB-ready songbook from one master XML document.
//!
//! ## Features
//!
//! - Songs, nested sections and raw XHTML pages described in a single tree
//! - Per-song source files merged in, with conflicting attributes reported
//! - Reciprocal "see also" links kept consistent across the whole book
//! - Chords rendered above the lyrics, beside them, or not at all
//! - Alphabetical song and author indexes, NCX table of contents and OPF manifest
//!
//! ## Quick Start
//!
//! ```no_run
//! use songbook::Build;
//!
//! let mut build = Build::open("songbook.xml")?;
//! build.settings.max_songs = 50;
//! let report = build.write()?;
//! println!("{} pages in {}", report.pages, report.output_dir.display());
//! # Ok::<(), songbook::Error>(())
//! ```
//!
//! ## Working with the Tree
//!
//! The reconcilers and renderers can also be driven one step at a time:
//!
//! ```
//! use songbook::{RenderSettings, Songbook, reconcile_links, render_song, xml};
//!
//! let doc = xml::parse_str(
//!     r#"<songbook>
//!   <song title="A" xhtml="a.xhtml"><link title="B"/></song>
//!   <song title="B" xhtml="b.xhtml"/>
//! </songbook>"#,
//! )?;
//! let mut book = Songbook::from_xml(&doc)?;
//! reconcile_links(&mut book);
//!
//! let b = book.songs()[1];
//! let page = render_song(&book, b, &RenderSettings::default());
//! assert!(page.to_xml("utf-8").contains("a.xhtml"));
//! # Ok::<(), songbook::Error>(())
//! ```

pub mod build;
pub mod epub;
pub mod error;
pub mod links;
pub mod names;
pub mod render;
pub mod settings;
pub mod source;
pub mod tree;
pub(crate) mod util;
pub mod xml;

pub use build::{Build, BuildReport, SongSummary};
pub use epub::write_epub;
pub use error::{BuildError, BuildErrors, Error, Result};
pub use links::{LinkReport, reconcile_links};
pub use names::{FileNameRegistry, slug, to_filename_stem};
pub use render::{XhtmlPage, render_part, render_section, render_song};
pub use settings::{RenderSettings, Settings};
pub use source::{ReconcileReport, reconcile_sources};
pub use tree::{ChordMode, NodeId, NodeKind, Songbook};
