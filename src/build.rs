//! End-to-end build: load, reconcile, render and write the output tree.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::epub::{
    BookInfo, CONTAINER_XML, MIMETYPE, Resource, SONGBOOK_CSS, TocEntry, book_identifier,
    generate_ncx, generate_opf,
};
use crate::error::Result;
use crate::links::{LinkReport, reconcile_links};
use crate::render::{
    XhtmlPage, render_authors_index, render_section, render_song, render_songs_index, song,
};
use crate::settings::{RenderSettings, Settings};
use crate::source::{HtmlInclude, ReconcileReport, reconcile_sources};
use crate::tree::{IndexKind, Node, NodeId, NodeKind, Songbook};
use crate::util::{encode_text, media_type};
use crate::xml::{parse_file, unescape};

/// Directory below the output root holding every page.
const TEXT_DIR: &str = "text";

/// A songbook loaded from disk, ready to be reconciled and written.
#[derive(Debug, Clone)]
pub struct Build {
    pub settings: Settings,
    pub book: Songbook,
    base_dir: PathBuf,
    includes: Vec<HtmlInclude>,
    reconciled: bool,
}

/// Summary of a finished [`Build::write`].
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub pages: usize,
    pub songs: usize,
    pub resources: usize,
}

/// One reconciled song as listed by `--list`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct SongSummary {
    pub title: String,
    pub xhtml: String,
    pub authors: Vec<String>,
    #[cfg_attr(feature = "cli", serde(skip_serializing_if = "Option::is_none"))]
    pub band: Option<String>,
    pub chord_mode: String,
    pub links: Vec<String>,
}

impl Build {
    /// Parse the master document and its `<settings>`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = parse_file(path)?;
        let settings = Settings::from_document(&doc)?;
        let book = Songbook::from_xml(&doc)?;
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(Self {
            settings,
            book,
            base_dir,
            includes: Vec::new(),
            reconciled: false,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Output directory with relative settings resolved against the input.
    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.settings.output_dir)
    }

    /// Apply defaults, then run the source and link reconcilers.
    ///
    /// Calling it again after success is a no-op. On failure the tree is
    /// left as loaded, so a retry reports the same errors.
    pub fn reconcile(&mut self) -> Result<(ReconcileReport, LinkReport)> {
        if self.reconciled {
            return Ok((ReconcileReport::default(), LinkReport::default()));
        }
        let loaded = self.book.clone();
        self.apply_chord_mode_defaults();
        self.add_missing_indexes();

        let report = match reconcile_sources(&mut self.book, &self.base_dir, self.settings.max_songs) {
            Ok(report) => report,
            Err(e) => {
                self.book = loaded;
                return Err(e);
            }
        };
        let links = reconcile_links(&mut self.book);
        info!(
            "Reconciled {} songs ({} from source files), {} link pass(es)",
            report.songs_kept, report.external_songs, links.passes
        );

        self.includes = report.html_includes.clone();
        self.reconciled = true;
        Ok((report, links))
    }

    /// Top-level sections and songs without `chord_mode` get the preferred
    /// one as a schema default, which a source file may still override.
    fn apply_chord_mode_defaults(&mut self) {
        let mode = self.settings.preferred_chord_mode.as_str();
        let top: Vec<NodeId> = self.book.children(self.book.root()).collect();
        for id in top {
            if !matches!(self.book.kind(id), Some(NodeKind::Section | NodeKind::Song)) {
                continue;
            }
            if let Some(node) = self.book.node_mut(id) {
                node.attrs.set_default("chord_mode", mode);
            }
        }
    }

    /// Titles index nodes and appends any index kind not declared.
    fn add_missing_indexes(&mut self) {
        for kind in [IndexKind::Songs, IndexKind::Authors] {
            let title = match kind {
                IndexKind::Songs => self.settings.alphabetical_index_title.as_str(),
                IndexKind::Authors => self.settings.authors_index_title.as_str(),
            };
            let declared = self.book.find_all(|n| n.kind == NodeKind::Index(kind));
            if declared.is_empty() {
                let node = Node::new(NodeKind::Index(kind)).with_attr("title", title);
                self.book.add_node(self.book.root(), node);
                continue;
            }
            for id in declared {
                if self.book.attr(id, "title").is_none() {
                    self.book.set_attr(id, "title", title);
                }
            }
        }
    }

    /// Reconciled songs in document order.
    pub fn songs(&self) -> Vec<SongSummary> {
        self.book
            .songs()
            .into_iter()
            .map(|id| SongSummary {
                title: unescape(self.book.title(id)).into_owned(),
                xhtml: self.book.attr(id, "xhtml").unwrap_or_default().to_string(),
                authors: song::song_authors(&self.book, id),
                band: self.book.attr(id, "band").map(|b| unescape(b).into_owned()),
                chord_mode: self
                    .book
                    .chord_mode(id)
                    .unwrap_or(self.settings.preferred_chord_mode)
                    .to_string(),
                links: self
                    .book
                    .link_titles(id)
                    .into_iter()
                    .map(|t| unescape(t).into_owned())
                    .collect(),
            })
            .collect()
    }

    /// Reconcile if needed and write every output file.
    ///
    /// Existing files are overwritten; nothing else in the output directory
    /// is touched.
    pub fn write(&mut self) -> Result<BuildReport> {
        self.reconcile()?;

        let out = self.output_dir();
        let text_dir = out.join(TEXT_DIR);
        fs::create_dir_all(&text_dir)?;
        fs::create_dir_all(out.join("META-INF"))?;

        let render = self.settings.render_settings();
        let mut report = BuildReport {
            output_dir: out.clone(),
            ..BuildReport::default()
        };
        let mut resources: Vec<Resource> = Vec::new();
        let mut pages: Vec<String> = Vec::new();

        for id in self.book.pages() {
            let Some(name) = self.book.attr(id, "xhtml") else {
                continue;
            };
            let target = text_dir.join(name);
            match self.book.kind(id) {
                Some(NodeKind::Html) => {
                    for href in self.copy_include(id, &text_dir)? {
                        if !resources.iter().any(|r| r.href == href) {
                            resources.push(Resource {
                                media_type: media_type(&href).to_string(),
                                href,
                            });
                        }
                    }
                }
                Some(kind) => {
                    if kind == NodeKind::Song {
                        report.songs += 1;
                    }
                    let Some(page) = self.render_page(id, kind, &render) else {
                        continue;
                    };
                    let xml = page.to_xml(&self.settings.encoding);
                    debug!("Writing {}", target.display());
                    fs::write(&target, encode_text(&xml, &self.settings.encoding))?;
                }
                None => continue,
            }
            pages.push(format!("{TEXT_DIR}/{name}"));
        }
        report.pages = pages.len();
        report.resources = resources.len();

        let info = BookInfo {
            title: self.settings.title.clone(),
            creator: self.settings.username.clone(),
            language: self.settings.language.clone(),
            identifier: book_identifier(&self.settings.username, &self.settings.title),
            toc_title: self.settings.toc_title.clone(),
        };
        let toc = self.toc_entries(self.book.root());
        fs::write(out.join("toc.ncx"), generate_ncx(&info, &toc))?;
        fs::write(
            out.join("metadata.opf"),
            generate_opf(&info, &pages, &resources),
        )?;
        fs::write(out.join("mimetype"), MIMETYPE)?;
        fs::write(out.join("META-INF").join("container.xml"), CONTAINER_XML)?;
        let css = out.join("songbook.css");
        if !css.exists() {
            fs::write(&css, SONGBOOK_CSS)?;
        }

        info!(
            "Wrote {} pages ({} songs) to {}",
            report.pages,
            report.songs,
            out.display()
        );
        Ok(report)
    }

    fn render_page(
        &self,
        id: NodeId,
        kind: NodeKind,
        render: &RenderSettings,
    ) -> Option<XhtmlPage> {
        let page = match kind {
            NodeKind::Song => render_song(&self.book, id, render),
            NodeKind::Section => render_section(&self.book, id, render),
            NodeKind::Index(IndexKind::Songs) => {
                render_songs_index(&self.book, self.book.title(id), render)
            }
            NodeKind::Index(IndexKind::Authors) => {
                render_authors_index(&self.book, self.book.title(id), render)
            }
            _ => return None,
        };
        Some(page)
    }

    /// Copy an XHTML include and its resources; returns the resource hrefs
    /// relative to the package root.
    fn copy_include(&self, id: NodeId, text_dir: &Path) -> Result<Vec<String>> {
        let Some(include) = self.includes.iter().find(|i| i.node == id) else {
            return Ok(Vec::new());
        };
        let Some(name) = self.book.attr(id, "xhtml") else {
            return Ok(Vec::new());
        };
        debug!("Copying {} to {name}", include.source.display());
        fs::copy(&include.source, text_dir.join(name))?;

        let src_dir = include.source.parent().unwrap_or(Path::new("."));
        let mut hrefs = Vec::new();
        for href in &include.resources {
            let target = text_dir.join(href);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(src_dir.join(href), &target)?;
            hrefs.push(format!("{TEXT_DIR}/{href}"));
        }
        Ok(hrefs)
    }

    /// Navigation entries for the page children of `node`.
    fn toc_entries(&self, node: NodeId) -> Vec<TocEntry> {
        let mut entries = Vec::new();
        for child in self.book.children(node) {
            let Some(kind) = self.book.kind(child) else {
                continue;
            };
            if !kind.is_page() {
                continue;
            }
            let Some(name) = self.book.attr(child, "xhtml") else {
                continue;
            };
            let mut entry = TocEntry::new(
                unescape(self.book.title(child)),
                format!("{TEXT_DIR}/{name}"),
            );
            if kind == NodeKind::Section {
                entry.children = self.toc_entries(child);
            }
            entries.push(entry);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ChordMode;

    fn build(xml: &str) -> (tempfile::TempDir, Build) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songbook.xml");
        fs::write(&path, xml).unwrap();
        let build = Build::open(&path).unwrap();
        (dir, build)
    }

    #[test]
    fn test_chord_mode_defaults_are_flagged() {
        let (_dir, mut build) = build(
            r#"<songbook>
  <settings><prefered_chord_mode>CHORDS_BESIDE</prefered_chord_mode></settings>
  <section title="S"><song title="A"/></section>
  <song title="B" chord_mode="NO_CHORDS"/>
</songbook>"#,
        );
        build.reconcile().unwrap();

        let section = build.book.sections()[0];
        let attrs = build.book.attrs(section).unwrap();
        assert_eq!(attrs.get("chord_mode"), Some("CHORDS_BESIDE"));
        assert!(attrs.is_defaulted("chord_mode"));

        let songs = build.book.songs();
        assert_eq!(build.book.chord_mode(songs[0]), Some(ChordMode::Beside));
        assert_eq!(build.book.chord_mode(songs[1]), Some(ChordMode::None));
        assert!(!build.book.attrs(songs[1]).unwrap().is_defaulted("chord_mode"));
    }

    #[test]
    fn test_failed_reconcile_leaves_tree_as_loaded() {
        let (dir, mut build) = build(
            r#"<songbook>
  <song title="A" src="a.xml"/>
  <song title="B" src="absent.xml"/>
</songbook>"#,
        );
        fs::write(dir.path().join("a.xml"), r#"<song title="A"><verse>la>C</verse></song>"#).unwrap();

        let first = build.reconcile().unwrap_err().to_string();
        let song_a = build.book.songs()[0];
        assert_eq!(build.book.children(song_a).count(), 0);
        assert!(build.book.attr(song_a, "chord_mode").is_none());

        let second = build.reconcile().unwrap_err().to_string();
        assert_eq!(first, second);
        assert!(!second.contains("defined in both"), "{second}");
        assert!(build.write().is_err());
    }

    #[test]
    fn test_missing_indexes_are_appended() {
        let (_dir, mut build) = build(
            r#"<songbook>
  <index type="authors"/>
  <song title="A"/>
</songbook>"#,
        );
        build.reconcile().unwrap();

        let root: Vec<NodeId> = build.book.children(build.book.root()).collect();
        assert_eq!(build.book.kind(root[0]), Some(NodeKind::Index(IndexKind::Authors)));
        assert_eq!(build.book.title(root[0]), "Authors");
        assert_eq!(build.book.attr(root[0], "xhtml"), Some("idx_authors.xhtml"));
        let last = *root.last().unwrap();
        assert_eq!(build.book.kind(last), Some(NodeKind::Index(IndexKind::Songs)));
        assert_eq!(build.book.attr(last, "xhtml"), Some("idx_songs.xhtml"));
    }

    #[test]
    fn test_song_summaries() {
        let (_dir, mut build) = build(
            r#"<songbook>
  <song title="You'll See" lyrics="J. Doe" band="Band"><link title="Other"/></song>
  <song title="Other" music="A. Smith"/>
</songbook>"#,
        );
        build.reconcile().unwrap();

        let songs = build.songs();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].title, "You'll See");
        assert_eq!(songs[0].xhtml, "sng_youll_see.xhtml");
        assert_eq!(songs[0].authors, vec!["J. Doe"]);
        assert_eq!(songs[0].band.as_deref(), Some("Band"));
        assert_eq!(songs[0].chord_mode, "CHORDS_ABOVE");
        assert_eq!(songs[1].links, vec!["You'll See"]);
    }

    #[test]
    fn test_output_dir_is_relative_to_input() {
        let (dir, build) =
            build("<songbook><settings><output_dir>out</output_dir></settings></songbook>");
        assert_eq!(build.output_dir(), dir.path().join("out"));
    }
}
