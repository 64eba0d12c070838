//! Songs whose body lives in a separate `src` file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;

use super::prune::is_false;
use crate::error::{BuildError, BuildErrors};
use crate::tree::{ChordMode, Node, NodeId, NodeKind, PartKind, Songbook};
use crate::util::resolve_source;
use crate::xml::{XmlDocument, parse_file};

/// Contents of one external `<song>` document.
#[derive(Debug, Clone)]
pub struct ExternalSong {
    pub path: PathBuf,
    /// Root attributes in source order.
    pub attrs: Vec<(String, String)>,
    pub links: Vec<Node>,
    pub parts: Vec<Node>,
}

impl ExternalSong {
    /// Load and validate an external song file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let doc = parse_file(path).map_err(|e| e.to_string())?;
        Self::from_document(path, &doc)
    }

    fn from_document(path: &Path, doc: &XmlDocument) -> Result<Self, String> {
        let root = doc
            .root_element()
            .ok_or_else(|| "document has no root element".to_string())?;
        if doc.local_name(root) != Some("song") {
            return Err(format!(
                "root element is <{}>, expected <song>",
                doc.element_name(root).unwrap_or("?")
            ));
        }

        let attrs = doc
            .attrs(root)
            .iter()
            .filter(|a| a.name != "src")
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect::<Vec<_>>();
        if let Some((_, mode)) = attrs.iter().find(|(name, _)| name == "chord_mode") {
            check_chord_mode(mode)?;
        }

        let mut links = Vec::new();
        let mut parts = Vec::new();
        for child in doc.child_elements(root) {
            if doc.get_attr(child, "include").is_some_and(is_false) {
                continue;
            }
            let kind = match doc.local_name(child) {
                Some("link") => NodeKind::Link,
                Some("verse") => NodeKind::Part(PartKind::Verse),
                Some("chorus") => NodeKind::Part(PartKind::Chorus),
                _ => continue,
            };
            let mut node = Node::new(kind);
            for attr in doc.attrs(child) {
                node.attrs.set(&attr.name, &attr.value);
            }
            if let Some(mode) = node.attrs.get("chord_mode") {
                check_chord_mode(mode)?;
            }
            if kind == NodeKind::Link {
                links.push(node);
            } else {
                node.text = doc.text_content(child);
                parts.push(node);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            attrs,
            links,
            parts,
        })
    }
}

fn check_chord_mode(value: &str) -> Result<(), String> {
    value.parse::<ChordMode>().map(|_| ())
}

/// External songs keyed by the node that references them.
pub type ExternalSongs = BTreeMap<NodeId, ExternalSong>;

/// Report every `song[@src]` that also carries non-link children inline.
///
/// Returns true when no song is ambiguous.
pub fn find_ambiguous_songs_content(book: &Songbook, errors: &mut BuildErrors) -> bool {
    let mut ok = true;
    for song in book.songs() {
        if book.attr(song, "src").is_none() {
            continue;
        }
        let inline_body = book.node(song).is_some_and(|n| n.had_unknown_children)
            || book
                .children(song)
                .any(|c| book.kind(c) != Some(NodeKind::Link));
        if inline_body {
            ok = false;
            errors.push(BuildError::StructuralAmbiguity {
                title: book.title(song).to_string(),
                path: book.path(song),
            });
        }
    }
    ok
}

/// Load each `song[@src]` file and copy its root attributes onto the
/// referencing node.
///
/// A value present on both sides must agree, unless the local one was only
/// injected as a default; the external value then replaces it.
pub fn pull_attributes_from_srcs(
    book: &mut Songbook,
    base_dir: &Path,
    errors: &mut BuildErrors,
) -> ExternalSongs {
    let mut externals = ExternalSongs::new();

    for song in book.songs() {
        let Some(src) = book.attr(song, "src").map(str::to_string) else {
            continue;
        };
        let path = book.path(song);

        let Some(file) = resolve_source(base_dir, &src) else {
            errors.push(BuildError::MissingSource {
                src,
                path,
                reason: "file does not exist".to_string(),
            });
            continue;
        };
        let external = match ExternalSong::load(&file) {
            Ok(external) => external,
            Err(reason) => {
                errors.push(BuildError::MissingSource { src, path, reason });
                continue;
            }
        };
        debug!("Loaded {} for {path}", file.display());

        let Some(node) = book.node_mut(song) else {
            continue;
        };
        for (name, value) in &external.attrs {
            let local = node.attrs.get(name).map(str::to_string);
            match local {
                None => node.attrs.set(name, value),
                Some(local) if local == *value => {}
                Some(_) if node.attrs.is_defaulted(name) => node.attrs.set(name, value),
                Some(local) => errors.push(BuildError::AttributeConflict {
                    path: path.clone(),
                    attribute: name.clone(),
                    external: value.clone(),
                    local,
                }),
            }
        }
        externals.insert(song, external);
    }

    externals
}

/// Copy links and verse/chorus parts from external files into the tree.
///
/// Links already present on the referencing song are not duplicated.
pub fn expose_links(book: &mut Songbook, externals: &ExternalSongs) {
    for (&song, external) in externals {
        if !book.is_attached(song) {
            continue;
        }
        for link in &external.links {
            let title = link.attrs.get("title").unwrap_or_default();
            if !book.has_link_to(song, title) {
                book.add_node(song, link.clone());
            }
        }
        for part in &external.parts {
            book.add_node(song, part.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    fn load(xml: &str) -> Songbook {
        Songbook::from_xml(&parse_str(xml).unwrap()).unwrap()
    }

    #[test]
    fn test_ambiguity_reports_exact_node() {
        let book = load(
            r#"<songbook>
  <song title="Fine" src="a.xml"><link title="Other"/></song>
  <song title="Twice" src="b.xml"><verse>inline</verse></song>
  <song title="Inline"><verse>ok</verse></song>
</songbook>"#,
        );
        let mut errors = BuildErrors::new();
        assert!(!find_ambiguous_songs_content(&book, &mut errors));
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.iter().next(),
            Some(&BuildError::StructuralAmbiguity {
                title: "Twice".into(),
                path: "/songbook/song[2]".into(),
            })
        );
    }

    #[test]
    fn test_external_document_parts() {
        let doc = parse_str(
            r#"<song title="B" lyrics="P. Gradkowski" src="x">
  <link title="A"/>
  <link title="Z" include="false"/>
  <verse>one>C</verse>
  <chorus>two</chorus>
  <comment/>
</song>"#,
        )
        .unwrap();
        let external = ExternalSong::from_document(Path::new("b.xml"), &doc).unwrap();
        assert_eq!(
            external.attrs,
            vec![
                ("title".to_string(), "B".to_string()),
                ("lyrics".to_string(), "P. Gradkowski".to_string()),
            ]
        );
        assert_eq!(external.links.len(), 1);
        assert_eq!(external.parts.len(), 2);
        assert_eq!(external.parts[0].text, "one>C");
    }

    #[test]
    fn test_unknown_inline_children_are_ambiguous() {
        let book = load(r#"<songbook><song title="Noted" src="a.xml"><comment/></song></songbook>"#);
        let mut errors = BuildErrors::new();
        assert!(!find_ambiguous_songs_content(&book, &mut errors));
        assert_eq!(
            errors.iter().next(),
            Some(&BuildError::StructuralAmbiguity {
                title: "Noted".into(),
                path: "/songbook/song[1]".into(),
            })
        );
    }

    #[test]
    fn test_external_invalid_chord_mode() {
        let doc = parse_str(r#"<song title="B" chord_mode="SIDEWAYS"/>"#).unwrap();
        let err = ExternalSong::from_document(Path::new("b.xml"), &doc).unwrap_err();
        assert!(err.contains("SIDEWAYS"), "{err}");

        let doc = parse_str(r#"<song title="B"><chorus chord_mode="LOUD">x</chorus></song>"#).unwrap();
        assert!(ExternalSong::from_document(Path::new("b.xml"), &doc).is_err());
    }

    #[test]
    fn test_external_root_must_be_song() {
        let doc = parse_str("<songbook/>").unwrap();
        assert!(ExternalSong::from_document(Path::new("x.xml"), &doc).is_err());
    }
}
