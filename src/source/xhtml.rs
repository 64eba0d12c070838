//! Output file names and attribute escaping.

use std::collections::BTreeMap;

use crate::error::{BuildError, BuildErrors};
use crate::names::FileNameRegistry;
use crate::tree::{NodeId, NodeKind, Songbook};

const EXT: &str = ".xhtml";

fn prefix(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Song => "sng_",
        NodeKind::Section => "sec_",
        NodeKind::Html => "htm_",
        _ => "",
    }
}

/// Give every page node a unique `xhtml` file name.
///
/// Explicit names are honoured and reserved first; two nodes declaring the
/// same explicit name is an error. Index nodes use their fixed names, the
/// rest are derived from the title.
pub fn assign_xhtml_attributes(
    book: &mut Songbook,
    registry: &mut FileNameRegistry,
    errors: &mut BuildErrors,
) -> bool {
    let pages = book.pages();

    let mut explicit: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
    for &id in &pages {
        if let Some(name) = book.attr(id, "xhtml") {
            explicit.entry(name.to_string()).or_default().push(id);
        }
    }

    let mut ok = true;
    for (name, nodes) in &explicit {
        registry.reserve(name);
        if nodes.len() > 1 {
            ok = false;
            errors.push(BuildError::FilenameCollision {
                xhtml: name.clone(),
                paths: nodes.iter().map(|&id| book.path(id)).collect(),
            });
        }
    }

    for id in pages {
        let Some(kind) = book.kind(id) else {
            continue;
        };
        if book.attr(id, "xhtml").is_some() {
            continue;
        }
        let name = match kind {
            NodeKind::Index(index) => {
                let fixed = index.file_name();
                registry.claim(fixed.trim_end_matches(EXT), EXT)
            }
            _ => registry.claim_for_title(prefix(kind), book.title(id), EXT),
        };
        book.set_attr(id, "xhtml", &name);
    }

    ok
}

/// Replace raw `'` and `"` in every attribute value with entity references.
pub fn escape_attribute_quotes(book: &mut Songbook) {
    let mut ids = book.descendants(book.root());
    ids.push(book.root());
    for id in ids {
        let Some(node) = book.node_mut(id) else {
            continue;
        };
        for attr in node.attrs.iter_mut() {
            if attr.value.contains(['\'', '"']) {
                attr.value = attr.value.replace('\'', "&apos;").replace('"', "&quot;");
            }
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

    fn xhtml(book: &Songbook) -> Vec<String> {
        book.pages()
            .into_iter()
            .map(|id| book.attr(id, "xhtml").unwrap_or("-").to_string())
            .collect()
    }

    #[test]
    fn test_generated_names_with_collisions() {
        let mut book = load(
            r#"<songbook>
  <section title="Section 1.1">
    <song title="Song A"/>
    <song title="Song A"/>
    <song title="You'll never see me"/>
  </section>
  <html title="HTML Subdocument" src="x.xhtml"/>
  <index type="songs"/>
</songbook>"#,
        );
        let mut registry = FileNameRegistry::new();
        let mut errors = BuildErrors::new();
        assert!(assign_xhtml_attributes(&mut book, &mut registry, &mut errors));
        assert!(errors.is_empty());
        assert_eq!(
            xhtml(&book),
            vec![
                "sec_section_1.1.xhtml",
                "sng_song_a.xhtml",
                "sng_song_a_1.xhtml",
                "sng_youll_never_see_me.xhtml",
                "htm_html_subdocument.xhtml",
                "idx_songs.xhtml",
            ]
        );
    }

    #[test]
    fn test_explicit_names_are_reserved() {
        let mut book = load(
            r#"<songbook>
  <song title="Song A"/>
  <song title="Other" xhtml="sng_song_a.xhtml"/>
</songbook>"#,
        );
        let mut registry = FileNameRegistry::new();
        let mut errors = BuildErrors::new();
        assert!(assign_xhtml_attributes(&mut book, &mut registry, &mut errors));
        assert_eq!(xhtml(&book), vec!["sng_song_a_1.xhtml", "sng_song_a.xhtml"]);
    }

    #[test]
    fn test_duplicate_explicit_names_are_reported() {
        let mut book = load(
            r#"<songbook>
  <song title="A" xhtml="same.xhtml"/>
  <section title="S"><song title="B" xhtml="same.xhtml"/></section>
</songbook>"#,
        );
        let mut registry = FileNameRegistry::new();
        let mut errors = BuildErrors::new();
        assert!(!assign_xhtml_attributes(&mut book, &mut registry, &mut errors));
        assert_eq!(
            errors.iter().next(),
            Some(&BuildError::FilenameCollision {
                xhtml: "same.xhtml".into(),
                paths: vec!["/songbook/song[1]".into(), "/songbook/section[1]/song[1]".into()],
            })
        );
    }

    #[test]
    fn test_escape_quotes_is_idempotent() {
        let mut book = load(r#"<songbook><song title="You'll say &quot;hi&quot;"/></songbook>"#);
        escape_attribute_quotes(&mut book);
        let song = book.songs()[0];
        assert_eq!(book.title(song), "You&apos;ll say &quot;hi&quot;");
        escape_attribute_quotes(&mut book);
        assert_eq!(book.title(song), "You&apos;ll say &quot;hi&quot;");
    }
}
