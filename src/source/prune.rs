//! Removal of excluded, surplus and empty content.

use log::info;

use crate::tree::{NodeKind, Songbook};

/// Drop `include="false"` nodes, songs beyond `max_songs` and sections left
/// without songs. Returns the number of titled songs kept.
///
/// `max_songs == 0` means no limit.
pub fn remove_ignored_content(book: &mut Songbook, max_songs: usize) -> usize {
    let excluded = book.find_all(|n| n.attrs.get("include").is_some_and(is_false));
    for id in excluded {
        if book.is_attached(id) {
            info!("Ignoring {}", book.path(id));
            book.detach(id);
        }
    }

    let titled = book.find_all(|n| n.kind == NodeKind::Song && n.attrs.contains("title"));
    info!("Found {} songs", titled.len());

    let cap = if max_songs == 0 || max_songs > titled.len() {
        titled.len()
    } else {
        max_songs
    };
    for &id in &titled[cap..] {
        info!("Max song number set to {cap}. Ignoring {}", book.path(id));
        book.detach(id);
    }

    remove_empty_sections(book);
    cap
}

/// Remove every section without a descendant song, innermost first.
fn remove_empty_sections(book: &mut Songbook) {
    let mut sections = book.sections();
    sections.reverse();
    for id in sections {
        if book.is_attached(id) && !book.has_descendant_song(id) {
            info!("Ignoring empty section {}", book.path(id));
            book.detach(id);
        }
    }
}

/// Values of the `include` attribute that exclude a node.
pub(crate) fn is_false(value: &str) -> bool {
    matches!(value.trim(), "false" | "0" | "no")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    fn load(xml: &str) -> Songbook {
        Songbook::from_xml(&parse_str(xml).unwrap()).unwrap()
    }

    fn titles(book: &Songbook) -> Vec<String> {
        book.songs()
            .into_iter()
            .map(|id| book.title(id).to_string())
            .collect()
    }

    const SIX_SONGS: &str = r#"<songbook>
  <section title="S1">
    <song title="A"/><song title="B"/>
    <section title="S1.1"><song title="C"/></section>
  </section>
  <section title="S2">
    <song title="D"/>
    <section title="S2.1"><song title="E"/><song title="F"/></section>
  </section>
</songbook>"#;

    #[test]
    fn test_cap_keeps_first_songs_and_drops_empty_sections() {
        let mut book = load(SIX_SONGS);
        assert_eq!(remove_ignored_content(&mut book, 3), 3);
        assert_eq!(titles(&book), vec!["A", "B", "C"]);

        let sections: Vec<_> = book
            .sections()
            .into_iter()
            .map(|id| book.title(id).to_string())
            .collect();
        assert_eq!(sections, vec!["S1", "S1.1"]);
        for section in book.sections() {
            assert!(book.has_descendant_song(section));
        }
    }

    #[test]
    fn test_zero_or_large_cap_keeps_everything() {
        let mut book = load(SIX_SONGS);
        assert_eq!(remove_ignored_content(&mut book, 0), 6);
        let mut book = load(SIX_SONGS);
        assert_eq!(remove_ignored_content(&mut book, 100), 6);
        assert_eq!(book.sections().len(), 4);
    }

    #[test]
    fn test_include_false_removed_before_counting() {
        let mut book = load(
            r#"<songbook>
  <song title="A" include="false"/>
  <song title="B"><link title="A" include="false"/></song>
  <section title="Hidden" include="false"><song title="C"/></section>
  <section title="Nested"><section title="Empty"/></section>
  <song title="D"/>
</songbook>"#,
        );
        assert_eq!(remove_ignored_content(&mut book, 1), 1);
        assert_eq!(titles(&book), vec!["B"]);
        assert!(book.link_titles(book.songs()[0]).is_empty());
        assert!(book.sections().is_empty());
    }
}
