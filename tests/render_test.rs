use songbook::render::{authorship_line, render_songs_index, standardize_author_name};
use songbook::xml::{XmlDocument, parse_str, serialize_node};
use songbook::{ChordMode, Error, RenderSettings, Settings, Songbook, render_part, render_song};

fn render(text: &str, mode: ChordMode, settings: &RenderSettings) -> (String, ChordMode) {
    let mut doc = XmlDocument::new();
    let body = doc.add_element(doc.document(), "body");
    let (p, used) = render_part(&mut doc, body, text, mode, settings);
    (serialize_node(&doc, p), used)
}

#[test]
fn test_plain_text_falls_back_to_no_chords() {
    let settings = RenderSettings::default();
    for mode in [ChordMode::Above, ChordMode::Beside, ChordMode::None] {
        let (xml, used) = render("Just words\nand more", mode, &settings);
        assert_eq!(used, ChordMode::None);
        assert_eq!(xml, "<p>\n  <span>Just words</span>\n  <br/>\n  <span>and more</span>\n</p>");
    }
}

#[test]
fn test_requested_mode_is_kept_when_chords_exist() {
    let settings = RenderSettings::default();
    let text = "Hey |Jude>D A\nplain line\nTake a sad |song>A";

    let (above, used) = render(text, ChordMode::Above, &settings);
    assert_eq!(used, ChordMode::Above);
    assert_eq!(above.matches("<table>").count(), 2);
    assert!(above.contains("<tr class=\"chords_above\"><td/><td>D</td><td>A</td></tr>"));
    assert!(above.contains("<span>plain line</span>"));

    let (beside, used) = render(text, ChordMode::Beside, &settings);
    assert_eq!(used, ChordMode::Beside);
    assert_eq!(beside.matches("<table class=\"chords_beside\">").count(), 2);
    assert!(beside.contains("<tr><td>Hey Jude</td><td class=\"chords\">D A</td></tr>"));

    let (none, used) = render(text, ChordMode::None, &settings);
    assert_eq!(used, ChordMode::None);
    assert!(none.contains("<span>Hey Jude</span>"));
    assert!(!none.contains("D A"));
}

#[test]
fn test_custom_markers() {
    let settings = RenderSettings {
        chord_separator: '#',
        chord_insertion: '^',
        ..RenderSettings::default()
    };
    let (xml, used) = render("^Row ^row#G C", ChordMode::Above, &settings);
    assert_eq!(used, ChordMode::Above);
    assert!(xml.contains("<tr class=\"chords_above\"><td/><td>G</td><td>C</td></tr>"));
    assert!(xml.contains("<tr><td/><td>Row&#xA0;</td><td>row</td></tr>"));
}

#[test]
fn test_song_page_uses_inherited_chord_mode() {
    let doc = parse_str(
        r#"<songbook>
  <section title="S" chord_mode="CHORDS_BESIDE">
    <song title="Inner" xhtml="sng_inner.xhtml">
      <verse>La |la>C</verse>
      <chorus chord_mode="CHORDS_ABOVE">Oh |oh>G</chorus>
    </song>
  </section>
</songbook>"#,
    )
    .unwrap();
    let book = Songbook::from_xml(&doc).unwrap();
    let song = book.songs()[0];
    let page = render_song(&book, song, &RenderSettings::default()).to_xml("utf-8");

    assert!(page.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(page.contains("<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.1//EN\""));
    assert!(page.contains("<table class=\"chords_beside\">"));
    assert!(page.contains("<tr class=\"chords_above\"><td/><td>G</td></tr>"));
}

#[test]
fn test_authorship_and_names() {
    let settings = RenderSettings {
        lyrics_string: "słowa:".to_string(),
        music_string: "muzyka:".to_string(),
        ..RenderSettings::default()
    };
    assert_eq!(
        authorship_line(Some("A. Nowak"), None, Some("Zespół"), &settings),
        "słowa: A. Nowak, muzyka: ? (Zespół)"
    );
    assert_eq!(standardize_author_name("Jan Maria  Rokita"), "Rokita, Jan Maria");
}

#[test]
fn test_songs_index_folds_accents() {
    let doc = parse_str(
        r#"<songbook>
  <song title="Łąka" xhtml="sng_laka.xhtml"/>
  <song title="Lato" xhtml="sng_lato.xhtml"/>
  <song title="Kot" xhtml="sng_kot.xhtml"/>
</songbook>"#,
    )
    .unwrap();
    let book = Songbook::from_xml(&doc).unwrap();
    let xml = render_songs_index(&book, "Songs", &RenderSettings::default()).to_xml("utf-8");

    let kot = xml.find("sng_kot.xhtml").unwrap();
    let laka = xml.find("sng_laka.xhtml").unwrap();
    let lato = xml.find("sng_lato.xhtml").unwrap();
    assert!(kot < laka && laka < lato);
    assert_eq!(xml.matches("<h3>L</h3>").count(), 1);
}

#[test]
fn test_markers_from_settings_element() {
    let doc = parse_str(
        r#"<songbook>
  <settings>
    <chord_separator>|</chord_separator>
    <chord_insertion_character>&gt;</chord_insertion_character>
  </settings>
  <song title="Swap" xhtml="sng_swap.xhtml" chord_mode="CHORDS_ABOVE">
    <verse>&gt;Row &gt;row|G C</verse>
  </song>
</songbook>"#,
    )
    .unwrap();
    let settings = Settings::from_document(&doc).unwrap().render_settings();
    let book = Songbook::from_xml(&doc).unwrap();
    let page = render_song(&book, book.songs()[0], &settings).to_xml("utf-8");

    assert!(page.contains("<tr class=\"chords_above\"><td/><td>G</td><td>C</td></tr>"));
    assert!(page.contains("<tr><td/><td>Row&#xA0;</td><td>row</td></tr>"));
}

#[test]
fn test_unknown_chord_mode_is_rejected() {
    let doc = parse_str(
        r#"<songbook>
  <section title="S" chord_mode="CHORDS_BESIDE">
    <song title="A" chord_mode="SIDEWAYS"><verse>La |la>C</verse></song>
  </section>
</songbook>"#,
    )
    .unwrap();
    assert!(matches!(Songbook::from_xml(&doc), Err(Error::Parse(_))));
}
