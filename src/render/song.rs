//! Song pages: title, authorship line, parts and "see also" block.

use crate::settings::RenderSettings;
use crate::tree::{NodeId, NodeKind, Songbook};
use crate::xml::{XmlNodeId, unescape};

use super::chords::render_part;
use super::page::XhtmlPage;

/// Render one song into a standalone XHTML page.
pub fn render_song(book: &Songbook, song: NodeId, settings: &RenderSettings) -> XhtmlPage {
    let mut page = XhtmlPage::new(settings);
    let body = page.body;

    page.doc.add_text_element(body, "h1", book.title(song));
    let header = authorship_line(
        defined(book, song, "lyrics"),
        defined(book, song, "music"),
        defined(book, song, "band"),
        settings,
    );
    let authors = page.doc.add_text_element(body, "p", &header);
    page.doc.set_attr(authors, "class", "authors");

    for part in book.children(song) {
        let Some(NodeKind::Part(kind)) = book.kind(part) else {
            continue;
        };
        let text = book.node(part).map(|n| n.text.as_str()).unwrap_or_default();
        let mode = book.chord_mode(part).unwrap_or_default();
        let (p, _) = render_part(&mut page.doc, body, text, mode, settings);
        page.doc.set_attr(p, "class", kind.as_str());
    }

    write_links_block(book, song, &mut page, settings);
    page
}

fn defined<'a>(book: &'a Songbook, song: NodeId, name: &str) -> Option<&'a str> {
    book.attr(song, name).filter(|v| !v.trim().is_empty())
}

/// Compose the authorship line.
///
/// A band alone is shown verbatim; otherwise lyrics and music authors are
/// labelled, unknown ones replaced by the placeholder, and the band, if any,
/// follows in parentheses.
pub fn authorship_line(
    lyrics: Option<&str>,
    music: Option<&str>,
    band: Option<&str>,
    settings: &RenderSettings,
) -> String {
    if let (None, None, Some(band)) = (lyrics, music, band) {
        return band.to_string();
    }

    let unknown = settings.unknown_author.as_str();
    let mut line = format!(
        "{} {}, {} {}",
        settings.lyrics_string,
        lyrics.unwrap_or(unknown),
        settings.music_string,
        music.unwrap_or(unknown)
    );
    if let Some(band) = band {
        line.push_str(&format!(" ({band})"));
    }
    line
}

/// Split a `;`-delimited author attribute into trimmed names.
pub fn split_authors(value: &str) -> Vec<String> {
    unescape(value)
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lyrics and music authors of a song, without repeats.
pub fn song_authors(book: &Songbook, song: NodeId) -> Vec<String> {
    let mut authors: Vec<String> = Vec::new();
    for attr in ["lyrics", "music"] {
        for name in split_authors(book.attr(song, attr).unwrap_or_default()) {
            if !authors.contains(&name) {
                authors.push(name);
            }
        }
    }
    authors
}

/// Append the "see also" list.
///
/// One item per other song carrying a linked title. Heading and list are
/// only created once the first item exists.
pub fn write_links_block(
    book: &Songbook,
    song: NodeId,
    page: &mut XhtmlPage,
    settings: &RenderSettings,
) {
    let mut list: Option<XmlNodeId> = None;
    let mut seen: Vec<&str> = Vec::new();

    for title in book.link_titles(song) {
        if seen.contains(&title) {
            continue;
        }
        seen.push(title);

        for target in book.songs_titled(title) {
            if target == song {
                continue;
            }
            let Some(href) = book.attr(target, "xhtml") else {
                continue;
            };

            let ul = match list {
                Some(ul) => ul,
                None => {
                    let doc = &mut page.doc;
                    doc.add_text_element(page.body, "h3", &settings.links_header);
                    let p = doc.add_element(page.body, "p");
                    doc.set_attr(p, "class", "links");
                    let ul = doc.add_element(p, "ul");
                    list = Some(ul);
                    ul
                }
            };

            let doc = &mut page.doc;
            let li = doc.add_element(ul, "li");
            let a = doc.add_text_element(li, "a", title);
            doc.set_attr(a, "href", href);
            let authors = song_authors(book, target);
            if !authors.is_empty() {
                let span = doc.add_text_element(li, "span", &format!("({})", authors.join(", ")));
                doc.set_attr(span, "style", "font-size:12px");
            }
        }
    }
}
