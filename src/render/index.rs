//! Alphabetical song and author indexes.

use std::collections::BTreeMap;

use crate::names::to_filename_stem;
use crate::settings::RenderSettings;
use crate::tree::{NodeId, Songbook};
use crate::xml::{XmlNodeId, unescape};

use super::page::XhtmlPage;
use super::song::split_authors;

/// Sort key that orders accented titles next to their ASCII forms.
fn collation_key(text: &str) -> String {
    to_filename_stem(&unescape(text)).to_lowercase()
}

/// Heading letter for a sort key.
fn initial(key: &str) -> String {
    match key.trim_start().chars().next() {
        Some(c) if c.is_ascii_alphabetic() => c.to_ascii_uppercase().to_string(),
        Some(c) if c.is_ascii_digit() => "0-9".to_string(),
        _ => "#".to_string(),
    }
}

struct Entry<'a> {
    key: String,
    title: &'a str,
    href: &'a str,
}

fn song_entry(book: &Songbook, song: NodeId) -> Option<Entry<'_>> {
    let href = book.attr(song, "xhtml")?;
    let title = book.title(song);
    Some(Entry {
        key: collation_key(title),
        title,
        href,
    })
}

fn write_entry(page: &mut XhtmlPage, ul: XmlNodeId, entry: &Entry<'_>) {
    let li = page.doc.add_element(ul, "li");
    let a = page.doc.add_text_element(li, "a", entry.title);
    page.doc.set_attr(a, "href", entry.href);
}

/// All songs by title, grouped under their initial letter.
pub fn render_songs_index(book: &Songbook, title: &str, settings: &RenderSettings) -> XhtmlPage {
    let mut page = XhtmlPage::new(settings);
    let body = page.body;
    page.doc.add_text_element(body, "h2", title);

    let mut entries: Vec<Entry<'_>> = book
        .songs()
        .into_iter()
        .filter_map(|song| song_entry(book, song))
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.title.cmp(b.title)));

    let mut current: Option<(String, XmlNodeId)> = None;
    for entry in &entries {
        let letter = initial(&entry.key);
        let ul = match &current {
            Some((l, ul)) if *l == letter => *ul,
            _ => {
                page.doc.add_text_element(body, "h3", &letter);
                let ul = page.doc.add_element(body, "ul");
                current = Some((letter, ul));
                ul
            }
        };
        write_entry(&mut page, ul, entry);
    }
    page
}

/// Normalize spacing after `.` and `,` and collapse runs of spaces.
pub fn normalize_name(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 4);
    let mut chars = name.trim().chars().peekable();
    while let Some(c) = chars.next() {
        spaced.push(c);
        if matches!(c, '.' | ',') && chars.peek().is_some_and(|next| !next.is_whitespace()) {
            spaced.push(' ');
        }
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "J. Doe" becomes "Doe, J."; names with a comma or a single word stay.
pub fn standardize_author_name(name: &str) -> String {
    let name = normalize_name(name);
    if name.contains(',') {
        return name;
    }
    match name.rsplit_once(' ') {
        Some((given, surname)) => format!("{surname}, {given}"),
        None => name,
    }
}

/// Authors in alphabetical order, each followed by their songs.
///
/// Lyrics and music authors are split on `;` and standardized; a band counts
/// as one author under its own name.
pub fn render_authors_index(book: &Songbook, title: &str, settings: &RenderSettings) -> XhtmlPage {
    let mut page = XhtmlPage::new(settings);
    let body = page.body;
    page.doc.add_text_element(body, "h2", title);

    let mut authors: BTreeMap<(String, String), Vec<Entry<'_>>> = BTreeMap::new();
    for song in book.songs() {
        let Some(entry) = song_entry(book, song) else {
            continue;
        };
        let mut names: Vec<String> = Vec::new();
        for attr in ["lyrics", "music"] {
            for raw in split_authors(book.attr(song, attr).unwrap_or_default()) {
                names.push(standardize_author_name(&raw));
            }
        }
        if let Some(band) = book.attr(song, "band") {
            let band = normalize_name(&unescape(band));
            if !band.is_empty() {
                names.push(band);
            }
        }
        names.dedup();

        for name in names {
            let songs = authors.entry((collation_key(&name), name)).or_default();
            if !songs.iter().any(|e| e.href == entry.href) {
                songs.push(Entry {
                    key: entry.key.clone(),
                    title: entry.title,
                    href: entry.href,
                });
            }
        }
    }

    let mut letter: Option<String> = None;
    for ((key, name), mut songs) in authors {
        let current = initial(&key);
        if letter.as_deref() != Some(current.as_str()) {
            page.doc.add_text_element(body, "h3", &current);
            letter = Some(current);
        }
        page.doc.add_text_element(body, "h4", &name);
        let ul = page.doc.add_element(body, "ul");
        songs.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.title.cmp(b.title)));
        for entry in &songs {
            write_entry(&mut page, ul, entry);
        }
    }
    page
}
