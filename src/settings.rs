//! Build configuration read from the `<settings>` element.

use std::path::PathBuf;

use log::warn;

use crate::error::{Error, Result};
use crate::tree::ChordMode;
use crate::xml::XmlDocument;

/// Global build settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub username: String,
    pub title: String,
    /// Maximum number of songs to keep, 0 for no limit.
    pub max_songs: usize,
    pub section_title: String,
    pub authors_index_title: String,
    pub alphabetical_index_title: String,
    pub toc_title: String,
    pub links_header: String,
    pub language: String,
    pub encoding: String,
    /// Output directory, relative to the input document's directory.
    pub output_dir: PathBuf,
    pub lyrics_string: String,
    pub music_string: String,
    pub unknown_author: String,
    pub preferred_chord_mode: ChordMode,
    pub chord_separator: char,
    pub chord_insertion: char,
}

impl Default for Settings {
    fn default() -> Self {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        Self {
            username,
            title: "My Songbook".to_string(),
            max_songs: 0,
            section_title: "Section".to_string(),
            authors_index_title: "Authors".to_string(),
            alphabetical_index_title: "Songs".to_string(),
            toc_title: "Contents".to_string(),
            links_header: "See also:".to_string(),
            language: "en".to_string(),
            encoding: "utf-8".to_string(),
            output_dir: PathBuf::from("output"),
            lyrics_string: "lyrics by:".to_string(),
            music_string: "music by:".to_string(),
            unknown_author: "?".to_string(),
            preferred_chord_mode: ChordMode::Above,
            chord_separator: '>',
            chord_insertion: '|',
        }
    }
}

impl Settings {
    /// Read `/songbook/settings/*`, starting from defaults.
    pub fn from_document(doc: &XmlDocument) -> Result<Self> {
        let mut settings = Settings::default();
        let Some(node) = doc
            .root_element()
            .and_then(|root| doc.child_by_name(root, "settings"))
        else {
            return Ok(settings);
        };

        for child in doc.child_elements(node) {
            let key = doc.local_name(child).unwrap_or_default();
            settings.apply(key, doc.text_content(child).trim())?;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Set one field by its settings key.
    ///
    /// Unknown keys are reported and ignored. Checks spanning several keys
    /// are left to [`Settings::validate`], so keys may arrive in any order.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "username" => self.username = value.to_string(),
            "title" => self.title = value.to_string(),
            "max_songs" | "maxsongs" => {
                self.max_songs = value.parse().map_err(|_| {
                    Error::Settings(format!("max_songs must be a non-negative integer, got '{value}'"))
                })?
            }
            "section_title" => self.section_title = value.to_string(),
            "authors_index_title" => self.authors_index_title = value.to_string(),
            "alphabetical_index_title" => self.alphabetical_index_title = value.to_string(),
            "toc_title" => self.toc_title = value.to_string(),
            "links_header" => self.links_header = value.to_string(),
            "language" => self.language = value.to_string(),
            "encoding" => self.encoding = value.to_string(),
            "output_dir" => self.output_dir = PathBuf::from(value),
            "lyrics_string" => self.lyrics_string = value.to_string(),
            "music_string" => self.music_string = value.to_string(),
            "unknown_author" => self.unknown_author = value.to_string(),
            "prefered_chord_mode" | "preferred_chord_mode" => {
                self.preferred_chord_mode = value.parse().map_err(Error::Settings)?
            }
            "chord_separator" => self.chord_separator = single_char(key, value)?,
            "chord_insertion_character" => self.chord_insertion = single_char(key, value)?,
            "template_dir" => warn!("Setting template_dir is not used"),
            other => warn!("Unknown setting '{other}' ignored"),
        }
        Ok(())
    }

    /// Check constraints between keys once every key has been applied.
    pub fn validate(&self) -> Result<()> {
        if self.chord_separator == self.chord_insertion {
            return Err(Error::Settings(format!(
                "chord_separator and chord_insertion_character are both '{}'",
                self.chord_separator
            )));
        }
        Ok(())
    }

    /// The subset of settings every renderer receives.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            book_title: self.title.clone(),
            stylesheet_href: "../songbook.css".to_string(),
            encoding: self.encoding.clone(),
            chord_separator: self.chord_separator,
            chord_insertion: self.chord_insertion,
            lyrics_string: self.lyrics_string.clone(),
            music_string: self.music_string.clone(),
            unknown_author: self.unknown_author.clone(),
            links_header: self.links_header.clone(),
            section_title: self.section_title.clone(),
            songs_index_title: self.alphabetical_index_title.clone(),
            authors_index_title: self.authors_index_title.clone(),
        }
    }
}

fn single_char(key: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::Settings(format!(
            "{key} must be exactly one character, got '{value}'"
        ))),
    }
}

/// Formatting inputs passed explicitly to every rendering call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Title placed in every page head.
    pub book_title: String,
    pub stylesheet_href: String,
    pub encoding: String,
    /// Separates lyric text from chord groups on one line.
    pub chord_separator: char,
    /// Marks where in the lyric text the next chord applies.
    pub chord_insertion: char,
    pub lyrics_string: String,
    pub music_string: String,
    pub unknown_author: String,
    pub links_header: String,
    pub section_title: String,
    pub songs_index_title: String,
    pub authors_index_title: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Settings::default().render_settings()
    }
}
