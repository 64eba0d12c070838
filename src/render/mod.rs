//! XHTML output for songs, sections and indexes.

pub mod chords;
pub mod index;
pub mod page;
pub mod section;
pub mod song;

pub use chords::{Line, LineWithChords, identify_lines_with_chords, render_part};
pub use index::{render_authors_index, render_songs_index, standardize_author_name};
pub use page::XhtmlPage;
pub use section::render_section;
pub use song::{authorship_line, render_song, split_authors, write_links_block};
