//! Title to file-name normalization.
//!
//! Titles are folded to ASCII through a fixed transliteration table and
//! everything outside `[A-Za-z0-9 .]` is dropped. The mapping is table
//! driven so it does not depend on the host locale.

use std::collections::HashSet;

/// Polish and German letters with their ASCII replacements.
const TRANSLITERATIONS: &[(char, &str)] = &[
    ('Ą', "A"),
    ('ą', "a"),
    ('Ć', "C"),
    ('ć', "c"),
    ('Ę', "E"),
    ('ę', "e"),
    ('Ł', "L"),
    ('ł', "l"),
    ('Ń', "N"),
    ('ń', "n"),
    ('Ó', "O"),
    ('ó', "o"),
    ('Ś', "S"),
    ('ś', "s"),
    ('Ź', "Z"),
    ('ź', "z"),
    ('Ż', "Z"),
    ('ż', "z"),
    ('Ä', "AE"),
    ('ä', "ae"),
    ('Ö', "OE"),
    ('ö', "oe"),
    ('Ü', "UE"),
    ('ü', "ue"),
    ('ß', "ss"),
];

fn is_stem_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || c == '.'
}

/// Fold a title to the characters allowed in a file-name stem.
pub fn to_filename_stem(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if let Some((_, replacement)) = TRANSLITERATIONS.iter().find(|(from, _)| *from == c) {
            out.push_str(replacement);
        } else if is_stem_char(c) {
            out.push(c);
        }
    }
    out
}

/// Lowercase, underscore-separated slug for a title.
pub fn slug(title: &str) -> String {
    to_filename_stem(title).replace(' ', "_").to_lowercase()
}

/// Per-build set of output file names already handed out.
#[derive(Debug, Clone, Default)]
pub struct FileNameRegistry {
    used: HashSet<String>,
}

impl FileNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a name chosen elsewhere. Returns false if it was taken.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.used.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Claim `stem.ext`, or the first free `stem_N.ext` for N = 1, 2, ...
    pub fn claim(&mut self, stem: &str, ext: &str) -> String {
        let mut candidate = format!("{stem}{ext}");
        let mut n = 0usize;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{stem}_{n}{ext}");
        }
        self.used.insert(candidate.clone());
        candidate
    }

    /// Claim a file name of the form `prefix + slug(title) + ext`.
    pub fn claim_for_title(&mut self, prefix: &str, title: &str, ext: &str) -> String {
        self.claim(&format!("{prefix}{}", slug(title)), ext)
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_polish_letters() {
        assert_eq!(to_filename_stem("Zażółć gęślą jaźń"), "Zazolc gesla jazn");
        assert_eq!(to_filename_stem("ŁĄKA"), "LAKA");
    }

    #[test]
    fn test_german_letters() {
        assert_eq!(to_filename_stem("Über den Fluß"), "UEber den Fluss");
        assert_eq!(to_filename_stem("Mädchen"), "Maedchen");
    }

    #[test]
    fn test_punctuation_dropped() {
        assert_eq!(to_filename_stem("You'll never see me!"), "Youll never see me");
        assert_eq!(to_filename_stem("Section 1.1"), "Section 1.1");
        assert_eq!(to_filename_stem("(Rock & Roll)"), "Rock  Roll");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("You'll never see me"), "youll_never_see_me");
        assert_eq!(slug("Section 1.1"), "section_1.1");
        assert_eq!(slug(""), "");
    }

    #[test]
    fn test_collision_suffixes() {
        let mut names = FileNameRegistry::new();
        assert_eq!(names.claim_for_title("sng_", "Song A", ".xhtml"), "sng_song_a.xhtml");
        assert_eq!(names.claim_for_title("sng_", "Song A", ".xhtml"), "sng_song_a_1.xhtml");
        assert_eq!(names.claim_for_title("sng_", "song a", ".xhtml"), "sng_song_a_2.xhtml");
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let mut names = FileNameRegistry::new();
        assert!(names.reserve("sng_song_a.xhtml"));
        assert!(!names.reserve("sng_song_a.xhtml"));
        assert_eq!(names.claim("sng_song_a", ".xhtml"), "sng_song_a_1.xhtml");
    }

    proptest! {
        #[test]
        fn stem_uses_only_allowed_chars(title in "\\PC*") {
            let stem = to_filename_stem(&title);
            prop_assert!(stem.chars().all(is_stem_char));
            prop_assert_eq!(stem, to_filename_stem(&title));
        }

        #[test]
        fn claims_never_repeat(titles in proptest::collection::vec("[a-c ]{0,3}", 1..20)) {
            let mut names = FileNameRegistry::new();
            let mut seen = HashSet::new();
            for title in &titles {
                let name = names.claim_for_title("sng_", title, ".xhtml");
                prop_assert!(seen.insert(name));
            }
        }
    }
}
