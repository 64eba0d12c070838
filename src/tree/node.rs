//! Node types for the songbook tree.

use std::fmt;
use std::str::FromStr;

/// Stable handle to a node in a [`Songbook`](super::Songbook).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The `<songbook>` root element.
    pub const ROOT: NodeId = NodeId(0);
}

/// Which alphabetical index an index node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Songs,
    Authors,
}

impl IndexKind {
    /// Fixed output file name.
    pub fn file_name(self) -> &'static str {
        match self {
            IndexKind::Songs => "idx_songs.xhtml",
            IndexKind::Authors => "idx_authors.xhtml",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IndexKind::Songs => "songs",
            IndexKind::Authors => "authors",
        }
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "songs" | "alphabetical" => Ok(IndexKind::Songs),
            "authors" => Ok(IndexKind::Authors),
            other => Err(format!("unknown index type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Verse,
    Chorus,
}

impl PartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PartKind::Verse => "verse",
            PartKind::Chorus => "chorus",
        }
    }
}

/// The closed set of element kinds a songbook tree can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The `<songbook>` root.
    Songbook,
    Section,
    Song,
    /// Raw XHTML document included verbatim.
    Html,
    Index(IndexKind),
    /// "See also" reference to another song by title.
    Link,
    /// Verse or chorus holding chord-annotated text.
    Part(PartKind),
}

impl NodeKind {
    /// Element name used in the source XML and in diagnostics.
    pub fn element_name(self) -> &'static str {
        match self {
            NodeKind::Songbook => "songbook",
            NodeKind::Section => "section",
            NodeKind::Song => "song",
            NodeKind::Html => "html",
            NodeKind::Index(_) => "index",
            NodeKind::Link => "link",
            NodeKind::Part(part) => part.as_str(),
        }
    }

    /// Nodes that become an output page of their own.
    pub fn is_page(self) -> bool {
        matches!(
            self,
            NodeKind::Section | NodeKind::Song | NodeKind::Html | NodeKind::Index(_)
        )
    }
}

/// Chord layout for a song or part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChordMode {
    /// Chords stacked above the syllable they apply to.
    #[default]
    Above,
    /// Chords in a column beside each line.
    Beside,
    /// Lyrics only.
    None,
}

impl ChordMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ChordMode::Above => "CHORDS_ABOVE",
            ChordMode::Beside => "CHORDS_BESIDE",
            ChordMode::None => "NO_CHORDS",
        }
    }

    /// Next, less demanding mode to try when this one cannot render.
    pub fn fallback(self) -> Option<ChordMode> {
        match self {
            ChordMode::Above => Some(ChordMode::Beside),
            ChordMode::Beside => Some(ChordMode::None),
            ChordMode::None => None,
        }
    }
}

impl fmt::Display for ChordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChordMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CHORDS_ABOVE" => Ok(ChordMode::Above),
            "CHORDS_BESIDE" => Ok(ChordMode::Beside),
            "NO_CHORDS" => Ok(ChordMode::None),
            _ => Err(format!(
                "unknown chord mode '{}' (expected CHORDS_ABOVE, CHORDS_BESIDE or NO_CHORDS)",
                s.trim()
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    /// Injected as a default rather than written by the author.
    pub defaulted: bool,
}

/// Ordered attribute list of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Value only if written explicitly.
    pub fn get_explicit(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.name == name && !a.defaulted)
            .map(|a| a.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|a| a.name == name)
    }

    pub fn is_defaulted(&self, name: &str) -> bool {
        self.0.iter().any(|a| a.name == name && a.defaulted)
    }

    /// Set an explicit value, replacing any existing one in place.
    pub fn set(&mut self, name: &str, value: &str) {
        self.insert(name, value, false);
    }

    /// Add a default value unless the attribute already exists.
    pub fn set_default(&mut self, name: &str, value: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.insert(name, value, true);
        true
    }

    fn insert(&mut self, name: &str, value: &str, defaulted: bool) {
        match self.0.iter_mut().find(|a| a.name == name) {
            Some(existing) => {
                existing.value = value.to_string();
                existing.defaulted = defaulted;
            }
            None => self.0.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
                defaulted,
            }),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|a| a.name == name)?;
        Some(self.0.remove(pos).value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attribute> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A node in the songbook arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub attrs: Attributes,
    /// Raw body text of verse/chorus parts.
    pub text: String,
    /// Unknown element children were dropped while loading.
    pub had_unknown_children: bool,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Attributes::new(),
            text: String::new(),
            had_unknown_children: false,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}
