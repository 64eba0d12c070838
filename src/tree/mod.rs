//! Typed songbook tree.
//!
//! The source XML is lifted into an arena of [`Node`]s whose kind is a closed
//! [`NodeKind`] variant. Structural edits (pruning, link creation, merging
//! external song bodies) only relink nodes, so a [`NodeId`] obtained before an
//! edit keeps pointing at the same node afterwards.

mod node;

pub use node::{Attribute, Attributes, ChordMode, IndexKind, Node, NodeId, NodeKind, PartKind};

use log::warn;

use crate::error::{Error, Result};
use crate::xml::{XmlDocument, XmlNodeId};

/// The whole songbook held as an arena tree.
#[derive(Debug, Clone)]
pub struct Songbook {
    nodes: Vec<Node>,
}

impl Songbook {
    /// Create an empty tree holding only the `<songbook>` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Songbook)],
        }
    }

    /// Lift a parsed `<songbook>` document into a typed tree.
    ///
    /// `<settings>` is skipped here; unknown elements are dropped with a
    /// warning. An invalid `chord_mode` value is a parse error.
    pub fn from_xml(doc: &XmlDocument) -> Result<Self> {
        let root = doc
            .root_element()
            .ok_or_else(|| Error::Parse("document has no root element".into()))?;
        if doc.local_name(root) != Some("songbook") {
            return Err(Error::Parse(format!(
                "root element is <{}>, expected <songbook>",
                doc.element_name(root).unwrap_or("?")
            )));
        }

        let mut book = Songbook::new();
        for attr in doc.attrs(root) {
            book.nodes[0].attrs.set(&attr.name, &attr.value);
        }
        book.lift_children(doc, root, NodeId::ROOT)?;
        Ok(book)
    }

    fn lift_children(&mut self, doc: &XmlDocument, from: XmlNodeId, to: NodeId) -> Result<()> {
        for child in doc.child_elements(from) {
            let name = doc.local_name(child).unwrap_or_default();
            let kind = match name {
                "settings" if to == NodeId::ROOT => continue,
                "section" => NodeKind::Section,
                "song" => NodeKind::Song,
                "html" => NodeKind::Html,
                "link" => NodeKind::Link,
                "verse" => NodeKind::Part(PartKind::Verse),
                "chorus" => NodeKind::Part(PartKind::Chorus),
                "index" => {
                    let kind = doc
                        .get_attr(child, "type")
                        .unwrap_or("songs")
                        .parse::<IndexKind>()
                        .map_err(Error::Parse)?;
                    NodeKind::Index(kind)
                }
                other => {
                    warn!("Ignoring unknown element <{other}>");
                    if let Some(parent) = self.node_mut(to) {
                        parent.had_unknown_children = true;
                    }
                    continue;
                }
            };

            let mut node = Node::new(kind);
            for attr in doc.attrs(child) {
                node.attrs.set(&attr.name, &attr.value);
            }
            if let Some(mode) = node.attrs.get("chord_mode") {
                mode.parse::<ChordMode>()
                    .map_err(|e| Error::Parse(format!("<{name}>: {e}")))?;
            }
            if let NodeKind::Part(_) = kind {
                node.text = doc.text_content(child);
            }

            let id = self.add_node(to, node);
            if matches!(kind, NodeKind::Section | NodeKind::Song) {
                self.lift_children(doc, child, id)?;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// Allocate a node without attaching it.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Allocate a node and append it to `parent`.
    pub fn add_node(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.alloc(node);
        self.append(parent, id);
        id
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last = self.node(parent).and_then(|n| n.last_child);

        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
        }
        if let Some(last) = last
            && let Some(node) = self.node_mut(last)
        {
            node.next_sibling = Some(child);
        }
        if let Some(node) = self.node_mut(parent) {
            if node.first_child.is_none() {
                node.first_child = Some(child);
            }
            node.last_child = Some(child);
        }
    }

    /// Insert `new_node` directly after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, new_node: NodeId) {
        let Some((parent, next)) = self.node(sibling).map(|n| (n.parent, n.next_sibling)) else {
            return;
        };

        if let Some(node) = self.node_mut(new_node) {
            node.parent = parent;
            node.prev_sibling = Some(sibling);
            node.next_sibling = next;
        }
        if let Some(node) = self.node_mut(sibling) {
            node.next_sibling = Some(new_node);
        }
        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev_sibling = Some(new_node);
                }
            }
            None => {
                if let Some(parent) = parent
                    && let Some(node) = self.node_mut(parent)
                {
                    node.last_child = Some(new_node);
                }
            }
        }
    }

    /// Unlink a node and its subtree. The id stays valid.
    pub fn detach(&mut self, id: NodeId) {
        let Some((parent, prev, next)) = self
            .node(id)
            .map(|n| (n.parent, n.prev_sibling, n.next_sibling))
        else {
            return;
        };

        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next_sibling = next;
                }
            }
            None => {
                if let Some(parent) = parent
                    && let Some(node) = self.node_mut(parent)
                {
                    node.first_child = next;
                }
            }
        }
        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev_sibling = prev;
                }
            }
            None => {
                if let Some(parent) = parent
                    && let Some(node) = self.node_mut(parent)
                {
                    node.last_child = prev;
                }
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.parent = None;
            node.prev_sibling = None;
            node.next_sibling = None;
        }
    }

    /// True if the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == NodeId::ROOT {
                return true;
            }
            current = self.node(c).and_then(|n| n.parent);
        }
        false
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            book: self,
            current: self.node(id).and_then(|n| n.first_child),
        }
    }

    /// Direct children of one kind.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(id)
            .filter(|&c| self.kind(c) == Some(kind))
            .collect()
    }

    /// All nodes below `start` in document order, `start` excluded.
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(start).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children: Vec<_> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Every attached node matching `pred`, in document order.
    pub fn find_all<F>(&self, pred: F) -> Vec<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        self.descendants(NodeId::ROOT)
            .into_iter()
            .filter(|&id| self.node(id).is_some_and(&pred))
            .collect()
    }

    pub fn songs(&self) -> Vec<NodeId> {
        self.find_all(|n| n.kind == NodeKind::Song)
    }

    pub fn sections(&self) -> Vec<NodeId> {
        self.find_all(|n| n.kind == NodeKind::Section)
    }

    /// Nodes that produce an output page, in document order.
    pub fn pages(&self) -> Vec<NodeId> {
        self.find_all(|n| n.kind.is_page())
    }

    /// Songs whose title equals `title`, in document order.
    pub fn songs_titled(&self, title: &str) -> Vec<NodeId> {
        self.find_all(|n| n.kind == NodeKind::Song && n.attrs.get("title") == Some(title))
    }

    pub fn has_descendant_song(&self, id: NodeId) -> bool {
        self.descendants(id)
            .into_iter()
            .any(|d| self.kind(d) == Some(NodeKind::Song))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attrs.get(name))
    }

    pub fn attrs(&self, id: NodeId) -> Option<&Attributes> {
        self.node(id).map(|n| &n.attrs)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.attrs.set(name, value);
        }
    }

    /// The `title` attribute, or an empty string.
    pub fn title(&self, id: NodeId) -> &str {
        self.attr(id, "title").unwrap_or("")
    }

    /// Attribute value from the node itself or its nearest ancestor.
    pub fn inherited_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.node(c)?;
            if let Some(value) = node.attrs.get(name) {
                return Some(value);
            }
            current = node.parent;
        }
        None
    }

    /// Resolved chord mode, if any node on the ancestor chain declares one.
    pub fn chord_mode(&self, id: NodeId) -> Option<ChordMode> {
        self.inherited_attr(id, "chord_mode")
            .and_then(|mode| mode.parse().ok())
    }

    /// Nearest enclosing song of a node (a song is its own).
    pub fn enclosing_song(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.kind(c) == Some(NodeKind::Song) {
                return Some(c);
            }
            current = self.parent(c);
        }
        None
    }

    /// Titles of a song's direct `<link>` children.
    pub fn link_titles(&self, song: NodeId) -> Vec<&str> {
        self.children(song)
            .filter(|&c| self.kind(c) == Some(NodeKind::Link))
            .filter_map(|c| self.attr(c, "title"))
            .collect()
    }

    pub fn has_link_to(&self, song: NodeId, title: &str) -> bool {
        self.link_titles(song).contains(&title)
    }

    /// Positional path such as `/songbook/section[1]/song[2]`.
    ///
    /// Positions count same-named siblings, starting at one. Detached nodes
    /// are reported relative to their detached subtree root.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(node) = self.node(c) else {
                break;
            };
            let name = node.kind.element_name();
            match node.parent {
                Some(parent) => {
                    let position = self
                        .children(parent)
                        .take_while(|&s| s != c)
                        .filter(|&s| self.kind(s).map(|k| k.element_name()) == Some(name))
                        .count()
                        + 1;
                    segments.push(format!("{name}[{position}]"));
                }
                None => segments.push(name.to_string()),
            }
            current = node.parent;
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Number of arena slots, detached nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }
}

impl Default for Songbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    book: &'a Songbook,
    current: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.book.node(id).and_then(|n| n.next_sibling);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    fn sample() -> Songbook {
        let doc = parse_str(
            r#"<songbook>
  <settings><title>Ignored here</title></settings>
  <section title="Section 1" chord_mode="CHORDS_BESIDE">
    <song title="Song A"><verse>a>C</verse><link title="Song B"/></song>
    <section title="Section 1.1">
      <song title="Song B"><chorus chord_mode="NO_CHORDS">b</chorus></song>
    </section>
  </section>
  <song title="Song C"/>
  <index type="authors"/>
  <mystery/>
</songbook>"#,
        )
        .unwrap();
        Songbook::from_xml(&doc).unwrap()
    }

    #[test]
    fn test_lift_kinds_in_document_order() {
        let book = sample();
        let kinds: Vec<_> = book
            .descendants(book.root())
            .into_iter()
            .filter_map(|id| book.kind(id))
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Section,
                NodeKind::Song,
                NodeKind::Part(PartKind::Verse),
                NodeKind::Link,
                NodeKind::Section,
                NodeKind::Song,
                NodeKind::Part(PartKind::Chorus),
                NodeKind::Song,
                NodeKind::Index(IndexKind::Authors),
            ]
        );
    }

    #[test]
    fn test_rejects_foreign_root() {
        let doc = parse_str("<html/>").unwrap();
        assert!(Songbook::from_xml(&doc).is_err());
    }

    #[test]
    fn test_paths_are_positional() {
        let book = sample();
        let songs = book.songs();
        assert_eq!(book.path(songs[0]), "/songbook/section[1]/song[1]");
        assert_eq!(book.path(songs[1]), "/songbook/section[1]/section[1]/song[1]");
        assert_eq!(book.path(songs[2]), "/songbook/song[1]");
    }

    #[test]
    fn test_chord_mode_inheritance() {
        let book = sample();
        let songs = book.songs();
        assert_eq!(book.chord_mode(songs[0]), Some(ChordMode::Beside));
        let chorus = book.children(songs[1]).next().unwrap();
        assert_eq!(book.chord_mode(chorus), Some(ChordMode::None));
        assert_eq!(book.chord_mode(songs[2]), None);
    }

    #[test]
    fn test_invalid_chord_mode_is_rejected() {
        let doc = parse_str(
            r#"<songbook><section title="S" chord_mode="CHORDS_BESIDE"><song title="A" chord_mode="SIDEWAYS"/></section></songbook>"#,
        )
        .unwrap();
        match Songbook::from_xml(&doc) {
            Err(Error::Parse(msg)) => {
                assert!(msg.contains("<song>"), "{msg}");
                assert!(msg.contains("SIDEWAYS"), "{msg}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        let doc = parse_str(r#"<songbook><song title="A"><verse chord_mode="ABOVE">x</verse></song></songbook>"#)
            .unwrap();
        assert!(Songbook::from_xml(&doc).is_err());
    }

    #[test]
    fn test_unknown_song_children_are_remembered() {
        let doc = parse_str(r#"<songbook><song title="A"><comment/><link title="B"/></song><song title="B"/></songbook>"#)
            .unwrap();
        let book = Songbook::from_xml(&doc).unwrap();
        let songs = book.songs();
        assert!(book.node(songs[0]).unwrap().had_unknown_children);
        assert!(!book.node(songs[1]).unwrap().had_unknown_children);
        assert_eq!(book.children(songs[0]).count(), 1);
    }

    #[test]
    fn test_detach_keeps_handles_valid() {
        let mut book = sample();
        let songs = book.songs();
        let section = book.sections()[0];

        book.detach(section);
        assert!(!book.is_attached(songs[0]));
        assert!(book.is_attached(songs[2]));
        assert_eq!(book.songs(), vec![songs[2]]);
        assert_eq!(book.title(songs[1]), "Song B");
    }

    #[test]
    fn test_links_and_enclosing_song() {
        let book = sample();
        let song_a = book.songs()[0];
        assert_eq!(book.link_titles(song_a), vec!["Song B"]);
        assert!(book.has_link_to(song_a, "Song B"));
        let link = book.children_of_kind(song_a, NodeKind::Link)[0];
        assert_eq!(book.enclosing_song(link), Some(song_a));
        assert_eq!(book.songs_titled("Song B").len(), 1);
    }
}
