//! Arena-based XML tree.
//!
//! Every node lives in one contiguous vector and is addressed by an
//! [`XmlNodeId`]. Detaching a node only unlinks it, so ids held elsewhere stay
//! valid across arbitrary insertions and removals.

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XmlNodeId(pub u32);

impl XmlNodeId {
    /// Sentinel value for no node.
    pub const NONE: XmlNodeId = XmlNodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNodeData {
    /// Document root, parent of the root element.
    Document,
    /// Element with its qualified name and attributes in source order.
    Element {
        name: String,
        attrs: Vec<XmlAttribute>,
    },
    /// Character data, entities already resolved.
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct XmlNode {
    pub data: XmlNodeData,
    pub parent: XmlNodeId,
    pub first_child: XmlNodeId,
    pub last_child: XmlNodeId,
    pub prev_sibling: XmlNodeId,
    pub next_sibling: XmlNodeId,
}

impl XmlNode {
    fn new(data: XmlNodeData) -> Self {
        Self {
            data,
            parent: XmlNodeId::NONE,
            first_child: XmlNodeId::NONE,
            last_child: XmlNodeId::NONE,
            prev_sibling: XmlNodeId::NONE,
            next_sibling: XmlNodeId::NONE,
        }
    }
}

/// Strip a namespace prefix from a qualified name.
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// An XML document held in an arena.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
    document: XmlNodeId,
}

impl XmlDocument {
    /// Create a new empty document with only the document node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            document: XmlNodeId::NONE,
        };
        doc.document = doc.alloc(XmlNode::new(XmlNodeData::Document));
        doc
    }

    fn alloc(&mut self, node: XmlNode) -> XmlNodeId {
        let id = XmlNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn document(&self) -> XmlNodeId {
        self.document
    }

    /// The single top-level element, if one has been attached.
    pub fn root_element(&self) -> Option<XmlNodeId> {
        self.children(self.document).find(|&id| self.is_element(id))
    }

    pub fn get(&self, id: XmlNodeId) -> Option<&XmlNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: XmlNodeId) -> Option<&mut XmlNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn create_element(&mut self, name: &str) -> XmlNodeId {
        self.alloc(XmlNode::new(XmlNodeData::Element {
            name: name.to_string(),
            attrs: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> XmlNodeId {
        self.alloc(XmlNode::new(XmlNodeData::Text(text.to_string())))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: XmlNodeId, child: XmlNodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(XmlNodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = XmlNodeId::NONE;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert `new_node` directly after `sibling`.
    pub fn insert_after(&mut self, sibling: XmlNodeId, new_node: XmlNodeId) {
        let (parent, next) = match self.get(sibling) {
            Some(n) => (n.parent, n.next_sibling),
            None => return,
        };

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = sibling;
            new.next_sibling = next;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.next_sibling = new_node;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.last_child = new_node;
        }
    }

    /// Unlink a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: XmlNodeId) {
        let (parent, prev, next) = match self.get(id) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = XmlNodeId::NONE;
            node.prev_sibling = XmlNodeId::NONE;
            node.next_sibling = XmlNodeId::NONE;
        }
    }

    /// Append text to an existing text node, or create new if last child isn't text.
    pub fn append_text(&mut self, parent: XmlNodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(XmlNodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let XmlNodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text);
        self.append(parent, text_node);
    }

    /// Create an element and append it to `parent`.
    pub fn add_element(&mut self, parent: XmlNodeId, name: &str) -> XmlNodeId {
        let id = self.create_element(name);
        self.append(parent, id);
        id
    }

    /// Create an element holding `text` and append it to `parent`.
    ///
    /// Empty text produces an empty element.
    pub fn add_text_element(&mut self, parent: XmlNodeId, name: &str, text: &str) -> XmlNodeId {
        let id = self.add_element(parent, name);
        if !text.is_empty() {
            self.append_text(id, text);
        }
        id
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: XmlNodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(XmlNodeId::NONE);
        ChildrenIter {
            doc: self,
            current: first,
        }
    }

    /// Child elements only.
    pub fn child_elements(&self, parent: XmlNodeId) -> impl Iterator<Item = XmlNodeId> + '_ {
        self.children(parent).filter(|&id| self.is_element(id))
    }

    /// First child element with the given local name.
    pub fn child_by_name(&self, parent: XmlNodeId, name: &str) -> Option<XmlNodeId> {
        self.child_elements(parent)
            .find(|&id| self.local_name(id) == Some(name))
    }

    /// All nodes below `start` in document order, `start` excluded.
    pub fn descendants(&self, start: XmlNodeId) -> Vec<XmlNodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<XmlNodeId> = self.children(start).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children: Vec<_> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Descendant elements with the given local name, in document order.
    pub fn find_all(&self, start: XmlNodeId, name: &str) -> Vec<XmlNodeId> {
        self.descendants(start)
            .into_iter()
            .filter(|&id| self.local_name(id) == Some(name))
            .collect()
    }

    /// Follow a chain of child element local names from `start`.
    pub fn select(&self, start: XmlNodeId, path: &[&str]) -> Option<XmlNodeId> {
        path.iter()
            .try_fold(start, |current, name| self.child_by_name(current, name))
    }

    pub fn is_element(&self, id: XmlNodeId) -> bool {
        matches!(
            self.get(id).map(|n| &n.data),
            Some(XmlNodeData::Element { .. })
        )
    }

    /// Qualified element name.
    pub fn element_name(&self, id: XmlNodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            XmlNodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Element name without namespace prefix.
    pub fn local_name(&self, id: XmlNodeId) -> Option<&str> {
        self.element_name(id).map(local_name)
    }

    pub fn attrs(&self, id: XmlNodeId) -> &[XmlAttribute] {
        match self.get(id).map(|n| &n.data) {
            Some(XmlNodeData::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    /// Get an attribute value by exact or local name.
    pub fn get_attr(&self, id: XmlNodeId, attr_name: &str) -> Option<&str> {
        let attrs = self.attrs(id);
        attrs
            .iter()
            .find(|a| a.name == attr_name)
            .or_else(|| attrs.iter().find(|a| local_name(&a.name) == attr_name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, id: XmlNodeId, attr_name: &str, value: &str) {
        if let Some(node) = self.get_mut(id)
            && let XmlNodeData::Element { attrs, .. } = &mut node.data
        {
            match attrs.iter_mut().find(|a| a.name == attr_name) {
                Some(existing) => existing.value = value.to_string(),
                None => attrs.push(XmlAttribute {
                    name: attr_name.to_string(),
                    value: value.to_string(),
                }),
            }
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: XmlNodeId) -> String {
        let mut out = String::new();
        if let Some(XmlNodeData::Text(text)) = self.get(id).map(|n| &n.data) {
            out.push_str(text);
        }
        for desc in self.descendants(id) {
            if let Some(XmlNodeData::Text(text)) = self.get(desc).map(|n| &n.data) {
                out.push_str(text);
            }
        }
        out
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    doc: &'a XmlDocument,
    current: XmlNodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = XmlNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(XmlNodeId::NONE);
        Some(id)
    }
}
