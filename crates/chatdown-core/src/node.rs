//! CDP-style DOM Node structure for HTML to Markdown conversion.
//!
//! The layout matches the Chrome DevTools Protocol `DOM.Node` object, so a
//! `DOM.getDocument` dump can be deserialized directly. Any other parser
//! (html5ever, a browser content script) can build the same structure.
//!
//! Trees are owned values: cloning a node is a deep copy, which is how the
//! conversion pipeline gets a disposable tree to edit while the caller's tree
//! stays untouched.

use serde::Deserialize;

/// Node types matching DOM nodeType values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u32")]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Comment node (nodeType = 8)
    Comment = 8,
    /// Document node (nodeType = 9)
    Document = 9,
    /// Document fragment node (nodeType = 11)
    DocumentFragment = 11,
}

impl From<u32> for NodeType {
    fn from(value: u32) -> Self {
        match value {
            1 => NodeType::Element,
            3 => NodeType::Text,
            8 => NodeType::Comment,
            9 => NodeType::Document,
            11 => NodeType::DocumentFragment,
            // Doctype, CDATA, processing instructions: nothing to render
            _ => NodeType::Comment,
        }
    }
}

/// Child-index path from a root node to one of its descendants.
pub type NodePath = Vec<usize>;

/// A DOM node following the CDP DOM.Node structure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Node type (1 = Element, 3 = Text, etc.)
    pub node_type: NodeType,

    /// Node name (uppercase for elements, e.g., "DIV", "#text" for text nodes)
    pub node_name: String,

    /// Text content for text nodes
    #[serde(default)]
    pub node_value: Option<String>,

    /// Attributes as flat array [name, value, name, value, ...] (CDP style)
    #[serde(default)]
    pub attributes: Option<Vec<String>>,

    /// Child nodes
    #[serde(default)]
    pub children: Option<Vec<Node>>,
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Self {
            node_type: NodeType::Element,
            node_name: tag_name.to_uppercase(),
            node_value: None,
            attributes: Some(Vec::new()),
            children: Some(Vec::new()),
        }
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        let mut node = Self::element(tag_name);
        for (name, value) in attrs {
            node.set_attr(name, value);
        }
        node
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self {
            node_type: NodeType::Text,
            node_name: "#text".to_string(),
            node_value: Some(content.to_string()),
            attributes: None,
            children: None,
        }
    }

    /// Create a document fragment node
    pub fn document_fragment() -> Self {
        Self {
            node_type: NodeType::DocumentFragment,
            node_name: "#document-fragment".to_string(),
            node_value: None,
            attributes: None,
            children: Some(Vec::new()),
        }
    }

    /// Builder-style variant of [`Node::add_child`].
    pub fn with_child(mut self, child: Node) -> Self {
        self.add_child(child);
        self
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get the tag name (lowercase)
    pub fn tag_name(&self) -> String {
        self.node_name.to_lowercase()
    }

    /// Case-insensitive tag comparison that does not allocate.
    pub fn is_tag(&self, name: &str) -> bool {
        self.is_element() && self.node_name.eq_ignore_ascii_case(name)
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        let attrs = self.attributes.as_ref()?;

        // CDP stores attributes as flat array: [name, value, name, value, ...]
        attrs
            .chunks_exact(2)
            .find(|pair| pair[0].eq_ignore_ascii_case(name))
            .map(|pair| pair[1].as_str())
    }

    /// Check if an attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Iterate over the whitespace-separated entries of the `class` attribute
    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().any(|c| c == class)
    }

    /// Get all child nodes
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().flat_map(|c| c.iter())
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children().filter(|n| n.is_element())
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// Set an attribute, replacing an existing value of the same name
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let attrs = self.attributes.get_or_insert_with(Vec::new);

        if let Some(pair) = attrs
            .chunks_exact_mut(2)
            .find(|pair| pair[0].eq_ignore_ascii_case(name))
        {
            pair[1] = value.to_string();
            return;
        }

        attrs.push(name.to_string());
        attrs.push(value.to_string());
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self.node_type {
            NodeType::Text => out.push_str(self.node_value.as_deref().unwrap_or("")),
            NodeType::Comment => {}
            _ => {
                for child in self.children() {
                    child.push_text(out);
                }
            }
        }
    }

    /// Number of levels below this node: 0 for a leaf, 1 for a node whose
    /// children are all leaves.
    ///
    /// Walks with an explicit stack, so it is safe on trees too deep for
    /// the recursive passes.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Resolve a path relative to this node. The empty path is the node itself.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &i| node.children.as_ref()?.get(i))
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &i| node.children.as_mut()?.get_mut(i))
    }

    /// Detach the node at `path` and return it. The root itself cannot be removed.
    pub fn remove_at(&mut self, path: &[usize]) -> Option<Node> {
        let (&index, parent_path) = path.split_last()?;
        let siblings = self.node_at_mut(parent_path)?.children.as_mut()?;
        (index < siblings.len()).then(|| siblings.remove(index))
    }

    /// Replace the node at `path`, returning the node that was there.
    pub fn replace_at(&mut self, path: &[usize], replacement: Node) -> Option<Node> {
        let target = self.node_at_mut(path)?;
        Some(std::mem::replace(target, replacement))
    }

    /// Splice the children of the node at `path` into its parent at the
    /// node's position and drop the node itself.
    ///
    /// Returns false if `path` does not resolve or points at the root.
    pub fn unwrap_at(&mut self, path: &[usize]) -> bool {
        let Some((&index, parent_path)) = path.split_last() else {
            return false;
        };
        let Some(siblings) = self
            .node_at_mut(parent_path)
            .and_then(|parent| parent.children.as_mut())
        else {
            return false;
        };
        if index >= siblings.len() {
            return false;
        }

        let mut wrapper = siblings.remove(index);
        let grandchildren = wrapper.children.take().unwrap_or_default();
        siblings.splice(index..index, grandchildren);
        true
    }
}

// Dropping detaches descendants onto a heap stack first; the derived drop
// recurses once per level.
impl Drop for Node {
    fn drop(&mut self) {
        let Some(mut pending) = self.children.take() else {
            return;
        };
        while let Some(mut node) = pending.pop() {
            if let Some(children) = node.children.take() {
                pending.extend(children);
            }
        }
    }
}

/// A borrowed node together with its chain of ancestors.
///
/// Parents are linked through references to the caller's stack frames, so
/// building a `NodeRef` for every visited node costs nothing on the heap.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    /// The node itself
    pub node: &'a Node,
    parent: Option<&'a NodeRef<'a>>,
    index: usize,
}

impl<'a> NodeRef<'a> {
    /// Create a new NodeRef without parent context
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            index: 0,
        }
    }

    /// Reference to the `index`-th child of this node, linked back to `self`.
    pub fn child(&'a self, node: &'a Node, index: usize) -> NodeRef<'a> {
        NodeRef {
            node,
            parent: Some(self),
            index,
        }
    }

    pub fn parent(&self) -> Option<&'a NodeRef<'a>> {
        self.parent
    }

    /// Get the parent tag name if known
    pub fn parent_tag(&self) -> Option<String> {
        self.parent.map(|p| p.node.tag_name())
    }

    /// Ancestors from the nearest outward.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a Node> + 'a {
        std::iter::successors(self.parent, |p| p.parent).map(|p| p.node)
    }

    /// Position of this node among all of its parent's children.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Position of this node among its parent's element children.
    pub fn element_index(&self) -> usize {
        match self.parent {
            Some(parent) => parent
                .node
                .children()
                .take(self.index)
                .filter(|n| n.is_element())
                .count(),
            None => 0,
        }
    }

    pub fn next_sibling(&self) -> Option<&'a Node> {
        self.parent?.node.children().nth(self.index + 1)
    }

    pub fn next_element_sibling(&self) -> Option<&'a Node> {
        self.parent?
            .node
            .children()
            .skip(self.index + 1)
            .find(|n| n.is_element())
    }

    /// True if no element follows this node under the same parent.
    pub fn is_last_element(&self) -> bool {
        self.next_element_sibling().is_none()
    }

    /// Delegate to Node methods
    pub fn is_element(&self) -> bool {
        self.node.is_element()
    }

    pub fn is_text(&self) -> bool {
        self.node.is_text()
    }

    pub fn tag_name(&self) -> String {
        self.node.tag_name()
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.node.is_tag(name)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node.has_attr(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.node.has_class(class)
    }

    pub fn children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.children()
    }

    pub fn element_children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.element_children()
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }
}
