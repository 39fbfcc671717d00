//! Document tree for the Kestrel document pipeline.
//!
//! The HTML parser produces a [`DomTree`]; the box builder and the
//! stylesheet collector walk it. Nodes are stored in one vector, addressed
//! by [`NodeId`], and linked to their parent and siblings the way the
//! [DOM Living Standard](https://dom.spec.whatwg.org/) describes a tree:
//! a node knows its first and last child and its previous and next sibling.

/// Index of a node in its [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The document node.
    pub const ROOT: Self = Self(0);
}

/// The kinds of node the pipeline keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// The document node at [`NodeId::ROOT`].
    Document,
    /// An element.
    Element(ElementData),
    /// Character data.
    Text(String),
    /// A comment.
    Comment(String),
}

/// [§ 4.9.2 Interface Attr](https://dom.spec.whatwg.org/#interface-attr)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lower-case local name.
    pub name: String,
    /// Value, entity references already decoded.
    pub value: String,
}

/// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
///
/// "Elements have an associated namespace, namespace prefix, local name,
/// custom element state, custom element definition, is value."
///
/// Only the local name and the attribute list are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementData {
    /// Lower-case local name.
    pub name: String,
    /// "Elements also have an attribute list", in source order.
    pub attributes: Vec<Attribute>,
}

impl ElementData {
    /// An element called `name` with no attributes.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// The value of attribute `name`.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Add attribute `name` unless the element already has one.
    ///
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    ///
    /// "if there is already an attribute on the token with the exact same
    /// name, then this is a duplicate-attribute parse error and the new
    /// attribute must be removed from the token."
    ///
    /// Returns `false` if the attribute was already present.
    pub fn add_attr(&mut self, name: &str, value: &str) -> bool {
        let name = name.to_ascii_lowercase();
        if self.attr(&name).is_some() {
            return false;
        }
        self.attributes.push(Attribute {
            name,
            value: value.to_string(),
        });
        true
    }

    /// The `id` attribute, if non-empty.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    /// The whole `class` attribute, if it names any class.
    #[must_use]
    pub fn class_attr(&self) -> Option<&str> {
        self.attr("class").filter(|c| !c.trim().is_empty())
    }

    /// [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#classes)
    ///
    /// "The attribute, if specified, must have a value that is a set of
    /// space-separated tokens representing the various classes that the
    /// element belongs to."
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_ascii_whitespace()
    }

    /// Whether `class` is one of the element's classes.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// [§ 4.2.1 Trees](https://dom.spec.whatwg.org/#trees)
///
/// A node and its links to the rest of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// What the node is.
    pub data: NodeType,
    /// "An object that participates in a tree has a parent"
    pub parent: Option<NodeId>,
    /// "The first child of an object is its first child or null if it has
    /// no children."
    pub first_child: Option<NodeId>,
    /// "The last child of an object is its last child or null if it has no
    /// children."
    pub last_child: Option<NodeId>,
    /// "The previous sibling of an object is its first preceding sibling or
    /// null if it has no preceding sibling."
    pub previous_sibling: Option<NodeId>,
    /// "The next sibling of an object is its first following sibling or
    /// null if it has no following sibling."
    pub next_sibling: Option<NodeId>,
}

impl Node {
    const fn detached(data: NodeType) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            previous_sibling: None,
            next_sibling: None,
        }
    }
}

/// A document: the document node at [`NodeId::ROOT`] and everything
/// appended below it.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// A tree holding only the document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::detached(NodeType::Document)],
        }
    }

    /// Number of nodes, the document node included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: the document node always exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// [§ 4.2.3 Mutation algorithms](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// Create a node holding `data` and make it the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, data: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = Node::detached(data);
        node.parent = Some(parent);
        node.previous_sibling = self.nodes[parent.0].last_child;
        self.nodes.push(node);

        match self.nodes[parent.0].last_child {
            Some(last) => self.nodes[last.0].next_sibling = Some(id),
            None => self.nodes[parent.0].first_child = Some(id),
        }
        self.nodes[parent.0].last_child = Some(id);
        id
    }

    /// The parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// The children of `id`, first to last.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        std::iter::successors(self.node(id).and_then(|n| n.first_child), |&c| {
            self.nodes[c.0].next_sibling
        })
    }

    /// The ancestors of `id`, nearest first, ending at the document.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        std::iter::successors(self.parent(id), |&p| self.parent(p))
    }

    /// [§ 4.2.1](https://dom.spec.whatwg.org/#concept-tree-order)
    ///
    /// "An object A is preceding an object B if A and B are in the same
    /// tree and A comes before B in tree order."
    ///
    /// Yields `id` and its descendants in tree order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: self.node(id).map(|_| id),
        }
    }

    /// The element data of `id`, if it is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.data {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable element data of `id`, if it is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The character data of `id`, if it is a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeType::Text(text) => Some(text),
            _ => None,
        }
    }

    /// [§ 4.4 `textContent`](https://dom.spec.whatwg.org/#dom-node-textcontent)
    ///
    /// "The descendant text content of a node node is the concatenation of
    /// the data of all the Text node descendants of node, in tree order."
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id).filter_map(|n| self.text(n)).collect()
    }

    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#document-element)
    ///
    /// "The document element of a document is the element whose parent is
    /// that document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT).find(|&c| self.element(c).is_some())
    }

    /// The first `name` element in tree order.
    #[must_use]
    pub fn find_element(&self, name: &str) -> Option<NodeId> {
        self.descendants(NodeId::ROOT)
            .find(|&id| self.element(id).is_some_and(|e| e.name == name))
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-order walk of a subtree following sibling links.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        let node = &self.tree.nodes[current.0];

        // Down to the first child, else across to the next sibling of the
        // nearest node in the subtree that has one.
        self.next = node.first_child.or_else(|| {
            let mut at = current;
            loop {
                if at == self.root {
                    return None;
                }
                let n = &self.tree.nodes[at.0];
                if let Some(sibling) = n.next_sibling {
                    return Some(sibling);
                }
                at = n.parent?;
            }
        });
        Some(current)
    }
}
