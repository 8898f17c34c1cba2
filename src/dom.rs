//! Output document: an arena-backed SVG element tree.
//!
//! Nodes are addressed by [`NodeId`], which is the identity the canvas uses for
//! its current insertion root, the definitions container and link wrappers.
//! Detached nodes stay in the arena; they are simply unreachable from the root
//! and invisible to id lookups and serialization.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::defaults::{NS_SVG, NS_XLINK};
use crate::errors::CanvasError;

/// Identity of a node inside a [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether the document is attached to a live, queryable host or is being
/// built for export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DocumentMode {
    /// Ids are checked for collisions, bounding boxes can be queried and
    /// references may use an absolute base URL.
    Live,
    /// Offline output: cheap counter ids, offscreen measurement and fallback
    /// text for foreign content.
    #[default]
    Export,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    /// Already well-formed markup, written verbatim.
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// SVG output tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    offscreen: NodeId,
    mode: DocumentMode,
}

impl Document {
    /// Create a document with an `<svg>` root element.
    pub fn new(mode: DocumentMode) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            offscreen: NodeId(0),
            mode,
        };
        let root = doc.create_element("svg");
        doc.set_attr(root, "xmlns", NS_SVG);
        doc.set_attr(root, "xmlns:xlink", NS_XLINK);
        doc.set_attr(root, "version", "1.1");
        doc.root = root;
        // Host for measurement probes; never reachable from the root
        let offscreen = doc.create_element("div");
        doc.set_attr(offscreen, "style", "position:absolute;visibility:hidden;");
        doc.offscreen = offscreen;
        doc
    }

    /// Shorthand for a live document.
    pub fn live() -> Self {
        Self::new(DocumentMode::Live)
    }

    /// Shorthand for an export document.
    pub fn export() -> Self {
        Self::new(DocumentMode::Export)
    }

    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == DocumentMode::Live
    }

    /// The `<svg>` element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Detached container that measurement probes are attached to.
    pub fn offscreen_host(&self) -> NodeId {
        self.offscreen
    }

    /// Whether `id` was allocated by this document.
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    /// Create a node holding well-formed markup that is serialized unescaped.
    pub fn create_raw(&mut self, markup: impl Into<String>) -> NodeId {
        self.push(NodeData::Raw(markup.into()))
    }

    /// Tag name of an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    /// All attributes of an element in insertion order.
    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match self.nodes.get(id.0).map(|node| &node.data) {
            Some(NodeData::Element { attrs, .. }) => attrs,
            _ => &[],
        }
    }

    /// Set an attribute, keeping its original position when it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(NodeData::Element { attrs, .. }) = self.nodes.get_mut(id.0).map(|n| &mut n.data)
        {
            let value = value.into();
            match attrs.iter_mut().find(|(key, _)| key == name) {
                Some(slot) => slot.1 = value,
                None => attrs.push((name.to_string(), value)),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.nodes.get_mut(id.0).map(|n| &mut n.data)
        {
            attrs.retain(|(key, _)| key != name);
        }
    }

    /// Markup held by a raw node.
    pub fn raw_markup(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Raw(markup) => Some(markup),
            _ => None,
        }
    }

    /// Concatenated text of a node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) | NodeData::Raw(text) => out.push_str(text),
            NodeData::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` before `reference` (or at the end when `reference` is
    /// `None` or not a child of `parent`).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        self.detach(child);
        let siblings = &mut self.nodes[parent.0].children;
        let position = reference
            .and_then(|r| siblings.iter().position(|&c| c == r))
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove `id` from its parent. The node and its subtree stay allocated.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
        self.nodes[id.0].parent = None;
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// First attached element carrying `id="<value>"`, in document order.
    pub fn get_element_by_id(&self, value: &str) -> Option<NodeId> {
        self.find_first(self.root, &|doc, node| doc.attr(node, "id") == Some(value))
    }

    /// First descendant of `from` (including itself) with the given tag.
    pub fn find_descendant(&self, from: NodeId, tag: &str) -> Option<NodeId> {
        self.find_first(from, &|doc, node| doc.tag(node) == Some(tag))
    }

    fn find_first(&self, from: NodeId, pred: &dyn Fn(&Document, NodeId) -> bool) -> Option<NodeId> {
        if pred(self, from) {
            return Some(from);
        }
        self.children(from)
            .iter()
            .find_map(|&child| self.find_first(child, pred))
    }

    /// Serialize the whole document.
    pub fn to_svg_string(&self) -> Result<String, CanvasError> {
        self.serialize_node(self.root)
    }

    /// Serialize one subtree.
    pub fn serialize_node(&self, id: NodeId) -> Result<String, CanvasError> {
        if !self.contains(id) {
            return Err(CanvasError::UnknownNode { node: id });
        }
        let mut writer = Writer::new(Vec::new());
        self.write_node(&mut writer, id)?;
        String::from_utf8(writer.into_inner()).map_err(|e| CanvasError::Serialize {
            message: e.to_string(),
        })
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), CanvasError> {
        let node = &self.nodes[id.0];
        let event = match &node.data {
            NodeData::Text(text) => Event::Text(BytesText::new(text)),
            NodeData::Raw(markup) => Event::Text(BytesText::from_escaped(markup.as_str())),
            NodeData::Element { tag, attrs } => {
                let mut start = BytesStart::new(tag.as_str());
                for (key, value) in attrs {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                if node.children.is_empty() {
                    return write_event(writer, Event::Empty(start));
                }
                write_event(writer, Event::Start(start))?;
                for &child in &node.children {
                    self.write_node(writer, child)?;
                }
                Event::End(BytesEnd::new(tag.as_str()))
            }
        };
        write_event(writer, event)
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), CanvasError> {
    writer.write_event(event).map_err(|e| CanvasError::Serialize {
        message: e.to_string(),
    })
}
