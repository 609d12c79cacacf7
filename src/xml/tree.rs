/*!
 * Arena-backed mutable XML tree.
 *
 * Nodes live in a flat arena and are addressed by `NodeId`. Mixed content is
 * modelled the element-tree way: an element's `text` is the character data
 * before its first child, and every child carries a `tail` holding the
 * character data after its end tag. Ids are never reused, so a `NodeId`
 * recorded before a mutation still addresses the same node afterwards.
 */

use std::borrow::Cow;

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::XmlError;

/// Index of a node in the document arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which character-data slot of a node a position refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextSlot {
    /// Text before the element's first child
    Text,
    /// Text following the element's end tag, inside the parent
    Tail,
}

/// A precise place in the tree where character data lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextPosition {
    pub node: NodeId,
    pub slot: TextSlot,
}

impl TextPosition {
    pub fn text(node: NodeId) -> Self {
        Self { node, slot: TextSlot::Text }
    }

    pub fn tail(node: NodeId) -> Self {
        Self { node, slot: TextSlot::Tail }
    }
}

/// An attribute with its unescaped value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Kind-specific node payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        /// Qualified name as written (`w:p`)
        name: String,
        attributes: Vec<Attribute>,
    },
    /// Raw comment content
    Comment(String),
    /// Raw processing instruction content
    ProcessingInstruction(String),
    /// CDATA section content
    CData(String),
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub text: String,
    pub tail: String,
}

/// Markup outside the root element
#[derive(Debug, Clone, PartialEq, Eq)]
enum Misc {
    Whitespace(String),
    DocType(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// Traversal events produced by [`XmlDocument::walk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEvent {
    Enter(NodeId),
    Exit(NodeId),
}

/// A parsed XML part
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
    root: NodeId,
    version: String,
    standalone: Option<String>,
    prolog: Vec<Misc>,
    epilog: Vec<Misc>,
}

fn malformed(reader: &Reader<&[u8]>, message: impl Into<String>) -> XmlError {
    XmlError::Malformed {
        position: reader.buffer_position() as u64,
        message: message.into(),
    }
}

fn utf8(bytes: &[u8]) -> Result<String, XmlError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| XmlError::Encoding(e.to_string()))
}

impl XmlDocument {
    /// Parse a part from raw bytes (UTF-8, optional BOM)
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, XmlError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let source = std::str::from_utf8(bytes).map_err(|e| XmlError::Encoding(e.to_string()))?;
        Self::parse(source)
    }

    /// Parse a part from a string
    pub fn parse(source: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(source);
        reader.trim_text(false);
        reader.check_end_names(true);

        let mut doc = XmlDocument {
            nodes: Vec::new(),
            root: NodeId(0),
            version: "1.0".to_string(),
            standalone: None,
            prolog: Vec::new(),
            epilog: Vec::new(),
        };
        let mut root: Option<NodeId> = None;
        let mut stack: Vec<NodeId> = Vec::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| malformed(&reader, e.to_string()))?;

            match event {
                Event::Decl(decl) => {
                    if let Ok(version) = decl.version() {
                        doc.version = utf8(&version)?;
                    }
                    if let Some(Ok(standalone)) = decl.standalone() {
                        doc.standalone = Some(utf8(&standalone)?);
                    }
                }
                Event::Start(start) => {
                    let id = doc.element_from(&reader, &start)?;
                    doc.attach(&reader, id, &stack, &mut root)?;
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let id = doc.element_from(&reader, &start)?;
                    doc.attach(&reader, id, &stack, &mut root)?;
                }
                Event::End(_) => {
                    if stack.pop().is_none() {
                        return Err(malformed(&reader, "end tag without matching start tag"));
                    }
                }
                Event::Text(text) => {
                    let content = text
                        .unescape()
                        .map_err(|e| malformed(&reader, e.to_string()))?
                        .into_owned();
                    match stack.last() {
                        Some(&parent) => doc.append_character_data(parent, &content),
                        None if content.trim().is_empty() => {
                            doc.misc_list(root.is_some()).push(Misc::Whitespace(content));
                        }
                        None => return Err(malformed(&reader, "text outside the root element")),
                    }
                }
                Event::CData(data) => {
                    let content = utf8(&data.into_inner())?;
                    match stack.last() {
                        Some(&parent) => {
                            let id = doc.push_node(NodeKind::CData(content), Some(parent));
                            doc.nodes[parent.index()].children.push(id);
                        }
                        None => return Err(malformed(&reader, "CDATA outside the root element")),
                    }
                }
                Event::Comment(comment) => {
                    let content = utf8(&comment)?;
                    match stack.last() {
                        Some(&parent) => {
                            let id = doc.push_node(NodeKind::Comment(content), Some(parent));
                            doc.nodes[parent.index()].children.push(id);
                        }
                        None => doc.misc_list(root.is_some()).push(Misc::Comment(content)),
                    }
                }
                Event::PI(pi) => {
                    let content = utf8(&pi)?;
                    match stack.last() {
                        Some(&parent) => {
                            let id = doc.push_node(NodeKind::ProcessingInstruction(content), Some(parent));
                            doc.nodes[parent.index()].children.push(id);
                        }
                        None => doc.misc_list(root.is_some()).push(Misc::ProcessingInstruction(content)),
                    }
                }
                Event::DocType(doctype) => {
                    doc.prolog.push(Misc::DocType(utf8(&doctype)?));
                }
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(malformed(&reader, "unexpected end of document, unclosed element"));
        }
        doc.root = root.ok_or_else(|| malformed(&reader, "document has no root element"))?;
        Ok(doc)
    }

    fn element_from(&mut self, reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<NodeId, XmlError> {
        let name = utf8(start.name().as_ref())?;
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| malformed(reader, e.to_string()))?;
            let value = attribute
                .unescape_value()
                .map_err(|e| malformed(reader, e.to_string()))?
                .into_owned();
            attributes.push(Attribute {
                name: utf8(attribute.key.as_ref())?,
                value,
            });
        }
        Ok(self.push_node(NodeKind::Element { name, attributes }, None))
    }

    fn attach(
        &mut self,
        reader: &Reader<&[u8]>,
        id: NodeId,
        stack: &[NodeId],
        root: &mut Option<NodeId>,
    ) -> Result<(), XmlError> {
        match stack.last() {
            Some(&parent) => {
                self.nodes[id.index()].parent = Some(parent);
                self.nodes[parent.index()].children.push(id);
                Ok(())
            }
            None if root.is_none() => {
                *root = Some(id);
                Ok(())
            }
            None => Err(malformed(reader, "document has more than one root element")),
        }
    }

    fn misc_list(&mut self, after_root: bool) -> &mut Vec<Misc> {
        if after_root { &mut self.epilog } else { &mut self.prolog }
    }

    fn append_character_data(&mut self, parent: NodeId, content: &str) {
        match self.nodes[parent.index()].children.last().copied() {
            Some(last) => self.nodes[last.index()].tail.push_str(content),
            None => self.nodes[parent.index()].text.push_str(content),
        }
    }

    fn push_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(XmlNode {
            kind,
            parent,
            children: Vec::new(),
            text: String::new(),
            tail: String::new(),
        });
        id
    }

    /// The document element
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever allocated
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id.index()]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Element children only
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|&c| self.is_element(c))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.index()].kind, NodeKind::Element { .. })
    }

    /// Qualified name of an element
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.index()].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Name without its prefix
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(|name| split_name(name).1)
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.nodes[id.index()].kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Attribute value by qualified name
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Attribute value by namespace and local name
    pub fn attribute_ns(&self, id: NodeId, namespace: &str, local: &str) -> Option<&str> {
        self.attributes(id).iter().find_map(|a| {
            let (prefix, name) = split_name(&a.name);
            let matches = name == local
                && prefix.is_some_and(|p| self.resolve_prefix(id, Some(p)) == Some(namespace));
            matches.then_some(a.value.as_str())
        })
    }

    /// Set or replace an attribute; returns true when the tree changed
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let NodeKind::Element { attributes, .. } = &mut self.nodes[id.index()].kind else {
            return false;
        };
        match attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) if existing.value == value => false,
            Some(existing) => {
                existing.value = value.to_string();
                true
            }
            None => {
                attributes.push(Attribute {
                    name: name.to_string(),
                    value: value.to_string(),
                });
                true
            }
        }
    }

    /// Character data at a position
    pub fn slot_text(&self, position: TextPosition) -> &str {
        let node = &self.nodes[position.node.index()];
        match position.slot {
            TextSlot::Text => &node.text,
            TextSlot::Tail => &node.tail,
        }
    }

    /// Replace the character data at a position
    pub fn set_slot_text(&mut self, position: TextPosition, value: impl Into<String>) {
        let node = &mut self.nodes[position.node.index()];
        match position.slot {
            TextSlot::Text => node.text = value.into(),
            TextSlot::Tail => node.tail = value.into(),
        }
    }

    /// Namespace URI bound to `prefix` (None = default namespace) in scope at `id`
    pub fn resolve_prefix(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some("http://www.w3.org/XML/1998/namespace");
        }
        let declaration = match prefix {
            Some(p) => Cow::Owned(format!("xmlns:{}", p)),
            None => Cow::Borrowed("xmlns"),
        };
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(uri) = self.attribute(node, &declaration) {
                return Some(uri);
            }
            current = self.parent(node);
        }
        None
    }

    /// Namespace URI of an element
    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        let name = self.name(id)?;
        self.resolve_prefix(id, split_name(name).0)
    }

    /// Whether `id` is the element `{namespace}local`
    pub fn is_named(&self, id: NodeId, namespace: &str, local: &str) -> bool {
        self.local_name(id) == Some(local) && self.namespace(id) == Some(namespace)
    }

    /// Prefix bound to `namespace` in scope at `id` ("" for the default namespace)
    pub fn lookup_prefix(&self, id: NodeId, namespace: &str) -> Option<String> {
        let mut current = Some(id);
        while let Some(node) = current {
            for attribute in self.attributes(node) {
                if attribute.value != namespace {
                    continue;
                }
                if attribute.name == "xmlns" {
                    return Some(String::new());
                }
                if let Some(prefix) = attribute.name.strip_prefix("xmlns:") {
                    return Some(prefix.to_string());
                }
            }
            current = self.parent(node);
        }
        None
    }

    /// Qualified name for `{namespace}local` in scope at `scope`, declaring
    /// `preferred_prefix` on the root element when the namespace is unbound
    pub fn qualify(&mut self, scope: NodeId, namespace: &str, preferred_prefix: &str, local: &str) -> String {
        let prefix = match self.lookup_prefix(scope, namespace) {
            Some(prefix) => prefix,
            None => {
                let root = self.root;
                self.set_attribute(root, &format!("xmlns:{}", preferred_prefix), namespace);
                preferred_prefix.to_string()
            }
        };
        if prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", prefix, local)
        }
    }

    /// First element child named `{namespace}local`
    pub fn find_child(&self, id: NodeId, namespace: &str, local: &str) -> Option<NodeId> {
        self.child_elements(id).find(|&c| self.is_named(c, namespace, local))
    }

    /// Create an element and insert it as child number `index` of `parent`
    pub fn insert_element(&mut self, parent: NodeId, index: usize, name: &str) -> NodeId {
        let id = self.push_node(
            NodeKind::Element {
                name: name.to_string(),
                attributes: Vec::new(),
            },
            Some(parent),
        );
        let children = &mut self.nodes[parent.index()].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    /// Create an element as the last child of `parent`
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let index = self.children(parent).len();
        self.insert_element(parent, index, name)
    }

    /// Depth-first traversal of the subtree rooted at `id`
    pub fn walk(&self, id: NodeId) -> Walk<'_> {
        Walk {
            doc: self,
            stack: vec![(id, false)],
        }
    }

    /// Elements of the subtree rooted at `id`, in document order
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.walk(id).filter_map(move |event| match event {
            WalkEvent::Enter(node) if self.is_element(node) => Some(node),
            _ => None,
        })
    }

    /// All elements named `{namespace}local`, in document order
    pub fn elements_named(&self, namespace: &str, local: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&id| self.is_named(id, namespace, local))
            .collect()
    }

    /// Serialize with an explicit UTF-8 encoding declaration
    pub fn to_bytes(&self) -> Result<Vec<u8>, XmlError> {
        let mut writer = Writer::new(Vec::new());
        let write_error = |e: quick_xml::Error| XmlError::Write(e.to_string());

        writer
            .write_event(Event::Decl(BytesDecl::new(&self.version, Some("UTF-8"), self.standalone.as_deref())))
            .map_err(write_error)?;
        if !matches!(self.prolog.first(), Some(Misc::Whitespace(_))) {
            writer
                .write_event(Event::Text(BytesText::from_escaped("\n")))
                .map_err(write_error)?;
        }
        for misc in &self.prolog {
            write_misc(&mut writer, misc).map_err(write_error)?;
        }
        self.write_node(&mut writer, self.root).map_err(write_error)?;
        for misc in &self.epilog {
            write_misc(&mut writer, misc).map_err(write_error)?;
        }
        Ok(writer.into_inner())
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<(), quick_xml::Error> {
        let node = &self.nodes[id.index()];
        match &node.kind {
            NodeKind::Element { name, attributes } => {
                let mut start = BytesStart::new(name.as_str());
                for attribute in attributes {
                    let value = escape_attribute(&attribute.value);
                    start.push_attribute((attribute.name.as_bytes(), value.as_bytes()));
                }
                if node.children.is_empty() && node.text.is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    write_text(writer, &node.text)?;
                    for &child in &node.children {
                        self.write_node(writer, child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                }
            }
            NodeKind::Comment(content) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(content.as_str())))?;
            }
            NodeKind::ProcessingInstruction(content) => {
                writer.write_event(Event::PI(BytesText::from_escaped(content.as_str())))?;
            }
            NodeKind::CData(content) => {
                writer.write_event(Event::CData(BytesCData::new(content.as_str())))?;
            }
        }
        write_text(writer, &node.tail)
    }
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), quick_xml::Error> {
    if text.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
}

fn write_misc(writer: &mut Writer<Vec<u8>>, misc: &Misc) -> Result<(), quick_xml::Error> {
    match misc {
        Misc::Whitespace(text) => writer.write_event(Event::Text(BytesText::from_escaped(text.as_str()))),
        Misc::DocType(content) => writer.write_event(Event::DocType(BytesText::from_escaped(content.as_str()))),
        Misc::Comment(content) => writer.write_event(Event::Comment(BytesText::from_escaped(content.as_str()))),
        Misc::ProcessingInstruction(content) => {
            writer.write_event(Event::PI(BytesText::from_escaped(content.as_str())))
        }
    }
}

/// Whether `c` matches the XML 1.0 `Char` production
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\u{9}' | '\u{A}' | '\u{D}' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Byte offset and value of the first character XML 1.0 does not allow
pub fn first_illegal_char(text: &str) -> Option<(usize, char)> {
    text.char_indices().find(|&(_, c)| !is_xml_char(c))
}

/// Escape an attribute value so whitespace survives attribute normalization
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped;
    }
    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        match c {
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Split `prefix:local` into its parts
fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Iterator over [`WalkEvent`]s
pub struct Walk<'a> {
    doc: &'a XmlDocument,
    stack: Vec<(NodeId, bool)>,
}

impl Iterator for Walk<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        let (id, entered) = self.stack.pop()?;
        if entered {
            return Some(WalkEvent::Exit(id));
        }
        self.stack.push((id, true));
        for &child in self.doc.children(id).iter().rev() {
            self.stack.push((child, false));
        }
        Some(WalkEvent::Enter(id))
    }
}
