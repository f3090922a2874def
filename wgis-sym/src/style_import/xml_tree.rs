//! Generic element tree for style documents
//!
//! Style documents are small, so they are parsed fully into an owned tree
//! and searched depth-first. Namespace prefixes are dropped from element
//! names but kept on attribute keys (`xsi:type`).

use super::color::{hex_from_components, hex_from_text_components};
use super::ImportError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One element of a parsed document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated text content (trimmed segments)
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a whole document and return its root element
    pub fn parse(document: &str) -> Result<XmlNode, ImportError> {
        let mut reader = Reader::from_str(document);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(XmlNode::from_start(&start)?),
                Ok(Event::Empty(start)) => {
                    let node = XmlNode::from_start(&start)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::End(_)) => {
                    let node = stack.pop().ok_or_else(|| {
                        ImportError::MalformedDocument("unexpected closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut root, node)?;
                }
                Ok(Event::Text(text)) => {
                    let text = text
                        .unescape()
                        .map_err(|e| ImportError::MalformedDocument(e.to_string()))?;
                    push_text(&mut stack, &text)?;
                }
                Ok(Event::CData(data)) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    push_text(&mut stack, &text)?;
                }
                Ok(Event::Eof) => break,
                // Declarations, comments, processing instructions, doctype
                Ok(_) => {}
                Err(e) => {
                    return Err(ImportError::MalformedDocument(format!(
                        "{} (at byte {})",
                        e,
                        reader.buffer_position()
                    )))
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(ImportError::MalformedDocument(format!(
                "unclosed element <{}>",
                open.name
            )));
        }
        root.ok_or_else(|| ImportError::MalformedDocument("no root element".to_string()))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<XmlNode, ImportError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ImportError::MalformedDocument(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ImportError::MalformedDocument(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(XmlNode {
            name,
            attributes,
            ..Default::default()
        })
    }

    /// Attribute value by exact key
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value by key ignoring any namespace prefix
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.rsplit(':').next() == Some(local))
            .map(|(_, v)| v.as_str())
    }

    /// Non-empty text content
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first direct child with the given name
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(XmlNode::text)
    }

    /// Depth-first (pre-order) search, including `self`
    pub fn find_first(&self, predicate: impl Fn(&XmlNode) -> bool) -> Option<&XmlNode> {
        self.find_first_dyn(&predicate)
    }

    fn find_first_dyn(&self, predicate: &dyn Fn(&XmlNode) -> bool) -> Option<&XmlNode> {
        if predicate(self) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_first_dyn(predicate))
    }

    /// Depth-first search below `self`
    pub fn find_descendant(&self, predicate: impl Fn(&XmlNode) -> bool) -> Option<&XmlNode> {
        self.children.iter().find_map(|c| c.find_first_dyn(&predicate))
    }

    /// Every matching node in document order, including `self`
    pub fn find_all(&self, predicate: impl Fn(&XmlNode) -> bool) -> Vec<&XmlNode> {
        let mut found = Vec::new();
        self.collect_matching(&predicate, &mut found);
        found
    }

    fn collect_matching<'a>(&'a self, predicate: &dyn Fn(&XmlNode) -> bool, out: &mut Vec<&'a XmlNode>) {
        if predicate(self) {
            out.push(self);
        }
        for child in &self.children {
            child.collect_matching(predicate, out);
        }
    }

    /// Key/value pairs carried directly by this node's children
    ///
    /// Recognized forms: `<prop k v>`, `<Option name value>` (unnamed or
    /// valueless `Option` maps are flattened), RGB color nodes (as hex),
    /// and leaf elements with text.
    pub fn properties(&self) -> Vec<(String, String)> {
        let mut props = Vec::new();
        for child in &self.children {
            child.collect_property(&mut props);
        }
        props
    }

    fn collect_property(&self, out: &mut Vec<(String, String)>) {
        match self.name.as_str() {
            "prop" => {
                if let (Some(k), Some(v)) = (self.attr("k"), self.attr("v")) {
                    out.push((k.to_string(), v.to_string()));
                }
            }
            "Option" => match (self.attr("name"), self.attr("value")) {
                (Some(name), Some(value)) => out.push((name.to_string(), value.to_string())),
                _ => {
                    for child in &self.children {
                        child.collect_property(out);
                    }
                }
            },
            _ => {
                if let Some(hex) = self.rgb_hex() {
                    out.push((self.name.clone(), hex));
                } else if self.children.is_empty() {
                    if let Some(text) = self.text() {
                        out.push((self.name.clone(), text.to_string()));
                    }
                }
            }
        }
    }

    /// Properties of this node and of every descendant `descend` admits
    pub fn subtree_properties(&self, descend: &dyn Fn(&XmlNode) -> bool) -> Vec<(String, String)> {
        let mut props = self.properties();
        for child in &self.children {
            if !child.is_property_carrier() && descend(child) {
                props.extend(child.subtree_properties(descend));
            }
        }
        props
    }

    /// Nodes consumed whole by `properties()`
    fn is_property_carrier(&self) -> bool {
        self.children.is_empty()
            || self.name == "prop"
            || self.name == "Option"
            || self.is_rgb_node()
    }

    fn is_rgb_node(&self) -> bool {
        self.name.ends_with("RGBColor")
            || self
                .attr_local("type")
                .map_or(false, |t| t.ends_with("RGBColor"))
    }

    /// Hex color of an ArcGIS RGB node
    ///
    /// Components come from `<R>/<G>/<B>` children or from the first three
    /// `<Double>` entries of a `<Values>` child.
    pub fn rgb_hex(&self) -> Option<String> {
        if !self.is_rgb_node() {
            return None;
        }

        let named = ["R", "G", "B"].map(|c| self.child_text(c));
        if let [Some(r), Some(g), Some(b)] = named {
            return hex_from_text_components(&[r, g, b]);
        }

        let values: Vec<f64> = self
            .child("Values")?
            .children
            .iter()
            .filter_map(|v| v.text()?.parse::<f64>().ok())
            .collect();
        match values.as_slice() {
            [r, g, b, ..] => Some(hex_from_components(*r, *g, *b)),
            _ => None,
        }
    }
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<(), ImportError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(ImportError::MalformedDocument(format!(
                "multiple root elements (second is <{}>)",
                node.name
            )))
        }
    }
    Ok(())
}

fn push_text(stack: &mut [XmlNode], text: &str) -> Result<(), ImportError> {
    match stack.last_mut() {
        Some(node) => {
            if !node.text.is_empty() {
                node.text.push(' ');
            }
            node.text.push_str(text.trim());
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ImportError::MalformedDocument(
            "text outside the root element".to_string(),
        )),
    }
}
