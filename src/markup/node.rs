//! Markup and stylesheet node types.
//!
//! Nodes are plain data: constructors classify heterogeneous [`Content`]
//! into the right bucket and nothing else. Rendering lives in
//! [`crate::render`].

use super::props::Props;

/// A CSS `name: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Pre-formatted text, emitted verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Raw {
    pub text: String,
}

impl Raw {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub is_void: bool,
    pub attributes: Props,
    /// Inline `style` declarations.
    pub style: Props,
    /// Always empty when `is_void`.
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(
        tag: impl Into<String>,
        is_void: bool,
        contents: impl IntoIterator<Item = Content>,
    ) -> Self {
        let mut element = Self {
            tag: tag.into(),
            is_void,
            attributes: Props::new(),
            style: Props::new(),
            children: Vec::new(),
        };
        for content in contents {
            element.add(content);
        }
        element
    }

    /// File one piece of content into children, style or attributes.
    pub fn add(&mut self, content: impl Into<Content>) {
        match content.into() {
            Content::Empty | Content::Bool(false) => {}
            Content::Bool(true) => self.push_child(Node::Text("true".into())),
            Content::Text(text) if text.is_empty() => {}
            Content::Text(text) => self.push_child(Node::Text(text)),
            Content::Property(property) | Content::Node(Node::Property(property)) => {
                self.style.set(property.name, property.value);
            }
            Content::Node(Node::Fragment(nodes)) => {
                for node in nodes {
                    self.add(node);
                }
            }
            Content::Node(node) => self.push_child(node),
            Content::List(items) => {
                for item in items {
                    self.add(item);
                }
            }
            Content::Attributes(pairs) => {
                for (name, value) in pairs {
                    self.attributes.append(name, value);
                }
            }
        }
    }

    fn push_child(&mut self, node: Node) {
        if !self.is_void {
            self.children.push(node);
        }
    }
}

/// A CSS rule, possibly nesting further rules.
///
/// `selector` may be a comma-separated list of alternates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub properties: Props,
    pub rules: Vec<Rule>,
}

impl Rule {
    pub fn new(selector: impl Into<String>, contents: impl IntoIterator<Item = Content>) -> Self {
        let mut rule = Self {
            selector: selector.into(),
            properties: Props::new(),
            rules: Vec::new(),
        };
        for content in contents {
            rule.add(content);
        }
        rule
    }

    /// Properties merge into the declaration map, rules nest; anything else is dropped.
    pub fn add(&mut self, content: impl Into<Content>) {
        match content.into() {
            Content::Property(property) | Content::Node(Node::Property(property)) => {
                self.properties.set(property.name, property.value);
            }
            Content::Node(Node::Rule(rule)) => self.rules.push(rule),
            Content::Node(Node::Fragment(nodes)) => {
                for node in nodes {
                    self.add(node);
                }
            }
            Content::List(items) => {
                for item in items {
                    self.add(item);
                }
            }
            _ => {}
        }
    }
}

/// Anything that may appear inside a nested at-rule body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssItem {
    Property(Property),
    Rule(Rule),
    AtRule(AtRule),
}

/// CSS at-rules in their three shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtRule {
    /// `@import "x";`
    Regular { keyword: String, prelude: String },
    /// `@font-face { ... }`
    Block { keyword: String, properties: Props },
    /// `@media (...) { ... }`, or `@layer x;` when `contents` is empty.
    Nested {
        keyword: String,
        prelude: String,
        contents: Vec<CssItem>,
    },
}

impl AtRule {
    pub fn regular(keyword: impl Into<String>, prelude: impl Into<String>) -> Self {
        Self::Regular {
            keyword: keyword.into(),
            prelude: prelude.into(),
        }
    }

    pub fn block(keyword: impl Into<String>, contents: impl IntoIterator<Item = Content>) -> Self {
        let mut properties = Props::new();
        let mut items = Vec::new();
        for content in contents {
            collect_css_items(content, &mut items);
        }
        for item in items {
            if let CssItem::Property(property) = item {
                properties.set(property.name, property.value);
            }
        }
        Self::Block {
            keyword: keyword.into(),
            properties,
        }
    }

    pub fn nested(
        keyword: impl Into<String>,
        prelude: impl Into<String>,
        contents: impl IntoIterator<Item = Content>,
    ) -> Self {
        let mut items = Vec::new();
        for content in contents {
            collect_css_items(content, &mut items);
        }
        Self::Nested {
            keyword: keyword.into(),
            prelude: prelude.into(),
            contents: items,
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            Self::Regular { keyword, .. }
            | Self::Block { keyword, .. }
            | Self::Nested { keyword, .. } => keyword,
        }
    }
}

fn collect_css_items(content: Content, items: &mut Vec<CssItem>) {
    match content {
        Content::Property(property) | Content::Node(Node::Property(property)) => {
            items.push(CssItem::Property(property));
        }
        Content::Node(Node::Rule(rule)) => items.push(CssItem::Rule(rule)),
        Content::Node(Node::AtRule(at_rule)) => items.push(CssItem::AtRule(at_rule)),
        Content::Node(Node::Fragment(nodes)) => {
            for node in nodes {
                collect_css_items(Content::Node(node), items);
            }
        }
        Content::List(list) => {
            for item in list {
                collect_css_items(item, items);
            }
        }
        _ => {}
    }
}

/// A node of a markup/stylesheet tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Rule(Rule),
    AtRule(AtRule),
    Property(Property),
    Raw(Raw),
    /// Escaped on output.
    Text(String),
    /// A sequence of sibling nodes.
    Fragment(Vec<Node>),
}

impl Node {
    /// A node that renders to nothing.
    pub const fn empty() -> Self {
        Self::Fragment(Vec::new())
    }
}

/// Constructor input before classification.
///
/// Mirrors what a template program may hand to a node constructor:
/// falsy values are dropped, lists are flattened, attribute records merge
/// into attributes and any scalar becomes text.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Empty,
    Bool(bool),
    Text(String),
    Node(Node),
    Property(Property),
    List(Vec<Content>),
    Attributes(Vec<(String, String)>),
}

impl Content {
    /// Build an attribute record from `(name, value)` pairs.
    pub fn attrs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Attributes(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Node {
    /// Classify top-level content into a standalone node.
    pub fn from_content(content: impl Into<Content>) -> Self {
        let mut nodes = Vec::new();
        collect_nodes(content.into(), &mut nodes);
        match nodes.len() {
            1 => nodes.pop().unwrap_or_else(Node::empty),
            _ => Node::Fragment(nodes),
        }
    }
}

fn collect_nodes(content: Content, nodes: &mut Vec<Node>) {
    match content {
        Content::Empty | Content::Bool(false) | Content::Attributes(_) => {}
        Content::Bool(true) => nodes.push(Node::Text("true".into())),
        Content::Text(text) if text.is_empty() => {}
        Content::Text(text) => nodes.push(Node::Text(text)),
        Content::Property(property) => nodes.push(Node::Property(property)),
        Content::Node(Node::Fragment(inner)) => nodes.extend(inner),
        Content::Node(node) => nodes.push(node),
        Content::List(items) => {
            for item in items {
                collect_nodes(item, nodes);
            }
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for Content {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<bool> for Content {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_content_from_number {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Content {
            fn from(value: $ty) -> Self {
                Self::Text(value.to_string())
            }
        })*
    };
}

impl_content_from_number!(i32, i64, u32, u64, usize, f32, f64);

impl From<Node> for Content {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Element> for Content {
    fn from(element: Element) -> Self {
        Self::Node(Node::Element(element))
    }
}

impl From<Rule> for Content {
    fn from(rule: Rule) -> Self {
        Self::Node(Node::Rule(rule))
    }
}

impl From<AtRule> for Content {
    fn from(at_rule: AtRule) -> Self {
        Self::Node(Node::AtRule(at_rule))
    }
}

impl From<Raw> for Content {
    fn from(raw: Raw) -> Self {
        Self::Node(Node::Raw(raw))
    }
}

impl From<Property> for Content {
    fn from(property: Property) -> Self {
        Self::Property(property)
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl<T: Into<Content>> From<Vec<T>> for Content {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Rule> for Node {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl From<AtRule> for Node {
    fn from(at_rule: AtRule) -> Self {
        Self::AtRule(at_rule)
    }
}

impl From<Raw> for Node {
    fn from(raw: Raw) -> Self {
        Self::Raw(raw)
    }
}
