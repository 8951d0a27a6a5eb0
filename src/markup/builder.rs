//! Constructor helpers for building node trees in Rust.
//!
//! ```ignore
//! let card = element("div").add_class("cardBody").build(content!["hi"]);
//! // <div class="card-body">hi</div>
//! ```

use super::node::{AtRule, Content, Element, Property, Raw, Rule};
use pulldown_cmark::{Options, Parser, html};

/// Tags that never carry children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "menuitem", "meta",
    "param", "source", "track", "wbr",
];

/// Body shape of an at-rule keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtRuleKind {
    Regular,
    Block,
    Nested,
}

const AT_RULES: &[(&str, AtRuleKind)] = &[
    ("charset", AtRuleKind::Regular),
    ("import", AtRuleKind::Regular),
    ("namespace", AtRuleKind::Regular),
    ("media", AtRuleKind::Nested),
    ("supports", AtRuleKind::Nested),
    ("page", AtRuleKind::Nested),
    ("keyframes", AtRuleKind::Nested),
    ("counter-style", AtRuleKind::Nested),
    ("font-feature-values", AtRuleKind::Nested),
    ("layer", AtRuleKind::Nested),
    ("color-profile", AtRuleKind::Nested),
    ("container", AtRuleKind::Nested),
    ("font-palette-values", AtRuleKind::Nested),
    ("font-face", AtRuleKind::Block),
];

/// Look up the body shape of a known at-rule keyword.
pub fn at_rule_kind(keyword: &str) -> Option<AtRuleKind> {
    AT_RULES
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, kind)| *kind)
}

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Convert `camelCase` to `kebab-case`.
pub fn kebabize(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for c in camel.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Element constructor with an accumulated class list.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    is_void: bool,
    classes: Vec<String>,
}

/// Start an element for `tag`. Void tags are detected by name.
pub fn element(tag: impl Into<String>) -> ElementBuilder {
    let tag = tag.into();
    let is_void = is_void_element(&tag);
    ElementBuilder {
        tag,
        is_void,
        classes: Vec::new(),
    }
}

impl ElementBuilder {
    /// Append a class name, kebab-cased.
    pub fn add_class(mut self, name: &str) -> Self {
        self.classes.push(kebabize(name));
        self
    }

    pub fn void(mut self, is_void: bool) -> Self {
        self.is_void = is_void;
        self
    }

    pub fn build(self, contents: impl IntoIterator<Item = Content>) -> Element {
        let mut element = Element::new(self.tag, self.is_void, std::iter::empty());
        if !self.classes.is_empty() {
            element.add(Content::attrs([("class", self.classes.join(" "))]));
        }
        for content in contents {
            element.add(content);
        }
        element
    }
}

pub fn rule(selector: impl Into<String>, contents: impl IntoIterator<Item = Content>) -> Rule {
    Rule::new(selector, contents)
}

pub fn prop(name: impl Into<String>, value: impl Into<String>) -> Property {
    Property::new(name, value)
}

pub fn raw(text: impl Into<String>) -> Raw {
    Raw::new(text)
}

/// Render CommonMark to HTML and wrap it as raw output.
pub fn markdown(source: &str) -> Raw {
    let parser = Parser::new_ext(source, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    Raw::new(out)
}

pub fn regular_at_rule(keyword: impl Into<String>, prelude: impl Into<String>) -> AtRule {
    AtRule::regular(keyword, prelude)
}

pub fn block_at_rule(
    keyword: impl Into<String>,
    contents: impl IntoIterator<Item = Content>,
) -> AtRule {
    AtRule::block(keyword, contents)
}

pub fn nested_at_rule(
    keyword: impl Into<String>,
    prelude: impl Into<String>,
    contents: impl IntoIterator<Item = Content>,
) -> AtRule {
    AtRule::nested(keyword, prelude, contents)
}
