//! Node tree serialization to HTML and CSS text.
//!
//! One [`Printer`] drives both serializers so mixed trees (an element
//! holding stylesheet rules, a stylesheet holding raw text) render in a
//! single pass. Output is a pure function of the tree and the [`Mode`].
//!
//! # Modes
//!
//! | Mode      | Element                    | Rule                      |
//! |-----------|----------------------------|---------------------------|
//! | `Compact` | `<p>hi</p>`                | `.a,.b{color:red}`        |
//! | `Pretty`  | `<p>\n  hi\n</p>`          | `.a, .b {\n  color: red;\n}` |

mod css;
mod escape;
mod html;

pub use escape::escape_html;

use crate::markup::{Node, Property};

/// Serializer output style, selected once per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Compact,
    Pretty,
}

impl Mode {
    pub const fn from_pretty(pretty: bool) -> Self {
        if pretty { Self::Pretty } else { Self::Compact }
    }
}

/// Render a single node tree.
pub fn render(node: &Node, mode: Mode) -> String {
    let mut printer = Printer::new(mode);
    write_node(&mut printer, node);
    printer.finish()
}

/// Render a sequence of sibling trees.
pub fn render_all(nodes: &[Node], mode: Mode) -> String {
    let mut printer = Printer::new(mode);
    for node in nodes {
        write_node(&mut printer, node);
    }
    printer.finish()
}

pub(crate) fn write_node(p: &mut Printer, node: &Node) {
    match node {
        Node::Element(element) => html::write_element(p, element),
        Node::Rule(rule) => css::write_rule(p, rule),
        Node::AtRule(at_rule) => css::write_at_rule(p, at_rule),
        Node::Property(property) => p.property(property),
        Node::Raw(raw) => {
            if !raw.text.is_empty() {
                p.item();
                p.push_reindented(&raw.text);
            }
        }
        Node::Text(text) => {
            if !text.is_empty() {
                p.item();
                p.push_reindented(&escape_html(text));
            }
        }
        Node::Fragment(nodes) => {
            for node in nodes {
                write_node(p, node);
            }
        }
    }
}

/// Whether a node produces any output.
pub(crate) fn is_visible(node: &Node) -> bool {
    match node {
        Node::Text(text) => !text.is_empty(),
        Node::Raw(raw) => !raw.text.is_empty(),
        Node::Fragment(nodes) => nodes.iter().any(is_visible),
        _ => true,
    }
}

// ============================================================================
// Printer
// ============================================================================

const INDENT: &str = "  ";

/// Output buffer with indentation state.
///
/// Every emitted item calls [`Printer::item`] first, which inserts the
/// separator owed to the previous sibling: a newline plus indentation in
/// pretty mode, a `;` after a declaration in compact mode.
pub(crate) struct Printer {
    out: String,
    mode: Mode,
    level: usize,
    /// Pretty: the next item starts on a new line.
    pending: bool,
    /// Compact: the previous sibling was a declaration.
    semicolon: bool,
}

impl Printer {
    fn new(mode: Mode) -> Self {
        Self {
            out: String::new(),
            mode,
            level: 0,
            pending: false,
            semicolon: false,
        }
    }

    fn finish(self) -> String {
        self.out
    }

    pub(crate) fn is_pretty(&self) -> bool {
        self.mode == Mode::Pretty
    }

    pub(crate) fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    /// Push text, re-indenting embedded newlines in pretty mode.
    ///
    /// One trailing newline is dropped so the closing tag keeps its own line.
    pub(crate) fn push_reindented(&mut self, s: &str) {
        if !self.is_pretty() || !s.contains('\n') {
            self.out.push_str(s);
            return;
        }
        let s = s.strip_suffix('\n').unwrap_or(s);
        for (i, line) in s.split('\n').enumerate() {
            if i > 0 {
                self.newline();
            }
            self.out.push_str(line);
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.level {
            self.out.push_str(INDENT);
        }
    }

    /// Start a new sibling item.
    pub(crate) fn item(&mut self) {
        if self.semicolon {
            self.out.push(';');
            self.semicolon = false;
        }
        if self.is_pretty() && self.pending {
            self.newline();
        }
        self.pending = true;
    }

    /// Descend one level; the next item starts a new line.
    pub(crate) fn enter(&mut self) {
        self.level += 1;
        self.pending = true;
        self.semicolon = false;
    }

    /// Return one level up, breaking the line in pretty mode.
    pub(crate) fn leave(&mut self) {
        self.level = self.level.saturating_sub(1);
        self.semicolon = false;
        if self.is_pretty() {
            self.newline();
        }
    }

    /// `head{` (compact) or `head {` (pretty), then descend.
    pub(crate) fn open(&mut self, head: &str) {
        self.out.push_str(head);
        self.out.push_str(if self.is_pretty() { " {" } else { "{" });
        self.enter();
    }

    pub(crate) fn close(&mut self) {
        self.leave();
        self.out.push('}');
        self.pending = true;
    }

    /// A declaration as one block item.
    pub(crate) fn property(&mut self, property: &Property) {
        self.declaration(&property.name, &property.value);
    }

    pub(crate) fn declaration(&mut self, name: &str, value: &str) {
        self.item();
        self.out.push_str(name);
        if self.is_pretty() {
            self.out.push_str(": ");
            self.out.push_str(value);
            self.out.push(';');
        } else {
            self.out.push(':');
            self.out.push_str(value);
            self.semicolon = true;
        }
    }
}
