//! Node model for markup and stylesheets.
//!
//! - [`node`]: element, rule, at-rule, property and raw nodes
//! - [`props`]: insertion-ordered attribute and declaration maps
//! - [`builder`]: constructor helpers (`element`, `rule`, `prop`, ...)

pub mod builder;
pub mod node;
pub mod props;

pub use builder::{
    AtRuleKind, ElementBuilder, at_rule_kind, block_at_rule, element, kebabize, markdown,
    nested_at_rule, prop, raw, regular_at_rule, rule,
};
pub use node::{AtRule, Content, CssItem, Element, Node, Property, Raw, Rule};
pub use props::Props;

/// Build a `Vec<Content>` from heterogeneous values.
///
/// ```ignore
/// Element::new("p", false, content!["hello", prop("color", "red"), None::<&str>]);
/// ```
#[macro_export]
macro_rules! content {
    () => {
        ::std::vec::Vec::<$crate::markup::Content>::new()
    };
    ($($item:expr),+ $(,)?) => {
        ::std::vec![$($crate::markup::Content::from($item)),+]
    };
}
