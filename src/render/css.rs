//! Stylesheet serialization with nested-rule flattening.
//!
//! A top-level rule splits its selector list into alternates. Its own
//! declarations form one block for the whole list; each alternate then
//! scopes its nested rules separately, so nested output never mixes
//! top-level alternates:
//!
//! ```text
//! .foo, .bar { color: red; .baz { color: green } }
//!   => .foo,.bar{color:red}.foo .baz{color:green}.bar .baz{color:green}
//! ```
//!
//! Below the top level, every parent selector is combined with every
//! alternate of the nested rule and the results share one block.

use super::Printer;
use crate::markup::{AtRule, CssItem, Props, Rule};

pub(super) fn write_rule(p: &mut Printer, rule: &Rule) {
    let alternates = split_selectors(&rule.selector);

    if !rule.properties.is_empty() {
        write_block(p, &alternates, &rule.properties);
    }

    for alternate in &alternates {
        let scope = std::slice::from_ref(alternate);
        for nested in &rule.rules {
            write_nested(p, scope, nested);
        }
    }
}

fn write_nested(p: &mut Printer, parents: &[String], rule: &Rule) {
    let own = split_selectors(&rule.selector);
    let selectors: Vec<String> = parents
        .iter()
        .flat_map(|parent| own.iter().map(move |token| combine(parent, token)))
        .collect();

    if !rule.properties.is_empty() {
        write_block(p, &selectors, &rule.properties);
    }

    for nested in &rule.rules {
        write_nested(p, &selectors, nested);
    }
}

fn write_block(p: &mut Printer, selectors: &[String], properties: &Props) {
    let separator = if p.is_pretty() { ", " } else { "," };
    p.item();
    p.open(&selectors.join(separator));
    for (name, value) in properties.iter() {
        p.declaration(name, value);
    }
    p.close();
}

/// Split a selector list into trimmed, non-empty alternates.
///
/// An empty list yields a single empty alternate so nested rules still
/// resolve against it.
fn split_selectors(selector: &str) -> Vec<String> {
    let alternates: Vec<String> = selector
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();

    if alternates.is_empty() {
        vec![String::new()]
    } else {
        alternates
    }
}

/// Join a parent selector with one nested alternate.
fn combine(parent: &str, token: &str) -> String {
    if let Some(rest) = token.strip_prefix('&') {
        format!("{parent}{rest}")
    } else if token.starts_with(':') {
        format!("{parent}{token}")
    } else if parent.is_empty() {
        token.to_owned()
    } else {
        format!("{parent} {token}")
    }
}

pub(super) fn write_at_rule(p: &mut Printer, at_rule: &AtRule) {
    match at_rule {
        AtRule::Regular { keyword, prelude } => {
            p.item();
            p.push(&head(keyword, prelude));
            p.push(";");
        }
        AtRule::Block {
            keyword,
            properties,
        } => {
            p.item();
            p.open(&format!("@{keyword}"));
            for (name, value) in properties.iter() {
                p.declaration(name, value);
            }
            p.close();
        }
        AtRule::Nested {
            keyword,
            prelude,
            contents,
        } => {
            p.item();
            if contents.is_empty() {
                p.push(&head(keyword, prelude));
                p.push(";");
                return;
            }
            p.open(&head(keyword, prelude));
            for item in contents {
                match item {
                    CssItem::Property(property) => p.property(property),
                    CssItem::Rule(rule) => write_rule(p, rule),
                    CssItem::AtRule(nested) => write_at_rule(p, nested),
                }
            }
            p.close();
        }
    }
}

fn head(keyword: &str, prelude: &str) -> String {
    if prelude.is_empty() {
        format!("@{keyword}")
    } else {
        format!("@{keyword} {prelude}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content;
    use crate::markup::{Node, Property, Raw};
    use crate::render::{Mode, render};

    fn compact(node: impl Into<Node>) -> String {
        render(&node.into(), Mode::Compact)
    }

    fn pretty(node: impl Into<Node>) -> String {
        render(&node.into(), Mode::Pretty)
    }

    fn color(value: &str) -> Property {
        Property::new("color", value)
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine(".foo", "&.bar"), ".foo.bar");
        assert_eq!(combine(".foo", ":hover"), ".foo:hover");
        assert_eq!(combine("", ".bar"), ".bar");
        assert_eq!(combine(".foo", ".bar"), ".foo .bar");
        assert_eq!(combine(".foo", "> li"), ".foo > li");
    }

    #[test]
    fn test_split_selectors_trims() {
        assert_eq!(split_selectors(".foo, .bar ,.baz"), vec![".foo", ".bar", ".baz"]);
        assert_eq!(split_selectors(""), vec![""]);
        assert_eq!(split_selectors(".a,,"), vec![".a"]);
    }

    #[test]
    fn test_renders_compact_rules() {
        let rule = Rule::new(".foo", content![color("red"), Property::new("background", "blue")]);
        assert_eq!(compact(rule), ".foo{color:red;background:blue}");
    }

    #[test]
    fn test_renders_nested_rules() {
        let bar = Rule::new(".bar", content![color("blue")]);
        let rule = Rule::new(".foo", content![color("red"), bar]);
        assert_eq!(compact(rule), ".foo{color:red}.foo .bar{color:blue}");
    }

    #[test]
    fn test_parent_without_properties_emits_only_nested() {
        let rule = Rule::new(".foo", content![Rule::new(".bar", content![color("blue")])]);
        assert_eq!(compact(rule), ".foo .bar{color:blue}");
    }

    #[test]
    fn test_ampersand_joins_without_space() {
        let rule = Rule::new(".foo", content![Rule::new("&.bar", content![color("blue")])]);
        assert_eq!(compact(rule), ".foo.bar{color:blue}");
    }

    #[test]
    fn test_pseudo_class_joins_without_space() {
        let hover = Rule::new(":hover", content![color("blue")]);
        let rule = Rule::new(".foo", content![color("red"), hover]);
        assert_eq!(compact(rule), ".foo{color:red}.foo:hover{color:blue}");
    }

    #[test]
    fn test_multiple_selectors_in_parent() {
        let rule = Rule::new(
            ".foo, .bar",
            content![color("red"), Rule::new(".baz", content![color("green")])],
        );
        assert_eq!(
            compact(rule),
            ".foo,.bar{color:red}.foo .baz{color:green}.bar .baz{color:green}"
        );
    }

    #[test]
    fn test_top_alternates_scope_nested_rules_separately() {
        let rule = Rule::new(".foo, .bar", content![Rule::new(".baz", content![color("green")])]);
        assert_eq!(compact(rule), ".foo .baz{color:green}.bar .baz{color:green}");
    }

    #[test]
    fn test_multiple_selectors_in_child() {
        let rule = Rule::new(".foo", content![Rule::new(".bar,.baz", content![color("purple")])]);
        assert_eq!(compact(rule), ".foo .bar,.foo .baz{color:purple}");
    }

    #[test]
    fn test_multiple_selectors_at_both_levels() {
        let inner = Rule::new(".baz,.buz", content![color("green")]);
        let rule = Rule::new(".foo, .bar", content![inner]);
        assert_eq!(
            compact(rule),
            ".foo .baz,.foo .buz{color:green}.bar .baz,.bar .buz{color:green}"
        );
    }

    #[test]
    fn test_deep_nesting_keeps_cartesian_product() {
        let rule = Rule::new(
            ".a",
            content![Rule::new(
                ".b, .c",
                content![Rule::new("&:hover, .d", content![color("red")])]
            )],
        );
        assert_eq!(compact(rule), ".a .b:hover,.a .b .d,.a .c:hover,.a .c .d{color:red}");
    }

    #[test]
    fn test_nested_rules_follow_declaration_order() {
        let rule = Rule::new(
            ".a",
            content![
                Rule::new(".x", content![color("1"), Rule::new(".y", content![color("2")])]),
                Rule::new(".z", content![color("3")]),
            ],
        );
        assert_eq!(compact(rule), ".a .x{color:1}.a .x .y{color:2}.a .z{color:3}");
    }

    #[test]
    fn test_renders_regular_at_rules() {
        assert_eq!(compact(AtRule::regular("import", "url(foo.css)")), "@import url(foo.css);");
    }

    #[test]
    fn test_renders_block_at_rules() {
        let family = Property::new("font-family", r#""Consolas""#);
        let at = AtRule::block("font-face", content![family]);
        assert_eq!(compact(at), r#"@font-face{font-family:"Consolas"}"#);
    }

    #[test]
    fn test_nested_at_rule_containing_rules() {
        let foo = Rule::new(".foo", content![color("red")]);
        let at = AtRule::nested("media", "(min-width: 600px)", content![foo]);
        assert_eq!(compact(at), "@media (min-width: 600px){.foo{color:red}}");
    }

    #[test]
    fn test_nested_at_rule_containing_nested_rules() {
        let at = AtRule::nested(
            "media",
            "(min-width: 600px)",
            content![Rule::new(
                ".foo",
                content![color("red"), Rule::new(".bar", content![color("blue")])]
            )],
        );
        assert_eq!(compact(at), "@media (min-width: 600px){.foo{color:red}.foo .bar{color:blue}}");
    }

    #[test]
    fn test_nested_at_rule_inside_nested_at_rule() {
        let at = AtRule::nested(
            "supports",
            "(display: flex)",
            content![AtRule::nested(
                "media",
                "(min-width: 900px)",
                content![Rule::new(".foo", content![Property::new("display", "flex")])]
            )],
        );
        assert_eq!(
            compact(at),
            "@supports (display: flex){@media (min-width: 900px){.foo{display:flex}}}"
        );
    }

    #[test]
    fn test_nested_at_rule_without_contents() {
        assert_eq!(compact(AtRule::nested("layer", "utilities", content![])), "@layer utilities;");
    }

    #[test]
    fn test_nested_at_rule_with_properties() {
        let system = Property::new("system", "cyclic");
        let at = AtRule::nested("counter-style", "thumbs", content![system]);
        assert_eq!(compact(at), "@counter-style thumbs{system:cyclic}");
    }

    #[test]
    fn test_nested_at_rule_separates_property_from_rule() {
        let at = AtRule::nested(
            "page",
            ":first",
            content![Property::new("margin", "1in"), Rule::new(".x", content![color("red")])],
        );
        assert_eq!(compact(at), "@page :first{margin:1in;.x{color:red}}");
    }

    #[test]
    fn test_pretty_rule_with_nested() {
        let rule = Rule::new(
            ".foo, .bar",
            content![color("red"), Rule::new("&:hover", content![color("blue")])],
        );
        assert_eq!(
            pretty(rule),
            ".foo, .bar {\n  color: red;\n}\n\
             .foo:hover {\n  color: blue;\n}\n\
             .bar:hover {\n  color: blue;\n}"
        );
    }

    #[test]
    fn test_pretty_nested_at_rule() {
        let foo = Rule::new(".foo", content![color("red")]);
        let at = AtRule::nested("media", "print", content![foo]);
        assert_eq!(pretty(at), "@media print {\n  .foo {\n    color: red;\n  }\n}");
    }

    #[test]
    fn test_pretty_block_and_regular_at_rules() {
        let at = AtRule::block("font-face", content![Property::new("font-family", "x")]);
        assert_eq!(pretty(at), "@font-face {\n  font-family: x;\n}");
        assert_eq!(pretty(AtRule::regular("charset", r#""utf-8""#)), r#"@charset "utf-8";"#);
    }

    #[test]
    fn test_raw_passes_through_in_stylesheets() {
        let sheet = Node::Fragment(vec![
            Node::Raw(Raw::new("/* banner */")),
            Node::Rule(Rule::new(".a", content![color("red")])),
        ]);
        assert_eq!(compact(sheet), "/* banner */.a{color:red}");
    }
}
