//! JSON wire format for node trees.
//!
//! External programs print trees as JSON. Classification follows the node
//! constructors: falsy values drop, arrays flatten, scalars become text and
//! `$`-keyed objects become nodes.
//!
//! | JSON                                               | Node          |
//! |----------------------------------------------------|---------------|
//! | `{"$tag": "div", "$class": ["a"], "$content": []}` | `Element`     |
//! | `{"$rule": ".a", "$content": []}`                  | `Rule`        |
//! | `{"$property": "color", "$value": "red"}`          | `Property`    |
//! | `{"$raw": "<b>x</b>"}`                             | `Raw`         |
//! | `{"$markdown": "*x*"}`                             | `Raw` (HTML)  |
//! | `{"$at": "media", "$prelude": "print", ...}`       | `AtRule`      |
//! | `{"href": "/"}`                                    | attributes    |

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

use super::{Compiled, SourceKind, TemplateRecord};
use crate::markup::{
    AtRule, AtRuleKind, Content, Element, Node, Property, Raw, Rule, at_rule_kind, element,
    markdown,
};
use crate::site::Page;

/// Key marking a page that must be rendered with a context.
pub const FUNCTION_KEY: &str = "$function";

/// Decode one JSON value into constructor content.
pub fn decode(value: &Value) -> Result<Content> {
    Ok(match value {
        Value::Null | Value::Bool(false) => Content::Empty,
        Value::Bool(true) => Content::Bool(true),
        Value::Number(n) => Content::Text(n.to_string()),
        Value::String(s) => Content::Text(s.clone()),
        Value::Array(items) => Content::List(items.iter().map(decode).collect::<Result<_>>()?),
        Value::Object(map) => decode_object(map)?,
    })
}

/// Decode a JSON value into a standalone node.
pub fn decode_node(value: &Value) -> Result<Node> {
    decode(value).map(Node::from_content)
}

fn decode_object(map: &Map<String, Value>) -> Result<Content> {
    if let Some(tag) = map.get("$tag") {
        return decode_element(tag, map).map(Content::from);
    }
    if let Some(selector) = map.get("$rule") {
        let selector = as_str(selector, "$rule")?;
        return Ok(Rule::new(selector, contents(map)?).into());
    }
    if let Some(name) = map.get("$property") {
        let name = as_str(name, "$property")?;
        let value = map.get("$value").map(scalar).unwrap_or_default();
        return Ok(Property::new(name, value).into());
    }
    if let Some(text) = map.get("$raw") {
        return Ok(Raw::new(scalar(text)).into());
    }
    if let Some(text) = map.get("$markdown") {
        return Ok(markdown(as_str(text, "$markdown")?).into());
    }
    if let Some(keyword) = map.get("$at") {
        return decode_at_rule(as_str(keyword, "$at")?, map).map(Content::from);
    }

    let mut attributes = Vec::with_capacity(map.len());
    for (name, value) in map {
        match value {
            Value::Null | Value::Bool(false) => {}
            Value::Bool(true) => attributes.push((name.clone(), String::new())),
            _ => attributes.push((name.clone(), scalar(value))),
        }
    }
    Ok(Content::Attributes(attributes))
}

fn decode_element(tag: &Value, map: &Map<String, Value>) -> Result<Element> {
    let mut builder = element(as_str(tag, "$tag")?);
    if let Some(is_void) = map.get("$void") {
        builder = builder.void(is_void.as_bool().context("`$void` must be a boolean")?);
    }
    match map.get("$class") {
        None | Some(Value::Null) => {}
        Some(Value::String(classes)) => {
            for class in classes.split_whitespace() {
                builder = builder.add_class(class);
            }
        }
        Some(Value::Array(classes)) => {
            for class in classes {
                builder = builder.add_class(as_str(class, "$class")?);
            }
        }
        Some(_) => bail!("`$class` must be a string or an array of strings"),
    }
    Ok(builder.build(contents(map)?))
}

fn decode_at_rule(keyword: &str, map: &Map<String, Value>) -> Result<AtRule> {
    let prelude = map.get("$prelude").map(scalar).unwrap_or_default();
    Ok(match at_rule_kind(keyword).unwrap_or(AtRuleKind::Nested) {
        AtRuleKind::Regular => AtRule::regular(keyword, prelude),
        AtRuleKind::Block => AtRule::block(keyword, contents(map)?),
        AtRuleKind::Nested => AtRule::nested(keyword, prelude, contents(map)?),
    })
}

fn contents(map: &Map<String, Value>) -> Result<Vec<Content>> {
    match map.get("$content") {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(decode).collect(),
        Some(other) => Ok(vec![decode(other)?]),
    }
}

fn as_str<'a>(value: &'a Value, key: &str) -> Result<&'a str> {
    value
        .as_str()
        .with_context(|| format!("`{key}` must be a string"))
}

/// Render a scalar as text; structured values keep their JSON form.
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Compile results
// ============================================================================

/// Decode a program's compile output for a source of `kind`.
///
/// `dynamic` supplies the page body when a template page is marked
/// `{"$function": true}`.
pub fn decode_compiled(
    kind: SourceKind,
    value: &Value,
    dynamic: impl FnOnce() -> Page,
) -> Result<Compiled> {
    if kind != SourceKind::Template {
        return decode_node(value).map(Compiled::Content);
    }

    let Some(map) = value.as_object().filter(|m| m.contains_key("page")) else {
        return Ok(Compiled::Template(TemplateRecord::new(Page::Static(
            decode_node(value)?,
        ))));
    };

    let page = match map.get("page") {
        Some(page) if is_function(page) => dynamic(),
        Some(page) => Page::Static(decode_node(page)?),
        None => Page::Static(Node::empty()),
    };

    let mut record = TemplateRecord::new(page);
    record.date = optional_string(map, "date")?;
    record.author = optional_string(map, "author")?;
    record.summary = optional_string(map, "summary")?;
    record.title = optional_string(map, "title")?;
    record.feed = optional_bool(map, "feed")?;
    record.map = optional_bool(map, "map")?;
    record.tags = match map.get("tags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(tags)) => tags
            .iter()
            .map(|t| as_str(t, "tags").map(str::to_owned))
            .collect::<Result<_>>()?,
        Some(_) => bail!("`tags` must be an array of strings"),
    };
    Ok(Compiled::Template(record))
}

fn is_function(value: &Value) -> bool {
    value
        .get(FUNCTION_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => bail!("`{key}` must be a string"),
    }
}

fn optional_bool(map: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => bail!("`{key}` must be a boolean"),
    }
}
