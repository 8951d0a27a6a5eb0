//! Element serialization.

use super::{Printer, escape_html, is_visible, write_node};
use crate::markup::Element;

pub(super) fn write_element(p: &mut Printer, element: &Element) {
    p.item();
    p.push("<");
    p.push(&element.tag);

    for (name, value) in element.attributes.iter() {
        p.push(" ");
        p.push(name);
        p.push("=\"");
        p.push(&escape_html(value));
        p.push("\"");
    }

    if !element.style.is_empty() {
        let style = element
            .style
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        p.push(" style=\"");
        p.push(&escape_html(&style));
        p.push("\"");
    }
    p.push(">");

    if element.is_void {
        return;
    }

    if element.children.iter().any(is_visible) {
        p.enter();
        for child in &element.children {
            write_node(p, child);
        }
        p.leave();
    }

    p.push("</");
    p.push(&element.tag);
    p.push(">");
}
