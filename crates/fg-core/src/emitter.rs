//! Emitter: MarkupTree → HTML text.
//!
//! Serializes the way `innerHTML` does: attribute values are always double
//! quoted, text is escaped, raw-text elements are written verbatim and void
//! elements get no end tag.

use crate::id::ElementKey;
use crate::model::*;
use petgraph::graph::NodeIndex;
use std::fmt::Write;

/// Attribute carrying an element's key in DOM-facing markup.
pub const KEY_ATTRIBUTE: &str = "data-fg-key";

/// Attribute marking the element currently selected in edit mode.
pub const SELECTED_ATTRIBUTE: &str = "data-fg-selected";

#[derive(Clone, Copy)]
struct EmitOptions {
    keyed: bool,
    selected: Option<ElementKey>,
}

/// Emit the canonical markup of a tree.
#[must_use]
pub fn emit_markup(tree: &MarkupTree) -> String {
    emit_with(
        tree,
        tree.root,
        EmitOptions {
            keyed: false,
            selected: None,
        },
    )
}

/// Emit DOM-facing markup: every element carries `data-fg-key`, and the
/// `selected` element (if any) carries `data-fg-selected`.
#[must_use]
pub fn emit_markup_keyed(tree: &MarkupTree, selected: Option<ElementKey>) -> String {
    emit_with(
        tree,
        tree.root,
        EmitOptions {
            keyed: true,
            selected,
        },
    )
}

/// Emit the children of `idx` (its `innerHTML`).
#[must_use]
pub fn emit_children(tree: &MarkupTree, idx: NodeIndex) -> String {
    emit_with(
        tree,
        idx,
        EmitOptions {
            keyed: false,
            selected: None,
        },
    )
}

fn emit_with(tree: &MarkupTree, idx: NodeIndex, opts: EmitOptions) -> String {
    let mut out = String::with_capacity(256);
    let raw = tree.element(idx).is_some_and(|el| is_raw_text(&el.tag));
    for child in tree.children(idx) {
        emit_node(&mut out, tree, child, raw, opts);
    }
    out
}

fn emit_node(out: &mut String, tree: &MarkupTree, idx: NodeIndex, raw: bool, opts: EmitOptions) {
    match &tree.graph[idx] {
        MarkupNode::Root => {}
        MarkupNode::Text(text) if raw => out.push_str(text),
        MarkupNode::Text(text) => escape_text(out, text),
        MarkupNode::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
        MarkupNode::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_attr(out, &attr.value);
                out.push('"');
            }
            if opts.keyed {
                let _ = write!(out, " {KEY_ATTRIBUTE}=\"{}\"", el.key);
                if opts.selected == Some(el.key) {
                    let _ = write!(out, " {SELECTED_ATTRIBUTE}=\"true\"");
                }
            }
            out.push('>');
            if is_void(&el.tag) {
                return;
            }
            let raw_children = is_raw_text(&el.tag);
            for child in tree.children(idx) {
                emit_node(out, tree, child, raw_children, opts);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_fragment;
    use pretty_assertions::assert_eq;

    #[test]
    fn emit_normalizes_quotes_and_case() {
        let tree = parse_fragment("<DIV Class=card><P>Hi</P><BR></DIV>");
        assert_eq!(emit_markup(&tree), r#"<div class="card"><p>Hi</p><br></div>"#);
    }

    #[test]
    fn emit_escapes_text_and_attributes() {
        let tree = parse_fragment(r#"<span title="a &quot;q&quot; &amp; b">1 &lt; 2 &amp;&nbsp;3</span>"#);
        assert_eq!(
            emit_markup(&tree),
            r#"<span title="a &quot;q&quot; &amp; b">1 &lt; 2 &amp;&nbsp;3</span>"#
        );
    }

    #[test]
    fn emit_is_stable_on_second_pass() {
        let src = r#"<ul id="list"><li>One</li><li>Two <em>2</em></li></ul><!--c-->"#;
        let once = emit_markup(&parse_fragment(src));
        let twice = emit_markup(&parse_fragment(&once));
        assert_eq!(once, src);
        assert_eq!(once, twice);
    }

    #[test]
    fn emit_raw_text_verbatim() {
        let tree = parse_fragment("<style>a > b { color: red }</style>");
        assert_eq!(emit_markup(&tree), "<style>a > b { color: red }</style>");
    }

    #[test]
    fn emit_keyed_marks_selection() {
        let tree = parse_fragment("<div><p>a</p><p>b</p></div>");
        assert_eq!(
            emit_markup_keyed(&tree, Some(ElementKey(2))),
            r#"<div data-fg-key="0"><p data-fg-key="1">a</p><p data-fg-key="2" data-fg-selected="true">b</p></div>"#
        );
    }

    #[test]
    fn emit_children_is_inner_html() {
        let tree = parse_fragment("<button>Buy <b>now</b></button>");
        let button = tree.elements()[0];
        assert_eq!(emit_children(&tree, button), "Buy <b>now</b>");
    }
}
