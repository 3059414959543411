//! Allowlist sanitizer for untrusted component markup.
//!
//! Markup is parsed into a detached tree, pruned against the policy and
//! serialized again. Nothing is ever unwrapped: a disallowed element goes
//! with its whole subtree. Sanitizing never fails; malformed input degrades
//! to whatever partial tree the lenient parser produced.

use crate::emitter::emit_markup;
use crate::model::*;
use crate::parser::parse_fragment;
use crate::style::{parse_declarations, serialize_declarations};
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

const DEFAULT_TAGS: &[&str] = &[
    "div", "span", "p", "h1", "h2", "h3", "h4", "h5", "h6", "a", "button", "input", "label",
    "form", "img", "svg", "ul", "ol", "li", "table", "tr", "td", "th", "thead", "tbody",
    "section", "article", "header", "footer", "nav", "aside", "br", "hr", "strong", "em", "b",
    "i", "u", "code", "pre",
];

const DEFAULT_ATTRIBUTES: &[&str] = &[
    "class",
    "id",
    "style",
    "href",
    "src",
    "alt",
    "title",
    "type",
    "value",
    "placeholder",
    "disabled",
    "readonly",
    "required",
    "min",
    "max",
    "step",
    "width",
    "height",
    "aria-label",
    "aria-describedby",
    "role",
    "tabindex",
];

const DEFAULT_STYLE_PROPERTIES: &[&str] = &[
    "color",
    "background-color",
    "font-size",
    "font-weight",
    "text-align",
    "margin",
    "padding",
    "border",
    "border-radius",
    "width",
    "height",
    "display",
    "flex",
    "flex-direction",
    "justify-content",
    "align-items",
    "position",
    "top",
    "left",
    "right",
    "bottom",
    "opacity",
    "transform",
    "transition",
    "box-shadow",
    "z-index",
    "overflow",
    "cursor",
];

/// URL schemes that can execute or smuggle content.
const SCRIPT_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Substrings that disqualify a style value.
const STYLE_BLOCKLIST: &[&str] = &["expression", "javascript"];

/// Prefix reserved for the editor's own DOM annotations.
const RESERVED_ATTRIBUTE_PREFIX: &str = "data-fg-";

static DEFAULT_POLICY: LazyLock<SanitizePolicy> = LazyLock::new(SanitizePolicy::default);

/// Allowlists applied by the sanitizer. All entries are lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizePolicy {
    pub tags: BTreeSet<String>,
    pub attributes: BTreeSet<String>,
    pub style_properties: BTreeSet<String>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        let set = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            tags: set(DEFAULT_TAGS),
            attributes: set(DEFAULT_ATTRIBUTES),
            style_properties: set(DEFAULT_STYLE_PROPERTIES),
        }
    }
}

impl SanitizePolicy {
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }

    pub fn allows_attribute(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        !name.starts_with(RESERVED_ATTRIBUTE_PREFIX) && self.attributes.contains(&name)
    }

    pub fn allows_style_property(&self, property: &str) -> bool {
        self.style_properties.contains(&property.to_ascii_lowercase())
    }
}

/// What a sanitizer pass removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeReport {
    pub scripts: usize,
    pub elements: usize,
    pub comments: usize,
    pub attributes: usize,
    pub declarations: usize,
}

impl SanitizeReport {
    /// True when the pass removed nothing.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Sanitize with the default policy.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    sanitize_with(raw, &DEFAULT_POLICY)
}

/// Sanitize with an explicit policy.
#[must_use]
pub fn sanitize_with(raw: &str, policy: &SanitizePolicy) -> String {
    emit_markup(&sanitize_tree(raw, policy))
}

/// Parse and clean, keeping the tree.
#[must_use]
pub fn sanitize_tree(raw: &str, policy: &SanitizePolicy) -> MarkupTree {
    let mut tree = parse_fragment(raw);
    clean_tree(&mut tree, policy);
    tree
}

enum Verdict {
    DropComment,
    DropElement,
    Keep,
}

/// Prune a tree in place against `policy`.
pub fn clean_tree(tree: &mut MarkupTree, policy: &SanitizePolicy) -> SanitizeReport {
    let mut report = SanitizeReport::default();

    // Scripts first, whatever the policy says about the tag.
    let scripts: Vec<NodeIndex> = tree
        .elements()
        .into_iter()
        .filter(|idx| tree.element(*idx).is_some_and(|el| el.tag == "script"))
        .collect();
    for idx in scripts {
        if tree.graph.contains_node(idx) {
            tree.remove_subtree(idx);
            report.scripts += 1;
        }
    }

    let mut stack = vec![tree.root];
    while let Some(parent) = stack.pop() {
        for child in tree.children(parent) {
            let verdict = match &tree.graph[child] {
                MarkupNode::Comment(_) => Verdict::DropComment,
                MarkupNode::Element(el) if !policy.allows_tag(&el.tag) => Verdict::DropElement,
                MarkupNode::Element(_) => Verdict::Keep,
                MarkupNode::Text(_) | MarkupNode::Root => continue,
            };
            match verdict {
                Verdict::DropComment => {
                    tree.remove_subtree(child);
                    report.comments += 1;
                }
                Verdict::DropElement => {
                    tree.remove_subtree(child);
                    report.elements += 1;
                }
                Verdict::Keep => {
                    if let Some(el) = tree.element_mut(child) {
                        clean_attributes(el, policy, &mut report);
                    }
                    stack.push(child);
                }
            }
        }
    }

    if !report.is_clean() {
        log::debug!("sanitized markup: {report:?}");
    }
    report
}

fn clean_attributes(el: &mut Element, policy: &SanitizePolicy, report: &mut SanitizeReport) {
    let before = el.attrs.len();
    el.attrs.retain(|attr| {
        let name = attr.name.to_ascii_lowercase();
        if name.starts_with("on") || !policy.allows_attribute(&name) {
            return false;
        }
        name == "style" || !is_script_bearing(&attr.value)
    });
    report.attributes += before - el.attrs.len();

    if let Some(style) = el.attr("style").map(str::to_owned) {
        match clean_style(&style, policy, report) {
            Some(cleaned) => el.set_attr("style", cleaned),
            None => {
                el.remove_attr("style");
                report.attributes += 1;
            }
        }
    }
}

/// Filter a style attribute's declarations. `None` when nothing survives.
pub fn clean_style(
    style: &str,
    policy: &SanitizePolicy,
    report: &mut SanitizeReport,
) -> Option<String> {
    let total = style.split(';').filter(|c| !c.trim().is_empty()).count();
    let kept: Vec<_> = parse_declarations(style)
        .into_iter()
        .filter(|d| {
            let value = d.value.to_ascii_lowercase();
            policy.allows_style_property(&d.property)
                && !STYLE_BLOCKLIST.iter().any(|bad| value.contains(bad))
                && !is_script_bearing(&d.value)
        })
        .collect();
    report.declarations += total.saturating_sub(kept.len());
    if kept.is_empty() {
        None
    } else {
        Some(serialize_declarations(&kept))
    }
}

/// True when the value, with whitespace and control characters removed and
/// lowercased, names a scriptable URL scheme. Entity references are already
/// decoded by the parser.
pub fn is_script_bearing(value: &str) -> bool {
    let normalized: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    SCRIPT_SCHEMES.iter().any(|scheme| normalized.contains(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn removes_scripts() {
        assert_eq!(sanitize("<p>a</p><script>alert(1)</script>"), "<p>a</p>");
        assert_eq!(sanitize("<div><SCRIPT src=x></SCRIPT>b</div>"), "<div>b</div>");
    }

    #[test]
    fn removes_disallowed_subtrees_without_unwrapping() {
        assert_eq!(
            sanitize("<div><iframe><p>inside</p></iframe><p>ok</p></div>"),
            "<div><p>ok</p></div>"
        );
        assert_eq!(sanitize("<style>p{}</style><p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn strips_event_handlers_and_unknown_attributes() {
        assert_eq!(
            sanitize(r#"<button onclick="x()" ONMOUSEOVER="y" data-id="1" class="btn">Go</button>"#),
            r#"<button class="btn">Go</button>"#
        );
    }

    #[test]
    fn strips_script_urls_after_decoding() {
        assert_eq!(sanitize(r#"<a href="javascript:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(sanitize(r#"<a href=" JaVa Script:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(sanitize(r#"<a href="java&#x09;script&colon;x">x</a>"#), "<a>x</a>");
        assert_eq!(sanitize(r#"<img src="data:image/svg+xml;base64,AAAA">"#), "<img>");
        assert_eq!(
            sanitize(r#"<a href="https://example.com">x</a>"#),
            r#"<a href="https://example.com">x</a>"#
        );
    }

    #[test]
    fn drops_data_urls_inside_style() {
        let out = sanitize(
            r#"<div style="color: red; cursor: url(data:image/svg+xml,abc), auto">x</div>"#,
        );
        assert_eq!(out, r#"<div style="color: red">x</div>"#);
        assert_eq!(
            sanitize(r#"<div style="cursor: url( DA&#x09;TA:x)">x</div>"#),
            "<div>x</div>"
        );
    }

    #[test]
    fn style_example_keeps_allowlisted_and_drops_script_url() {
        assert_eq!(
            sanitize(r#"<div style="color:red;position:fixed;background-image:url(javascript:alert(1))">x</div>"#),
            r#"<div style="color: red; position: fixed">x</div>"#
        );
    }

    #[test]
    fn filters_style_declarations() {
        assert_eq!(
            sanitize(r#"<div style="color: red; behavior: url(x.htc); width: expression(alert(1)); padding:4px">x</div>"#),
            r#"<div style="color: red; padding: 4px">x</div>"#
        );
        assert_eq!(
            sanitize(r#"<div style="background-image: url(javascript:x)">x</div>"#),
            "<div>x</div>"
        );
        assert_eq!(sanitize(r#"<div style="COLOR: JavaScript:x">x</div>"#), "<div>x</div>");
    }

    #[test]
    fn removes_comments() {
        assert_eq!(sanitize("<p>a<!-- secret --></p>"), "<p>a</p>");
    }

    #[test]
    fn strips_reserved_key_attribute() {
        let mut policy = SanitizePolicy::default();
        policy.attributes.insert("data-fg-key".into());
        assert_eq!(sanitize_with(r#"<p data-fg-key="9">a</p>"#, &policy), "<p>a</p>");
    }

    #[test]
    fn custom_policy_extends_tags() {
        let mut policy = SanitizePolicy::default();
        policy.tags.insert("blockquote".into());
        assert_eq!(
            sanitize_with("<blockquote>q</blockquote>", &policy),
            "<blockquote>q</blockquote>"
        );
        assert_eq!(sanitize("<blockquote>q</blockquote>"), "");
    }

    #[test]
    fn report_counts_removals() {
        let mut tree = parse_fragment(
            r#"<div onclick="x" style="color: red; float: left"><script></script><!--c--><iframe></iframe></div>"#,
        );
        let report = clean_tree(&mut tree, &SanitizePolicy::default());
        assert_eq!(
            report,
            SanitizeReport {
                scripts: 1,
                elements: 1,
                comments: 1,
                attributes: 1,
                declarations: 1,
            }
        );
        let again = clean_tree(&mut tree, &SanitizePolicy::default());
        assert!(again.is_clean());
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: SanitizePolicy =
            serde_json::from_str(r#"{"tags": ["p"]}"#).expect("policy json");
        assert!(policy.allows_tag("P"));
        assert!(!policy.allows_tag("div"));
        assert!(policy.allows_attribute("class"));
    }

    #[test]
    fn malformed_input_degrades() {
        assert_eq!(sanitize("<div><p>unclosed"), "<div><p>unclosed</p></div>");
        assert_eq!(sanitize("<<script>>x"), "&lt;");
        assert_eq!(sanitize(""), "");
    }
}
