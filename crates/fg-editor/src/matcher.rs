//! Element identity matching and inspector commits.
//!
//! An inspector edit names an element through an `ElementDescriptor`
//! captured when the user clicked it. To apply the edit, the element has to
//! be found again in the component's canonical markup:
//!
//! - **By key**: the descriptor's `key` still names an element with the same
//!   tag. This is exact even when siblings share tag and text.
//! - **By content**: otherwise the first element in depth-first order whose
//!   tag and text content equal the descriptor's. Duplicates resolve to the
//!   first match.
//!
//! A commit either updates the tree and returns the refreshed descriptor,
//! or returns `None` and leaves the tree untouched.

use fg_core::emitter::{emit_children, emit_markup};
use fg_core::id::ElementKey;
use fg_core::model::MarkupTree;
use fg_core::parser::parse_fragment;
use fg_core::style::{get_property, parse_declarations, set_property, to_kebab_case};
use fg_core::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Computed style properties reported for a clicked element.
pub const INSPECTED_PROPERTIES: [&str; 9] = [
    "color",
    "background-color",
    "font-size",
    "font-weight",
    "margin",
    "padding",
    "border-radius",
    "width",
    "height",
];

/// Snapshot of a clicked element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    /// Lowercase tag name.
    pub tag_name: String,
    pub text_content: String,
    pub class_name: String,
    pub id: String,
    pub computed_styles: BTreeMap<String, String>,
    #[serde(rename = "innerHTML")]
    pub inner_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<ElementKey>,
}

/// An inspector edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// Property → value. Names may be camelCase or kebab-case.
    pub styles: BTreeMap<String, String>,
}

/// Describe the element at `idx`. Inspected properties missing from
/// `computed` fall back to the element's inline declarations.
pub fn describe(
    tree: &MarkupTree,
    idx: NodeIndex,
    computed: &BTreeMap<String, String>,
) -> Option<ElementDescriptor> {
    let el = tree.element(idx)?;
    let mut computed_styles: BTreeMap<String, String> = computed
        .iter()
        .map(|(k, v)| (to_kebab_case(k), v.clone()))
        .filter(|(k, _)| INSPECTED_PROPERTIES.contains(&k.as_str()))
        .collect();
    if let Some(style) = el.attr("style") {
        for decl in parse_declarations(style) {
            if INSPECTED_PROPERTIES.contains(&decl.property.as_str()) {
                computed_styles.entry(decl.property).or_insert(decl.value);
            }
        }
    }
    Some(ElementDescriptor {
        tag_name: el.tag.clone(),
        text_content: tree.text_content(idx),
        class_name: el.class_name().to_string(),
        id: el.html_id().to_string(),
        computed_styles,
        inner_html: emit_children(tree, idx),
        key: Some(el.key),
    })
}

/// First element in depth-first order whose tag (case-insensitive) and text
/// content equal the descriptor's.
pub fn find_first_match(tree: &MarkupTree, descriptor: &ElementDescriptor) -> Option<NodeIndex> {
    tree.elements().into_iter().find(|idx| {
        tree.element(*idx).is_some_and(|el| {
            el.tag.eq_ignore_ascii_case(&descriptor.tag_name)
                && tree.text_content(*idx) == descriptor.text_content
        })
    })
}

/// Find the descriptor's element, by key first and by content otherwise.
pub fn locate(tree: &MarkupTree, descriptor: &ElementDescriptor) -> Option<NodeIndex> {
    let by_key = descriptor
        .key
        .and_then(|key| tree.index_of_key(key))
        .filter(|idx| {
            tree.element(*idx)
                .is_some_and(|el| el.tag.eq_ignore_ascii_case(&descriptor.tag_name))
        });
    by_key.or_else(|| find_first_match(tree, descriptor))
}

fn apply_update(tree: &mut MarkupTree, idx: NodeIndex, update: &ElementUpdate) {
    if let Some(text) = &update.text_content {
        tree.set_text_content(idx, text);
    }
    if update.styles.is_empty() {
        return;
    }
    if let Some(el) = tree.element_mut(idx) {
        let mut style = el.attr("style").unwrap_or_default().to_string();
        for (property, value) in &update.styles {
            style = set_property(&style, property, value);
        }
        if style.is_empty() {
            el.remove_attr("style");
        } else {
            el.set_attr("style", style);
        }
    }
}

/// Apply an update to a tree and return the refreshed descriptor.
pub fn commit(
    tree: &mut MarkupTree,
    descriptor: &ElementDescriptor,
    update: &ElementUpdate,
) -> Option<(NodeIndex, ElementDescriptor)> {
    let Some(idx) = locate(tree, descriptor) else {
        log::debug!(
            "matcher: no <{}> with text {:?}, update dropped",
            descriptor.tag_name,
            descriptor.text_content
        );
        return None;
    };
    apply_update(tree, idx, update);

    let el = tree.element(idx)?;
    let mut computed_styles = descriptor.computed_styles.clone();
    for (property, value) in &update.styles {
        let property = to_kebab_case(property);
        if value.trim().is_empty() {
            computed_styles.remove(&property);
        } else {
            computed_styles.insert(property, value.trim().to_string());
        }
    }
    let refreshed = ElementDescriptor {
        tag_name: el.tag.clone(),
        text_content: tree.text_content(idx),
        class_name: el.class_name().to_string(),
        id: el.html_id().to_string(),
        computed_styles,
        inner_html: emit_children(tree, idx),
        key: Some(el.key),
    };
    Some((idx, refreshed))
}

/// Drop descriptor styles that the element's inline style no longer
/// carries after a sanitizer pass rejected them.
pub fn retain_surviving_styles(
    tree: &MarkupTree,
    idx: NodeIndex,
    descriptor: &mut ElementDescriptor,
    update: &ElementUpdate,
) {
    let style = tree
        .element(idx)
        .and_then(|el| el.attr("style"))
        .unwrap_or_default();
    for property in update.styles.keys() {
        let property = to_kebab_case(property);
        if get_property(style, &property).is_none() {
            descriptor.computed_styles.remove(&property);
        }
    }
    descriptor.inner_html = emit_children(tree, idx);
}

/// String form: parse `markup`, apply `update` to the first content match,
/// and re-serialize. `None` when nothing matches.
pub fn apply(markup: &str, descriptor: &ElementDescriptor, update: &ElementUpdate) -> Option<String> {
    let mut tree = parse_fragment(markup);
    let idx = find_first_match(&tree, descriptor)?;
    apply_update(&mut tree, idx, update);
    Some(emit_markup(&tree))
}
