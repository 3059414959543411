//! Placed components and their canonical markup.

use crate::emitter::emit_markup;
use crate::geometry::Frame;
use crate::id::ComponentId;
use crate::model::MarkupTree;
use crate::sanitize::{SanitizePolicy, SanitizeReport, clean_tree, sanitize_tree};
use kurbo::{Point, Size};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;

/// Longest prompt prefix used as a default name.
const NAME_MAX_CHARS: usize = 50;

/// Sanitized markup of one component.
///
/// The tree is the source of truth. The serialized string is cached and
/// re-emitted lazily after a mutation, so repeated renders do not pay for a
/// parse and serialize round trip.
#[derive(Debug, Clone)]
pub struct ComponentMarkup {
    tree: MarkupTree,
    text: String,
    text_dirty: bool,
}

impl ComponentMarkup {
    /// Sanitize untrusted markup.
    pub fn from_untrusted(raw: &str, policy: &SanitizePolicy) -> Self {
        let tree = sanitize_tree(raw, policy);
        let text = emit_markup(&tree);
        Self {
            tree,
            text,
            text_dirty: false,
        }
    }

    pub fn tree(&self) -> &MarkupTree {
        &self.tree
    }

    /// Mutate the tree. When `edit` returns `Some`, the tree is cleaned
    /// against `policy` again and the cached text is invalidated; `None`
    /// must mean the tree was left untouched.
    pub fn edit<R>(
        &mut self,
        policy: &SanitizePolicy,
        edit: impl FnOnce(&mut MarkupTree) -> Option<R>,
    ) -> Option<(R, SanitizeReport)> {
        let result = edit(&mut self.tree)?;
        let report = clean_tree(&mut self.tree, policy);
        self.text_dirty = true;
        Some((result, report))
    }

    /// Canonical markup, emitted on demand if the tree changed.
    pub fn canonical(&self) -> Cow<'_, str> {
        if self.text_dirty {
            Cow::Owned(emit_markup(&self.tree))
        } else {
            Cow::Borrowed(&self.text)
        }
    }

    /// Re-emit the cached text if the tree changed.
    pub fn flush(&mut self) -> &str {
        if self.text_dirty {
            self.text = emit_markup(&self.tree);
            self.text_dirty = false;
        }
        &self.text
    }
}

impl PartialEq for ComponentMarkup {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Serialize for ComponentMarkup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

/// Deserialized markup is untrusted and goes through the default policy.
impl<'de> Deserialize<'de> for ComponentMarkup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ComponentMarkup::from_untrusted(&raw, &SanitizePolicy::default()))
    }
}

/// One component instance on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedComponent {
    pub id: ComponentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub markup: ComponentMarkup,
    pub position: Point,
    pub size: Size,
    /// Recompute size from content once, then clear.
    #[serde(default)]
    pub auto_fit: bool,
}

impl PlacedComponent {
    pub fn new(id: ComponentId, markup: ComponentMarkup, frame: Frame, prompt: Option<&str>) -> Self {
        Self {
            id,
            name: default_name(id, prompt),
            prompt: prompt.map(str::to_owned),
            markup,
            position: frame.position,
            size: frame.size,
            auto_fit: true,
        }
    }

    pub fn frame(&self) -> Frame {
        Frame::new(self.position, self.size)
    }

    pub fn set_frame(&mut self, frame: Frame) {
        self.position = frame.position;
        self.size = frame.size;
    }
}

/// Display name derived from the prompt, or from the id when there is none.
pub fn default_name(id: ComponentId, prompt: Option<&str>) -> String {
    let prompt = prompt.map(str::trim).filter(|p| !p.is_empty());
    let Some(prompt) = prompt else {
        return format!("Component {}", id.suffix(3));
    };
    let mut chars = prompt.chars();
    let mut name: String = chars
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default();
    name.extend(chars.by_ref().take(NAME_MAX_CHARS - 1));
    if chars.next().is_some() {
        name.push_str("...");
    }
    name
}
