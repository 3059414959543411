//! Canvas-wide selection state.
//!
//! Three single-owner resources live here: the selected component, the
//! edit session (at most one component in edit mode) and the element
//! marked inside that session. Acquiring any of them for a new target
//! releases it from the previous holder first.

use crate::matcher::ElementDescriptor;
use fg_core::id::{ComponentId, ElementKey};

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub component: ComponentId,
    /// Element clicked inside the component, if any.
    pub element: Option<ElementDescriptor>,
}

#[derive(Debug, Default)]
pub struct SelectionRegistry {
    selected: Option<ComponentId>,
    edit: Option<EditSession>,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<ComponentId> {
        self.selected
    }

    pub fn select(&mut self, id: ComponentId) {
        self.selected = Some(id);
    }

    /// Clear the selection. Also ends any edit session.
    pub fn clear(&mut self) -> Option<EditSession> {
        self.selected = None;
        self.edit.take()
    }

    /// Component holding the edit session.
    pub fn editing(&self) -> Option<ComponentId> {
        self.edit.as_ref().map(|s| s.component)
    }

    pub fn is_editing(&self, id: ComponentId) -> bool {
        self.editing() == Some(id)
    }

    /// Start an edit session on `id`, selecting it. Returns the previous
    /// holder when the session moved from another component.
    pub fn begin_edit(&mut self, id: ComponentId) -> Option<ComponentId> {
        self.selected = Some(id);
        if self.is_editing(id) {
            return None;
        }
        let previous = self.edit.take().map(|s| s.component);
        self.edit = Some(EditSession {
            component: id,
            element: None,
        });
        previous
    }

    /// End the edit session if `id` holds it.
    pub fn end_edit(&mut self, id: ComponentId) -> Option<EditSession> {
        if self.is_editing(id) {
            self.edit.take()
        } else {
            None
        }
    }

    /// Mark an element inside the session. Fails unless `id` holds it.
    /// Replaces any previously marked element.
    pub fn mark_element(&mut self, id: ComponentId, descriptor: ElementDescriptor) -> bool {
        match &mut self.edit {
            Some(session) if session.component == id => {
                session.element = Some(descriptor);
                true
            }
            _ => false,
        }
    }

    pub fn unmark_element(&mut self) -> Option<ElementDescriptor> {
        self.edit.as_mut().and_then(|s| s.element.take())
    }

    pub fn marked_element(&self) -> Option<&ElementDescriptor> {
        self.edit.as_ref().and_then(|s| s.element.as_ref())
    }

    /// Key of the marked element inside `id`, for rendering the mark.
    pub fn marked_key(&self, id: ComponentId) -> Option<ElementKey> {
        self.edit
            .as_ref()
            .filter(|s| s.component == id)
            .and_then(|s| s.element.as_ref())
            .and_then(|d| d.key)
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    /// Forget `id` after it was removed from the canvas.
    pub fn release(&mut self, id: ComponentId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.end_edit(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn descriptor(key: u32) -> ElementDescriptor {
        ElementDescriptor {
            tag_name: "p".into(),
            text_content: "t".into(),
            class_name: String::new(),
            id: String::new(),
            computed_styles: BTreeMap::new(),
            inner_html: "t".into(),
            key: Some(ElementKey(key)),
        }
    }

    #[test]
    fn edit_session_is_single_owner() {
        let a = ComponentId::intern("sel_a");
        let b = ComponentId::intern("sel_b");
        let mut reg = SelectionRegistry::new();
        assert_eq!(reg.begin_edit(a), None);
        assert!(reg.mark_element(a, descriptor(1)));
        assert_eq!(reg.begin_edit(b), Some(a));
        assert_eq!(reg.editing(), Some(b));
        assert_eq!(reg.selected(), Some(b));
        // The mark went with a's session.
        assert_eq!(reg.marked_element(), None);
    }

    #[test]
    fn mark_requires_session_holder() {
        let a = ComponentId::intern("sel_c");
        let b = ComponentId::intern("sel_d");
        let mut reg = SelectionRegistry::new();
        assert!(!reg.mark_element(a, descriptor(0)));
        reg.begin_edit(a);
        assert!(!reg.mark_element(b, descriptor(0)));
        assert!(reg.mark_element(a, descriptor(3)));
        assert!(reg.mark_element(a, descriptor(4)));
        assert_eq!(reg.marked_key(a), Some(ElementKey(4)));
        assert_eq!(reg.marked_key(b), None);
    }

    #[test]
    fn end_edit_only_by_holder() {
        let a = ComponentId::intern("sel_e");
        let b = ComponentId::intern("sel_f");
        let mut reg = SelectionRegistry::new();
        reg.begin_edit(a);
        assert!(reg.end_edit(b).is_none());
        let session = reg.end_edit(a).expect("session");
        assert_eq!(session.component, a);
        assert_eq!(reg.editing(), None);
        assert_eq!(reg.selected(), Some(a));
    }

    #[test]
    fn clear_and_release() {
        let a = ComponentId::intern("sel_g");
        let mut reg = SelectionRegistry::new();
        reg.begin_edit(a);
        assert!(reg.clear().is_some());
        assert_eq!(reg.selected(), None);

        reg.begin_edit(a);
        reg.release(a);
        assert_eq!(reg.selected(), None);
        assert_eq!(reg.editing(), None);
    }
}
