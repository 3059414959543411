//! Canvas host: the composition root of the editor.
//!
//! Owns the placed components (z-order = list order), one interaction state
//! machine per component, the selection registry, the viewport and the
//! configuration. Browser events come in here in screen coordinates and
//! leave as component mutations, capture changes and sanitized markup.
//!
//! The host is the only writer of component geometry and markup:
//!
//! - **Geometry** changes flow through [`ComponentMutation`]s produced by the
//!   interaction machines and auto-fit, applied with [`CanvasHost::apply_mutation`].
//! - **Markup** changes go through explicit commits (creation, regeneration,
//!   element updates, import), each of which re-sanitizes.

use crate::autofit::{AutoFit, ScratchSurface};
use crate::hit::hit_test;
use crate::input::{InputEvent, Modifiers};
use crate::interaction::{CaptureChange, Context, InteractionMachine, InteractionPhase};
use crate::matcher::{self, ElementDescriptor, ElementUpdate};
use crate::selection::SelectionRegistry;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use fg_core::config::CanvasConfig;
use fg_core::emitter::emit_markup_keyed;
use fg_core::geometry::Frame;
use fg_core::id::{ComponentId, ElementKey};
use fg_core::snapshot::{self, SnapshotError};
use fg_core::{ComponentMarkup, PlacedComponent, Point, Size, Vec2, default_name};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

// ─── Mutations ───────────────────────────────────────────────────────────

/// A geometry change to one component.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentMutation {
    Move { id: ComponentId, position: Point },
    Reframe { id: ComponentId, frame: Frame },
    Resize { id: ComponentId, size: Size },
}

/// What a host operation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    /// Something visible changed and the view should re-render.
    pub changed: bool,
    /// Document-level pointer listeners should be attached or detached.
    pub capture: Option<CaptureChange>,
}

// ─── Viewport ────────────────────────────────────────────────────────────

/// Screen = pan + canvas × zoom / 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub pan: Vec2,
    /// Zoom in percent.
    pub zoom: f64,
}

impl Viewport {
    pub fn scale(&self) -> f64 {
        self.zoom / 100.0
    }

    pub fn to_canvas(&self, screen: Point) -> Point {
        let scale = self.scale();
        let p = screen - self.pan;
        Point::new(p.x / scale, p.y / scale)
    }

    pub fn to_screen(&self, canvas: Point) -> Point {
        let scale = self.scale();
        Point::new(canvas.x * scale, canvas.y * scale) + self.pan
    }
}

#[derive(Debug, Default)]
struct PanState {
    /// Pan key held.
    armed: bool,
    /// Screen point minus pan at pointer-down while panning.
    anchor: Option<Vec2>,
}

// ─── Host ────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct CanvasItem {
    component: PlacedComponent,
    interaction: InteractionMachine,
    /// When the pending auto-fit may run, once observed.
    fit_due_ms: Option<f64>,
}

impl CanvasItem {
    fn new(component: PlacedComponent) -> Self {
        Self {
            component,
            interaction: InteractionMachine::new(),
            fit_due_ms: None,
        }
    }
}

#[derive(Debug)]
pub struct CanvasHost {
    items: Vec<CanvasItem>,
    registry: SelectionRegistry,
    viewport: Viewport,
    config: CanvasConfig,
    auto_fit: AutoFit,
    pan: PanState,
}

impl Default for CanvasHost {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl CanvasHost {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            items: Vec::new(),
            registry: SelectionRegistry::new(),
            viewport: Viewport {
                pan: config.zoom.initial_pan,
                zoom: config.zoom.clamp(config.zoom.initial),
            },
            auto_fit: AutoFit::from_config(&config),
            config,
            pan: PanState::default(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selection(&self) -> &SelectionRegistry {
        &self.registry
    }

    /// Components in z-order (last is topmost).
    pub fn components(&self) -> impl DoubleEndedIterator<Item = &PlacedComponent> + Clone {
        self.items.iter().map(|item| &item.component)
    }

    pub fn get(&self, id: ComponentId) -> Option<&PlacedComponent> {
        self.item(id).map(|item| &item.component)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.anchor.is_some()
    }

    pub fn phase(&self, id: ComponentId) -> Option<InteractionPhase> {
        let item = self.item(id)?;
        if self.registry.is_editing(id) {
            return Some(InteractionPhase::EditSelecting);
        }
        Some(item.interaction.phase())
    }

    /// True while any component holds pointer capture.
    pub fn capture_held(&self) -> bool {
        self.items.iter().any(|item| item.interaction.is_active())
    }

    fn item(&self, id: ComponentId) -> Option<&CanvasItem> {
        self.items.iter().find(|item| item.component.id == id)
    }

    fn item_mut(&mut self, id: ComponentId) -> Option<&mut CanvasItem> {
        self.items.iter_mut().find(|item| item.component.id == id)
    }

    /// Build a response, deriving the capture change from whether capture
    /// was held before the operation. This pairs acquire and release at
    /// the host boundary whatever happened to individual machines.
    fn respond(&self, held_before: bool, changed: bool) -> Response {
        let capture = match (held_before, self.capture_held()) {
            (false, true) => Some(CaptureChange::Acquire),
            (true, false) => Some(CaptureChange::Release),
            _ => None,
        };
        Response { changed, capture }
    }

    // ─── Component lifecycle ─────────────────────────────────────────────

    /// Sanitize and place a new component at the default frame, then
    /// select it.
    pub fn add_component(&mut self, raw_markup: &str, prompt: Option<&str>) -> ComponentId {
        let id = ComponentId::generate();
        let markup = ComponentMarkup::from_untrusted(raw_markup, &self.config.sanitize);
        let mut frame = self.config.placement.frame();
        frame.size = self.config.bounds.clamp(frame.size);
        self.items
            .push(CanvasItem::new(PlacedComponent::new(id, markup, frame, prompt)));
        self.registry.select(id);
        log::debug!("canvas: added {id}");
        id
    }

    /// Replace a component's markup with freshly generated output.
    pub fn regenerate(&mut self, id: ComponentId, raw_markup: &str, prompt: Option<&str>) -> bool {
        let markup = ComponentMarkup::from_untrusted(raw_markup, &self.config.sanitize);
        let Some(item) = self.item_mut(id) else {
            return false;
        };
        item.component.markup = markup;
        if let Some(prompt) = prompt {
            item.component.name = default_name(id, Some(prompt));
            item.component.prompt = Some(prompt.to_string());
        }
        item.component.auto_fit = true;
        item.fit_due_ms = None;
        if self.registry.is_editing(id) {
            self.registry.unmark_element();
        }
        log::debug!("canvas: regenerated {id}");
        true
    }

    pub fn remove(&mut self, id: ComponentId) -> Response {
        let held_before = self.capture_held();
        let Some(pos) = self.items.iter().position(|item| item.component.id == id) else {
            return Response::default();
        };
        self.items.remove(pos);
        self.registry.release(id);
        log::debug!("canvas: removed {id}");
        self.respond(held_before, true)
    }

    /// Copy a component with an offset and a new id, and select the copy.
    pub fn duplicate(&mut self, id: ComponentId) -> Option<ComponentId> {
        let source = self.get(id)?;
        let mut copy = source.clone();
        copy.id = ComponentId::generate();
        copy.position += self.config.placement.duplicate_offset;
        copy.auto_fit = false;
        let new_id = copy.id;
        self.items.push(CanvasItem::new(copy));
        self.registry.select(new_id);
        log::debug!("canvas: duplicated {id} as {new_id}");
        Some(new_id)
    }

    pub fn rename(&mut self, id: ComponentId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.item_mut(id) {
            Some(item) => {
                item.component.name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn select(&mut self, id: ComponentId) -> bool {
        if self.item(id).is_none() {
            return false;
        }
        self.registry.select(id);
        true
    }

    /// Clear the selection and end any edit session.
    pub fn clear_selection(&mut self) -> bool {
        let had = self.registry.selected().is_some() || self.registry.editing().is_some();
        self.registry.clear();
        had
    }

    /// Apply a geometry mutation. Sizes are clamped to bounds.
    pub fn apply_mutation(&mut self, mutation: ComponentMutation) -> bool {
        let bounds = self.config.bounds;
        match mutation {
            ComponentMutation::Move { id, position } => match self.item_mut(id) {
                Some(item) => {
                    item.component.position = position;
                    true
                }
                None => false,
            },
            ComponentMutation::Reframe { id, frame } => match self.item_mut(id) {
                Some(item) => {
                    item.component.set_frame(Frame::new(frame.position, bounds.clamp(frame.size)));
                    true
                }
                None => false,
            },
            ComponentMutation::Resize { id, size } => match self.item_mut(id) {
                Some(item) => {
                    item.component.size = bounds.clamp(size);
                    true
                }
                None => false,
            },
        }
    }

    // ─── Pointer routing ─────────────────────────────────────────────────

    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) -> Response {
        let held_before = self.capture_held();

        if self.pan.armed {
            self.pan.anchor = Some(screen.to_vec2() - self.viewport.pan);
            return self.respond(held_before, false);
        }

        let at = self.viewport.to_canvas(screen);
        let handle_extent = self.config.handle_size / self.viewport.scale();
        let hit = hit_test(
            self.components(),
            self.registry.selected(),
            self.registry.editing(),
            at,
            handle_extent,
        );

        let Some(hit) = hit else {
            for item in &mut self.items {
                item.interaction.cancel();
            }
            let changed = self.clear_selection();
            return self.respond(held_before, changed);
        };

        // A new gesture supersedes any stale one on another component.
        for item in self.items.iter_mut().filter(|item| item.component.id != hit.id) {
            item.interaction.cancel();
        }
        self.registry.select(hit.id);

        let edit_mode = self.registry.is_editing(hit.id);
        let event = InputEvent::pointer_down(at, modifiers);
        let bounds = self.config.bounds;
        if let Some(item) = self.item_mut(hit.id) {
            let cx = Context {
                id: hit.id,
                frame: item.component.frame(),
                edit_mode,
                bounds: &bounds,
            };
            item.interaction.handle(&event, Some(hit.target), cx);
        }
        self.respond(held_before, true)
    }

    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers) -> Response {
        let held_before = self.capture_held();

        if let Some(anchor) = self.pan.anchor {
            self.viewport.pan = screen.to_vec2() - anchor;
            return self.respond(held_before, true);
        }

        let event = InputEvent::pointer_move(self.viewport.to_canvas(screen), modifiers);
        let bounds = self.config.bounds;
        let mut mutations = Vec::new();
        for item in self.items.iter_mut().filter(|item| item.interaction.is_active()) {
            let cx = Context {
                id: item.component.id,
                frame: item.component.frame(),
                edit_mode: false,
                bounds: &bounds,
            };
            mutations.extend(item.interaction.handle(&event, None, cx).mutations);
        }
        let mut changed = false;
        for mutation in mutations {
            changed |= self.apply_mutation(mutation);
        }
        self.respond(held_before, changed)
    }

    pub fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) -> Response {
        let held_before = self.capture_held();
        if self.pan.anchor.take().is_some() {
            return self.respond(held_before, false);
        }
        let event = InputEvent::pointer_up(self.viewport.to_canvas(screen), modifiers);
        let bounds = self.config.bounds;
        for item in &mut self.items {
            let cx = Context {
                id: item.component.id,
                frame: item.component.frame(),
                edit_mode: false,
                bounds: &bounds,
            };
            item.interaction.handle(&event, None, cx);
        }
        self.respond(held_before, false)
    }

    /// Abort every gesture (window blur, lost capture).
    pub fn cancel_interaction(&mut self) -> Response {
        let held_before = self.capture_held();
        self.pan.anchor = None;
        for item in &mut self.items {
            item.interaction.cancel();
        }
        self.respond(held_before, false)
    }

    // ─── Edit mode ───────────────────────────────────────────────────────

    /// Enter or leave edit mode. Entering moves the edit session to `id`
    /// and cancels every in-flight drag or resize.
    pub fn set_edit_mode(&mut self, id: ComponentId, on: bool) -> Response {
        let held_before = self.capture_held();
        if self.item(id).is_none() {
            return Response::default();
        }
        let changed = if on {
            for item in &mut self.items {
                item.interaction.cancel();
            }
            if let Some(previous) = self.registry.begin_edit(id) {
                log::debug!("canvas: edit session moved from {previous} to {id}");
            }
            true
        } else {
            self.registry.end_edit(id).is_some()
        };
        self.respond(held_before, changed)
    }

    /// Record a click on an element inside the edit-mode component.
    /// `computed` holds the browser's computed styles for the element.
    pub fn click_element(
        &mut self,
        id: ComponentId,
        key: ElementKey,
        computed: &BTreeMap<String, String>,
    ) -> Option<ElementDescriptor> {
        if !self.registry.is_editing(id) {
            return None;
        }
        let tree = self.get(id)?.markup.tree();
        let idx = tree.index_of_key(key)?;
        let descriptor = matcher::describe(tree, idx, computed)?;
        self.registry.mark_element(id, descriptor.clone());
        Some(descriptor)
    }

    pub fn selected_element(&self) -> Option<&ElementDescriptor> {
        self.registry.marked_element()
    }

    /// Apply an inspector edit to the marked element. Either the markup is
    /// updated, re-sanitized and the descriptor refreshed, or nothing
    /// changes and `false` is returned.
    pub fn commit_element_update(&mut self, update: &ElementUpdate) -> bool {
        let Some(session) = self.registry.session() else {
            return false;
        };
        let Some(descriptor) = session.element.clone() else {
            return false;
        };
        let id = session.component;
        let Some(item) = self.items.iter_mut().find(|item| item.component.id == id) else {
            return false;
        };
        let committed = item
            .component
            .markup
            .edit(&self.config.sanitize, |tree| matcher::commit(tree, &descriptor, update));
        let Some(((idx, mut refreshed), report)) = committed else {
            return false;
        };
        if !report.is_clean() {
            log::debug!("canvas: element commit on {id} was re-sanitized: {report:?}");
        }
        let tree = item.component.markup.tree();
        if tree.element(idx).is_some() {
            matcher::retain_surviving_styles(tree, idx, &mut refreshed, update);
            self.registry.mark_element(id, refreshed);
        } else {
            self.registry.unmark_element();
        }
        true
    }

    // ─── Markup ──────────────────────────────────────────────────────────

    /// DOM-facing markup: sanitized, with element keys and the edit-mode
    /// mark.
    pub fn render_markup(&self, id: ComponentId) -> Option<String> {
        let component = self.get(id)?;
        Some(emit_markup_keyed(
            component.markup.tree(),
            self.registry.marked_key(id),
        ))
    }

    /// Canonical markup without editor annotations.
    pub fn markup(&self, id: ComponentId) -> Option<String> {
        self.get(id).map(|c| c.markup.canonical().into_owned())
    }

    // ─── Auto-fit ────────────────────────────────────────────────────────

    /// Run pending auto-fits. A component's first observation schedules it
    /// `settle_delay` later; it then runs on the first call at or after that
    /// time while the component is idle. Returns whether any size changed.
    pub fn run_auto_fit<S: ScratchSurface + ?Sized>(&mut self, now_ms: f64, surface: &mut S) -> bool {
        let delay = self.auto_fit.settle_delay_ms();
        let mut resizes = Vec::new();
        for item in self.items.iter_mut().filter(|item| item.component.auto_fit) {
            let due = *item.fit_due_ms.get_or_insert(now_ms + delay);
            if now_ms < due || item.interaction.is_active() {
                continue;
            }
            item.component.auto_fit = false;
            item.fit_due_ms = None;
            let component = &mut item.component;
            let markup = component.markup.flush().to_string();
            if let Some(size) = self.auto_fit.fit(surface, &markup, component.size) {
                log::debug!("auto-fit: {} → {}x{}", component.id, size.width, size.height);
                resizes.push(ComponentMutation::Resize {
                    id: component.id,
                    size,
                });
            }
        }
        let mut changed = false;
        for mutation in resizes {
            changed |= self.apply_mutation(mutation);
        }
        changed
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.viewport.zoom + self.config.zoom.step)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.viewport.zoom - self.config.zoom.step)
    }

    pub fn set_zoom(&mut self, percent: f64) -> bool {
        let zoom = self.config.zoom.clamp(percent);
        let changed = zoom != self.viewport.zoom;
        self.viewport.zoom = zoom;
        changed
    }

    pub fn reset_view(&mut self) -> bool {
        let initial = Viewport {
            pan: self.config.zoom.initial_pan,
            zoom: self.config.zoom.clamp(self.config.zoom.initial),
        };
        let changed = initial != self.viewport;
        self.viewport = initial;
        changed
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Resolve and perform a shortcut. Returns the action taken, if any.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Option<(ShortcutAction, Response)> {
        let action = ShortcutMap::resolve(key, modifiers)?;
        let held_before = self.capture_held();
        let changed = match action {
            ShortcutAction::Deselect => match self.registry.editing() {
                Some(id) => self.registry.end_edit(id).is_some(),
                None => self.clear_selection(),
            },
            ShortcutAction::Delete => {
                match self.registry.selected().filter(|id| !self.registry.is_editing(*id)) {
                    Some(id) => self.remove(id).changed,
                    None => false,
                }
            }
            ShortcutAction::Duplicate => self
                .registry
                .selected()
                .and_then(|id| self.duplicate(id))
                .is_some(),
            ShortcutAction::ZoomIn => self.zoom_in(),
            ShortcutAction::ZoomOut => self.zoom_out(),
            ShortcutAction::ResetZoom => self.reset_view(),
            ShortcutAction::PanStart => {
                self.pan.armed = true;
                false
            }
        };
        Some((action, self.respond(held_before, changed)))
    }

    /// Key released. Releasing the pan key ends panning.
    pub fn handle_key_up(&mut self, key: &str) {
        if ShortcutMap::ends_pan(key) {
            self.pan.armed = false;
            self.pan.anchor = None;
        }
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Snapshot of every component with flushed canonical markup.
    pub fn export_components(&mut self) -> Vec<PlacedComponent> {
        self.items
            .iter_mut()
            .map(|item| {
                item.component.markup.flush();
                item.component.clone()
            })
            .collect()
    }

    /// Replace every component. Markup is re-sanitized with this host's
    /// policy and sizes are clamped; selection and gestures are reset.
    /// A repeated id is replaced by a fresh one.
    pub fn import_components(&mut self, components: Vec<PlacedComponent>) -> Response {
        let held_before = self.capture_held();
        let bounds = self.config.bounds;
        let mut seen = HashSet::new();
        self.items = components
            .into_iter()
            .map(|mut component| {
                if !seen.insert(component.id) {
                    let fresh = ComponentId::generate();
                    log::debug!("canvas: duplicate id {} imported as {fresh}", component.id);
                    component.id = fresh;
                    seen.insert(fresh);
                }
                component.markup =
                    ComponentMarkup::from_untrusted(&component.markup.canonical(), &self.config.sanitize);
                component.size = bounds.clamp(component.size);
                CanvasItem::new(component)
            })
            .collect();
        self.registry.clear();
        log::debug!("canvas: imported {} components", self.items.len());
        self.respond(held_before, true)
    }

    pub fn snapshot(&mut self) -> Result<Vec<u8>, SnapshotError> {
        snapshot::encode(&self.export_components())
    }

    /// Restore from a snapshot. A decode failure leaves the canvas as is.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<Response, SnapshotError> {
        let components = snapshot::decode(bytes)?;
        Ok(self.import_components(components))
    }
}
