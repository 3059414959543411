//! WASM bridge for Figaroo: exposes the canvas host to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Pointer handlers take
//! screen coordinates and return a JSON response:
//! `{"changed":bool,"capture":"acquire"|"release"|null}`. The page attaches
//! its document-level `pointermove`/`pointerup` listeners on `acquire` and
//! removes them on `release`.

pub mod measure;

use fg_core::config::CanvasConfig;
use fg_core::id::{ComponentId, ElementKey};
use fg_core::{PlacedComponent, Point};
use fg_editor::canvas::{CanvasHost, Response};
use fg_editor::input::Modifiers;
use fg_editor::interaction::InteractionPhase;
use fg_editor::matcher::ElementUpdate;
use fg_editor::shortcuts::ShortcutAction;
use measure::DomSurface;
use serde::Serialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

/// The main WASM-facing canvas controller.
#[wasm_bindgen]
pub struct FgCanvas {
    host: CanvasHost,
    /// Created on first auto-fit; needs a live document.
    surface: Option<DomSurface>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ComponentView<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    auto_fit: bool,
    selected: bool,
    edit_mode: bool,
    phase: &'static str,
}

#[derive(Serialize)]
struct KeyResponse {
    action: &'static str,
    #[serde(flatten)]
    response: Response,
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn response_json(response: Response) -> String {
    serde_json::to_string(&response).unwrap_or_else(|_| r#"{"changed":false,"capture":null}"#.to_string())
}

fn phase_name(phase: InteractionPhase) -> &'static str {
    match phase {
        InteractionPhase::Idle => "idle",
        InteractionPhase::Dragging => "dragging",
        InteractionPhase::Resizing(_) => "resizing",
        InteractionPhase::EditSelecting => "editing",
    }
}

fn action_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Delete => "delete",
        ShortcutAction::Duplicate => "duplicate",
        ShortcutAction::ZoomIn => "zoomIn",
        ShortcutAction::ZoomOut => "zoomOut",
        ShortcutAction::ResetZoom => "resetZoom",
        ShortcutAction::PanStart => "panStart",
        ShortcutAction::Deselect => "deselect",
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

impl FgCanvas {
    fn with_host(host: CanvasHost) -> Self {
        console_error_panic_hook_setup();
        console_log_setup(log::Level::Info);
        Self {
            host,
            surface: None,
        }
    }
}

impl Default for FgCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl FgCanvas {
    /// Create a canvas with the stock configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_host(CanvasHost::new(CanvasConfig::default()))
    }

    /// Create a canvas from a (partial) JSON `CanvasConfig`.
    pub fn with_config(config_json: &str) -> Result<FgCanvas, JsValue> {
        let config: CanvasConfig = serde_json::from_str(config_json).map_err(js_error)?;
        Ok(Self::with_host(CanvasHost::new(config)))
    }

    /// Set the console log level (`"error"` … `"trace"`).
    pub fn set_log_level(&self, level: &str) {
        log::set_max_level(parse_level(level));
    }

    // ─── Components ──────────────────────────────────────────────────────

    /// Sanitize and place generated markup. Returns the new component id.
    pub fn add_component(&mut self, markup: &str, prompt: Option<String>) -> String {
        self.host
            .add_component(markup, prompt.as_deref())
            .as_str()
            .to_string()
    }

    pub fn regenerate(&mut self, id: &str, markup: &str, prompt: Option<String>) -> bool {
        self.host
            .regenerate(ComponentId::intern(id), markup, prompt.as_deref())
    }

    pub fn remove(&mut self, id: &str) -> String {
        response_json(self.host.remove(ComponentId::intern(id)))
    }

    pub fn duplicate(&mut self, id: &str) -> Option<String> {
        self.host
            .duplicate(ComponentId::intern(id))
            .map(|copy| copy.as_str().to_string())
    }

    pub fn rename(&mut self, id: &str, name: &str) -> bool {
        self.host.rename(ComponentId::intern(id), name)
    }

    pub fn select(&mut self, id: &str) -> bool {
        self.host.select(ComponentId::intern(id))
    }

    pub fn clear_selection(&mut self) -> bool {
        self.host.clear_selection()
    }

    /// Geometry and state of every component, in z-order, as JSON.
    pub fn components_json(&self) -> String {
        let selection = self.host.selection();
        let views: Vec<ComponentView<'_>> = self
            .host
            .components()
            .map(|c| ComponentView {
                id: c.id.as_str(),
                name: &c.name,
                prompt: c.prompt.as_deref(),
                x: c.position.x,
                y: c.position.y,
                width: c.size.width,
                height: c.size.height,
                auto_fit: c.auto_fit,
                selected: selection.selected() == Some(c.id),
                edit_mode: selection.is_editing(c.id),
                phase: self.host.phase(c.id).map_or("idle", phase_name),
            })
            .collect();
        serde_json::to_string(&views).unwrap_or_else(|_| "[]".to_string())
    }

    /// Sanitized, keyed markup for the component's DOM container.
    pub fn render_markup(&self, id: &str) -> String {
        self.host
            .render_markup(ComponentId::intern(id))
            .unwrap_or_default()
    }

    /// Canonical markup (for export / copy).
    pub fn markup(&self, id: &str) -> String {
        self.host
            .markup(ComponentId::intern(id))
            .unwrap_or_default()
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        response_json(
            self.host
                .pointer_down(Point::new(x, y), modifiers(shift, ctrl, alt, meta)),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        response_json(
            self.host
                .pointer_move(Point::new(x, y), modifiers(shift, ctrl, alt, meta)),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        response_json(
            self.host
                .pointer_up(Point::new(x, y), modifiers(shift, ctrl, alt, meta)),
        )
    }

    /// Window blur / `pointercancel`.
    pub fn cancel_interaction(&mut self) -> String {
        response_json(self.host.cancel_interaction())
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Handle a key press. Returns JSON with the action taken
    /// (`"none"` when unbound) plus the usual response fields.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let (action, response) = match self.host.handle_key(key, modifiers(shift, ctrl, alt, meta)) {
            Some((action, response)) => (action_name(action), response),
            None => ("none", Response::default()),
        };
        serde_json::to_string(&KeyResponse { action, response })
            .unwrap_or_else(|_| r#"{"action":"none","changed":false,"capture":null}"#.to_string())
    }

    pub fn handle_key_up(&mut self, key: &str) {
        self.host.handle_key_up(key);
    }

    // ─── Edit mode ───────────────────────────────────────────────────────

    pub fn set_edit_mode(&mut self, id: &str, on: bool) -> String {
        response_json(self.host.set_edit_mode(ComponentId::intern(id), on))
    }

    /// Record a click on the element carrying `data-fg-key="key"`.
    /// `computed_json` maps CSS property names to computed values.
    /// Returns the descriptor JSON, or `null`.
    pub fn click_element(&mut self, id: &str, key: u32, computed_json: &str) -> String {
        let computed: BTreeMap<String, String> = serde_json::from_str(computed_json).unwrap_or_default();
        self.host
            .click_element(ComponentId::intern(id), ElementKey(key), &computed)
            .and_then(|d| serde_json::to_string(&d).ok())
            .unwrap_or_else(|| "null".to_string())
    }

    /// The element currently marked in edit mode, as JSON, or `null`.
    pub fn selected_element(&self) -> String {
        self.host
            .selected_element()
            .and_then(|d| serde_json::to_string(d).ok())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Apply an `ElementUpdate` JSON to the marked element.
    pub fn update_element(&mut self, update_json: &str) -> bool {
        match serde_json::from_str::<ElementUpdate>(update_json) {
            Ok(update) => self.host.commit_element_update(&update),
            Err(err) => {
                log::warn!("update_element: bad update JSON: {err}");
                false
            }
        }
    }

    // ─── Auto-fit ────────────────────────────────────────────────────────

    /// Run pending auto-fits against the live document. Call once per
    /// animation frame. `now_ms` defaults to `Date.now()`.
    pub fn run_auto_fit(&mut self, now_ms: Option<f64>) -> bool {
        let now = now_ms.unwrap_or_else(js_sys::Date::now);
        if self.surface.is_none() {
            self.surface = DomSurface::from_window();
        }
        match self.surface.as_mut() {
            Some(surface) => self.host.run_auto_fit(now, surface),
            None => false,
        }
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom(&self) -> f64 {
        self.host.viewport().zoom
    }

    pub fn pan_x(&self) -> f64 {
        self.host.viewport().pan.x
    }

    pub fn pan_y(&self) -> f64 {
        self.host.viewport().pan.y
    }

    pub fn zoom_in(&mut self) -> bool {
        self.host.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        self.host.zoom_out()
    }

    pub fn reset_view(&mut self) -> bool {
        self.host.reset_view()
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// MessagePack snapshot of every component.
    pub fn snapshot(&mut self) -> Result<Vec<u8>, JsValue> {
        self.host.snapshot().map_err(js_error)
    }

    /// Restore from [`snapshot`](Self::snapshot) bytes. Markup is
    /// re-sanitized. On error the canvas is unchanged.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<String, JsValue> {
        self.host.restore(bytes).map(response_json).map_err(js_error)
    }

    /// Components as JSON (canonical markup included).
    pub fn export_json(&mut self) -> String {
        serde_json::to_string(&self.host.export_components()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Replace every component from JSON produced by
    /// [`export_json`](Self::export_json).
    pub fn import_json(&mut self, json: &str) -> Result<String, JsValue> {
        let components: Vec<PlacedComponent> = serde_json::from_str(json).map_err(js_error)?;
        Ok(response_json(self.host.import_components(components)))
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Figaroo WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Console logging ─────────────────────────────────────────────────────

/// Route `log` records to the browser console. Installing twice is a no-op.
fn console_log_setup(level: log::Level) {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(level);
    }
    log::set_max_level(level.to_level_filter());
}

/// Parse a level name (`"debug"`, `"warn"`, ...), defaulting to `Info`.
fn parse_level(name: &str) -> log::LevelFilter {
    name.parse().unwrap_or(log::LevelFilter::Info)
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Sanitize untrusted markup with the default allowlists.
#[wasm_bindgen]
pub fn sanitize_markup(raw: &str) -> String {
    fg_core::sanitize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas() -> FgCanvas {
        // Pan 0 and zoom 100 keep screen and canvas coordinates equal.
        FgCanvas::with_config(r#"{"zoom": {"initial": 100, "initial_pan": {"x": 0, "y": 0}}}"#)
            .unwrap_or_else(|_| panic!("config"))
    }

    #[test]
    fn level_names() {
        assert_eq!(parse_level("debug"), log::LevelFilter::Debug);
        assert_eq!(parse_level("WARN"), log::LevelFilter::Warn);
        assert_eq!(parse_level("chatty"), log::LevelFilter::Info);
    }

    #[test]
    fn sanitize_markup_strips_scripts() {
        assert_eq!(
            sanitize_markup(r#"<p onclick="x">hi</p><script>x()</script>"#),
            "<p>hi</p>"
        );
    }

    #[test]
    fn drag_reports_capture_pairing() {
        let mut c = canvas();
        let id = c.add_component("<div>card</div>", None);
        let down = c.handle_pointer_down(150.0, 150.0, false, false, false, false);
        assert_eq!(down, r#"{"changed":true,"capture":"acquire"}"#);
        let mv = c.handle_pointer_move(170.0, 160.0, false, false, false, false);
        assert_eq!(mv, r#"{"changed":true,"capture":null}"#);
        let up = c.handle_pointer_up(170.0, 160.0, false, false, false, false);
        assert_eq!(up, r#"{"changed":false,"capture":"release"}"#);

        let views: serde_json::Value = serde_json::from_str(&c.components_json()).expect("json");
        assert_eq!(views[0]["id"], id.as_str());
        assert_eq!(views[0]["x"], 120.0);
        assert_eq!(views[0]["y"], 110.0);
        assert_eq!(views[0]["selected"], true);
        assert_eq!(views[0]["phase"], "idle");
    }

    #[test]
    fn element_click_and_update() {
        let mut c = canvas();
        let id = c.add_component(r#"<div><h2>Title</h2><p>Body</p></div>"#, None);
        assert_eq!(c.click_element(&id, 1, "{}"), "null");

        c.set_edit_mode(&id, true);
        let descriptor: serde_json::Value =
            serde_json::from_str(&c.click_element(&id, 1, r#"{"color":"rgb(0, 0, 0)"}"#)).expect("json");
        assert_eq!(descriptor["tagName"], "h2");
        assert_eq!(descriptor["computedStyles"]["color"], "rgb(0, 0, 0)");

        assert!(c.update_element(r#"{"textContent":"Hello","styles":{"fontSize":"24px"}}"#));
        assert_eq!(
            c.markup(&id),
            r#"<div><h2 style="font-size: 24px">Hello</h2><p>Body</p></div>"#
        );
        assert!(c.render_markup(&id).contains(r#"data-fg-key="1" data-fg-selected="true""#));
        assert!(!c.update_element("not json"));
    }

    #[test]
    fn key_response_shape() {
        let mut c = canvas();
        assert_eq!(
            c.handle_key("=", true, false, false, false),
            r#"{"action":"zoomIn","changed":true,"capture":null}"#
        );
        assert_eq!(
            c.handle_key("q", false, false, false, false),
            r#"{"action":"none","changed":false,"capture":null}"#
        );
    }

    #[test]
    fn export_import_json_resanitizes() {
        let mut c = canvas();
        c.add_component("<p>one</p>", Some("first".into()));
        let exported = c.export_json();
        let tampered = exported.replace("<p>one</p>", r#"<p onclick=\"x\">one</p><script></script>"#);
        let mut other = canvas();
        assert!(other.import_json(&tampered).is_ok());
        let views: serde_json::Value = serde_json::from_str(&other.components_json()).expect("json");
        let id = views[0]["id"].as_str().expect("id").to_string();
        assert_eq!(other.markup(&id), "<p>one</p>");
        assert_eq!(views[0]["name"], "First");
    }
}
