//! DOM-backed scratch surface for auto-fit.
//!
//! Markup is laid out in a zero-opacity, absolutely positioned `div` far
//! off-screen. The container is auto-sized and inherits font and line height
//! from the page, so its scroll size is the content's natural size.

use fg_core::Size;
use fg_editor::autofit::{MeasureError, ScratchSurface};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement};

const SCRATCH_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("left", "-10000px"),
    ("top", "0"),
    ("opacity", "0"),
    ("pointer-events", "none"),
    ("width", "auto"),
    ("height", "auto"),
    ("overflow", "visible"),
    ("font-family", "inherit"),
    ("font-size", "inherit"),
    ("line-height", "inherit"),
];

pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    /// Surface on the current window's document, if there is one.
    pub fn from_window() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self { document })
    }
}

fn describe(value: JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

impl ScratchSurface for DomSurface {
    type Node = HtmlElement;

    fn attach(&mut self, markup: &str) -> Result<HtmlElement, MeasureError> {
        let container = self
            .document
            .create_element("div")
            .map_err(|e| MeasureError::Attach(describe(e)))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| MeasureError::Attach("scratch container is not an HTMLElement".into()))?;
        let style = container.style();
        for (property, value) in SCRATCH_STYLE {
            style
                .set_property(property, value)
                .map_err(|e| MeasureError::Attach(describe(e)))?;
        }
        container.set_inner_html(markup);
        let body = self
            .document
            .body()
            .ok_or_else(|| MeasureError::Attach("document has no body".into()))?;
        body.append_child(&container)
            .map_err(|e| MeasureError::Attach(describe(e)))?;
        Ok(container)
    }

    fn natural_size(&self, node: &HtmlElement) -> Result<Size, MeasureError> {
        let width = node.scroll_width();
        let height = node.scroll_height();
        if width <= 0 && height <= 0 {
            return Err(MeasureError::Read("scratch container has no layout".into()));
        }
        Ok(Size::new(f64::from(width), f64::from(height)))
    }

    fn detach(&mut self, node: HtmlElement) {
        node.remove();
    }
}
