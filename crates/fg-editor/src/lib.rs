pub mod autofit;
pub mod canvas;
pub mod hit;
pub mod input;
pub mod interaction;
pub mod matcher;
pub mod selection;
pub mod shortcuts;

pub use autofit::{AutoFit, MeasureError, ScratchSurface, measure_scoped};
pub use canvas::{CanvasHost, ComponentMutation, Response, Viewport};
pub use input::{InputEvent, Modifiers};
pub use interaction::{CaptureChange, InteractionMachine, InteractionPhase};
pub use matcher::{ElementDescriptor, ElementUpdate};
pub use shortcuts::{ShortcutAction, ShortcutMap};
