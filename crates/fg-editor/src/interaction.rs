//! Per-component direct-manipulation state machine.
//!
//! Translates pointer events into `ComponentMutation`s that the canvas host
//! applies immediately (there is no preview buffer). Entering an active
//! state acquires pointer capture and every exit path releases it.
//!
//! ```text
//!            down on body             move → Move
//!   Idle ───────────────────▶ Dragging ─────┐
//!    ▲ ▲                           │ ◀──────┘
//!    │ │        up / cancel        │
//!    │ └───────────────────────────┘
//!    │
//!    │      down on handle          move → Reframe
//!    └─────────────────────▶ Resizing ────┐
//!          up / cancel          │ ◀───────┘
//! ```

use crate::canvas::ComponentMutation;
use crate::hit::HitTarget;
use crate::input::InputEvent;
use fg_core::geometry::{Frame, ResizeDirection, SizeBounds, drag, resize};
use fg_core::id::ComponentId;
use fg_core::Point;
use serde::Serialize;

/// Transient interaction state of one component.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Dragging {
        start_pos: Point,
        start_mouse: Point,
    },
    Resizing {
        direction: ResizeDirection,
        start: Frame,
        start_mouse: Point,
    },
}

/// Coarse phase reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionPhase {
    Idle,
    Dragging,
    Resizing(ResizeDirection),
    /// The component holds the edit session; direct manipulation is off.
    EditSelecting,
}

/// Document-level pointer capture transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureChange {
    Acquire,
    Release,
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub mutations: Vec<ComponentMutation>,
    pub capture: Option<CaptureChange>,
}

/// Everything the machine needs to know about its component for one event.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub id: ComponentId,
    pub frame: Frame,
    pub edit_mode: bool,
    pub bounds: &'a SizeBounds,
}

#[derive(Debug, Default)]
pub struct InteractionMachine {
    state: Interaction,
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Interaction {
        self.state
    }

    /// True while dragging or resizing (pointer capture held).
    pub fn is_active(&self) -> bool {
        self.state != Interaction::Idle
    }

    pub fn phase(&self) -> InteractionPhase {
        match self.state {
            Interaction::Idle => InteractionPhase::Idle,
            Interaction::Dragging { .. } => InteractionPhase::Dragging,
            Interaction::Resizing { direction, .. } => InteractionPhase::Resizing(direction),
        }
    }

    /// Handle an event in canvas space. `target` is the hit result for
    /// pointer-down events and ignored otherwise.
    pub fn handle(&mut self, event: &InputEvent, target: Option<HitTarget>, cx: Context<'_>) -> Outcome {
        match event {
            InputEvent::PointerDown { x, y, .. } => self.pointer_down(Point::new(*x, *y), target, cx),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y), cx),
            InputEvent::PointerUp { .. } | InputEvent::Cancel => Outcome {
                mutations: Vec::new(),
                capture: self.cancel(),
            },
        }
    }

    /// Return to `Idle`. Yields `Release` iff capture was held.
    pub fn cancel(&mut self) -> Option<CaptureChange> {
        if self.is_active() {
            log::debug!("interaction: {:?} → idle", self.phase());
            self.state = Interaction::Idle;
            Some(CaptureChange::Release)
        } else {
            None
        }
    }

    fn pointer_down(&mut self, at: Point, target: Option<HitTarget>, cx: Context<'_>) -> Outcome {
        if cx.edit_mode {
            log::debug!("interaction: {} is in edit mode, pointer-down ignored", cx.id);
            return Outcome {
                mutations: Vec::new(),
                capture: self.cancel(),
            };
        }
        let next = match target {
            Some(HitTarget::Body) => Interaction::Dragging {
                start_pos: cx.frame.position,
                start_mouse: at,
            },
            Some(HitTarget::Handle(direction)) => Interaction::Resizing {
                direction,
                start: cx.frame,
                start_mouse: at,
            },
            None => return Outcome::default(),
        };
        // A stale gesture is superseded; capture is already held then.
        let was_active = self.is_active();
        self.state = next;
        log::debug!("interaction: {} → {:?}", cx.id, self.phase());
        Outcome {
            mutations: Vec::new(),
            capture: (!was_active).then_some(CaptureChange::Acquire),
        }
    }

    fn pointer_move(&mut self, at: Point, cx: Context<'_>) -> Outcome {
        let mutation = match self.state {
            Interaction::Idle => return Outcome::default(),
            Interaction::Dragging {
                start_pos,
                start_mouse,
            } => ComponentMutation::Move {
                id: cx.id,
                position: drag(start_pos, at - start_mouse),
            },
            Interaction::Resizing {
                direction,
                start,
                start_mouse,
            } => ComponentMutation::Reframe {
                id: cx.id,
                frame: resize(direction, start, at - start_mouse, cx.bounds),
            },
        };
        log::trace!("interaction: {mutation:?}");
        Outcome {
            mutations: vec![mutation],
            capture: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use fg_core::Size;

    fn cx(bounds: &SizeBounds, edit_mode: bool) -> Context<'_> {
        Context {
            id: ComponentId::intern("machine_test"),
            frame: Frame::new(Point::new(100.0, 100.0), Size::new(300.0, 200.0)),
            edit_mode,
            bounds,
        }
    }

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::pointer_down(Point::new(x, y), Modifiers::NONE)
    }

    fn mv(x: f64, y: f64) -> InputEvent {
        InputEvent::pointer_move(Point::new(x, y), Modifiers::NONE)
    }

    fn up(x: f64, y: f64) -> InputEvent {
        InputEvent::pointer_up(Point::new(x, y), Modifiers::NONE)
    }

    #[test]
    fn drag_moves_by_pointer_delta() {
        let bounds = SizeBounds::default();
        let mut m = InteractionMachine::new();
        let out = m.handle(&down(200.0, 200.0), Some(HitTarget::Body), cx(&bounds, false));
        assert_eq!(out.capture, Some(CaptureChange::Acquire));
        assert_eq!(m.phase(), InteractionPhase::Dragging);

        let out = m.handle(&mv(250.0, 170.0), None, cx(&bounds, false));
        assert_eq!(
            out.mutations,
            vec![ComponentMutation::Move {
                id: ComponentId::intern("machine_test"),
                position: Point::new(150.0, 70.0),
            }]
        );

        let out = m.handle(&up(250.0, 170.0), None, cx(&bounds, false));
        assert_eq!(out.capture, Some(CaptureChange::Release));
        assert!(out.mutations.is_empty());
        assert_eq!(m.state(), Interaction::Idle);
    }

    #[test]
    fn resize_west_from_handle() {
        let bounds = SizeBounds::default();
        let mut m = InteractionMachine::new();
        m.handle(&down(100.0, 200.0), Some(HitTarget::Handle(ResizeDirection::W)), cx(&bounds, false));
        let out = m.handle(&mv(150.0, 260.0), None, cx(&bounds, false));
        let Some(ComponentMutation::Reframe { frame, .. }) = out.mutations.first().cloned() else {
            panic!("expected reframe, got {:?}", out.mutations);
        };
        assert_eq!(frame.size, Size::new(250.0, 200.0));
        assert_eq!(frame.position, Point::new(150.0, 100.0));
    }

    #[test]
    fn resize_uses_start_frame_not_live_frame() {
        let bounds = SizeBounds::default();
        let mut m = InteractionMachine::new();
        m.handle(&down(400.0, 300.0), Some(HitTarget::Handle(ResizeDirection::SE)), cx(&bounds, false));
        let mut live = cx(&bounds, false);
        live.frame.size = Size::new(999.0, 999.0);
        let out = m.handle(&mv(410.0, 310.0), None, live);
        assert!(matches!(
            out.mutations.as_slice(),
            [ComponentMutation::Reframe { frame, .. }] if frame.size == Size::new(310.0, 210.0)
        ));
    }

    #[test]
    fn edit_mode_ignores_pointer_down() {
        let bounds = SizeBounds::default();
        let mut m = InteractionMachine::new();
        let out = m.handle(&down(200.0, 200.0), Some(HitTarget::Body), cx(&bounds, true));
        assert_eq!(out, Outcome::default());
        assert_eq!(m.state(), Interaction::Idle);
        assert!(m.handle(&mv(300.0, 300.0), None, cx(&bounds, true)).mutations.is_empty());
    }

    #[test]
    fn cancel_releases_exactly_once() {
        let bounds = SizeBounds::default();
        let mut m = InteractionMachine::new();
        m.handle(&down(200.0, 200.0), Some(HitTarget::Body), cx(&bounds, false));
        assert_eq!(
            m.handle(&InputEvent::Cancel, None, cx(&bounds, false)).capture,
            Some(CaptureChange::Release)
        );
        assert_eq!(m.cancel(), None);
        assert_eq!(m.handle(&up(0.0, 0.0), None, cx(&bounds, false)).capture, None);
    }

    #[test]
    fn superseding_down_does_not_reacquire() {
        let bounds = SizeBounds::default();
        let mut m = InteractionMachine::new();
        m.handle(&down(200.0, 200.0), Some(HitTarget::Handle(ResizeDirection::E)), cx(&bounds, false));
        let out = m.handle(&down(210.0, 210.0), Some(HitTarget::Body), cx(&bounds, false));
        assert_eq!(out.capture, None);
        assert_eq!(m.phase(), InteractionPhase::Dragging);
    }

    #[test]
    fn zero_length_drag_clears_state() {
        let bounds = SizeBounds::default();
        let mut m = InteractionMachine::new();
        m.handle(&down(120.0, 120.0), Some(HitTarget::Body), cx(&bounds, false));
        let out = m.handle(&up(120.0, 120.0), None, cx(&bounds, false));
        assert!(out.mutations.is_empty());
        assert_eq!(out.capture, Some(CaptureChange::Release));
        assert!(!m.is_active());
    }

    #[test]
    fn miss_stays_idle() {
        let bounds = SizeBounds::default();
        let mut m = InteractionMachine::new();
        assert_eq!(m.handle(&down(0.0, 0.0), None, cx(&bounds, false)), Outcome::default());
    }
}
