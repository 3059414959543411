//! Hit testing: canvas point → component / resize handle.
//!
//! Components are checked front-to-back (last in the list is topmost).
//! Resize handles belong only to the selected component and only while it
//! is not in edit mode; they sit above every component body.

use fg_core::geometry::{Frame, ResizeDirection};
use fg_core::id::ComponentId;
use fg_core::{PlacedComponent, Point};

/// What part of a component was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Body,
    Handle(ResizeDirection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub id: ComponentId,
    pub target: HitTarget,
}

/// Which of a frame's handles contains `point`. Corners win over edges.
pub fn hit_handle(frame: Frame, point: Point, extent: f64) -> Option<ResizeDirection> {
    const ORDER: [ResizeDirection; 8] = [
        ResizeDirection::NW,
        ResizeDirection::NE,
        ResizeDirection::SW,
        ResizeDirection::SE,
        ResizeDirection::N,
        ResizeDirection::S,
        ResizeDirection::E,
        ResizeDirection::W,
    ];
    ORDER
        .into_iter()
        .find(|d| frame.handle_rect(*d, extent).contains(point))
}

/// Find what is under `point`. Returns `None` for empty canvas.
///
/// `handle_extent` is the handle hit box in canvas units (the screen-space
/// handle size divided by the zoom scale).
pub fn hit_test<'a>(
    components: impl DoubleEndedIterator<Item = &'a PlacedComponent> + Clone,
    selected: Option<ComponentId>,
    editing: Option<ComponentId>,
    point: Point,
    handle_extent: f64,
) -> Option<Hit> {
    if let Some(id) = selected.filter(|id| editing != Some(*id))
        && let Some(component) = components.clone().find(|c| c.id == id)
        && let Some(direction) = hit_handle(component.frame(), point, handle_extent)
    {
        return Some(Hit {
            id,
            target: HitTarget::Handle(direction),
        });
    }

    components
        .rev()
        .find(|c| c.frame().contains(point))
        .map(|c| Hit {
            id: c.id,
            target: HitTarget::Body,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fg_core::{ComponentMarkup, SanitizePolicy, Size};

    fn place(id: &str, x: f64, y: f64) -> PlacedComponent {
        PlacedComponent::new(
            ComponentId::intern(id),
            ComponentMarkup::from_untrusted("<div>x</div>", &SanitizePolicy::default()),
            Frame::new(Point::new(x, y), Size::new(200.0, 100.0)),
            None,
        )
    }

    #[test]
    fn topmost_body_wins() {
        let comps = [place("hit_a", 0.0, 0.0), place("hit_b", 50.0, 50.0)];
        let hit = hit_test(comps.iter(), None, None, Point::new(60.0, 60.0), 8.0);
        assert_eq!(
            hit,
            Some(Hit {
                id: ComponentId::intern("hit_b"),
                target: HitTarget::Body
            })
        );
        let hit = hit_test(comps.iter(), None, None, Point::new(10.0, 10.0), 8.0);
        assert_eq!(hit.map(|h| h.id), Some(ComponentId::intern("hit_a")));
        assert_eq!(hit_test(comps.iter(), None, None, Point::new(500.0, 500.0), 8.0), None);
    }

    #[test]
    fn handles_only_on_selected_non_edit_component() {
        let comps = [place("hit_c", 0.0, 0.0)];
        let id = ComponentId::intern("hit_c");
        let corner = Point::new(200.0, 100.0);

        let hit = hit_test(comps.iter(), Some(id), None, corner, 8.0);
        assert_eq!(hit.map(|h| h.target), Some(HitTarget::Handle(ResizeDirection::SE)));

        let hit = hit_test(comps.iter(), None, None, corner, 8.0);
        assert_eq!(hit.map(|h| h.target), Some(HitTarget::Body));

        let hit = hit_test(comps.iter(), Some(id), Some(id), corner, 8.0);
        assert_eq!(hit.map(|h| h.target), Some(HitTarget::Body));
    }

    #[test]
    fn handle_outside_body_still_hits() {
        let comps = [place("hit_d", 0.0, 0.0)];
        let id = ComponentId::intern("hit_d");
        let hit = hit_test(comps.iter(), Some(id), None, Point::new(-3.0, 50.0), 8.0);
        assert_eq!(hit.map(|h| h.target), Some(HitTarget::Handle(ResizeDirection::W)));
    }

    #[test]
    fn selected_handles_sit_above_other_bodies() {
        let comps = [place("hit_e", 0.0, 0.0), place("hit_f", 150.0, 50.0)];
        let below = ComponentId::intern("hit_e");
        let hit = hit_test(comps.iter(), Some(below), None, Point::new(199.0, 99.0), 8.0);
        assert_eq!(
            hit,
            Some(Hit {
                id: below,
                target: HitTarget::Handle(ResizeDirection::SE)
            })
        );
    }
}
