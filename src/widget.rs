/// Floating panel state: visibility, position and drag tracking
use std::rc::Rc;

/// A point in viewport pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Position {
    #[default]
    Centered,
    At(Point),
}

/// Visibility including the closing transition. A panel that is `Closing`
/// is no longer visible but stays interactive-free in the tree until the
/// matching `finish_hide` lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Hidden,
    Open,
    Closing(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    pointer: Point,
    origin: Point,
}

/// Result of a visibility change, telling the caller what to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Panel became visible; start an analysis
    Opened,
    /// Panel started hiding; call `finish_hide` with the ticket after the
    /// transition duration
    Closing(u64),
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetState {
    phase: Phase,
    position: Position,
    drag: Option<DragAnchor>,
    hide_generation: u64,
}

impl WidgetState {
    pub fn new() -> Self {
        WidgetState::default()
    }

    pub fn visible(&self) -> bool {
        self.phase == Phase::Open
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn toggle(&mut self) -> Transition {
        if self.visible() {
            self.begin_hide()
        } else {
            self.phase = Phase::Open;
            Transition::Opened
        }
    }

    /// Hide without ever re-opening
    pub fn close(&mut self) -> Transition {
        if self.visible() {
            self.begin_hide()
        } else {
            Transition::Unchanged
        }
    }

    fn begin_hide(&mut self) -> Transition {
        self.hide_generation += 1;
        self.phase = Phase::Closing(self.hide_generation);
        self.drag = None;
        Transition::Closing(self.hide_generation)
    }

    /// Complete a hide once its transition has elapsed. Ignored if the
    /// panel was reopened in the meantime.
    pub fn finish_hide(&mut self, ticket: u64) -> bool {
        if self.phase == Phase::Closing(ticket) {
            self.phase = Phase::Hidden;
            true
        } else {
            false
        }
    }

    /// `origin` is the panel's current top-left corner, needed when the
    /// panel is still centered.
    pub fn start_drag(&mut self, pointer: Point, origin: Point) {
        let origin = match self.position {
            Position::At(at) => at,
            Position::Centered => origin,
        };
        self.drag = Some(DragAnchor { pointer, origin });
    }

    /// Returns false when no drag is active or the position is unchanged
    pub fn update_drag(&mut self, pointer: Point) -> bool {
        let Some(anchor) = self.drag else {
            return false;
        };
        let next = Position::At(Point::new(
            anchor.origin.x + (pointer.x - anchor.pointer.x),
            anchor.origin.y + (pointer.y - anchor.pointer.y),
        ));
        if next == self.position {
            return false;
        }
        self.position = next;
        true
    }

    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum WidgetAction {
    Toggle,
    Close,
    FinishHide(u64),
    StartDrag { pointer: Point, origin: Point },
    UpdateDrag(Point),
    EndDrag,
}

impl yew::Reducible for WidgetState {
    type Action = WidgetAction;

    fn reduce(self: Rc<Self>, action: WidgetAction) -> Rc<Self> {
        let mut next = (*self).clone();
        let changed = match action {
            WidgetAction::Toggle => next.toggle() != Transition::Unchanged,
            WidgetAction::Close => next.close() != Transition::Unchanged,
            WidgetAction::FinishHide(ticket) => next.finish_hide(ticket),
            WidgetAction::StartDrag { pointer, origin } => {
                next.start_drag(pointer, origin);
                true
            }
            WidgetAction::UpdateDrag(pointer) => next.update_drag(pointer),
            WidgetAction::EndDrag => next.end_drag(),
        };
        if changed {
            Rc::new(next)
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_hidden_and_centered() {
        let state = WidgetState::new();

        assert!(!state.visible());
        assert_eq!(state.phase(), Phase::Hidden);
        assert_eq!(state.position(), Position::Centered);
        assert!(!state.dragging());
    }

    #[test]
    fn test_toggle_opens_then_closes() {
        let mut state = WidgetState::new();

        assert_eq!(state.toggle(), Transition::Opened);
        assert!(state.visible());

        let Transition::Closing(ticket) = state.toggle() else {
            panic!("expected closing transition");
        };
        assert!(!state.visible());
        assert!(state.finish_hide(ticket));
        assert_eq!(state.phase(), Phase::Hidden);
    }

    #[test]
    fn test_even_toggles_restore_visibility() {
        for initial_open in [false, true] {
            let mut state = WidgetState::new();
            if initial_open {
                state.toggle();
            }
            let before = state.visible();

            for _ in 0..4 {
                state.toggle();
            }

            assert_eq!(state.visible(), before);
        }
    }

    #[test]
    fn test_reopen_during_transition_cancels_hide() {
        let mut state = WidgetState::new();
        state.toggle();
        let Transition::Closing(ticket) = state.toggle() else {
            panic!("expected closing transition");
        };

        assert_eq!(state.toggle(), Transition::Opened);
        assert!(!state.finish_hide(ticket));
        assert!(state.visible());
    }

    #[test]
    fn test_stale_hide_ticket_ignored() {
        let mut state = WidgetState::new();
        state.toggle();
        let Transition::Closing(first) = state.toggle() else {
            panic!("expected closing transition");
        };
        state.toggle();
        let Transition::Closing(second) = state.toggle() else {
            panic!("expected closing transition");
        };

        assert_ne!(first, second);
        assert!(!state.finish_hide(first));
        assert!(state.finish_hide(second));
    }

    #[test]
    fn test_close_never_opens() {
        let mut state = WidgetState::new();

        assert_eq!(state.close(), Transition::Unchanged);
        assert!(!state.visible());

        state.toggle();
        assert!(matches!(state.close(), Transition::Closing(_)));
        assert_eq!(state.close(), Transition::Unchanged);
        assert!(!state.visible());
    }

    #[test]
    fn test_drag_moves_by_net_delta() {
        let mut state = WidgetState::new();
        state.toggle();

        state.start_drag(Point::new(100.0, 100.0), Point::new(40.0, 60.0));
        state.update_drag(Point::new(300.0, -20.0));
        state.update_drag(Point::new(90.0, 140.0));
        state.update_drag(Point::new(125.0, 90.0));
        state.end_drag();

        assert_eq!(state.position(), Position::At(Point::new(65.0, 50.0)));
        assert!(!state.dragging());
    }

    #[test]
    fn test_second_drag_starts_from_recorded_position() {
        let mut state = WidgetState::new();
        state.start_drag(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        state.update_drag(Point::new(5.0, 5.0));
        state.end_drag();

        // origin hint is ignored once the panel has a recorded position
        state.start_drag(Point::new(50.0, 50.0), Point::new(999.0, 999.0));
        state.update_drag(Point::new(40.0, 70.0));
        state.end_drag();

        assert_eq!(state.position(), Position::At(Point::new(5.0, 35.0)));
    }

    #[test]
    fn test_update_without_drag_is_ignored() {
        let mut state = WidgetState::new();

        state.update_drag(Point::new(10.0, 10.0));

        assert_eq!(state.position(), Position::Centered);
    }

    #[test]
    fn test_reduce_keeps_state_for_noop_actions() {
        use yew::Reducible;

        let hidden = Rc::new(WidgetState::new());
        for action in [
            WidgetAction::UpdateDrag(Point::new(5.0, 5.0)),
            WidgetAction::EndDrag,
            WidgetAction::Close,
            WidgetAction::FinishHide(42),
        ] {
            let next = hidden.clone().reduce(action);
            assert!(Rc::ptr_eq(&hidden, &next), "{:?} produced a new state", action);
        }

        let opened = hidden.clone().reduce(WidgetAction::Toggle);
        assert!(!Rc::ptr_eq(&hidden, &opened));
        assert!(opened.visible());
    }

    #[test]
    fn test_reduce_drag_to_same_point_is_noop() {
        use yew::Reducible;

        let state = Rc::new(WidgetState::new()).reduce(WidgetAction::StartDrag {
            pointer: Point::new(10.0, 10.0),
            origin: Point::new(0.0, 0.0),
        });
        let moved = state.clone().reduce(WidgetAction::UpdateDrag(Point::new(20.0, 30.0)));
        let again = moved.clone().reduce(WidgetAction::UpdateDrag(Point::new(20.0, 30.0)));

        assert!(!Rc::ptr_eq(&state, &moved));
        assert!(Rc::ptr_eq(&moved, &again));
        assert_eq!(again.position(), Position::At(Point::new(10.0, 20.0)));
    }

    #[test]
    fn test_hiding_ends_drag() {
        let mut state = WidgetState::new();
        state.toggle();
        state.start_drag(Point::new(0.0, 0.0), Point::new(0.0, 0.0));

        state.close();

        assert!(!state.dragging());
    }
}
