//! Pointer-gesture recognition for list reordering.
//!
//! Translates a stream of pointer events into at most one
//! [`ReorderIntent`] per gesture. The tracker is pure state over plain
//! geometry, so any front end (terminal mouse events, a web canvas, a test
//! script) can drive it; nothing here touches list state.
//!
//! Gesture lifecycle, following the press/threshold/drop shape of
//! mouse-driven drag and drop:
//!
//! 1. press on an item records a pending drag with its origin
//! 2. movement at or beyond the activation threshold promotes it to a drag
//!    (movement below stays a click and never emits)
//! 3. release resolves the drop target by closest center among candidate
//!    rects; ties break toward the earlier candidate

use serde::{Deserialize, Serialize};

/// Default activation threshold in display units (pixels or cells).
pub const DEFAULT_ACTIVATION_DISTANCE: f32 = 8.0;

/// A pointer position in the same coordinate space as [`ItemRect`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }
}

/// Bounding box of one rendered list item, tagged with its stable id.
///
/// Boxes are assumed non-overlapping (a vertical or horizontal list), which
/// is what makes first-match tie-breaking acceptable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemRect<I> {
    pub id: I,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl<I: Copy> ItemRect<I> {
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// The `{active, over}` pair produced by a completed drag gesture.
/// Consumed exactly once by the reindexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderIntent<I> {
    pub active_id: I,
    pub over_id: I,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState<I> {
    Idle,
    /// Pressed but not yet past the activation threshold.
    Pending { id: I, origin: Point },
    Dragging { id: I },
}

/// Gesture recognizer: feed it pointer events, collect intents.
#[derive(Debug, Clone)]
pub struct DragTracker<I> {
    activation_distance: f32,
    state: DragState<I>,
}

impl<I: Copy + Eq> DragTracker<I> {
    #[must_use]
    pub const fn new(activation_distance: f32) -> Self {
        Self {
            activation_distance,
            state: DragState::Idle,
        }
    }

    /// Id of the item currently being dragged, once past the threshold.
    #[must_use]
    pub const fn dragging(&self) -> Option<I> {
        match self.state {
            DragState::Dragging { id } => Some(id),
            DragState::Idle | DragState::Pending { .. } => None,
        }
    }

    /// Pointer pressed on the item with `id`.
    pub fn press(&mut self, id: I, at: Point) {
        self.state = DragState::Pending { id, origin: at };
    }

    /// Pointer moved. Promotes a pending press to a drag once the pointer
    /// is at or beyond the activation distance from its origin.
    pub fn moved(&mut self, at: Point) {
        if let DragState::Pending { id, origin } = self.state {
            let threshold_sq = self.activation_distance * self.activation_distance;
            if origin.distance_squared(at) >= threshold_sq {
                self.state = DragState::Dragging { id };
            }
        }
    }

    /// Pointer released. Emits an intent only when a drag was active and a
    /// drop target resolves; sub-threshold releases are clicks and emit
    /// nothing. The tracker returns to idle either way.
    pub fn release(&mut self, at: Point, candidates: &[ItemRect<I>]) -> Option<ReorderIntent<I>> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let DragState::Dragging { id } = state else {
            return None;
        };
        let over_id = closest_center(at, candidates)?;
        Some(ReorderIntent {
            active_id: id,
            over_id,
        })
    }

    /// Abandon any gesture in progress (focus loss, escape key).
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

impl<I: Copy + Eq> Default for DragTracker<I> {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

/// Resolve the drop target by nearest rect center. Ties break toward the
/// earlier candidate; returns `None` for an empty candidate set.
fn closest_center<I: Copy>(at: Point, candidates: &[ItemRect<I>]) -> Option<I> {
    let mut best: Option<(I, f32)> = None;
    for rect in candidates {
        let d = at.distance_squared(rect.center());
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((rect.id, d)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::{DragTracker, ItemRect, Point, ReorderIntent};

    fn row(id: u32, index: u32) -> ItemRect<u32> {
        // vertical list, one row per 20 units
        ItemRect {
            id,
            x: 0.0,
            y: index as f32 * 20.0,
            width: 100.0,
            height: 20.0,
        }
    }

    fn rows() -> Vec<ItemRect<u32>> {
        vec![row(1, 0), row(2, 1), row(3, 2)]
    }

    #[test]
    fn sub_threshold_release_is_a_click() {
        let mut tracker = DragTracker::new(8.0);
        tracker.press(1, Point::new(10.0, 10.0));
        tracker.moved(Point::new(13.0, 14.0)); // 5 units of travel
        assert_eq!(tracker.release(Point::new(13.0, 14.0), &rows()), None);
    }

    #[test]
    fn threshold_release_emits_exactly_one_intent() {
        let mut tracker = DragTracker::new(8.0);
        tracker.press(1, Point::new(10.0, 10.0));
        tracker.moved(Point::new(10.0, 18.0)); // exactly 8 units
        assert!(tracker.dragging().is_some());

        let intent = tracker.release(Point::new(10.0, 50.0), &rows());
        assert_eq!(
            intent,
            Some(ReorderIntent {
                active_id: 1,
                over_id: 3
            })
        );
        // gesture consumed: a second release emits nothing
        assert_eq!(tracker.release(Point::new(10.0, 50.0), &rows()), None);
    }

    #[test]
    fn release_with_no_candidates_emits_nothing() {
        let mut tracker = DragTracker::new(8.0);
        tracker.press(1, Point::new(0.0, 0.0));
        tracker.moved(Point::new(0.0, 40.0));
        assert_eq!(tracker.release(Point::new(0.0, 40.0), &[]), None);
    }

    #[test]
    fn closest_center_ties_break_toward_earlier_candidate() {
        let mut tracker = DragTracker::new(1.0);
        tracker.press(9, Point::new(0.0, 0.0));
        tracker.moved(Point::new(0.0, 30.0));
        // y=30 is equidistant from row centers at y=10 and y=50
        let candidates = vec![row(1, 0), row(2, 2)];
        let intent = tracker.release(Point::new(50.0, 30.0), &candidates);
        assert_eq!(intent.map(|i| i.over_id), Some(1));
    }

    #[test]
    fn cancel_abandons_the_gesture() {
        let mut tracker = DragTracker::new(8.0);
        tracker.press(1, Point::new(0.0, 0.0));
        tracker.moved(Point::new(0.0, 40.0));
        tracker.cancel();
        assert_eq!(tracker.release(Point::new(0.0, 40.0), &rows()), None);
    }

    #[test]
    fn dropping_on_the_origin_still_emits_for_the_reindexer_to_ignore() {
        let mut tracker = DragTracker::new(8.0);
        tracker.press(2, Point::new(10.0, 30.0));
        tracker.moved(Point::new(10.0, 39.0));
        let intent = tracker.release(Point::new(10.0, 30.0), &rows());
        assert_eq!(
            intent,
            Some(ReorderIntent {
                active_id: 2,
                over_id: 2
            })
        );
    }
}
