//! Widget registry and z-ordered hit testing
//!
//! [`UiContext`] is owned by the application and passed to every widget
//! constructor and update. It records which widgets are interactive, resolves
//! the pointer to a single hovered widget per frame and tracks focus for click
//! delivery.

use crate::domain::{Point, Rect};

use super::input::PointerFrame;

/// Handle to a registered widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(u64);

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: WidgetId,
    rect: Rect,
    z: i32,
}

#[derive(Debug, Default)]
pub struct UiContext {
    /// Registration order is kept; ties in z resolve to the earliest entry
    entries: Vec<Entry>,
    next_id: u64,
    pointer: PointerFrame,
    hovered: Option<WidgetId>,
    focused: Option<WidgetId>,
}

impl UiContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id and register a widget in one step
    pub fn add(&mut self, rect: Rect, z: i32) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.register(id, rect, z);
        id
    }

    /// Register a widget; no-op if it is already registered
    pub fn register(&mut self, id: WidgetId, rect: Rect, z: i32) {
        if !self.is_registered(id) {
            self.entries.push(Entry { id, rect, z });
        }
    }

    /// Unregister a widget; no-op if it is not registered
    pub fn unregister(&mut self, id: WidgetId) {
        self.entries.retain(|e| e.id != id);
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
    }

    pub fn is_registered(&self, id: WidgetId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_rect(&mut self, id: WidgetId, rect: Rect) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.id == id) {
            e.rect = rect;
        }
    }

    /// Negative z-index makes a widget unhittable without unregistering it
    pub fn set_z_index(&mut self, id: WidgetId, z: i32) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.id == id) {
            e.z = z;
        }
    }

    pub fn z_index(&self, id: WidgetId) -> Option<i32> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.z)
    }

    /// Hittable widgets under `p`, highest z first, registration order within equal z
    pub fn candidates(&self, p: Point) -> Vec<WidgetId> {
        let mut under: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| e.z >= 0 && e.rect.contains_strict(p))
            .collect();
        // sort_by is stable
        under.sort_by(|a, b| b.z.cmp(&a.z));
        under.into_iter().map(|e| e.id).collect()
    }

    pub fn hit_test(&self, p: Point) -> Option<WidgetId> {
        self.candidates(p).into_iter().next()
    }

    /// Resolve this frame's pointer against the registry
    ///
    /// The top widget under the pointer becomes hovered; a press edge hands it
    /// focus, and a release over empty space clears focus.
    pub fn dispatch(&mut self, frame: PointerFrame) {
        self.pointer = frame;
        self.hovered = self.hit_test(frame.pos);
        if frame.pressed {
            self.focused = self.hovered;
        } else if frame.released && self.hovered.is_none() {
            self.focused = None;
        }
    }

    pub fn pointer(&self) -> PointerFrame {
        self.pointer
    }

    pub fn hovered(&self) -> Option<WidgetId> {
        self.hovered
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.focused
    }

    pub fn is_hovered(&self, id: WidgetId) -> bool {
        self.hovered == Some(id)
    }

    /// Click edge delivered to `id` this frame
    pub fn clicked(&self, id: WidgetId) -> bool {
        self.pointer.pressed && self.focused == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press_at(ui: &mut UiContext, p: Point) {
        ui.dispatch(PointerFrame {
            pos: p,
            down: true,
            pressed: true,
            released: false,
        });
    }

    #[test]
    fn test_higher_z_wins_regardless_of_order() {
        let mut ui = UiContext::new();
        let low = ui.add(Rect::new(0, 0, 50, 50), 1);
        let high = ui.add(Rect::new(10, 10, 60, 60), 5);
        press_at(&mut ui, Point::new(20, 20));
        assert!(ui.clicked(high));
        assert!(!ui.clicked(low));

        let mut ui = UiContext::new();
        let high = ui.add(Rect::new(10, 10, 60, 60), 5);
        let low = ui.add(Rect::new(0, 0, 50, 50), 1);
        press_at(&mut ui, Point::new(20, 20));
        assert!(ui.clicked(high));
        assert!(!ui.clicked(low));
    }

    #[test]
    fn test_equal_z_first_registered_wins() {
        let mut ui = UiContext::new();
        let first = ui.add(Rect::new(0, 0, 50, 50), 3);
        let second = ui.add(Rect::new(0, 0, 50, 50), 3);
        assert_eq!(ui.candidates(Point::new(5, 5)), vec![first, second]);
        press_at(&mut ui, Point::new(5, 5));
        assert!(ui.clicked(first));
        assert!(!ui.clicked(second));
    }

    #[test]
    fn test_register_and_unregister_are_idempotent() {
        let mut ui = UiContext::new();
        let id = ui.add(Rect::new(0, 0, 10, 10), 0);
        ui.register(id, Rect::new(0, 0, 99, 99), 7);
        assert_eq!(ui.len(), 1);
        assert_eq!(ui.z_index(id), Some(0));
        ui.unregister(id);
        ui.unregister(id);
        assert!(ui.is_empty());
        assert_eq!(ui.hit_test(Point::new(5, 5)), None);
    }

    #[test]
    fn test_negative_z_is_not_hittable() {
        let mut ui = UiContext::new();
        let hidden = ui.add(Rect::new(0, 0, 10, 10), -1);
        assert_eq!(ui.hit_test(Point::new(5, 5)), None);
        ui.set_z_index(hidden, 2);
        assert_eq!(ui.hit_test(Point::new(5, 5)), Some(hidden));
    }

    #[test]
    fn test_release_outside_clears_focus() {
        let mut ui = UiContext::new();
        let id = ui.add(Rect::new(0, 0, 10, 10), 0);
        press_at(&mut ui, Point::new(5, 5));
        assert_eq!(ui.focused(), Some(id));
        ui.dispatch(PointerFrame {
            pos: Point::new(50, 50),
            down: false,
            pressed: false,
            released: true,
        });
        assert_eq!(ui.focused(), None);
    }

    #[test]
    fn test_held_button_clicks_once() {
        let mut ui = UiContext::new();
        let id = ui.add(Rect::new(0, 0, 10, 10), 0);
        press_at(&mut ui, Point::new(5, 5));
        assert!(ui.clicked(id));
        ui.dispatch(PointerFrame {
            pos: Point::new(5, 5),
            down: true,
            pressed: false,
            released: false,
        });
        assert!(!ui.clicked(id));
    }
}
