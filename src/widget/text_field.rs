//! Single-line editable text bound to the key buffer

use crate::domain::{Point, Rect};
use crate::render::canvas::{Canvas, GLYPH_SIZE, text_width};

use super::input::KeyEvent;
use super::registry::{UiContext, WidgetId};

/// Result of feeding keys to a focused field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Editing,
    /// Enter was pressed
    Submitted,
    /// Escape released focus
    Released,
}

#[derive(Debug)]
pub struct TextField {
    id: WidgetId,
    rect: Rect,
    text: String,
    focused: bool,
}

impl TextField {
    pub fn new(ui: &mut UiContext, rect: Rect, z: i32) -> Self {
        Self {
            id: ui.add(rect, z),
            rect,
            text: String::new(),
            focused: false,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Append text from outside the key buffer, e.g. the clipboard
    pub fn insert(&mut self, text: &str) {
        self.text.extend(text.chars().filter(|c| !c.is_control()));
    }

    /// Take focus on a press over the field, drop it on a press elsewhere
    pub fn update(&mut self, ui: &UiContext) {
        if ui.pointer().pressed {
            self.focused = ui.is_hovered(self.id);
        }
    }

    /// Apply buffered keys; does nothing without focus
    pub fn feed(&mut self, keys: &[KeyEvent]) -> FieldOutcome {
        if !self.focused {
            return FieldOutcome::Editing;
        }
        for key in keys {
            match key {
                KeyEvent::Char(c) if !c.is_control() => self.text.push(*c),
                KeyEvent::Char(_) => {}
                KeyEvent::Backspace => {
                    self.text.pop();
                }
                KeyEvent::Enter => return FieldOutcome::Submitted,
                KeyEvent::Escape => {
                    self.focused = false;
                    return FieldOutcome::Released;
                }
            }
        }
        FieldOutcome::Editing
    }

    pub fn destroy(&self, ui: &mut UiContext) {
        ui.unregister(self.id);
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        let r = self.rect.normalized();
        canvas.fill_rect(r, [255, 255, 255]);
        let border = if self.focused { [0, 120, 215] } else { [90, 90, 90] };
        canvas.stroke_rect(r, border, 1.0);

        // Keep the tail visible when the text overflows
        let room = ((r.width() - 8) / GLYPH_SIZE).max(0) as usize;
        let count = self.text.chars().count();
        let visible: String = self.text.chars().skip(count.saturating_sub(room)).collect();
        let y = r.y1 + (r.height() - GLYPH_SIZE) / 2;
        canvas.draw_text(Point::new(r.x1 + 4, y), &visible, [0, 0, 0]);
        if self.focused {
            let caret_x = r.x1 + 4 + text_width(&visible);
            canvas.fill_rect(Rect::from_origin(caret_x, y, 1, GLYPH_SIZE), [0, 0, 0]);
        }
    }
}
