//! Dismissible notification balloon

use crate::domain::{Point, Rect};
use crate::render::canvas::{Canvas, GLYPH_SIZE, text_width};

use super::registry::{UiContext, WidgetId};

/// Above the menu bar, below dialogs
pub const NOTIFY_Z: i32 = 9998;

const PADDING: i32 = 10;

#[derive(Debug)]
pub struct Notifier {
    id: WidgetId,
    rect: Rect,
    text: String,
    visible: bool,
}

impl Notifier {
    /// Balloon anchored at the bottom right of the window
    pub fn show(ui: &mut UiContext, window: (i32, i32), text: impl Into<String>) -> Self {
        let text = text.into();
        let w = text_width(&text) + 2 * PADDING;
        let h = GLYPH_SIZE + 2 * PADDING;
        let rect = Rect::from_origin(window.0 - w - 20, window.1 - h - 40, w, h);
        Self {
            id: ui.add(rect, NOTIFY_Z),
            rect,
            text,
            visible: true,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// A click on the balloon closes it; returns whether it closed this frame
    pub fn update(&mut self, ui: &mut UiContext) -> bool {
        if self.visible && ui.clicked(self.id) {
            self.close(ui);
            return true;
        }
        false
    }

    pub fn close(&mut self, ui: &mut UiContext) {
        ui.unregister(self.id);
        self.visible = false;
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if !self.visible {
            return;
        }
        canvas.fill_rect(self.rect, [255, 255, 225]);
        canvas.stroke_rect(self.rect, [80, 80, 80], 1.0);
        canvas.draw_text(
            Point::new(self.rect.x1 + PADDING, self.rect.y1 + PADDING),
            &self.text,
            [0, 0, 0],
        );
    }
}
