//! Clickable rectangle with a bound action

use crate::domain::{Point, Rect};
use crate::render::canvas::{Canvas, Rgb, text_width};

use super::registry::{UiContext, WidgetId};

/// Height of buttons in the menu bar and toolbar
pub const BUTTON_HEIGHT: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStatus {
    #[default]
    Idle,
    Hover,
    /// Pressed; the action fired on entry
    Active,
}

/// Fill colors per status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonColors {
    pub idle: Rgb,
    pub hover: Rgb,
    pub active: Rgb,
    pub text: Rgb,
}

impl Default for ButtonColors {
    fn default() -> Self {
        Self {
            idle: [125, 125, 125],
            hover: [50, 50, 50],
            active: [200, 100, 0],
            text: [255, 255, 255],
        }
    }
}

#[derive(Debug)]
pub struct Button<A> {
    id: WidgetId,
    rect: Rect,
    z: i32,
    label: String,
    status: ButtonStatus,
    action: A,
    pub colors: ButtonColors,
}

impl<A: Clone> Button<A> {
    /// Create and register a button
    pub fn new(ui: &mut UiContext, label: impl Into<String>, rect: Rect, z: i32, action: A) -> Self {
        let id = ui.add(rect, z);
        Self {
            id,
            rect,
            z,
            label: label.into(),
            status: ButtonStatus::Idle,
            action,
            colors: ButtonColors::default(),
        }
    }

    /// Button sized to fit its label
    pub fn fitted(ui: &mut UiContext, label: &str, origin: Point, z: i32, action: A) -> Self {
        let rect = Rect::from_origin(origin.x, origin.y, text_width(label) + 16, BUTTON_HEIGHT);
        Self::new(ui, label, rect, z, action)
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> ButtonStatus {
        self.status
    }

    pub fn is_visible(&self) -> bool {
        self.z >= 0
    }

    pub fn set_z_index(&mut self, ui: &mut UiContext, z: i32) {
        self.z = z;
        ui.set_z_index(self.id, z);
    }

    pub fn set_rect(&mut self, ui: &mut UiContext, rect: Rect) {
        self.rect = rect;
        ui.set_rect(self.id, rect);
    }

    /// Advance the status machine; returns the action on the click edge
    pub fn update(&mut self, ui: &UiContext) -> Option<A> {
        let hovered = ui.is_hovered(self.id);
        let pointer = ui.pointer();
        match self.status {
            ButtonStatus::Active if !hovered || !pointer.down => {
                self.status = ButtonStatus::Idle;
                None
            }
            ButtonStatus::Active => None,
            _ if ui.clicked(self.id) => {
                self.status = ButtonStatus::Active;
                Some(self.action.clone())
            }
            _ if hovered => {
                self.status = ButtonStatus::Hover;
                None
            }
            _ => {
                self.status = ButtonStatus::Idle;
                None
            }
        }
    }

    /// Remove from the registry
    pub fn destroy(&self, ui: &mut UiContext) {
        ui.unregister(self.id);
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if !self.is_visible() {
            return;
        }
        let fill = match self.status {
            ButtonStatus::Idle => self.colors.idle,
            ButtonStatus::Hover => self.colors.hover,
            ButtonStatus::Active => self.colors.active,
        };
        canvas.fill_rect(self.rect, fill);
        let r = self.rect.normalized();
        let text_x = r.x1 + (r.width() - text_width(&self.label)) / 2;
        let text_y = r.y1 + (r.height() - 8) / 2;
        canvas.draw_text(Point::new(text_x, text_y), &self.label, self.colors.text);
    }
}
