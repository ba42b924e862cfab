//! Modal overlay: Info, Progress, or Input
//!
//! A dialog registers a backdrop covering the whole window just below its
//! own controls, so nothing underneath can be hit while it is open. The
//! app keeps at most one; opening another destroys the previous one.

use std::time::Instant;

use crate::domain::{Point, Rect};
use crate::render::canvas::{Canvas, GLYPH_SIZE};
use crate::worker::ProgressHandle;

use super::button::Button;
use super::input::KeyEvent;
use super::progress::ProgressIndicator;
use super::registry::{UiContext, WidgetId};
use super::text_field::{FieldOutcome, TextField};

/// Backdrop z-index; controls sit one above
pub const DIALOG_Z: i32 = 10000;

const HALF_HEIGHT: i32 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Ok,
    Paste,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    Dismissed,
    Submitted(String),
    /// The user asked for clipboard contents to be inserted
    PasteRequested,
}

#[derive(Debug)]
enum Body {
    Info,
    Progress(ProgressIndicator),
    Input(TextField),
}

#[derive(Debug)]
pub struct Dialog {
    body: Body,
    message: String,
    frame: Rect,
    backdrop: WidgetId,
    buttons: Vec<Button<Control>>,
    destroyed: bool,
}

impl Dialog {
    /// Message with an OK button
    pub fn info(ui: &mut UiContext, window: (i32, i32), message: impl Into<String>) -> Self {
        let mut dialog = Self::frame(ui, window, 250, message.into(), Body::Info);
        dialog.add_ok(ui);
        dialog
    }

    /// Progress bar that closes itself once the handle reaches 1
    pub fn progress(
        ui: &mut UiContext,
        window: (i32, i32),
        message: impl Into<String>,
        handle: ProgressHandle,
        now: Instant,
    ) -> Self {
        let body = Body::Progress(ProgressIndicator::new(handle, now));
        Self::frame(ui, window, 250, message.into(), body)
    }

    /// Prompt with a focused text field, OK, and Paste
    pub fn input(ui: &mut UiContext, window: (i32, i32), prompt: impl Into<String>) -> Self {
        let mut dialog = Self::frame(ui, window, 350, prompt.into(), Body::Info);
        let f = dialog.frame;
        let center_y = (f.y1 + f.y2) / 2;
        let mut field = TextField::new(
            ui,
            Rect::new(f.x1 + 15, center_y - 15, f.x2 - 15, center_y + 15),
            DIALOG_Z + 1,
        );
        field.set_focus(true);
        dialog.body = Body::Input(field);
        dialog.add_ok(ui);
        let paste = Rect::from_origin(f.x2 - 190, f.y2 - 40, 100, 30);
        dialog
            .buttons
            .push(Button::new(ui, "Paste", paste, DIALOG_Z + 1, Control::Paste));
        dialog
    }

    fn frame(ui: &mut UiContext, window: (i32, i32), half_width: i32, message: String, body: Body) -> Self {
        let (w, h) = window;
        let backdrop = ui.add(Rect::new(0, 0, w, h), DIALOG_Z);
        let (cx, cy) = (w / 2, h / 2);
        Self {
            body,
            message,
            frame: Rect::new(cx - half_width, cy - HALF_HEIGHT, cx + half_width, cy + HALF_HEIGHT),
            backdrop,
            buttons: Vec::new(),
            destroyed: false,
        }
    }

    fn add_ok(&mut self, ui: &mut UiContext) {
        let ok = Rect::from_origin(self.frame.x2 - 85, self.frame.y2 - 40, 75, 30);
        self.buttons
            .push(Button::new(ui, "OK", ok, DIALOG_Z + 1, Control::Ok));
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Keys go to the text field instead of the global bindings
    pub fn wants_keyboard(&self) -> bool {
        matches!(&self.body, Body::Input(field) if field.is_focused())
    }

    pub fn input_text(&self) -> Option<&str> {
        match &self.body {
            Body::Input(field) => Some(field.text()),
            _ => None,
        }
    }

    pub fn update(&mut self, ui: &mut UiContext) -> Option<DialogEvent> {
        if self.destroyed {
            return None;
        }
        if let Body::Progress(progress) = &self.body {
            if progress.is_done() {
                self.destroy(ui);
            }
            return None;
        }
        if let Body::Input(field) = &mut self.body {
            field.update(ui);
        }

        let mut fired = None;
        for button in self.buttons.iter_mut() {
            if let Some(control) = button.update(ui) {
                fired = Some(control);
            }
        }
        match fired? {
            Control::Ok => Some(self.confirm(ui)),
            Control::Paste => Some(DialogEvent::PasteRequested),
        }
    }

    /// Route buffered keys to the field; Enter confirms
    pub fn feed_keys(&mut self, ui: &mut UiContext, keys: &[KeyEvent]) -> Option<DialogEvent> {
        let Body::Input(field) = &mut self.body else {
            return None;
        };
        match field.feed(keys) {
            FieldOutcome::Submitted => Some(self.confirm(ui)),
            FieldOutcome::Editing | FieldOutcome::Released => None,
        }
    }

    pub fn paste(&mut self, text: &str) {
        if let Body::Input(field) = &mut self.body {
            field.insert(text.trim());
            field.set_focus(true);
        }
    }

    fn confirm(&mut self, ui: &mut UiContext) -> DialogEvent {
        let event = match &self.body {
            Body::Input(field) => DialogEvent::Submitted(field.text().to_string()),
            _ => DialogEvent::Dismissed,
        };
        self.destroy(ui);
        event
    }

    /// Unregister every part; idempotent
    pub fn destroy(&mut self, ui: &mut UiContext) {
        ui.unregister(self.backdrop);
        for button in &self.buttons {
            button.destroy(ui);
        }
        if let Body::Input(field) = &self.body {
            field.destroy(ui);
        }
        self.destroyed = true;
    }

    pub fn draw(&mut self, canvas: &mut Canvas, now: Instant) {
        if self.destroyed {
            return;
        }
        let screen = Rect::new(0, 0, canvas.width() as i32, canvas.height() as i32);
        canvas.shade_rect(screen, [0, 0, 0], 120);
        let f = self.frame;
        canvas.fill_rect(f, [40, 40, 40]);
        canvas.stroke_rect(f, [200, 200, 200], 1.0);
        let columns = ((f.width() - 30) / GLYPH_SIZE).max(1) as usize;
        for (i, line) in wrap(&self.message, columns).iter().take(3).enumerate() {
            let y = f.y1 + 15 + i as i32 * (GLYPH_SIZE + 4);
            canvas.draw_text(Point::new(f.x1 + 15, y), line, [255, 255, 255]);
        }

        match &mut self.body {
            Body::Info => {}
            Body::Progress(progress) => {
                let cy = (f.y1 + f.y2) / 2;
                let track = Rect::new(f.x1 + 15, cy - 10, f.x2 - 15, cy + 10);
                progress.draw(canvas, track, now);
            }
            Body::Input(field) => field.draw(canvas),
        }
        for button in &self.buttons {
            button.draw(canvas);
        }
    }
}

/// Break `text` into lines of at most `columns` characters, at spaces where possible
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > columns {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..columns).collect());
        }
        let needed = line.chars().count() + usize::from(!line.is_empty()) + word.len();
        if needed > columns && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
