//! minifb window host

use std::sync::Arc;

use anyhow::{Context, Result};
use minifb::{InputCallback, Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use parking_lot::Mutex;

use crate::domain::Point;
use crate::render::canvas::Canvas;
use crate::widget::input::{FrameInput, KeyEvent};

use super::frame_loop::Host;

/// Collects typed characters between frames
struct CharBuffer(Arc<Mutex<Vec<char>>>);

impl InputCallback for CharBuffer {
    fn add_char(&mut self, uni_char: u32) {
        if let Some(c) = char::from_u32(uni_char).filter(|c| !c.is_control()) {
            self.0.lock().push(c);
        }
    }
}

pub struct MinifbHost {
    window: Window,
    width: usize,
    height: usize,
    buffer: Vec<u32>,
    chars: Arc<Mutex<Vec<char>>>,
}

impl MinifbHost {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .with_context(|| format!("Failed to open a {width}x{height} window"))?;
        let chars = Arc::new(Mutex::new(Vec::new()));
        window.set_input_callback(Box::new(CharBuffer(chars.clone())));
        Ok(Self {
            window,
            width,
            height,
            buffer: Vec::with_capacity(width * height),
            chars,
        })
    }
}

impl Host for MinifbHost {
    fn is_open(&self) -> bool {
        self.window.is_open()
    }

    fn poll_input(&mut self) -> FrameInput {
        let mut keys: Vec<KeyEvent> = self
            .window
            .get_keys_pressed(KeyRepeat::Yes)
            .into_iter()
            .filter_map(|key| match key {
                Key::Escape => Some(KeyEvent::Escape),
                Key::Enter | Key::NumPadEnter => Some(KeyEvent::Enter),
                Key::Backspace => Some(KeyEvent::Backspace),
                _ => None,
            })
            .collect();
        keys.extend(self.chars.lock().drain(..).map(KeyEvent::Char));

        let pointer = self
            .window
            .get_mouse_pos(MouseMode::Pass)
            .map(|(x, y)| Point::new(x.round() as i32, y.round() as i32))
            .unwrap_or_default();
        FrameInput {
            pointer,
            down: self.window.get_mouse_down(MouseButton::Left),
            keys,
        }
    }

    fn present(&mut self, canvas: &Canvas) -> Result<()> {
        canvas.write_0rgb(&mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .context("Failed to present frame")?;
        Ok(())
    }
}
