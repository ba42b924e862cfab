//! Fixed-cadence render and input loop

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::config::CropperConfig;
use crate::render::canvas::Canvas;
use crate::widget::input::FrameInput;

use super::app::App;

/// Window system seam: input in, pixels out
pub trait Host {
    fn is_open(&self) -> bool;

    /// Gather this frame's pointer state and buffered keys
    fn poll_input(&mut self) -> FrameInput;

    fn present(&mut self, canvas: &Canvas) -> Result<()>;
}

pub struct FrameLoop {
    interval: Duration,
    debounce: Duration,
}

impl FrameLoop {
    pub fn new(config: &CropperConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.frame_interval_ms),
            debounce: Duration::from_millis(config.zoom_debounce_ms),
        }
    }

    /// Tick and redraw until the host closes or the app asks to exit
    ///
    /// The only blocking calls are the cadence sleep and the short sleep
    /// after a zoom, so worker progress is picked up every frame.
    pub fn run(&self, app: &mut App, host: &mut impl Host) -> Result<()> {
        let (w, h) = (app.window_width() as u32, app.window_height() as u32);
        let mut canvas = Canvas::new(w, h).with_context(|| format!("Cannot allocate a {w}x{h} canvas"))?;
        let mut frames: u64 = 0;

        while host.is_open() && !app.should_exit() {
            let started = Instant::now();
            app.tick(host.poll_input(), started);
            if app.should_exit() {
                break;
            }
            app.render(&mut canvas, started);
            host.present(&canvas)?;
            frames += 1;

            if app.take_debounce() {
                std::thread::sleep(self.debounce);
            }
            if let Some(rest) = self.interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }

        log::info!("Frame loop stopped after {} frame(s)", frames);
        app.shutdown();
        Ok(())
    }
}
