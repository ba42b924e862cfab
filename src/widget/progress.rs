//! Progress bar with ETA, or a bouncing segment before the first update

use std::time::{Duration, Instant};

use crate::domain::{Point, Rect};
use crate::render::canvas::Canvas;
use crate::worker::ProgressHandle;

const SEGMENT_MAX: i32 = 50;
const SEGMENT_STEP: i32 = 2;

#[derive(Debug)]
pub struct ProgressIndicator {
    handle: ProgressHandle,
    started: Instant,
    anim_x: i32,
    anim_w: i32,
}

impl ProgressIndicator {
    pub fn new(handle: ProgressHandle, started: Instant) -> Self {
        Self {
            handle,
            started,
            anim_x: 0,
            anim_w: 0,
        }
    }

    pub fn fraction(&self) -> f32 {
        self.handle.get()
    }

    pub fn is_done(&self) -> bool {
        self.fraction() >= 1.0
    }

    /// `(1 - p) * elapsed / p`; undefined before any progress
    pub fn eta(&self, now: Instant) -> Option<Duration> {
        let p = self.fraction();
        if p <= 0.0 {
            return None;
        }
        let elapsed = now.saturating_duration_since(self.started);
        Some(elapsed.mul_f32((1.0 - p) / p))
    }

    pub fn status_text(&self, now: Instant) -> String {
        match self.eta(now) {
            Some(eta) => format!("{:.2}% - ETA {}", self.fraction() * 100.0, format_duration(eta)),
            None => "Please wait.".to_string(),
        }
    }

    /// Advance the indeterminate segment across a track `width` pixels wide
    pub fn tick_animation(&mut self, width: i32) {
        if self.anim_w < SEGMENT_MAX {
            self.anim_w += SEGMENT_STEP;
        } else {
            self.anim_x += SEGMENT_STEP;
            if self.anim_x + self.anim_w > width {
                self.anim_x = 0;
                self.anim_w = 0;
            }
        }
    }

    pub fn draw(&mut self, canvas: &mut Canvas, track: Rect, now: Instant) {
        let t = track.normalized();
        canvas.fill_rect(t, [60, 60, 60]);
        let p = self.fraction();
        if p > 0.0 {
            let filled = (t.width() as f32 * p).round() as i32;
            canvas.fill_rect(Rect::from_origin(t.x1, t.y1, filled, t.height()), [0, 150, 255]);
        } else {
            self.tick_animation(t.width());
            let seg = Rect::from_origin(t.x1 + self.anim_x, t.y1, self.anim_w, t.height());
            canvas.fill_rect(seg, [0, 150, 255]);
        }
        canvas.draw_text(Point::new(t.x1, t.y2 + 8), &self.status_text(now), [255, 255, 255]);
    }
}

/// `m:ss.mmm`, or `h:mm:ss.mmm` past an hour
pub fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    let ms = total_ms % 1000;
    let secs = (total_ms / 1000) % 60;
    let mins = (total_ms / 60_000) % 60;
    let hours = total_ms / 3_600_000;
    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}.{ms:03}")
    } else {
        format!("{mins}:{secs:02}.{ms:03}")
    }
}
