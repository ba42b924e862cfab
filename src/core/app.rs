//! Application state and message handling
//!
//! [`App::tick`] runs once per frame: it drains worker events, resolves the
//! pointer against the widget registry, routes the result to the dialog,
//! menus, toolbar and crop box, and applies key bindings. Everything the
//! user can do ends up in [`App::update`] as a [`Msg`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tiny_skia::Pixmap;

use crate::config::CropperConfig;
use crate::crop::CropRegion;
use crate::detect::batch::run_detection;
use crate::detect::{DETECTORS, Detector};
use crate::domain::{Point, Rect, SuggestionMap};
use crate::error::ItemError;
use crate::render::canvas::{Canvas, pixmap_from_image, text_width};
use crate::render::overlay::draw_crop_overlay;
use crate::session::cache::ResultCache;
use crate::session::export::{BatchEntry, export_batch, export_crop};
use crate::session::images::ImageList;
use crate::session::messages::Msg;
use crate::session::shortcuts::handle_key_event;
use crate::session::similar::remove_similar;
use crate::session::square_check::final_square_check;
use crate::widget::button::Button;
use crate::widget::dialog::{Dialog, DialogEvent};
use crate::widget::input::{FrameInput, KeyEvent, PointerFrame, PointerTracker};
use crate::widget::menu::MenuTree;
use crate::widget::notifier::Notifier;
use crate::widget::registry::UiContext;
use crate::worker::{CancelToken, TaskContext, TaskEvent, TaskKind, TaskQueue};

/// Top of the toolbar row, below the menu bar
pub const TOOLBAR_Y: i32 = 40;
/// Canvas row where the image's first pixel row is drawn
pub const IMAGE_TOP: i32 = 80;
const STATUS_HEIGHT: i32 = 30;
const TOOLBAR_Z: i32 = 1;

const BACKGROUND: [u8; 3] = [30, 30, 30];
const BAR_COLOR: [u8; 3] = [45, 45, 45];
const TEXT_COLOR: [u8; 3] = [230, 230, 230];

pub const WELCOME_TEXT: &str = "Press ESC or File > Exit to exit.";
pub const END_OF_LIST_TEXT: &str = "No more image to process.";

/// The image on screen at its current zoom
struct DisplayImage {
    path: PathBuf,
    original: DynamicImage,
    /// Size at zoom 1: the original, shrunk to fit the window if needed
    base: (u32, u32),
    size: (u32, u32),
    pixmap: Pixmap,
}

impl DisplayImage {
    fn open(path: &Path, max_side: u32) -> Result<Self, ItemError> {
        let original = image::open(path).map_err(|e| ItemError::image(path, e))?;
        let base = fit_within(original.dimensions(), max_side);
        let (size, pixmap) = render_scaled(&original, base)?;
        Ok(Self {
            path: path.to_path_buf(),
            original,
            base,
            size,
            pixmap,
        })
    }

    fn rescale(&mut self, zoom: f32) -> Result<(), ItemError> {
        let (size, pixmap) = render_scaled(&self.original, scaled_size(self.base, zoom))?;
        self.size = size;
        self.pixmap = pixmap;
        Ok(())
    }
}

fn render_scaled(original: &DynamicImage, size: (u32, u32)) -> Result<((u32, u32), Pixmap), ItemError> {
    let rgba = if size == original.dimensions() {
        original.to_rgba8()
    } else {
        original
            .resize_exact(size.0, size.1, FilterType::Triangle)
            .to_rgba8()
    };
    let pixmap = pixmap_from_image(&rgba).ok_or(ItemError::Degenerate {
        width: size.0 as i64,
        height: size.1 as i64,
    })?;
    Ok((size, pixmap))
}

/// Shrink `(w, h)` to fit a `max_side` square, keeping the aspect ratio
fn fit_within((w, h): (u32, u32), max_side: u32) -> (u32, u32) {
    if w <= max_side && h <= max_side {
        return (w, h);
    }
    let scale = max_side as f32 / w.max(h) as f32;
    (
        ((w as f32 * scale).round() as u32).max(1),
        ((h as f32 * scale).round() as u32).max(1),
    )
}

fn scaled_size(base: (u32, u32), zoom: f32) -> (u32, u32) {
    (
        (base.0 as f32 * zoom).round() as u32,
        (base.1 as f32 * zoom).round() as u32,
    )
}

fn to_image(p: Point) -> Point {
    Point::new(p.x, p.y - IMAGE_TOP)
}

pub struct App {
    config: CropperConfig,
    ui: UiContext,
    tracker: PointerTracker,
    menu: MenuTree<Msg>,
    toolbar: Vec<Button<Msg>>,
    dialog: Option<Dialog>,
    /// Dismissing the current dialog leaves the application
    exit_on_dismiss: bool,
    notifier: Option<Notifier>,
    region: CropRegion,
    images: Option<ImageList>,
    cache: Option<Arc<ResultCache>>,
    display: Option<DisplayImage>,
    zoom: f32,
    suggestions: SuggestionMap,
    /// Suggestions for the displayed path arrived mid-drag
    pending_adopt: bool,
    /// Loaded detectors, indexed like [`DETECTORS`]
    detectors: Vec<Option<Arc<dyn Detector>>>,
    tasks: TaskQueue,
    cancel: CancelToken,
    pointer: Point,
    debounce: bool,
    exit: bool,
}

impl App {
    pub fn new(config: CropperConfig) -> Result<Self> {
        let cancel = CancelToken::default();
        let tasks = TaskQueue::new(config.worker_threads, config.task_queue_capacity, cancel.clone())?;
        let mut ui = UiContext::new();
        let toolbar = build_toolbar(&mut ui);
        let menu = build_menu(&mut ui);
        let window = (config.window_size as i32, config.window_size as i32 + IMAGE_TOP + STATUS_HEIGHT);
        let notifier = config
            .show_welcome
            .then(|| Notifier::show(&mut ui, window, WELCOME_TEXT));

        Ok(Self {
            region: CropRegion::new(config.handle_tolerance),
            config,
            ui,
            tracker: PointerTracker::default(),
            menu,
            toolbar,
            dialog: None,
            exit_on_dismiss: false,
            notifier,
            images: None,
            cache: None,
            display: None,
            zoom: 1.0,
            suggestions: SuggestionMap::new(),
            pending_adopt: false,
            detectors: vec![None; DETECTORS.len()],
            tasks,
            cancel,
            pointer: Point::default(),
            debounce: false,
            exit: false,
        })
    }

    pub fn window_width(&self) -> i32 {
        self.config.window_size as i32
    }

    pub fn window_height(&self) -> i32 {
        self.config.window_size as i32 + IMAGE_TOP + STATUS_HEIGHT
    }

    fn window(&self) -> (i32, i32) {
        (self.window_width(), self.window_height())
    }

    pub fn should_exit(&self) -> bool {
        self.exit || self.cancel.is_cancelled()
    }

    /// Whether the frame loop should sleep briefly after this frame
    pub fn take_debounce(&mut self) -> bool {
        std::mem::take(&mut self.debounce)
    }

    pub fn tick(&mut self, input: FrameInput, now: Instant) {
        for event in self.tasks.drain_events() {
            self.handle_task_event(event, now);
        }

        let frame = self.tracker.frame(input.pointer, input.down);
        self.ui.dispatch(frame);
        self.pointer = input.pointer;
        // Widgets below may close themselves on this press; the canvas only
        // gets it when nothing was under the pointer at dispatch
        let canvas_free = self.dialog.is_none() && self.ui.hovered().is_none();

        let mut msgs = Vec::new();
        let mut dialog_events = Vec::new();
        if let Some(dialog) = self.dialog.as_mut() {
            if dialog.wants_keyboard() {
                dialog_events.extend(dialog.feed_keys(&mut self.ui, &input.keys));
            } else if input.keys.contains(&KeyEvent::Escape) {
                msgs.push(Msg::Exit);
            }
            dialog_events.extend(dialog.update(&mut self.ui));
        }
        if self.dialog.as_ref().is_some_and(Dialog::is_destroyed) {
            self.dialog = None;
        }
        for event in dialog_events {
            self.on_dialog_event(event, now);
        }

        msgs.extend(self.menu.update(&mut self.ui));
        for button in self.toolbar.iter_mut() {
            msgs.extend(button.update(&self.ui));
        }
        if let Some(notifier) = self.notifier.as_mut()
            && notifier.update(&mut self.ui)
        {
            self.notifier = None;
        }

        self.track_crop_gesture(frame, canvas_free);

        if self.dialog.is_none() {
            msgs.extend(input.keys.iter().filter_map(handle_key_event));
        }
        for msg in msgs {
            self.update(msg, now);
        }
    }

    /// Drive the crop box; a gesture only starts on empty canvas
    fn track_crop_gesture(&mut self, frame: PointerFrame, canvas_free: bool) {
        if self.display.is_none() {
            return;
        }
        let local = to_image(frame.pos);
        if frame.pressed {
            if canvas_free && self.dialog.is_none() {
                self.region.press(local);
            }
        } else if frame.down && self.region.is_dragging() {
            self.region.drag(local);
        }
        if frame.released {
            self.region.release();
            if std::mem::take(&mut self.pending_adopt) {
                self.adopt_suggestions();
            }
        }
    }

    pub fn update(&mut self, msg: Msg, now: Instant) {
        log::debug!("{:?}", msg);
        match msg {
            Msg::OpenFolderPrompt => {
                let window = self.window();
                let dialog = Dialog::input(&mut self.ui, window, "Image folder path:");
                self.open_dialog(dialog, false);
            }
            Msg::LoadFolder(dir) => self.load_folder(dir, now),
            Msg::Exit => self.request_exit(),
            Msg::ResetCheckpoint => {
                let Some(images) = self.images.as_mut() else {
                    return;
                };
                match images.reset_checkpoint() {
                    Ok(()) => self.show_current(),
                    Err(err) => self.show_info(format!("{err:#}")),
                }
            }
            Msg::Reset => {
                if self.display.is_some() {
                    self.set_zoom(1.0);
                    self.region.reset();
                }
            }
            Msg::Delete => {
                let Some(images) = self.images.as_mut() else {
                    return;
                };
                match images.delete_current().map(|_| ()) {
                    Ok(()) => self.show_current(),
                    Err(err) => {
                        log::error!("{}", err);
                        self.show_info(err.to_string());
                    }
                }
            }
            Msg::ZoomIn => self.zoom_by(self.config.zoom_step),
            Msg::ZoomOut => self.zoom_by(-self.config.zoom_step),
            Msg::Next => self.next_image(),
            Msg::CropAndNext => match self.export_current() {
                Ok(()) => self.next_image(),
                Err(err) => {
                    log::warn!("Crop not saved: {}", err);
                    self.show_info(format!("Crop not saved: {err}"));
                }
            },
            Msg::LoadDetector(index) => self.load_detector(index, now),
            Msg::Detect { detector, all } => self.detect(detector, all, now),
            Msg::ExportAllSuggestions => self.export_all(now),
            Msg::RemoveSimilarImages => self.remove_similar_images(now),
        }
    }

    fn request_exit(&mut self) {
        log::info!("Exit requested");
        self.exit = true;
        self.cancel.cancel();
    }

    fn open_dialog(&mut self, dialog: Dialog, exit_on_dismiss: bool) {
        if let Some(mut old) = self.dialog.take() {
            old.destroy(&mut self.ui);
        }
        self.dialog = Some(dialog);
        self.exit_on_dismiss = exit_on_dismiss;
    }

    fn show_info(&mut self, message: impl Into<String>) {
        let window = self.window();
        let dialog = Dialog::info(&mut self.ui, window, message);
        self.open_dialog(dialog, false);
    }

    fn on_dialog_event(&mut self, event: DialogEvent, now: Instant) {
        match event {
            DialogEvent::Dismissed => {
                if std::mem::take(&mut self.exit_on_dismiss) {
                    self.request_exit();
                }
            }
            DialogEvent::Submitted(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    self.update(Msg::LoadFolder(PathBuf::from(text)), now);
                }
            }
            DialogEvent::PasteRequested => {
                match arboard::Clipboard::new().and_then(|mut c| c.get_text()) {
                    Ok(text) => {
                        if let Some(dialog) = self.dialog.as_mut() {
                            dialog.paste(&text);
                        }
                    }
                    Err(err) => log::warn!("Clipboard unavailable: {}", err),
                }
            }
        }
    }

    fn load_folder(&mut self, dir: PathBuf, now: Instant) {
        match ImageList::open(&dir) {
            Ok(list) => {
                let cache = Arc::new(ResultCache::for_dir(list.dir()));
                let cached = cache.load();
                log::info!("Loaded {} cached result(s) for {}", cached.len(), dir.display());
                self.suggestions.extend(cached);
                self.cache = Some(cache);
                let check = (self.config.final_square_check && list.checkpoint_wrapped())
                    .then(|| list.paths().to_vec());
                self.images = Some(list);
                self.show_current();
                if let Some(paths) = check {
                    self.spawn("Final checking...", now, move |ctx| {
                        let check = final_square_check(&paths, ctx);
                        ctx.publish(TaskEvent::Settled {
                            summary: check.to_string(),
                            paths: check.settled,
                        });
                    });
                }
            }
            Err(err) => {
                log::error!("{:?}", err);
                self.show_info(format!("{err:#}"));
            }
        }
    }

    /// Display the image under the cursor, or announce the end of the list
    fn show_current(&mut self) {
        let current = self
            .images
            .as_ref()
            .and_then(ImageList::current)
            .map(Path::to_path_buf);
        match current {
            Some(path) => self.open_image(&path),
            None if self.images.is_some() => {
                self.display = None;
                let window = self.window();
                let dialog = Dialog::info(&mut self.ui, window, END_OF_LIST_TEXT);
                self.open_dialog(dialog, true);
            }
            None => {}
        }
    }

    fn open_image(&mut self, path: &Path) {
        self.zoom = 1.0;
        match DisplayImage::open(path, self.config.window_size) {
            Ok(display) => {
                self.display = Some(display);
                self.rebind_region();
            }
            Err(err) => {
                log::warn!("{}", err);
                self.display = None;
                self.show_info(format!("Cannot open image: {err}"));
            }
        }
    }

    fn next_image(&mut self) {
        let Some(images) = self.images.as_mut() else {
            return;
        };
        if let Err(err) = images.advance(true).map(|_| ()) {
            log::error!("Failed to save checkpoint: {:?}", err);
        }
        self.show_current();
    }

    /// Associate the crop box with the displayed image at its current size
    fn rebind_region(&mut self) {
        self.pending_adopt = false;
        let Some(display) = &self.display else {
            return;
        };
        let list = self
            .suggestions
            .get(&display.path)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.region
            .associate(&display.path, display.size.0 as i32, display.size.1 as i32, list);
    }

    /// Keep the box the user just dragged, measured against the new suggestions
    fn adopt_suggestions(&mut self) {
        let Some(display) = &self.display else {
            return;
        };
        let list = self
            .suggestions
            .get(&display.path)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.region.adopt(list);
    }

    fn set_zoom(&mut self, zoom: f32) {
        let Some(display) = self.display.as_mut() else {
            return;
        };
        if let Err(err) = display.rescale(zoom) {
            log::warn!("Zoom {} failed: {}", zoom, err);
            return;
        }
        self.zoom = zoom;
        self.rebind_region();
        self.debounce = true;
    }

    /// Step the zoom; kept only when the result fits the window
    fn zoom_by(&mut self, delta: f32) {
        let Some(display) = &self.display else {
            return;
        };
        let factor = self.zoom + delta;
        if factor < self.config.zoom_step - f32::EPSILON {
            return;
        }
        let (w, h) = scaled_size(display.base, factor);
        let max = self.config.window_size;
        if w > max || h > max {
            log::debug!("Zoom {} does not fit the window, reverted", factor);
            return;
        }
        self.set_zoom(factor);
    }

    fn export_current(&self) -> Result<(), ItemError> {
        let Some(display) = &self.display else {
            return Ok(());
        };
        let (w, h) = display.original.dimensions();
        let rect = self.region.export_rect(w, h)?;
        export_crop(&display.original, &display.path, rect, self.config.export_format)?;
        Ok(())
    }

    fn spawn(&mut self, title: &str, now: Instant, job: impl FnOnce(&TaskContext) + Send + 'static) {
        match self.tasks.submit(job) {
            Ok(progress) => {
                log::info!("Task started: {}", title);
                let window = self.window();
                let dialog = Dialog::progress(&mut self.ui, window, title, progress, now);
                self.open_dialog(dialog, false);
            }
            Err(err) => {
                log::warn!("{}: {}", title, err);
                self.show_info(err.to_string());
            }
        }
    }

    fn load_detector(&mut self, index: usize, now: Instant) {
        let Some(entry) = DETECTORS.get(index) else {
            return;
        };
        if self.detectors.get(index).is_some_and(Option::is_some) {
            self.show_info(format!("{} is already loaded.", entry.label));
            return;
        }
        let config = self.config.clone();
        self.spawn(&format!("Loading {}...", entry.label), now, move |ctx| {
            let mut detector = entry.build(&config);
            match detector.load(&config.detector_base()) {
                Ok(()) => ctx.publish(TaskEvent::DetectorLoaded {
                    index,
                    detector: Arc::from(detector),
                }),
                Err(err) => ctx.publish(TaskEvent::Failed {
                    kind: TaskKind::LoadDetector,
                    message: err.to_string(),
                }),
            }
            ctx.progress.set(1.0);
        });
    }

    fn install_detector(&mut self, index: usize, detector: Arc<dyn Detector>) {
        let Some(entry) = DETECTORS.get(index) else {
            return;
        };
        if let Some(slot) = self.detectors.get_mut(index) {
            *slot = Some(detector);
        }
        log::info!("Detector {} loaded", entry.id);

        if self.menu.find(entry.label).is_none() {
            let parent = self.menu.add_parent(&mut self.ui, entry.label);
            self.menu.add_child(
                &mut self.ui,
                parent,
                "Detect current image",
                Msg::Detect {
                    detector: index,
                    all: false,
                },
            );
            self.menu.add_child(
                &mut self.ui,
                parent,
                "Detect all images",
                Msg::Detect {
                    detector: index,
                    all: true,
                },
            );
        }
        if self.menu.find("Output").is_none() {
            let output = self.menu.add_parent(&mut self.ui, "Output");
            self.menu
                .add_child(&mut self.ui, output, "Crop all suggestions", Msg::ExportAllSuggestions);
        }
    }

    fn detect(&mut self, index: usize, all: bool, now: Instant) {
        let Some(detector) = self.detectors.get(index).cloned().flatten() else {
            return;
        };
        let Some(cache) = self.cache.clone() else {
            self.show_info("Load an image folder first.");
            return;
        };
        let paths: Vec<PathBuf> = if all {
            self.images
                .as_ref()
                .map(|images| images.paths().to_vec())
                .unwrap_or_default()
        } else {
            self.display.iter().map(|d| d.path.clone()).collect()
        };
        if paths.is_empty() {
            return;
        }
        let min_confidence = self.config.min_confidence;
        self.spawn("Detecting...", now, move |ctx| {
            let summary = run_detection(detector.as_ref(), &paths, &cache, min_confidence, ctx);
            ctx.publish(TaskEvent::Finished {
                kind: TaskKind::Detection,
                summary: summary.to_string(),
            });
        });
    }

    fn export_all(&mut self, now: Instant) {
        let Some(images) = &self.images else {
            return;
        };
        let entries: Vec<BatchEntry> = images
            .paths()
            .iter()
            .filter_map(|path| {
                let list = self.suggestions.get(path).filter(|l| !l.is_empty())?;
                Some(BatchEntry {
                    path: path.clone(),
                    suggestions: list.clone(),
                    padding: self.region.padding(path).copied().unwrap_or_default(),
                })
            })
            .collect();
        if entries.is_empty() {
            self.show_info("No suggestions to crop.");
            return;
        }
        let format = self.config.export_format;
        self.spawn("Cropping suggestions...", now, move |ctx| {
            let summary = export_batch(&entries, format, ctx);
            ctx.publish(TaskEvent::Finished {
                kind: TaskKind::Export,
                summary: summary.to_string(),
            });
        });
    }

    fn remove_similar_images(&mut self, now: Instant) {
        let Some(images) = &self.images else {
            return;
        };
        let paths = images.paths().to_vec();
        let (threshold, window) = (self.config.similar_threshold, self.config.similar_window);
        self.spawn("Removing similar images...", now, move |ctx| {
            let summary = remove_similar(&paths, threshold, window, ctx);
            ctx.publish(TaskEvent::Finished {
                kind: TaskKind::RemoveSimilar,
                summary: summary.to_string(),
            });
        });
    }

    fn handle_task_event(&mut self, event: TaskEvent, now: Instant) {
        match event {
            TaskEvent::Suggestions { path, suggestions } => {
                let on_screen = self.display.as_ref().is_some_and(|d| d.path == path);
                self.suggestions.insert(path, suggestions);
                // A drag in progress keeps its box until release
                if on_screen {
                    if self.region.is_dragging() {
                        self.pending_adopt = true;
                    } else {
                        self.rebind_region();
                    }
                }
            }
            TaskEvent::DetectorLoaded { index, detector } => self.install_detector(index, detector),
            TaskEvent::Settled { paths, summary } => {
                log::info!("Final check finished: {}", summary);
                let Some(images) = self.images.as_mut() else {
                    return;
                };
                images.settle(&paths);
                let shown = self.display.as_ref().map(|d| d.path.as_path());
                if images.current() != shown {
                    self.show_current();
                }
                if self.images.as_ref().and_then(ImageList::current).is_some() {
                    self.show_info(summary);
                }
            }
            TaskEvent::Finished { kind, summary } => {
                log::info!("{:?} finished: {}", kind, summary);
                if kind == TaskKind::RemoveSimilar
                    && let Some(dir) = self.images.as_ref().map(|i| i.dir().to_path_buf())
                {
                    self.load_folder(dir, now);
                }
                self.show_info(summary);
            }
            TaskEvent::Failed { kind, message } => {
                log::error!("{:?} failed: {}", kind, message);
                self.show_info(message);
            }
        }
    }

    pub fn render(&mut self, canvas: &mut Canvas, now: Instant) {
        canvas.clear(BACKGROUND);
        let (w, h) = self.window();
        let local = to_image(self.pointer);

        if let Some(display) = &self.display {
            let origin = Point::new(0, IMAGE_TOP);
            canvas.draw_pixmap(&display.pixmap, origin);
            let list = self
                .suggestions
                .get(&display.path)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            draw_crop_overlay(canvas, origin, &self.region, list, local);
        }

        canvas.fill_rect(Rect::new(0, 0, w, IMAGE_TOP), BAR_COLOR);
        for button in &self.toolbar {
            button.draw(canvas);
        }
        self.menu.draw(canvas);

        let coords = format!("x: {} y: {}", local.x, local.y);
        canvas.draw_text(Point::new(w - text_width(&coords) - 10, 11), &coords, TEXT_COLOR);

        canvas.fill_rect(Rect::new(0, h - STATUS_HEIGHT, w, h), BAR_COLOR);
        if let Some(images) = &self.images {
            canvas.draw_text(Point::new(10, h - 19), &images.formatted_info(), TEXT_COLOR);
        }

        if let Some(notifier) = &self.notifier {
            notifier.draw(canvas);
        }
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.draw(canvas, now);
        }
    }

    /// Stop workers and release detector resources
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.tasks.shutdown();
        for detector in self.detectors.iter().flatten() {
            detector.close();
        }
        log::info!("Shut down");
    }
}

fn build_toolbar(ui: &mut UiContext) -> Vec<Button<Msg>> {
    let entries = [
        ("Reset", Msg::Reset),
        ("Delete", Msg::Delete),
        ("Zoom In", Msg::ZoomIn),
        ("Zoom Out", Msg::ZoomOut),
        ("Next", Msg::Next),
        ("Crop & Next", Msg::CropAndNext),
    ];
    let mut x = 10;
    entries
        .into_iter()
        .map(|(label, msg)| {
            let button = Button::fitted(ui, label, Point::new(x, TOOLBAR_Y), TOOLBAR_Z, msg);
            x = button.rect().x2 + 5;
            button
        })
        .collect()
}

fn build_menu(ui: &mut UiContext) -> MenuTree<Msg> {
    let mut menu = MenuTree::new();
    let file = menu.add_parent(ui, "File");
    menu.add_child(ui, file, "Load image folder", Msg::OpenFolderPrompt);
    menu.add_child(ui, file, "Exit", Msg::Exit);
    let edit = menu.add_parent(ui, "Edit");
    menu.add_child(ui, edit, "Reset checkpoint", Msg::ResetCheckpoint);
    menu.add_child(ui, edit, "Remove similar images", Msg::RemoveSimilarImages);
    let plugins = menu.add_parent(ui, "Plugins");
    for (i, entry) in DETECTORS.iter().enumerate() {
        menu.add_child(ui, plugins, entry.label, Msg::LoadDetector(i));
    }
    menu
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::qr::QrDetector;
    use crate::domain::{Handle, Suggestion};
    use crate::session::images::CHECKPOINT_FILE;
    use std::time::Duration;

    fn config() -> CropperConfig {
        CropperConfig {
            show_welcome: false,
            worker_threads: 1,
            ..CropperConfig::default()
        }
    }

    fn folder(images: &[(&str, u32, u32)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, w, h) in images {
            image::RgbImage::from_pixel(*w, *h, image::Rgb([90, 120, 150]))
                .save(dir.path().join(name))
                .unwrap();
        }
        dir
    }

    fn input(x: i32, y: i32, down: bool) -> FrameInput {
        FrameInput {
            pointer: Point::new(x, y),
            down,
            keys: Vec::new(),
        }
    }

    fn click(app: &mut App, p: Point) {
        let now = Instant::now();
        app.tick(input(p.x, p.y, true), now);
        app.tick(input(p.x, p.y, false), now);
    }

    #[test]
    fn test_crop_and_next_writes_crop_and_checkpoint() {
        let dir = folder(&[("a.png", 200, 100), ("b.png", 200, 100)]);
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());
        assert_eq!(app.region.rect(), Rect::new(0, 0, 100, 100));

        app.update(Msg::CropAndNext, Instant::now());
        let crop = image::open(dir.path().join("a.png.jpg")).unwrap();
        assert_eq!(crop.dimensions(), (100, 100));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CHECKPOINT_FILE)).unwrap(),
            "2"
        );
        assert!(app.display.as_ref().unwrap().path.ends_with("b.png"));
    }

    #[test]
    fn test_end_of_list_dialog_exits_on_dismiss() {
        let dir = folder(&[("a.png", 50, 50)]);
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());
        app.update(Msg::Next, Instant::now());
        assert!(app.display.is_none());
        assert_eq!(app.dialog.as_ref().unwrap().message(), END_OF_LIST_TEXT);
        assert!(!app.should_exit());

        // OK sits at the bottom right of the centred Info dialog
        let (w, h) = app.window();
        click(&mut app, Point::new(w / 2 + 250 - 48, h / 2 + 75 - 25));
        assert!(app.dialog.is_none());
        assert!(app.should_exit());
    }

    #[test]
    fn test_zoom_steps_and_reverts() {
        let dir = folder(&[("a.png", 400, 400)]);
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());
        for _ in 0..6 {
            app.update(Msg::ZoomIn, Instant::now());
        }
        assert_eq!(app.zoom, 2.25);
        assert_eq!(app.display.as_ref().unwrap().size, (900, 900));
        assert_eq!(app.region.display_size(), (900, 900));
        assert!(app.take_debounce());
        assert!(!app.take_debounce());

        app.update(Msg::Reset, Instant::now());
        assert_eq!(app.zoom, 1.0);
        for _ in 0..6 {
            app.update(Msg::ZoomOut, Instant::now());
        }
        assert_eq!(app.zoom, 0.25);
    }

    #[test]
    fn test_finished_folder_gets_final_square_check() {
        let dir = folder(&[("a.png", 100, 100), ("b.png", 200, 100)]);
        std::fs::write(dir.path().join(CHECKPOINT_FILE), "3").unwrap();
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());
        assert!(app.display.as_ref().unwrap().path.ends_with("a.png"));
        assert!(app.dialog.is_some());

        let deadline = Instant::now() + Duration::from_secs(30);
        while app.images.as_ref().unwrap().len() == 2 && Instant::now() < deadline {
            app.tick(input(0, 0, false), Instant::now());
            std::thread::sleep(Duration::from_millis(5));
        }
        let images = app.images.as_ref().unwrap();
        assert_eq!(images.len(), 1);
        assert!(images.current().unwrap().ends_with("b.png"));
        assert!(app.display.as_ref().unwrap().path.ends_with("b.png"));
        assert!(
            app.dialog
                .as_ref()
                .unwrap()
                .message()
                .starts_with("1 image(s) already square")
        );
    }

    #[test]
    fn test_large_image_is_fitted() {
        assert_eq!(fit_within((1800, 900), 900), (900, 450));
        assert_eq!(fit_within((300, 200), 900), (300, 200));
    }

    #[test]
    fn test_detector_load_adds_menus_once() {
        let mut app = App::new(config()).unwrap();
        let base = app.menu.len();
        app.handle_task_event(
            TaskEvent::DetectorLoaded {
                index: 0,
                detector: Arc::new(QrDetector::default()),
            },
            Instant::now(),
        );
        assert!(app.menu.find(DETECTORS[0].label).is_some());
        assert!(app.menu.find("Output").is_some());
        assert_eq!(app.menu.len(), base + 2);

        app.handle_task_event(
            TaskEvent::DetectorLoaded {
                index: 1,
                detector: Arc::new(QrDetector::default()),
            },
            Instant::now(),
        );
        assert_eq!(app.menu.len(), base + 3);
        assert!(app.detectors.iter().all(Option::is_some));
    }

    #[test]
    fn test_suggestions_rebind_unless_dragging() {
        let dir = folder(&[("a.png", 100, 100)]);
        let path = dir.path().join("a.png");
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());

        app.handle_task_event(
            TaskEvent::Suggestions {
                path: path.clone(),
                suggestions: vec![Suggestion::new([0.2, 0.2, 0.6, 0.6])],
            },
            Instant::now(),
        );
        assert_eq!(app.region.rect(), Rect::new(20, 20, 60, 60));

        app.region.press(Point::new(40, 40));
        app.handle_task_event(
            TaskEvent::Suggestions {
                path,
                suggestions: vec![Suggestion::new([0.0, 0.0, 0.1, 0.1])],
            },
            Instant::now(),
        );
        assert_eq!(app.region.rect(), Rect::new(20, 20, 60, 60));
    }

    #[test]
    fn test_suggestions_during_drag_are_adopted_on_release() {
        let dir = folder(&[("a.png", 100, 100)]);
        let path = dir.path().join("a.png");
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());

        let now = Instant::now();
        app.tick(input(50, IMAGE_TOP + 50, true), now);
        assert!(app.region.is_dragging());
        app.handle_task_event(
            TaskEvent::Suggestions {
                path: path.clone(),
                suggestions: vec![Suggestion::new([0.2, 0.2, 0.6, 0.6])],
            },
            Instant::now(),
        );
        app.tick(input(50, IMAGE_TOP + 50, false), now);
        assert_eq!(app.region.rect(), Rect::new(0, 0, 100, 100));
        assert!(app.region.padding(&path).is_some());

        // The edit is kept relative to the suggestion across a zoom
        app.update(Msg::ZoomIn, now);
        assert_eq!(app.region.rect(), Rect::new(0, 0, 125, 125));
    }

    #[test]
    fn test_dialog_press_does_not_reach_crop_box() {
        let dir = folder(&[("a.png", 900, 700)]);
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());
        let before = app.region.rect();
        assert_eq!(before, Rect::new(0, 0, 700, 700));

        app.show_info("Process completed.");
        let (w, h) = app.window();
        let ok = Point::new(w / 2 + 250 - 48, h / 2 + 75 - 25);
        let now = Instant::now();
        app.tick(input(ok.x, ok.y, true), now);
        assert!(app.dialog.is_none());
        assert_eq!(app.region.handle(), Handle::Idle);

        app.tick(input(ok.x + 200, ok.y, true), now);
        app.tick(input(ok.x + 200, ok.y, false), now);
        assert_eq!(app.region.rect(), before);
    }

    #[test]
    fn test_text_field_swallows_bindings() {
        let dir = folder(&[("a.png", 60, 60), ("b.png", 60, 60)]);
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());
        app.update(Msg::OpenFolderPrompt, Instant::now());

        let mut frame = input(0, 0, false);
        frame.keys = vec![KeyEvent::Char('x'), KeyEvent::Char('r'), KeyEvent::Escape];
        app.tick(frame, Instant::now());
        assert_eq!(app.dialog.as_ref().unwrap().input_text(), Some("xr"));
        assert!(dir.path().join("a.png").exists());
        assert!(!app.should_exit());
    }

    #[test]
    fn test_toolbar_press_does_not_start_crop() {
        let dir = folder(&[("a.png", 60, 60), ("b.png", 60, 60)]);
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());
        let next = app
            .toolbar
            .iter()
            .find(|b| b.label() == "Next")
            .unwrap()
            .rect()
            .center();
        click(&mut app, next);
        assert_eq!(app.images.as_ref().unwrap().cursor(), 1);
        assert!(!app.region.is_dragging());
    }

    #[test]
    fn test_drag_on_canvas_moves_box() {
        let dir = folder(&[("a.png", 200, 100)]);
        let mut app = App::new(config()).unwrap();
        app.update(Msg::LoadFolder(dir.path().to_path_buf()), Instant::now());
        let now = Instant::now();
        app.tick(input(50, IMAGE_TOP + 50, true), now);
        app.tick(input(80, IMAGE_TOP + 50, true), now);
        app.tick(input(80, IMAGE_TOP + 50, false), now);
        assert_eq!(app.region.rect(), Rect::new(30, 0, 130, 100));
    }
}
