//! The draw loop shared by both renderer backends.
//!
//! A frame does nothing unless something marked the scene dirty or the FPS
//! overlay is on. Bitmap fetches never block a frame: their futures are
//! polled with a waker that raises a flag, and the next frame turns the
//! flag into a redraw.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Waker;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use boardview_core::coords::viewport_bounds;
use boardview_core::{Bounds, ObjectId, ShapeData, ViewTransform};
use futures::task::{ArcWake, waker};
use kurbo::{Affine, Point, Rect, Size};
use peniko::Color;

use crate::bitmap::BitmapLoader;
use crate::shapes::{DrawContext, Shape};
use crate::surface::Surface;

/// How often the FPS figure is recomputed.
const FPS_WINDOW: Duration = Duration::from_millis(1000);

/// Raises a flag when a pending bitmap makes progress.
#[derive(Debug, Default)]
struct FrameWaker {
    woken: AtomicBool,
}

impl ArcWake for FrameWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::SeqCst);
    }
}

/// Rolling frames-per-second counter.
#[derive(Debug)]
pub struct FpsCounter {
    prev_time: Instant,
    frames: u32,
    last_fps: Option<String>,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            prev_time: now,
            frames: 0,
            last_fps: None,
        }
    }

    /// Count a frame. Returns the label to show, if one has been computed yet.
    pub fn tick(&mut self, now: Instant) -> Option<&str> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.prev_time);
        if elapsed > FPS_WINDOW {
            let fps = (f64::from(self.frames) / elapsed.as_secs_f64()).max(0.0).round();
            self.last_fps = Some(format!("{} FPS", fps as u64));
            self.prev_time = now;
            self.frames = 0;
        }
        self.last_fps.as_deref()
    }
}

/// Surface, shapes and view state driven one frame at a time.
pub struct RenderLoop {
    surface: Box<dyn Surface>,
    loader: Arc<dyn BitmapLoader>,
    redraw: bool,
    screen_size: Size,
    viewport: ViewTransform,
    viewport_bounds: Bounds,
    shapes: HashMap<ObjectId, Shape>,
    /// Paint order.
    order: Vec<ObjectId>,
    show_fps: bool,
    fps: FpsCounter,
    wake: Arc<FrameWaker>,
    waker: Waker,
}

impl std::fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("redraw", &self.redraw)
            .field("screen_size", &self.screen_size)
            .field("viewport", &self.viewport)
            .field("shapes", &self.order.len())
            .field("show_fps", &self.show_fps)
            .finish()
    }
}

impl RenderLoop {
    pub fn new(
        surface: Box<dyn Surface>,
        loader: Arc<dyn BitmapLoader>,
        screen_size: Size,
        viewport: ViewTransform,
        shapes: Vec<ShapeData>,
    ) -> Self {
        let wake = Arc::new(FrameWaker::default());
        let mut render_loop = Self {
            surface,
            loader,
            redraw: true,
            screen_size: Size::ZERO,
            viewport,
            viewport_bounds: Bounds::default(),
            shapes: HashMap::new(),
            order: Vec::new(),
            show_fps: true,
            fps: FpsCounter::new(Instant::now()),
            waker: waker(wake.clone()),
            wake,
        };
        render_loop.set_dimensions(screen_size);
        render_loop.set_shapes(shapes);
        render_loop
    }

    pub fn with_show_fps(mut self, show_fps: bool) -> Self {
        self.show_fps = show_fps;
        self
    }

    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    pub fn screen_size(&self) -> Size {
        self.screen_size
    }

    pub fn viewport(&self) -> ViewTransform {
        self.viewport
    }

    /// Board-space region currently on screen.
    pub fn viewport_bounds(&self) -> Bounds {
        self.viewport_bounds
    }

    pub fn shape_count(&self) -> usize {
        self.order.len()
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.get(id)
    }

    pub fn set_dimensions(&mut self, size: Size) {
        self.screen_size = size;
        self.surface.resize(size);
        self.update_viewport_bounds();
        self.redraw = true;
    }

    pub fn set_viewport(&mut self, viewport: ViewTransform) {
        self.viewport = viewport;
        self.update_viewport_bounds();
        self.redraw = true;
    }

    /// Replace every shape and the paint order.
    ///
    /// Images that keep their id and source keep their bitmap.
    pub fn set_shapes(&mut self, shapes: Vec<ShapeData>) {
        let mut previous = std::mem::take(&mut self.shapes);
        self.order.clear();
        for data in shapes {
            let mut shape = Shape::from_data(data);
            if let Some(old) = previous.remove(shape.id()) {
                shape.inherit_from(old);
            }
            let id = shape.id().to_string();
            if self.shapes.insert(id.clone(), shape).is_none() {
                self.order.push(id);
            }
        }
        self.redraw = true;
    }

    fn update_viewport_bounds(&mut self) {
        self.viewport_bounds = viewport_bounds(self.screen_size, &self.viewport);
    }

    /// Run one frame. Returns whether anything was drawn.
    pub fn frame(&mut self) -> bool {
        self.frame_at(Instant::now())
    }

    pub(crate) fn frame_at(&mut self, now: Instant) -> bool {
        if self.wake.woken.swap(false, Ordering::SeqCst) {
            self.redraw = true;
        }
        if !self.show_fps && !self.redraw {
            return false;
        }
        self.redraw = false;

        let surface = &mut *self.surface;
        surface.clear();
        surface.save();
        surface.set_transform(self.viewport.to_affine());
        let ctx = DrawContext {
            loader: self.loader.as_ref(),
            waker: &self.waker,
        };
        for id in &self.order {
            if let Some(shape) = self.shapes.get_mut(id) {
                if shape.is_visible(&self.viewport_bounds) {
                    shape.render(surface, &ctx);
                }
            }
        }
        surface.restore();

        if self.show_fps {
            if let Some(label) = self.fps.tick(now) {
                surface.save();
                surface.set_transform(Affine::IDENTITY);
                surface.fill_rect(Rect::new(5.0, 0.0, 55.0, 18.0), Color::from_rgba8(0, 0, 0, 255));
                surface.fill_text(label, Point::new(8.0, 14.0), 14.0, Color::from_rgba8(0, 255, 0, 255));
                surface.restore();
            }
        }

        surface.present();
        true
    }
}
