//! Glue that keeps a renderer in step with a [`Store`].

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use boardview_core::{Store, ViewTransform};
use kurbo::Size;

use crate::bitmap::BitmapLoader;
use crate::renderer::{CanvasRenderer, RendererConfig, RendererKind, create_renderer};
use crate::surface::Surface;

/// A board on screen: the store's change feeds wired into a renderer.
///
/// Call [`Canvas::on_frame`] once per display refresh. It forwards every
/// pending screen-size and viewport change in commit order, re-exports the
/// shapes if any object changed, then lets the renderer run its frame.
pub struct Canvas {
    renderer: Box<dyn CanvasRenderer>,
    screen_rx: Receiver<Size>,
    viewport_rx: Receiver<ViewTransform>,
    objects_rx: Receiver<u64>,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("renderer", &self.renderer.kind())
            .finish_non_exhaustive()
    }
}

impl Canvas {
    pub fn new(
        store: &mut Store,
        surface: Box<dyn Surface>,
        loader: Arc<dyn BitmapLoader>,
        config: RendererConfig,
    ) -> Self {
        let screen_rx = store.subscribe_screen_size();
        let viewport_rx = store.viewport.subscribe();
        let objects_rx = store.objects.subscribe();
        let renderer = create_renderer(
            surface,
            loader,
            store.screen_size(),
            store.viewport.transform(),
            store.objects.transferable_data(),
            config,
        );
        Self {
            renderer,
            screen_rx,
            viewport_rx,
            objects_rx,
        }
    }

    /// Wrap an already constructed renderer.
    pub fn with_renderer(store: &mut Store, renderer: Box<dyn CanvasRenderer>) -> Self {
        Self {
            renderer,
            screen_rx: store.subscribe_screen_size(),
            viewport_rx: store.viewport.subscribe(),
            objects_rx: store.objects.subscribe(),
        }
    }

    pub fn renderer_kind(&self) -> RendererKind {
        self.renderer.kind()
    }

    pub fn on_frame(&mut self, store: &Store) {
        for size in self.screen_rx.try_iter() {
            self.renderer.set_dimensions(size);
        }
        for transform in self.viewport_rx.try_iter() {
            self.renderer.set_viewport(transform);
        }
        if self.objects_rx.try_iter().count() > 0 {
            self.renderer.set_shapes(store.objects.transferable_data());
        }
        self.renderer.on_frame();
    }

    pub fn destroy(&mut self) {
        self.renderer.destroy();
    }
}
