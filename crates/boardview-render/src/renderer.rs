//! Renderer contract and backend selection.

use std::sync::Arc;
use std::time::Duration;

use boardview_core::{ShapeData, ViewTransform};
use kurbo::Size;
use thiserror::Error;

use crate::background::BackgroundRenderer;
use crate::bitmap::BitmapLoader;
use crate::local::LocalRenderer;
use crate::surface::Surface;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render thread is gone")]
    Disconnected,
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Which backend is drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Draws on the caller's thread from [`CanvasRenderer::on_frame`].
    Local,
    /// Draws on a dedicated thread that owns the surface.
    Background,
}

/// Renderer options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    /// Draw the FPS overlay. Keeps every frame drawing while on.
    pub show_fps: bool,
    /// Use the background backend when the platform supports it.
    pub prefer_background: bool,
    /// Frame pacing of the background thread.
    pub frame_interval: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            show_fps: true,
            prefer_background: true,
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl RendererConfig {
    pub fn with_show_fps(mut self, show_fps: bool) -> Self {
        self.show_fps = show_fps;
        self
    }

    pub fn with_prefer_background(mut self, prefer_background: bool) -> Self {
        self.prefer_background = prefer_background;
        self
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }
}

/// What a canvas needs from a renderer, regardless of where it draws.
pub trait CanvasRenderer {
    fn kind(&self) -> RendererKind;

    fn set_dimensions(&mut self, size: Size);

    fn set_viewport(&mut self, viewport: ViewTransform);

    /// Replace the shape collection; the order given is the paint order.
    fn set_shapes(&mut self, shapes: Vec<ShapeData>);

    /// Called by the host once per display refresh.
    fn on_frame(&mut self);

    /// Stop drawing. Further calls are ignored.
    fn destroy(&mut self);
}

/// Whether a background render thread can be used here.
pub fn background_supported() -> bool {
    if cfg!(target_arch = "wasm32") {
        return false;
    }
    std::thread::available_parallelism()
        .map(|n| n.get() > 1)
        .unwrap_or(false)
}

/// Build a renderer, preferring the background backend when it is available.
///
/// Falls back to the local backend if the capability check says no or the render thread
/// cannot be spawned.
pub fn create_renderer(
    surface: Box<dyn Surface>,
    loader: Arc<dyn BitmapLoader>,
    screen_size: Size,
    viewport: ViewTransform,
    shapes: Vec<ShapeData>,
    config: RendererConfig,
) -> Box<dyn CanvasRenderer> {
    if config.prefer_background && background_supported() {
        match BackgroundRenderer::spawn(loader.clone(), config) {
            Ok(mut renderer) => match renderer.init(surface, screen_size, viewport, shapes) {
                Ok(()) => {
                    log::info!("Using background renderer");
                    return Box::new(renderer);
                }
                Err((e, surface, shapes)) => {
                    log::info!("Background renderer unavailable ({}), rendering locally", e);
                    return Box::new(LocalRenderer::new(surface, loader, screen_size, viewport, shapes, config));
                }
            },
            Err(e) => {
                log::info!("Background renderer unavailable ({}), rendering locally", e);
            }
        }
    } else {
        log::info!("Using local renderer");
    }
    Box::new(LocalRenderer::new(surface, loader, screen_size, viewport, shapes, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::DefaultBitmapLoader;
    use crate::surface::recording::RecordingSurface;

    #[test]
    fn test_config_defaults() {
        let config = RendererConfig::default();
        assert!(config.show_fps);
        assert!(config.prefer_background);
        assert_eq!(config.frame_interval, Duration::from_millis(16));

        let config = config.with_show_fps(false).with_frame_interval(Duration::from_millis(5));
        assert!(!config.show_fps);
        assert_eq!(config.frame_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_local_when_background_not_preferred() {
        let (surface, _log) = RecordingSurface::new(10.0, 10.0);
        let mut renderer = create_renderer(
            Box::new(surface),
            Arc::new(DefaultBitmapLoader::new()),
            Size::new(10.0, 10.0),
            ViewTransform::default(),
            Vec::new(),
            RendererConfig::default().with_prefer_background(false),
        );
        assert_eq!(renderer.kind(), RendererKind::Local);
        renderer.destroy();
    }

    #[test]
    fn test_capability_check_decides_backend() {
        let (surface, _log) = RecordingSurface::new(10.0, 10.0);
        let mut renderer = create_renderer(
            Box::new(surface),
            Arc::new(DefaultBitmapLoader::new()),
            Size::new(10.0, 10.0),
            ViewTransform::default(),
            Vec::new(),
            RendererConfig::default(),
        );
        let expected = if background_supported() {
            RendererKind::Background
        } else {
            RendererKind::Local
        };
        assert_eq!(renderer.kind(), expected);
        renderer.destroy();
    }
}
