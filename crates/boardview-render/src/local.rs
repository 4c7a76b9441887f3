//! Renderer that draws on the caller's thread.

use std::sync::Arc;

use boardview_core::{ShapeData, ViewTransform};
use kurbo::Size;

use crate::bitmap::BitmapLoader;
use crate::frame::RenderLoop;
use crate::renderer::{CanvasRenderer, RendererConfig, RendererKind};
use crate::surface::Surface;

/// Draws one frame per [`CanvasRenderer::on_frame`] call.
#[derive(Debug)]
pub struct LocalRenderer {
    render_loop: RenderLoop,
    destroyed: bool,
}

impl LocalRenderer {
    pub fn new(
        surface: Box<dyn Surface>,
        loader: Arc<dyn BitmapLoader>,
        screen_size: Size,
        viewport: ViewTransform,
        shapes: Vec<ShapeData>,
        config: RendererConfig,
    ) -> Self {
        log::info!("Starting local renderer with {} shapes", shapes.len());
        Self {
            render_loop: RenderLoop::new(surface, loader, screen_size, viewport, shapes)
                .with_show_fps(config.show_fps),
            destroyed: false,
        }
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl CanvasRenderer for LocalRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Local
    }

    fn set_dimensions(&mut self, size: Size) {
        if !self.destroyed {
            self.render_loop.set_dimensions(size);
        }
    }

    fn set_viewport(&mut self, viewport: ViewTransform) {
        if !self.destroyed {
            self.render_loop.set_viewport(viewport);
        }
    }

    fn set_shapes(&mut self, shapes: Vec<ShapeData>) {
        if !self.destroyed {
            self.render_loop.set_shapes(shapes);
        }
    }

    fn on_frame(&mut self) {
        if !self.destroyed {
            self.render_loop.frame();
        }
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            log::info!("Local renderer destroyed");
            self.destroyed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::DefaultBitmapLoader;
    use crate::surface::recording::{DrawCommand, RecordingSurface, drain};
    use boardview_core::objects::SerializableColor;
    use boardview_core::Bounds;
    use kurbo::Affine;

    fn renderer() -> (LocalRenderer, crate::surface::recording::DrawLog) {
        let (surface, log) = RecordingSurface::new(100.0, 100.0);
        let renderer = LocalRenderer::new(
            Box::new(surface),
            Arc::new(DefaultBitmapLoader::new()),
            Size::new(100.0, 100.0),
            ViewTransform::default(),
            vec![ShapeData::Rectangle {
                id: "r".to_string(),
                matrix: Affine::IDENTITY,
                bounds: Bounds::from_edges(0.0, 0.0, 10.0, 10.0),
                width: 10.0,
                height: 10.0,
                color: SerializableColor::black(),
            }],
            RendererConfig::default().with_show_fps(false),
        );
        (renderer, log)
    }

    #[test]
    fn test_draws_on_frame() {
        let (mut renderer, log) = renderer();
        renderer.on_frame();
        let commands = drain(&log);
        assert!(commands.iter().any(|c| matches!(c, DrawCommand::FillRect { .. })));

        renderer.on_frame();
        assert!(drain(&log).is_empty());

        renderer.set_dimensions(Size::new(200.0, 100.0));
        assert!((renderer.render_loop().viewport_bounds().width - 200.0).abs() < f64::EPSILON);
        renderer.on_frame();
        assert!(!drain(&log).is_empty());
    }

    #[test]
    fn test_destroy_stops_drawing() {
        let (mut renderer, log) = renderer();
        renderer.destroy();
        renderer.set_viewport(ViewTransform {
            scale: 2.0,
            tx: 0.0,
            ty: 0.0,
        });
        renderer.on_frame();
        assert!(drain(&log).is_empty());
        assert!(renderer.is_destroyed());
    }
}
