//! Drawable shapes built from the board's transferable shape data.

use std::task::{Context, Poll, Waker};

use boardview_core::{Bounds, ImageKind, ObjectId, ShapeData};
use kurbo::{Affine, Point, Rect};
use peniko::{Color, ImageData};

use crate::bitmap::{BitmapFuture, BitmapLoader};
use crate::surface::Surface;

/// Collaborators a shape needs while drawing.
pub struct DrawContext<'a> {
    pub loader: &'a dyn BitmapLoader,
    /// Woken when a pending bitmap makes progress.
    pub waker: &'a Waker,
}

/// A shape the render loop can draw.
#[derive(Debug)]
pub enum Shape {
    Rectangle(RectangleShape),
    Image(ImageShape),
}

impl Shape {
    pub fn from_data(data: ShapeData) -> Self {
        match data {
            ShapeData::Rectangle {
                id,
                matrix,
                bounds,
                width,
                height,
                color,
            } => Shape::Rectangle(RectangleShape {
                id,
                matrix,
                bounds,
                width,
                height,
                color: color.into(),
            }),
            ShapeData::Image {
                id,
                matrix,
                bounds,
                src,
                width,
                height,
                kind,
            } => Shape::Image(ImageShape {
                id,
                matrix,
                bounds,
                src,
                width,
                height,
                kind,
                state: BitmapState::Idle,
            }),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Shape::Rectangle(r) => &r.id,
            Shape::Image(i) => &i.id,
        }
    }

    pub fn matrix(&self) -> Affine {
        match self {
            Shape::Rectangle(r) => r.matrix,
            Shape::Image(i) => i.matrix,
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Shape::Rectangle(r) => r.bounds,
            Shape::Image(i) => i.bounds,
        }
    }

    /// Whether the shape has area and overlaps the visible board region.
    pub fn is_visible(&self, viewport: &Bounds) -> bool {
        let bounds = self.bounds();
        bounds.has_area() && bounds.intersects(viewport)
    }

    /// Carry a loaded or failed bitmap over from the shape this one replaces.
    ///
    /// Only applies when both are images of the same id and source.
    pub fn inherit_from(&mut self, previous: Shape) {
        if let (Shape::Image(next), Shape::Image(prev)) = (self, previous) {
            if next.id == prev.id && next.src == prev.src {
                next.state = prev.state;
            }
        }
    }

    /// Draw in local coordinates under the shape's displayed matrix.
    pub fn render(&mut self, surface: &mut dyn Surface, ctx: &DrawContext<'_>) {
        surface.save();
        surface.concat_transform(self.matrix());
        match self {
            Shape::Rectangle(rect) => rect.draw(surface),
            Shape::Image(image) => image.draw(surface, ctx),
        }
        surface.restore();
    }
}

/// Solid rectangle.
#[derive(Debug, Clone)]
pub struct RectangleShape {
    pub id: ObjectId,
    pub matrix: Affine,
    pub bounds: Bounds,
    pub width: f64,
    pub height: f64,
    pub color: Color,
}

impl RectangleShape {
    fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_rect(Rect::new(0.0, 0.0, self.width, self.height), self.color);
    }
}

/// Progress of an image's bitmap fetch.
enum BitmapState {
    Idle,
    Pending(BitmapFuture),
    Ready(ImageData),
    /// Fetch or decode failed; the image is never drawn.
    Failed,
}

impl std::fmt::Debug for BitmapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BitmapState::Idle => f.write_str("Idle"),
            BitmapState::Pending(_) => f.write_str("Pending"),
            BitmapState::Ready(bitmap) => write!(f, "Ready({}x{})", bitmap.width, bitmap.height),
            BitmapState::Failed => f.write_str("Failed"),
        }
    }
}

/// Bitmap image, fetched lazily on first draw.
#[derive(Debug)]
pub struct ImageShape {
    pub id: ObjectId,
    pub matrix: Affine,
    pub bounds: Bounds,
    pub src: String,
    pub width: f64,
    pub height: f64,
    pub kind: Option<ImageKind>,
    state: BitmapState,
}

impl ImageShape {
    pub fn is_pending(&self) -> bool {
        matches!(self.state, BitmapState::Pending(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, BitmapState::Ready(_))
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.state, BitmapState::Failed)
    }

    /// Start or advance the bitmap fetch without blocking.
    fn poll_bitmap(&mut self, ctx: &DrawContext<'_>) {
        if let BitmapState::Idle = self.state {
            let future = ctx.loader.get_bitmap(&self.id, &self.src, self.kind);
            self.state = BitmapState::Pending(future);
        }
        if let BitmapState::Pending(future) = &mut self.state {
            let mut task = Context::from_waker(ctx.waker);
            match future.as_mut().poll(&mut task) {
                Poll::Pending => {}
                Poll::Ready(Ok(bitmap)) => {
                    log::debug!("Bitmap ready for {}", self.id);
                    self.state = BitmapState::Ready(bitmap);
                }
                Poll::Ready(Err(e)) => {
                    log::error!("Failed to load image {} from {}: {}", self.id, self.src, e);
                    self.state = BitmapState::Failed;
                }
            }
        }
    }

    fn draw(&mut self, surface: &mut dyn Surface, ctx: &DrawContext<'_>) {
        self.poll_bitmap(ctx);
        let BitmapState::Ready(bitmap) = &self.state else {
            return;
        };
        if bitmap.width == 0 || bitmap.height == 0 {
            return;
        }
        // Stretch to the object's size when the decoded bitmap differs.
        let sx = self.width / f64::from(bitmap.width);
        let sy = self.height / f64::from(bitmap.height);
        if (sx - 1.0).abs() > f64::EPSILON || (sy - 1.0).abs() > f64::EPSILON {
            surface.concat_transform(Affine::scale_non_uniform(sx, sy));
        }
        surface.draw_bitmap(bitmap, Point::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{BitmapError, BitmapResult};
    use crate::surface::recording::{DrawCommand, RecordingSurface, drain};
    use boardview_core::objects::SerializableColor;
    use futures::channel::oneshot;
    use futures::task::noop_waker;
    use peniko::{Blob, ImageAlphaType, ImageFormat};
    use std::sync::{Arc, Mutex};

    fn bitmap(width: u32, height: u32) -> ImageData {
        ImageData {
            data: Blob::new(Arc::new(vec![0u8; (width * height * 4) as usize])),
            format: ImageFormat::Rgba8,
            width,
            height,
            alpha_type: ImageAlphaType::Alpha,
        }
    }

    /// Loader whose replies are sent by the test.
    #[derive(Default)]
    struct ManualLoader {
        requests: Mutex<Vec<(String, oneshot::Sender<BitmapResult<ImageData>>)>>,
    }

    impl ManualLoader {
        fn reply(&self, result: BitmapResult<ImageData>) {
            let (_, tx) = self.requests.lock().unwrap().remove(0);
            assert!(tx.send(result).is_ok());
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl BitmapLoader for ManualLoader {
        fn get_bitmap(&self, id: &str, _src: &str, _kind: Option<ImageKind>) -> BitmapFuture {
            let (tx, rx) = oneshot::channel();
            self.requests.lock().unwrap().push((id.to_string(), tx));
            Box::pin(async move { rx.await.unwrap_or(Err(BitmapError::Cancelled)) })
        }
    }

    fn rect_data(bounds: Bounds) -> ShapeData {
        ShapeData::Rectangle {
            id: "r".to_string(),
            matrix: Affine::translate((10.0, 20.0)),
            bounds,
            width: 30.0,
            height: 40.0,
            color: SerializableColor::new(255, 0, 0, 255),
        }
    }

    fn image_data(width: f64, height: f64) -> ShapeData {
        ShapeData::Image {
            id: "img".to_string(),
            matrix: Affine::IDENTITY,
            bounds: Bounds::from_edges(0.0, 0.0, width, height),
            src: "a.jpg".to_string(),
            width,
            height,
            kind: None,
        }
    }

    #[test]
    fn test_visibility() {
        let viewport = Bounds::from_edges(0.0, 0.0, 100.0, 100.0);
        let visible = Shape::from_data(rect_data(Bounds::from_edges(90.0, 90.0, 120.0, 120.0)));
        let outside = Shape::from_data(rect_data(Bounds::from_edges(200.0, 0.0, 250.0, 50.0)));
        let touching = Shape::from_data(rect_data(Bounds::from_edges(100.0, 0.0, 150.0, 50.0)));
        let empty = Shape::from_data(rect_data(Bounds::from_edges(10.0, 10.0, 10.0, 50.0)));

        assert!(visible.is_visible(&viewport));
        assert!(!outside.is_visible(&viewport));
        assert!(touching.is_visible(&viewport));
        assert!(!empty.is_visible(&viewport));
    }

    #[test]
    fn test_rectangle_draw_uses_matrix() {
        let (mut surface, log) = RecordingSurface::new(100.0, 100.0);
        let loader = ManualLoader::default();
        let waker = noop_waker();
        let ctx = DrawContext {
            loader: &loader,
            waker: &waker,
        };
        let mut shape = Shape::from_data(rect_data(Bounds::from_edges(10.0, 20.0, 40.0, 60.0)));
        shape.render(&mut surface, &ctx);

        assert_eq!(
            drain(&log),
            vec![DrawCommand::FillRect {
                rect: Rect::new(0.0, 0.0, 30.0, 40.0),
                color: [255, 0, 0, 255],
                transform: Affine::translate((10.0, 20.0)),
            }]
        );
    }

    #[test]
    fn test_image_fetched_once_then_drawn() {
        let (mut surface, log) = RecordingSurface::new(100.0, 100.0);
        let loader = ManualLoader::default();
        let waker = noop_waker();
        let ctx = DrawContext {
            loader: &loader,
            waker: &waker,
        };
        let mut shape = Shape::from_data(image_data(8.0, 4.0));

        shape.render(&mut surface, &ctx);
        shape.render(&mut surface, &ctx);
        assert_eq!(loader.request_count(), 1);
        assert!(drain(&log).is_empty());

        loader.reply(Ok(bitmap(8, 4)));
        shape.render(&mut surface, &ctx);
        assert_eq!(
            drain(&log),
            vec![DrawCommand::DrawBitmap {
                width: 8,
                height: 4,
                origin: Point::ZERO,
                transform: Affine::IDENTITY,
            }]
        );
        let Shape::Image(image) = &shape else {
            panic!("expected image");
        };
        assert!(image.is_ready());
    }

    #[test]
    fn test_image_scaled_to_object_size() {
        let (mut surface, log) = RecordingSurface::new(100.0, 100.0);
        let loader = ManualLoader::default();
        let waker = noop_waker();
        let ctx = DrawContext {
            loader: &loader,
            waker: &waker,
        };
        let mut shape = Shape::from_data(image_data(20.0, 10.0));
        shape.render(&mut surface, &ctx);
        loader.reply(Ok(bitmap(10, 10)));
        shape.render(&mut surface, &ctx);

        let commands = drain(&log);
        assert!(matches!(
            commands.as_slice(),
            [DrawCommand::DrawBitmap { transform, .. }]
                if *transform == Affine::scale_non_uniform(2.0, 1.0)
        ));
    }

    #[test]
    fn test_replacement_keeps_loaded_bitmap() {
        let (mut surface, log) = RecordingSurface::new(100.0, 100.0);
        let loader = ManualLoader::default();
        let waker = noop_waker();
        let ctx = DrawContext {
            loader: &loader,
            waker: &waker,
        };
        let mut shape = Shape::from_data(image_data(8.0, 4.0));
        shape.render(&mut surface, &ctx);
        loader.reply(Ok(bitmap(8, 4)));
        shape.render(&mut surface, &ctx);
        drain(&log);

        let mut moved = Shape::from_data(image_data(8.0, 4.0));
        moved.inherit_from(shape);
        moved.render(&mut surface, &ctx);
        assert_eq!(loader.request_count(), 0);
        assert_eq!(drain(&log).len(), 1);
    }

    #[test]
    fn test_image_failure_is_permanent() {
        let (mut surface, log) = RecordingSurface::new(100.0, 100.0);
        let loader = ManualLoader::default();
        let waker = noop_waker();
        let ctx = DrawContext {
            loader: &loader,
            waker: &waker,
        };
        let mut shape = Shape::from_data(image_data(8.0, 4.0));
        shape.render(&mut surface, &ctx);
        loader.reply(Err(BitmapError::Decode("corrupt".to_string())));
        shape.render(&mut surface, &ctx);
        shape.render(&mut surface, &ctx);

        assert_eq!(loader.request_count(), 0);
        assert!(drain(&log).is_empty());
        let Shape::Image(image) = &shape else {
            panic!("expected image");
        };
        assert!(image.has_failed());
        assert!(!image.is_pending());
    }
}
