//! Raster surface abstraction the draw loop paints into.
//!
//! A surface behaves like a 2D canvas context: it has a current transform, a
//! save/restore stack, and a handful of fill operations. Implementations must
//! be [`Send`] so the background backend can move one onto its own thread.

use kurbo::{Affine, Point, Rect, Size};
use peniko::{Color, ImageData};

/// Drawing target used by the render loop.
pub trait Surface: Send {
    /// Current size in pixels.
    fn size(&self) -> Size;

    /// Resize the backing store. Contents are discarded.
    fn resize(&mut self, size: Size);

    /// Clear to transparent and reset the transform to identity.
    fn clear(&mut self);

    /// Push the current transform.
    fn save(&mut self);

    /// Pop the transform pushed by the matching [`Surface::save`].
    fn restore(&mut self);

    /// Replace the current transform.
    fn set_transform(&mut self, transform: Affine);

    /// Concatenate `transform` onto the current one (applied first).
    fn concat_transform(&mut self, transform: Affine);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw a bitmap at its natural size with its top-left corner at `origin`.
    fn draw_bitmap(&mut self, bitmap: &ImageData, origin: Point);

    /// Draw a short overlay string with its baseline starting at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, size: f64, color: Color);

    /// Make the finished frame visible.
    fn present(&mut self);
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn size(&self) -> Size {
        (**self).size()
    }

    fn resize(&mut self, size: Size) {
        (**self).resize(size)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn save(&mut self) {
        (**self).save()
    }

    fn restore(&mut self) {
        (**self).restore()
    }

    fn set_transform(&mut self, transform: Affine) {
        (**self).set_transform(transform)
    }

    fn concat_transform(&mut self, transform: Affine) {
        (**self).concat_transform(transform)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        (**self).fill_rect(rect, color)
    }

    fn draw_bitmap(&mut self, bitmap: &ImageData, origin: Point) {
        (**self).draw_bitmap(bitmap, origin)
    }

    fn fill_text(&mut self, text: &str, origin: Point, size: f64, color: Color) {
        (**self).fill_text(text, origin, size, color)
    }

    fn present(&mut self) {
        (**self).present()
    }
}

#[cfg(test)]
pub(crate) mod recording {
    //! Surface that records draw calls for assertions.

    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawCommand {
        Clear,
        FillRect {
            rect: Rect,
            color: [u8; 4],
            transform: Affine,
        },
        DrawBitmap {
            width: u32,
            height: u32,
            origin: Point,
            transform: Affine,
        },
        FillText {
            text: String,
            origin: Point,
        },
        Present,
    }

    /// Shared log so a surface moved onto another thread can still be inspected.
    pub type DrawLog = Arc<Mutex<Vec<DrawCommand>>>;

    #[derive(Debug)]
    pub struct RecordingSurface {
        size: Size,
        current: Affine,
        stack: Vec<Affine>,
        log: DrawLog,
    }

    impl RecordingSurface {
        pub fn new(width: f64, height: f64) -> (Self, DrawLog) {
            let log = DrawLog::default();
            let surface = Self {
                size: Size::new(width, height),
                current: Affine::IDENTITY,
                stack: Vec::new(),
                log: log.clone(),
            };
            (surface, log)
        }

        fn push(&self, command: DrawCommand) {
            if let Ok(mut log) = self.log.lock() {
                log.push(command);
            }
        }
    }

    /// Take everything recorded so far.
    pub fn drain(log: &DrawLog) -> Vec<DrawCommand> {
        log.lock().map(|mut log| std::mem::take(&mut *log)).unwrap_or_default()
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> Size {
            self.size
        }

        fn resize(&mut self, size: Size) {
            self.size = size;
        }

        fn clear(&mut self) {
            self.current = Affine::IDENTITY;
            self.push(DrawCommand::Clear);
        }

        fn save(&mut self) {
            self.stack.push(self.current);
        }

        fn restore(&mut self) {
            if let Some(previous) = self.stack.pop() {
                self.current = previous;
            }
        }

        fn set_transform(&mut self, transform: Affine) {
            self.current = transform;
        }

        fn concat_transform(&mut self, transform: Affine) {
            self.current *= transform;
        }

        fn fill_rect(&mut self, rect: Rect, color: Color) {
            let rgba = color.to_rgba8();
            self.push(DrawCommand::FillRect {
                rect,
                color: [rgba.r, rgba.g, rgba.b, rgba.a],
                transform: self.current,
            });
        }

        fn draw_bitmap(&mut self, bitmap: &ImageData, origin: Point) {
            self.push(DrawCommand::DrawBitmap {
                width: bitmap.width,
                height: bitmap.height,
                origin,
                transform: self.current,
            });
        }

        fn fill_text(&mut self, text: &str, origin: Point, _size: f64, _color: Color) {
            self.push(DrawCommand::FillText {
                text: text.to_string(),
                origin,
            });
        }

        fn present(&mut self) {
            self.push(DrawCommand::Present);
        }
    }
}
