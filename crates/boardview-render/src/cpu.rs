//! [`Surface`] backed by the `vello_cpu` sparse-strip rasterizer.

use std::fmt;

use kurbo::{Affine, Point, Rect, Size};
use peniko::{Color, ImageData, ImageSampler};
use vello_cpu::kurbo::{Affine as CpuAffine, Rect as CpuRect};
use vello_cpu::{Image as CpuImage, ImageSource, Pixmap, RenderContext};

use crate::surface::Surface;

/// Callback that receives each finished frame.
pub type Presenter = Box<dyn FnMut(&Pixmap) + Send>;

/// CPU raster surface.
///
/// Draw calls are recorded into a `vello_cpu` context and rasterized into
/// an owned [`Pixmap`] on [`Surface::present`]. An optional presenter is
/// then handed the pixmap, e.g. to blit it into a window.
pub struct CpuSurface {
    ctx: RenderContext,
    pixmap: Pixmap,
    width: u16,
    height: u16,
    current: Affine,
    stack: Vec<Affine>,
    presenter: Option<Presenter>,
}

impl fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.stack.len())
            .field("presenter", &self.presenter.is_some())
            .finish()
    }
}

fn pixel_extent(value: f64) -> u16 {
    value.round().clamp(1.0, f64::from(u16::MAX)) as u16
}

fn to_cpu(transform: Affine) -> CpuAffine {
    CpuAffine::new(transform.as_coeffs())
}

impl CpuSurface {
    pub fn new(size: Size) -> Self {
        let width = pixel_extent(size.width);
        let height = pixel_extent(size.height);
        Self {
            ctx: RenderContext::new(width, height),
            pixmap: Pixmap::new(width, height),
            width,
            height,
            current: Affine::IDENTITY,
            stack: Vec::new(),
            presenter: None,
        }
    }

    /// Hand every presented frame to `presenter`.
    pub fn with_presenter(mut self, presenter: impl FnMut(&Pixmap) + Send + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    /// The last presented frame.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// The last presented frame as premultiplied RGBA bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(usize::from(self.width) * usize::from(self.height) * 4);
        for p in self.pixmap.data() {
            data.extend_from_slice(&[p.r, p.g, p.b, p.a]);
        }
        data
    }

    fn apply_transform(&mut self) {
        self.ctx.set_transform(to_cpu(self.current));
    }

    /// Fill one glyph cell grid using rectangles.
    fn fill_glyph(&mut self, rows: &[u8; 5], origin: Point, cell: f64) {
        for (row, bits) in rows.iter().enumerate() {
            for column in 0..3 {
                if bits & (0b100 >> column) != 0 {
                    let x = origin.x + column as f64 * cell;
                    let y = origin.y + row as f64 * cell;
                    self.ctx
                        .fill_rect(&CpuRect::new(x, y, x + cell, y + cell));
                }
            }
        }
    }
}

/// 3x5 glyphs for the characters the FPS overlay needs.
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        _ => return None,
    };
    Some(rows)
}

impl Surface for CpuSurface {
    fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    fn resize(&mut self, size: Size) {
        let width = pixel_extent(size.width);
        let height = pixel_extent(size.height);
        if (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!("Resizing CPU surface to {}x{}", width, height);
        self.width = width;
        self.height = height;
        self.ctx = RenderContext::new(width, height);
        self.pixmap = Pixmap::new(width, height);
        self.stack.clear();
        self.current = Affine::IDENTITY;
    }

    fn clear(&mut self) {
        self.ctx.reset();
        self.stack.clear();
        self.current = Affine::IDENTITY;
        self.apply_transform();
    }

    fn save(&mut self) {
        self.stack.push(self.current);
    }

    fn restore(&mut self) {
        if let Some(previous) = self.stack.pop() {
            self.current = previous;
            self.apply_transform();
        }
    }

    fn set_transform(&mut self, transform: Affine) {
        self.current = transform;
        self.apply_transform();
    }

    fn concat_transform(&mut self, transform: Affine) {
        self.current *= transform;
        self.apply_transform();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_paint(color);
        self.ctx
            .fill_rect(&CpuRect::new(rect.x0, rect.y0, rect.x1, rect.y1));
    }

    fn draw_bitmap(&mut self, bitmap: &ImageData, origin: Point) {
        let paint = CpuImage {
            image: ImageSource::from_peniko_image_data(bitmap),
            sampler: ImageSampler::default(),
        };
        let placed = self.current * Affine::translate(origin.to_vec2());
        self.ctx.set_transform(to_cpu(placed));
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&CpuRect::new(
            0.0,
            0.0,
            f64::from(bitmap.width),
            f64::from(bitmap.height),
        ));
        self.apply_transform();
    }

    fn fill_text(&mut self, text: &str, origin: Point, size: f64, color: Color) {
        // Glyphs are five cells tall and sit on the baseline.
        let cell = (size / 7.0).max(1.0);
        let top = origin.y - 5.0 * cell;
        self.ctx.set_paint(color);
        let mut x = origin.x;
        for c in text.chars() {
            if let Some(rows) = glyph(c.to_ascii_uppercase()) {
                self.fill_glyph(&rows, Point::new(x, top), cell);
            }
            x += 4.0 * cell;
        }
    }

    fn present(&mut self) {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        if let Some(presenter) = self.presenter.as_mut() {
            presenter(&self.pixmap);
        }
    }
}
