//! Boardview Render Library
//!
//! Draw loop, shapes and bitmap loading for the boardview board, with two
//! interchangeable backends: one drawing on the caller's thread and one
//! drawing on a dedicated render thread. The default raster surface uses
//! `vello_cpu`.

pub mod background;
pub mod bitmap;
pub mod canvas;
#[cfg(feature = "cpu-surface")]
pub mod cpu;
pub mod frame;
pub mod local;
pub mod protocol;
mod renderer;
pub mod shapes;
pub mod surface;

pub use background::BackgroundRenderer;
pub use bitmap::{BitmapError, BitmapFuture, BitmapLoader, BitmapResult, DefaultBitmapLoader};
pub use canvas::Canvas;
#[cfg(feature = "cpu-surface")]
pub use cpu::CpuSurface;
pub use frame::RenderLoop;
pub use local::LocalRenderer;
pub use renderer::{
    CanvasRenderer, RenderResult, RendererConfig, RendererError, RendererKind, background_supported,
    create_renderer,
};
pub use shapes::Shape;
pub use surface::Surface;
