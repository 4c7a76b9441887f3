//! Messages exchanged with the background render thread.
//!
//! Nothing is shared between the two sides: every piece of state the render
//! thread needs travels in one of these messages, in FIFO order.

use std::fmt;

use boardview_core::{ImageKind, ShapeData, ViewTransform};
use kurbo::Size;
use peniko::ImageData;

use crate::bitmap::BitmapResult;
use crate::surface::Surface;

/// Foreground to render thread.
pub enum RenderMessage {
    /// Hand over the surface and the initial state. Must be sent first.
    Init {
        surface: Box<dyn Surface>,
        screen_size: Size,
        viewport: ViewTransform,
        shapes: Vec<ShapeData>,
    },
    Dimensions {
        width: f64,
        height: f64,
    },
    Viewport {
        tx: f64,
        ty: f64,
        scale: f64,
    },
    Shapes {
        shapes: Vec<ShapeData>,
    },
    /// Reply to [`WorkerMessage::GetImageBitmap`], correlated by `(id, src)`.
    ImageBitmap {
        id: String,
        src: String,
        result: BitmapResult<ImageData>,
    },
    Terminate,
}

impl RenderMessage {
    pub fn name(&self) -> &'static str {
        match self {
            RenderMessage::Init { .. } => "init",
            RenderMessage::Dimensions { .. } => "dimensions",
            RenderMessage::Viewport { .. } => "viewport",
            RenderMessage::Shapes { .. } => "shapes",
            RenderMessage::ImageBitmap { .. } => "image-bitmap",
            RenderMessage::Terminate => "terminate",
        }
    }
}

impl fmt::Debug for RenderMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMessage::Init {
                screen_size,
                viewport,
                shapes,
                ..
            } => f
                .debug_struct("Init")
                .field("screen_size", screen_size)
                .field("viewport", viewport)
                .field("shapes", &shapes.len())
                .finish_non_exhaustive(),
            RenderMessage::Dimensions { width, height } => f
                .debug_struct("Dimensions")
                .field("width", width)
                .field("height", height)
                .finish(),
            RenderMessage::Viewport { tx, ty, scale } => f
                .debug_struct("Viewport")
                .field("tx", tx)
                .field("ty", ty)
                .field("scale", scale)
                .finish(),
            RenderMessage::Shapes { shapes } => f
                .debug_struct("Shapes")
                .field("shapes", &shapes.len())
                .finish(),
            RenderMessage::ImageBitmap { id, src, result } => f
                .debug_struct("ImageBitmap")
                .field("id", id)
                .field("src", src)
                .field("ok", &result.is_ok())
                .finish(),
            RenderMessage::Terminate => f.write_str("Terminate"),
        }
    }
}

/// Render thread to foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Ask the foreground loader for a bitmap it must decode itself.
    GetImageBitmap {
        id: String,
        src: String,
        kind: Option<ImageKind>,
    },
}
