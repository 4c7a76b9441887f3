//! Bitmap loading for image shapes.
//!
//! The render loop never blocks on I/O: a [`BitmapLoader`] returns a
//! [`BitmapFuture`] that the owning shape polls once per frame.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::thread;

use base64::{Engine, engine::general_purpose::STANDARD};
use boardview_core::ImageKind;
use futures::channel::oneshot;
use peniko::{Blob, ImageAlphaType, ImageData, ImageFormat};
use thiserror::Error;

/// Bitmap loading errors.
///
/// Cloneable so a failure can be sent back across threads in a reply message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitmapError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid data URL: {0}")]
    DataUrl(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Unsupported image source: {0}")]
    Unsupported(String),
    #[error("Bitmap request was abandoned")]
    Cancelled,
}

/// Result type for bitmap operations.
pub type BitmapResult<T> = Result<T, BitmapError>;

/// Boxed future resolving to a decoded bitmap.
pub type BitmapFuture = Pin<Box<dyn Future<Output = BitmapResult<ImageData>> + Send>>;

/// Source of decoded bitmaps for image shapes.
pub trait BitmapLoader: Send + Sync {
    /// Start fetching the bitmap for image `id` from `src`.
    fn get_bitmap(&self, id: &str, src: &str, kind: Option<ImageKind>) -> BitmapFuture;
}

/// Loads local paths and `data:` URLs on short-lived decode threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBitmapLoader;

impl DefaultBitmapLoader {
    pub fn new() -> Self {
        Self
    }
}

impl BitmapLoader for DefaultBitmapLoader {
    fn get_bitmap(&self, id: &str, src: &str, kind: Option<ImageKind>) -> BitmapFuture {
        log::debug!("Loading bitmap for {}", id);
        let (tx, rx) = oneshot::channel();
        let src = src.to_string();
        let spawned = thread::Builder::new()
            .name("bitmap-decode".into())
            .spawn(move || {
                // The receiver may be gone if the shape was dropped meanwhile
                let _ = tx.send(load_bitmap(&src, kind));
            });
        if let Err(e) = spawned {
            let err = BitmapError::Io(e.to_string());
            return Box::pin(futures::future::ready(Err(err)));
        }
        Box::pin(async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(BitmapError::Cancelled),
            }
        })
    }
}

/// Read and decode a bitmap synchronously.
///
/// When `kind` is `None` the kind is guessed from the data URL media type
/// or the file extension; anything that is not SVG goes through the
/// raster decoder.
pub fn load_bitmap(src: &str, kind: Option<ImageKind>) -> BitmapResult<ImageData> {
    let (bytes, guessed) = read_source(src)?;
    match kind.or(guessed) {
        Some(kind) if kind.is_vector() => rasterize_svg(&bytes),
        _ => decode_raster(&bytes),
    }
}

/// Guess the kind of `src` from its data URL media type or file extension.
pub fn guess_kind(src: &str) -> Option<ImageKind> {
    if let Some(rest) = src.strip_prefix("data:") {
        let header = rest.split_once(',').map_or(rest, |(header, _)| header);
        return if header.contains("svg") {
            Some(ImageKind::Svg)
        } else if header.contains("jpeg") || header.contains("jpg") {
            Some(ImageKind::Jpg)
        } else {
            None
        };
    }
    Path::new(src)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageKind::from_extension)
}

fn read_source(src: &str) -> BitmapResult<(Vec<u8>, Option<ImageKind>)> {
    let kind = guess_kind(src);
    if let Some(rest) = src.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| BitmapError::DataUrl("missing ','".to_string()))?;
        let bytes = if header.ends_with(";base64") {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| BitmapError::DataUrl(e.to_string()))?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };
        return Ok((bytes, kind));
    }

    let bytes = std::fs::read(src).map_err(|e| BitmapError::Io(format!("{}: {}", src, e)))?;
    Ok((bytes, kind))
}

fn decode_raster(bytes: &[u8]) -> BitmapResult<ImageData> {
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| BitmapError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageData {
        data: Blob::new(Arc::new(rgba.into_vec())),
        format: ImageFormat::Rgba8,
        width,
        height,
        alpha_type: ImageAlphaType::Alpha,
    })
}

#[cfg(feature = "svg")]
fn rasterize_svg(bytes: &[u8]) -> BitmapResult<ImageData> {
    use resvg::{tiny_skia, usvg};

    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
        .map_err(|e| BitmapError::Decode(e.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| BitmapError::Decode("SVG has an empty canvas".to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(ImageData {
        data: Blob::new(Arc::new(pixmap.take())),
        format: ImageFormat::Rgba8,
        width: size.width(),
        height: size.height(),
        alpha_type: ImageAlphaType::AlphaPremultiplied,
    })
}

#[cfg(not(feature = "svg"))]
fn rasterize_svg(_bytes: &[u8]) -> BitmapResult<ImageData> {
    Err(BitmapError::Unsupported("SVG support is disabled".to_string()))
}

/// Outstanding bitmap requests, keyed by `(id, src)`.
///
/// Each entry is removed as soon as its reply arrives. Registering the same
/// key again drops the older waiter, which then resolves as cancelled.
#[derive(Debug, Default)]
pub struct PendingBitmaps {
    waiting: HashMap<(String, String), oneshot::Sender<BitmapResult<ImageData>>>,
}

impl PendingBitmaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Register a request and get the future that its reply will resolve.
    pub fn register(&mut self, id: &str, src: &str) -> BitmapFuture {
        let (tx, rx) = oneshot::channel();
        self.waiting.insert((id.to_string(), src.to_string()), tx);
        Box::pin(async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(BitmapError::Cancelled),
            }
        })
    }

    /// Deliver a reply. Returns false when nothing was waiting for it.
    pub fn resolve(&mut self, id: &str, src: &str, result: BitmapResult<ImageData>) -> bool {
        match self.waiting.remove(&(id.to_string(), src.to_string())) {
            Some(tx) => tx.send(result).is_ok(),
            None => {
                log::warn!("Bitmap reply for {} has no pending request", id);
                false
            }
        }
    }

    /// Abandon every outstanding request.
    pub fn clear(&mut self) {
        self.waiting.clear();
    }
}
