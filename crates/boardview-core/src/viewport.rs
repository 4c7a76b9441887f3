//! Viewport module for pan/zoom transforms.

use std::sync::mpsc::{self, Receiver, Sender};

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::coords;

/// Zoom percentage that corresponds to a scale of 1.
pub const BASE_ZOOM: i32 = 100;

/// Transform handed to the renderer: `screen = board * scale + t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

impl ViewTransform {
    /// Affine mapping board coordinates to screen coordinates.
    pub fn to_affine(&self) -> Affine {
        Affine::translate((self.tx, self.ty)) * Affine::scale(self.scale)
    }
}

/// Arguments of [`Viewport::set_transform`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    /// Integer zoom percentage.
    pub zoom: i32,
    pub tx: f64,
    pub ty: f64,
}

/// Viewport holds the pan offset and zoom level of the board.
///
/// Every call to [`Viewport::set_transform`] is published to all subscribers,
/// including calls that leave the values unchanged.
#[derive(Debug)]
pub struct Viewport {
    zoom: i32,
    tx: f64,
    ty: f64,
    subscribers: Vec<Sender<ViewTransform>>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: BASE_ZOOM,
            tx: 0.0,
            ty: 0.0,
            subscribers: Vec::new(),
        }
    }
}

impl Viewport {
    /// Create a viewport at 100% with no pan.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom(&self) -> i32 {
        self.zoom
    }

    /// Scale factor derived from the zoom percentage.
    pub fn scale(&self) -> f64 {
        f64::from(self.zoom) / 100.0
    }

    pub fn tx(&self) -> f64 {
        self.tx
    }

    pub fn ty(&self) -> f64 {
        self.ty
    }

    /// Current pan offset in screen pixels.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.tx, self.ty)
    }

    /// Snapshot of the current transform.
    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            scale: self.scale(),
            tx: self.tx,
            ty: self.ty,
        }
    }

    /// Convert a container-relative screen point to board coordinates.
    pub fn to_board(&self, screen_point: Point) -> Point {
        coords::to_board(screen_point, &self.transform())
    }

    /// Convert a board point to container-relative screen coordinates.
    pub fn to_screen(&self, board_point: Point) -> Point {
        coords::to_screen(board_point, &self.transform())
    }

    /// Replace zoom and translation in one step and notify subscribers.
    ///
    /// Zoom is kept at 1 or above so the scale stays positive.
    pub fn set_transform(&mut self, transform: ViewportTransform) {
        self.zoom = transform.zoom.max(1);
        self.tx = transform.tx;
        self.ty = transform.ty;
        self.publish();
    }

    /// Translate by a screen delta, keeping the zoom.
    pub fn pan(&mut self, delta: Vec2) {
        let transform = ViewportTransform {
            zoom: self.zoom,
            tx: self.tx + delta.x,
            ty: self.ty + delta.y,
        };
        self.set_transform(transform);
    }

    /// Receive every committed transform from now on, in commit order.
    pub fn subscribe(&mut self) -> Receiver<ViewTransform> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn publish(&mut self) {
        let transform = self.transform();
        self.subscribers
            .retain(|subscriber| subscriber.send(transform).is_ok());
    }
}
