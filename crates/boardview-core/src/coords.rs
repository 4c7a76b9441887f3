//! Conversions between window, container and board coordinates.
//!
//! - *client* (window) coordinates are what the windowing system reports.
//! - *pointer* coordinates are relative to the board container's top-left.
//! - *board* coordinates are pointer coordinates with the viewport undone.

use kurbo::{Point, Size};

use crate::geometry::Bounds;
use crate::viewport::ViewTransform;

/// A position expressed in every coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPosition {
    pub client: Point,
    pub pointer: Point,
    pub board: Point,
}

/// `(p - t) / scale`
pub fn to_board(point: Point, transform: &ViewTransform) -> Point {
    let inverted = 1.0 / transform.scale;
    Point::new(
        inverted * point.x - transform.tx * inverted,
        inverted * point.y - transform.ty * inverted,
    )
}

/// `p * scale + t`
pub fn to_screen(point: Point, transform: &ViewTransform) -> Point {
    Point::new(
        point.x * transform.scale + transform.tx,
        point.y * transform.scale + transform.ty,
    )
}

/// Convert screen-space bounds into board space.
pub fn bounds_to_board(bounds: &Bounds, transform: &ViewTransform) -> Bounds {
    let origin = to_board(Point::new(bounds.left, bounds.top), transform);
    let width = bounds.width / transform.scale;
    let height = bounds.height / transform.scale;
    Bounds::from_edges(origin.x, origin.y, origin.x + width, origin.y + height)
}

/// Convert board-space bounds into screen space.
pub fn bounds_to_screen(bounds: &Bounds, transform: &ViewTransform) -> Bounds {
    let origin = to_screen(Point::new(bounds.left, bounds.top), transform);
    let width = bounds.width * transform.scale;
    let height = bounds.height * transform.scale;
    Bounds::from_edges(origin.x, origin.y, origin.x + width, origin.y + height)
}

/// Map a window position to container and board coordinates.
///
/// `container_origin` is the container's top-left corner in window coordinates.
pub fn normalize_window_position(
    client: Point,
    container_origin: Point,
    transform: &ViewTransform,
) -> NormalizedPosition {
    let pointer = Point::new(client.x - container_origin.x, client.y - container_origin.y);
    NormalizedPosition {
        client,
        pointer,
        board: to_board(pointer, transform),
    }
}

/// Map a board position back to container and window coordinates.
pub fn normalize_board_position(
    board: Point,
    container_origin: Point,
    transform: &ViewTransform,
) -> NormalizedPosition {
    let pointer = to_screen(board, transform);
    NormalizedPosition {
        client: Point::new(pointer.x + container_origin.x, pointer.y + container_origin.y),
        pointer,
        board,
    }
}

/// The part of the board currently visible on a screen of `screen_size`.
pub fn viewport_bounds(screen_size: Size, transform: &ViewTransform) -> Bounds {
    let screen = Bounds::from_edges(0.0, 0.0, screen_size.width, screen_size.height);
    bounds_to_board(&screen, transform)
}
