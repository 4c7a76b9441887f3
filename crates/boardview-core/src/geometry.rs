//! Affine geometry for board objects.
//!
//! Everything here is a pure function of an [`ObjectGeometry`]. The renderer
//! consumes the displayed matrix directly: its translation is the top-left
//! corner of the transformed box, so drawing needs no anchor math per frame.

use std::str::FromStr;

use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Horizontal anchor of an object's `coords`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

impl OriginX {
    /// Offset of this anchor from the box center, as a fraction of the width.
    pub fn offset(self) -> f64 {
        match self {
            OriginX::Left => -0.5,
            OriginX::Center => 0.0,
            OriginX::Right => 0.5,
        }
    }
}

impl FromStr for OriginX {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(OriginX::Left),
            "center" => Ok(OriginX::Center),
            "right" => Ok(OriginX::Right),
            other => Err(ParseError::Origin(other.to_string())),
        }
    }
}

/// Vertical anchor of an object's `coords`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

impl OriginY {
    /// Offset of this anchor from the box center, as a fraction of the height.
    pub fn offset(self) -> f64 {
        match self {
            OriginY::Top => -0.5,
            OriginY::Center => 0.0,
            OriginY::Bottom => 0.5,
        }
    }
}

impl FromStr for OriginY {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(OriginY::Top),
            "center" => Ok(OriginY::Center),
            "bottom" => Ok(OriginY::Bottom),
            other => Err(ParseError::Origin(other.to_string())),
        }
    }
}

/// Position of the anchor point in board space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coords {
    pub left: f64,
    pub top: f64,
}

/// Per-axis scale factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// Per-axis skew angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Skew {
    pub x: f64,
    pub y: f64,
}

/// Geometric attributes of a board object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectGeometry {
    pub origin_x: OriginX,
    pub origin_y: OriginY,
    pub coords: Coords,
    pub scale: Scale,
    pub skew: Skew,
    /// Rotation in degrees, clockwise in screen space.
    pub angle: f64,
    pub stroke_width: f64,
    /// Intrinsic width before scale and skew.
    pub width: f64,
    /// Intrinsic height before scale and skew.
    pub height: f64,
}

/// Axis-aligned bounds in board space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Build bounds from two opposite corners.
    pub fn from_edges(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Smallest bounds containing all four corners.
    pub fn from_corners(corners: &CornerPoints) -> Self {
        let points = corners.as_array();
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Self::from_edges(min_x, min_y, max_x, max_y)
    }

    /// Whether both extents are strictly positive.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Inclusive overlap test: touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.right >= other.left
            && self.left <= other.right
            && self.bottom >= other.top
            && self.top <= other.bottom
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.right, self.bottom)
    }
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Self::from_edges(rect.x0, rect.y0, rect.x1, rect.y1)
    }
}

/// The four corners of a (possibly rotated or skewed) box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerPoints {
    pub tl: Point,
    pub tr: Point,
    pub br: Point,
    pub bl: Point,
}

impl CornerPoints {
    fn as_array(&self) -> [Point; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    fn map(self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            tl: f(self.tl),
            tr: f(self.tr),
            br: f(self.br),
            bl: f(self.bl),
        }
    }

    /// Corners of a `width` x `height` box centered on the origin.
    fn centered(width: f64, height: f64) -> Self {
        let (w, h) = (width / 2.0, height / 2.0);
        Self {
            tl: Point::new(-w, -h),
            tr: Point::new(w, -h),
            br: Point::new(w, h),
            bl: Point::new(-w, h),
        }
    }
}

/// Displayed matrix and bounds of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayedGeometry {
    /// Linear part of the object transform, translated to the top-left corner.
    pub matrix: Affine,
    pub bounds: Bounds,
}

/// Cosine and sine of an angle in degrees.
///
/// Multiples of 90° return exact 1/0/-1 values instead of float noise.
pub fn cos_sin_degrees(degrees: f64) -> (f64, f64) {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        (1.0, 0.0)
    } else if normalized == 90.0 {
        (0.0, 1.0)
    } else if normalized == 180.0 {
        (-1.0, 0.0)
    } else if normalized == 270.0 {
        (0.0, -1.0)
    } else {
        let radians = degrees.to_radians();
        (radians.cos(), radians.sin())
    }
}

/// Rotate `point` around `origin` by `degrees`.
pub fn rotate_point(point: Point, origin: Point, degrees: f64) -> Point {
    let (cos, sin) = cos_sin_degrees(degrees);
    let vx = point.x - origin.x;
    let vy = point.y - origin.y;
    Point::new(
        vx * cos - vy * sin + origin.x,
        vx * sin + vy * cos + origin.y,
    )
}

/// Apply `matrix` to `point`, optionally ignoring its translation.
pub fn transform_point(point: Point, matrix: Affine, ignore_offset: bool) -> Point {
    let [a, b, c, d, e, f] = matrix.as_coeffs();
    if ignore_offset {
        Point::new(a * point.x + c * point.y, b * point.x + d * point.y)
    } else {
        Point::new(a * point.x + c * point.y + e, b * point.x + d * point.y + f)
    }
}

/// Linear scale/skew matrix: scale first, then skew X, then skew Y.
pub fn compute_transform_matrix(scale_x: f64, scale_y: f64, skew_x: f64, skew_y: f64) -> Affine {
    let mut matrix = Affine::new([scale_x, 0.0, 0.0, scale_y, 0.0, 0.0]);
    if skew_x != 0.0 {
        let shear = Affine::new([1.0, 0.0, skew_x.to_radians().tan(), 1.0, 0.0, 0.0]);
        matrix = linear_only(matrix * shear);
    }
    if skew_y != 0.0 {
        let shear = Affine::new([1.0, skew_y.to_radians().tan(), 0.0, 1.0, 0.0, 0.0]);
        matrix = linear_only(matrix * shear);
    }
    matrix
}

fn linear_only(matrix: Affine) -> Affine {
    let [a, b, c, d, _, _] = matrix.as_coeffs();
    Affine::new([a, b, c, d, 0.0, 0.0])
}

/// Rotation matrix for `angle` degrees; identity when the angle is a multiple of 360.
pub fn compute_rotate_matrix(angle: f64) -> Affine {
    if angle % 360.0 != 0.0 {
        let (cos, sin) = cos_sin_degrees(angle);
        Affine::new([cos, sin, -sin, cos, 0.0, 0.0])
    } else {
        Affine::IDENTITY
    }
}

/// Width and height including the stroke, before scale and skew.
pub fn non_transformed_dimensions(object: &ObjectGeometry) -> (f64, f64) {
    (
        object.width + object.stroke_width,
        object.height + object.stroke_width,
    )
}

/// Corners of the scaled and skewed box, centered on the origin.
pub fn corner_points(object: &ObjectGeometry) -> CornerPoints {
    let (width, height) = non_transformed_dimensions(object);
    let linear = linear_matrix(object);
    CornerPoints::centered(width, height).map(|p| transform_point(p, linear, false))
}

/// Bounding box of the scaled and skewed (but not rotated) object.
pub fn transformed_dimensions(object: &ObjectGeometry) -> Bounds {
    Bounds::from_corners(&corner_points(object))
}

/// Re-anchor `point` from one origin to another on the transformed box.
///
/// Rotation is not applied here; see [`center_point`].
pub fn translate_to_origin(
    object: &ObjectGeometry,
    point: Point,
    from: (OriginX, OriginY),
    to: (OriginX, OriginY),
) -> Point {
    let offset_x = to.0.offset() - from.0.offset();
    let offset_y = to.1.offset() - from.1.offset();
    if offset_x == 0.0 && offset_y == 0.0 {
        return point;
    }
    let dim = transformed_dimensions(object);
    Point::new(point.x + offset_x * dim.width, point.y + offset_y * dim.height)
}

/// True center of the object in board space, rotation around the anchor included.
pub fn center_point(object: &ObjectGeometry) -> Point {
    let anchor = Point::new(object.coords.left, object.coords.top);
    let center = translate_to_origin(
        object,
        anchor,
        (object.origin_x, object.origin_y),
        (OriginX::Center, OriginY::Center),
    );
    if object.angle != 0.0 {
        rotate_point(center, anchor, object.angle)
    } else {
        center
    }
}

fn linear_matrix(object: &ObjectGeometry) -> Affine {
    compute_transform_matrix(object.scale.x, object.scale.y, object.skew.x, object.skew.y)
}

/// Compute the displayed matrix and axis-aligned bounds of `object`.
pub fn compute_displayed_matrix_and_bounds(object: &ObjectGeometry) -> DisplayedGeometry {
    let linear = linear_matrix(object);
    let center = center_point(object);
    let translation = Affine::translate((center.x, center.y));
    let relative = translation * compute_rotate_matrix(object.angle) * linear;

    let (width, height) = non_transformed_dimensions(object);
    let corners = CornerPoints::centered(width, height).map(|p| transform_point(p, relative, false));

    let [a, b, c, d, _, _] = relative.as_coeffs();
    DisplayedGeometry {
        matrix: Affine::new([a, b, c, d, corners.tl.x, corners.tl.y]),
        bounds: Bounds::from_corners(&corners),
    }
}

/// Euclidean distance between two points.
pub fn distance_between(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Midpoint of two points.
pub fn center_between(a: Point, b: Point) -> Point {
    Point::new(a.x + (b.x - a.x) / 2.0, a.y + (b.y - a.y) / 2.0)
}
