//! Filled rectangle.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use super::{ObjectBase, ObjectTrait, ObjectType, SerializableColor, ShapeData};

/// A solid rectangle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rectangle {
    #[serde(flatten)]
    base: ObjectBase,
    pub color: SerializableColor,
}

impl Rectangle {
    /// Create a rectangle anchored at `position` (top-left by default).
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            base: ObjectBase::new(position, width, height),
            color: SerializableColor::black(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.id = id.into();
        self
    }

    pub fn with_z_index(mut self, z_index: i64) -> Self {
        self.base.z_index = z_index;
        self
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_stroke_width(mut self, stroke_width: f64) -> Self {
        self.base.set_stroke_width(stroke_width);
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.base.set_angle(angle);
        self
    }

    pub fn with_scale(mut self, x: f64, y: f64) -> Self {
        self.base.set_scale(x, y);
        self
    }

    pub fn width(&self) -> f64 {
        self.base.geometry().width
    }

    pub fn height(&self) -> f64 {
        self.base.geometry().height
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.base.set_size(width, height);
    }
}

impl ObjectTrait for Rectangle {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Rectangle
    }

    fn transferable_data(&self) -> ShapeData {
        let displayed = self.base.displayed();
        ShapeData::Rectangle {
            id: self.base.id.clone(),
            matrix: displayed.matrix,
            bounds: displayed.bounds,
            width: self.width(),
            height: self.height(),
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    #[test]
    fn test_rectangle_creation() {
        let rect = Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0);
        assert!((rect.width() - 100.0).abs() < f64::EPSILON);
        assert!((rect.height() - 50.0).abs() < f64::EPSILON);
        assert!((rect.geometry().stroke_width - 2.0).abs() < f64::EPSILON);
        assert!(!rect.id().is_empty());
    }

    #[test]
    fn test_unstroked_bounds() {
        let rect = Rectangle::new(Point::ZERO, 50.0, 50.0).with_stroke_width(0.0);
        assert_eq!(rect.bounds(), Bounds::from_edges(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn test_resize_updates_bounds() {
        let mut rect = Rectangle::new(Point::ZERO, 50.0, 50.0).with_stroke_width(0.0);
        let _ = rect.bounds();
        rect.set_size(20.0, 30.0);
        assert_eq!(rect.bounds(), Bounds::from_edges(0.0, 0.0, 20.0, 30.0));
    }

    #[test]
    fn test_rotated_rectangle_matrix() {
        let rect = Rectangle::new(Point::ZERO, 100.0, 50.0)
            .with_stroke_width(0.0)
            .with_angle(180.0);
        let [a, b, c, d, e, f] = rect.matrix().as_coeffs();
        assert_eq!((a, b, c, d), (-1.0, 0.0, 0.0, -1.0));
        assert_eq!((e, f), (0.0, 0.0));
        assert_eq!(rect.bounds(), Bounds::from_edges(-100.0, -50.0, 0.0, 0.0));
    }
}
