//! Board objects: positioned, transformed items shown on the board.

mod base;
mod collection;
mod image;
mod rectangle;

pub use base::ObjectBase;
pub use collection::BoardObjects;
pub use image::{Image, ImageKind, ImageSource};
pub use rectangle::Rectangle;

use kurbo::Affine;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::geometry::{Bounds, ObjectGeometry};

/// Unique identifier for board objects.
pub type ObjectId = String;

/// Generate a fresh object id.
pub fn generate_id() -> ObjectId {
    uuid::Uuid::new_v4().to_string()
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Closed set of object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Rectangle,
    Image,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Rectangle => f.write_str("rectangle"),
            ObjectType::Image => f.write_str("image"),
        }
    }
}

/// Everything the renderer needs to draw one object.
///
/// This is the wire form sent to the renderer, possibly across threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "objectType", rename_all = "lowercase")]
pub enum ShapeData {
    Rectangle {
        id: ObjectId,
        matrix: Affine,
        bounds: Bounds,
        width: f64,
        height: f64,
        color: SerializableColor,
    },
    Image {
        id: ObjectId,
        matrix: Affine,
        bounds: Bounds,
        src: String,
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ImageKind>,
    },
}

impl ShapeData {
    pub fn id(&self) -> &str {
        match self {
            ShapeData::Rectangle { id, .. } | ShapeData::Image { id, .. } => id,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            ShapeData::Rectangle { .. } => ObjectType::Rectangle,
            ShapeData::Image { .. } => ObjectType::Image,
        }
    }

    pub fn matrix(&self) -> Affine {
        match self {
            ShapeData::Rectangle { matrix, .. } | ShapeData::Image { matrix, .. } => *matrix,
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            ShapeData::Rectangle { bounds, .. } | ShapeData::Image { bounds, .. } => *bounds,
        }
    }
}

/// Common behavior of all board objects.
pub trait ObjectTrait {
    fn base(&self) -> &ObjectBase;

    fn base_mut(&mut self) -> &mut ObjectBase;

    fn object_type(&self) -> ObjectType;

    /// Snapshot for the renderer.
    fn transferable_data(&self) -> ShapeData;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn z_index(&self) -> i64 {
        self.base().z_index
    }

    fn geometry(&self) -> &ObjectGeometry {
        self.base().geometry()
    }

    /// Displayed matrix; translation is the top-left corner of the transformed box.
    fn matrix(&self) -> Affine {
        self.base().displayed().matrix
    }

    /// Axis-aligned bounds in board space.
    fn bounds(&self) -> Bounds {
        self.base().displayed().bounds
    }
}

/// Enum wrapper for all object types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "objectType", rename_all = "lowercase")]
pub enum BoardObject {
    Rectangle(Rectangle),
    Image(Image),
}

impl BoardObject {
    fn inner(&self) -> &dyn ObjectTrait {
        match self {
            BoardObject::Rectangle(r) => r,
            BoardObject::Image(i) => i,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ObjectTrait {
        match self {
            BoardObject::Rectangle(r) => r,
            BoardObject::Image(i) => i,
        }
    }

    pub fn id(&self) -> &str {
        self.inner().id()
    }

    pub fn object_type(&self) -> ObjectType {
        self.inner().object_type()
    }

    pub fn z_index(&self) -> i64 {
        self.inner().z_index()
    }

    pub fn geometry(&self) -> &ObjectGeometry {
        self.inner().geometry()
    }

    pub fn matrix(&self) -> Affine {
        self.inner().matrix()
    }

    pub fn bounds(&self) -> Bounds {
        self.inner().bounds()
    }

    pub fn base_mut(&mut self) -> &mut ObjectBase {
        self.inner_mut().base_mut()
    }

    pub fn transferable_data(&self) -> ShapeData {
        self.inner().transferable_data()
    }
}

impl From<Rectangle> for BoardObject {
    fn from(rect: Rectangle) -> Self {
        BoardObject::Rectangle(rect)
    }
}

impl From<Image> for BoardObject {
    fn from(image: Image) -> Self {
        BoardObject::Image(image)
    }
}

impl FromStr for ObjectType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" => Ok(ObjectType::Rectangle),
            "image" => Ok(ObjectType::Image),
            other => Err(ParseError::ObjectType(other.to_string())),
        }
    }
}
