//! Image object referencing an external bitmap source.

use std::fmt;
use std::str::FromStr;

use kurbo::Point;
use serde::{Deserialize, Serialize};

use super::{ObjectBase, ObjectTrait, ObjectType, ShapeData};
use crate::error::ParseError;

/// Hint about how a source must be decoded.
///
/// Vector sources need rasterizing before they can be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpg,
    Svg,
}

impl ImageKind {
    pub fn is_vector(self) -> bool {
        matches!(self, ImageKind::Svg)
    }

    /// Detect the kind from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpg),
            "svg" => Some(ImageKind::Svg),
            _ => None,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::Jpg => f.write_str("jpg"),
            ImageKind::Svg => f.write_str("svg"),
        }
    }
}

impl FromStr for ImageKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpg" => Ok(ImageKind::Jpg),
            "svg" => Ok(ImageKind::Svg),
            other => Err(ParseError::ImageKind(other.to_string())),
        }
    }
}

/// Where an image comes from and its intrinsic size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    /// File path or `data:` URL.
    pub src: String,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ImageKind>,
}

impl ImageSource {
    pub fn new(src: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            src: src.into(),
            width,
            height,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ImageKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// An image placed on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    #[serde(flatten)]
    base: ObjectBase,
    image: ImageSource,
}

impl Image {
    /// Create an image anchored at `position`, sized by its source.
    pub fn new(position: Point, image: ImageSource) -> Self {
        Self {
            base: ObjectBase::new(position, image.width, image.height),
            image,
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

    pub fn with_scale(mut self, x: f64, y: f64) -> Self {
        self.base.set_scale(x, y);
        self
    }

    pub fn source(&self) -> &ImageSource {
        &self.image
    }

    /// Replace the source; the intrinsic size follows it.
    pub fn set_source(&mut self, image: ImageSource) {
        self.base.set_size(image.width, image.height);
        self.image = image;
    }
}

impl ObjectTrait for Image {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn object_type(&self) -> ObjectType {
        ObjectType::Image
    }

    fn transferable_data(&self) -> ShapeData {
        let displayed = self.base.displayed();
        ShapeData::Image {
            id: self.base.id.clone(),
            matrix: displayed.matrix,
            bounds: displayed.bounds,
            src: self.image.src.clone(),
            width: self.image.width,
            height: self.image.height,
            kind: self.image.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection() {
        assert_eq!(ImageKind::from_extension("JPEG"), Some(ImageKind::Jpg));
        assert_eq!(ImageKind::from_extension("svg"), Some(ImageKind::Svg));
        assert_eq!(ImageKind::from_extension("png"), None);
        assert!(ImageKind::Svg.is_vector());
        assert_eq!("svg".parse::<ImageKind>(), Ok(ImageKind::Svg));
        assert!("gif".parse::<ImageKind>().is_err());
    }

    #[test]
    fn test_scaled_image_bounds() {
        let image = Image::new(Point::new(-7630.0, -5050.0), ImageSource::new("a.jpg", 1920.0, 1080.0))
            .with_scale(8.0, 8.0);
        let bounds = image.bounds();
        assert!((bounds.left + 7630.0).abs() < 1e-9);
        assert!((bounds.width - 1922.0 * 8.0).abs() < 1e-9);
        assert!((bounds.height - 1082.0 * 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_source_resizes() {
        let mut image = Image::new(Point::ZERO, ImageSource::new("a.jpg", 10.0, 10.0));
        image.set_source(ImageSource::new("b.svg", 30.0, 40.0).with_kind(ImageKind::Svg));
        assert!((image.geometry().width - 30.0).abs() < f64::EPSILON);
        assert_eq!(image.source().kind, Some(ImageKind::Svg));
    }
}
