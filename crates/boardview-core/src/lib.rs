//! Boardview Core Library
//!
//! Geometry, viewport, input normalization and gesture handling for an
//! infinite pannable and zoomable board. Nothing here draws; see the
//! `boardview-render` crate for that.

pub mod coords;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod input;
pub mod objects;
pub mod store;
pub mod viewport;
pub mod zoom;

pub use error::ParseError;
pub use geometry::{Bounds, DisplayedGeometry, ObjectGeometry, OriginX, OriginY};
pub use gesture::{Action, GestureConfig, InteractionHandler, PinchAction};
pub use input::{InputBackend, InputCapabilities, InputListener, NormalizedEvent, PointerType};
pub use objects::{BoardObject, BoardObjects, Image, ImageKind, ObjectId, Rectangle, ShapeData};
pub use store::Store;
pub use viewport::{ViewTransform, Viewport, ViewportTransform};
pub use zoom::{ModifierKey, ZoomLimits};
