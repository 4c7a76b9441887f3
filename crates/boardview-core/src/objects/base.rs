//! Geometric state shared by every object kind.

use std::sync::RwLock;

use kurbo::Point;
use serde::{Deserialize, Serialize};

use super::{ObjectId, generate_id};
use crate::geometry::{
    Coords, DisplayedGeometry, ObjectGeometry, OriginX, OriginY, Scale, Skew,
    compute_displayed_matrix_and_bounds,
};

/// Stroke width objects get unless told otherwise.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Id, paint order and geometry of an object.
///
/// The displayed matrix and bounds are computed on first use and cached until
/// the geometry changes.
#[derive(Debug, Serialize, Deserialize)]
pub struct ObjectBase {
    pub id: ObjectId,
    /// Paint order; lower values are drawn first.
    pub z_index: i64,
    geometry: ObjectGeometry,
    #[serde(skip)]
    displayed: RwLock<Option<DisplayedGeometry>>,
}

impl Clone for ObjectBase {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            z_index: self.z_index,
            geometry: self.geometry,
            // Clone the cached value, not the lock
            displayed: RwLock::new(self.displayed.read().ok().and_then(|guard| *guard)),
        }
    }
}

impl ObjectBase {
    /// New base anchored at `position` with its top-left origin.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            id: generate_id(),
            z_index: 0,
            geometry: ObjectGeometry {
                coords: Coords {
                    left: position.x,
                    top: position.y,
                },
                stroke_width: DEFAULT_STROKE_WIDTH,
                width,
                height,
                ..ObjectGeometry::default()
            },
            displayed: RwLock::new(None),
        }
    }

    pub fn geometry(&self) -> &ObjectGeometry {
        &self.geometry
    }

    /// Mutate the geometry and drop the cached matrix.
    pub fn update_geometry(&mut self, f: impl FnOnce(&mut ObjectGeometry)) {
        f(&mut self.geometry);
        self.invalidate_cache();
    }

    /// Displayed matrix and bounds, computed lazily.
    pub fn displayed(&self) -> DisplayedGeometry {
        if let Some(cached) = self.displayed.read().ok().and_then(|guard| *guard) {
            return cached;
        }
        let computed = compute_displayed_matrix_and_bounds(&self.geometry);
        if let Ok(mut cache) = self.displayed.write() {
            *cache = Some(computed);
        }
        computed
    }

    pub fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.displayed.write() {
            *cache = None;
        }
    }

    pub fn set_coords(&mut self, left: f64, top: f64) {
        self.update_geometry(|g| g.coords = Coords { left, top });
    }

    pub fn set_origin(&mut self, origin_x: OriginX, origin_y: OriginY) {
        self.update_geometry(|g| {
            g.origin_x = origin_x;
            g.origin_y = origin_y;
        });
    }

    pub fn set_scale(&mut self, x: f64, y: f64) {
        self.update_geometry(|g| g.scale = Scale { x, y });
    }

    pub fn set_skew(&mut self, x: f64, y: f64) {
        self.update_geometry(|g| g.skew = Skew { x, y });
    }

    /// Rotation in degrees.
    pub fn set_angle(&mut self, angle: f64) {
        self.update_geometry(|g| g.angle = angle);
    }

    pub fn set_stroke_width(&mut self, stroke_width: f64) {
        self.update_geometry(|g| g.stroke_width = stroke_width.max(0.0));
    }

    pub(crate) fn set_size(&mut self, width: f64, height: f64) {
        self.update_geometry(|g| {
            g.width = width;
            g.height = height;
        });
    }

    pub(crate) fn is_cached(&self) -> bool {
        self.displayed.read().map(|guard| guard.is_some()).unwrap_or(false)
    }
}
