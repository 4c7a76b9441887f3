//! Anchor-preserving zoom and the wheel step policy.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

use crate::input::Modifiers;
use crate::viewport::{Viewport, ViewportTransform};

/// Smallest zoom percentage.
pub const MIN_ZOOM: i32 = 1;
/// Largest zoom percentage.
pub const MAX_ZOOM: i32 = 1000;

/// Inclusive zoom range in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: i32,
    pub max: i32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: MIN_ZOOM,
            max: MAX_ZOOM,
        }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, zoom: i32) -> i32 {
        zoom.max(self.min).min(self.max)
    }
}

/// Key that switches the wheel to fine (1%) zoom steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKey {
    Ctrl,
    Meta,
}

impl Default for ModifierKey {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            ModifierKey::Meta
        } else {
            ModifierKey::Ctrl
        }
    }
}

impl ModifierKey {
    pub fn is_held(self, modifiers: &Modifiers) -> bool {
        match self {
            ModifierKey::Ctrl => modifiers.ctrl,
            ModifierKey::Meta => modifiers.meta,
        }
    }
}

/// Clamp a zoom percentage to `[MIN_ZOOM, MAX_ZOOM]`.
pub fn limit_zoom(zoom: i32) -> i32 {
    ZoomLimits::default().clamp(zoom)
}

/// Next zoom level for one wheel notch.
///
/// Positive `delta` zooms out, negative zooms in. Coarse steps snap to the
/// nearest multiple of ten first.
pub fn next_wheel_zoom(current: i32, delta: f64, fine: bool) -> i32 {
    let snapped = || (f64::from(current) / 10.0).round() as i32 * 10;
    if delta > 0.0 {
        if fine || current <= 10 {
            current - 1
        } else {
            snapped() - 10
        }
    } else if fine || current < 10 {
        current + 1
    } else {
        snapped() + 10
    }
}

/// Set the zoom to `new_zoom` while keeping the board point under `anchor` fixed.
///
/// `anchor` is in container coordinates. The resulting translation is rounded to
/// whole pixels.
pub fn zoom_at(viewport: &mut Viewport, anchor: Point, new_zoom: i32, limits: &ZoomLimits) {
    let zoom = limits.clamp(new_zoom);
    let board = viewport.to_board(anchor);
    let scale = f64::from(zoom) / 100.0;
    viewport.set_transform(ViewportTransform {
        zoom,
        tx: (anchor.x - board.x * scale).round(),
        ty: (anchor.y - board.y * scale).round(),
    });
}

/// Apply one wheel notch anchored at `pointer`. A zero delta does nothing.
pub fn zoom_to_point(
    viewport: &mut Viewport,
    pointer: Point,
    delta: f64,
    fine: bool,
    limits: &ZoomLimits,
) {
    if delta == 0.0 {
        return;
    }
    let new_zoom = next_wheel_zoom(viewport.zoom(), delta, fine);
    zoom_at(viewport, pointer, new_zoom, limits);
}

/// Apply one zoom step anchored at the center of the screen.
pub fn zoom_to_center(
    viewport: &mut Viewport,
    screen_size: Size,
    delta: f64,
    fine: bool,
    limits: &ZoomLimits,
) {
    let center = Point::new(screen_size.width / 2.0, screen_size.height / 2.0);
    let new_zoom = next_wheel_zoom(viewport.zoom(), delta, fine);
    zoom_at(viewport, center, new_zoom, limits);
}
