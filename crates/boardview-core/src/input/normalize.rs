//! Conversion of raw device events into [`NormalizedEvent`]s.

use std::collections::HashMap;

use kurbo::Point;

use super::{
    DEFAULT_PRESSURE, InputCapabilities, MOUSE_POINTER_ID, NormalizedEvent, PointerType,
    RawMouseEvent, RawPointerEvent, RawTouch, RawTouchEvent, TouchType,
};
use crate::coords::normalize_window_position;
use crate::viewport::ViewTransform;

/// Normalizes raw events against the container position and current viewport.
///
/// Also remembers the last force reported for each active touch, which is used
/// as that touch's pressure.
#[derive(Debug, Clone, Default)]
pub struct EventNormalizer {
    container_origin: Point,
    touch_forces: HashMap<i64, f64>,
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set where the board container's top-left corner sits in window coordinates.
    pub fn with_container_origin(mut self, origin: Point) -> Self {
        self.container_origin = origin;
        self
    }

    pub fn set_container_origin(&mut self, origin: Point) {
        self.container_origin = origin;
    }

    pub fn container_origin(&self) -> Point {
        self.container_origin
    }

    pub fn set_touch_force(&mut self, identifier: i64, force: f64) {
        self.touch_forces.insert(identifier, force);
    }

    pub fn touch_force(&self, identifier: i64) -> Option<f64> {
        self.touch_forces.get(&identifier).copied()
    }

    pub fn remove_touch_force(&mut self, identifier: i64) {
        self.touch_forces.remove(&identifier);
    }

    fn base_event(&self, client: Point, transform: &ViewTransform) -> NormalizedEvent {
        let position = normalize_window_position(client, self.container_origin, transform);
        NormalizedEvent {
            pointer_id: String::new(),
            pointer_type: PointerType::Mouse,
            pressure: DEFAULT_PRESSURE,
            client: position.client,
            pointer: position.pointer,
            board: position.board,
            delta_y: 0.0,
            modifiers: Default::default(),
            mouse_button: None,
            timestamp: 0.0,
        }
    }

    /// Mouse and wheel events: id `"mouse"`, constant pressure.
    pub fn normalize_mouse(&self, raw: &RawMouseEvent, transform: &ViewTransform) -> NormalizedEvent {
        NormalizedEvent {
            pointer_id: MOUSE_POINTER_ID.to_string(),
            pointer_type: PointerType::Mouse,
            pressure: DEFAULT_PRESSURE,
            delta_y: raw.delta_y,
            modifiers: raw.modifiers,
            mouse_button: raw.button,
            timestamp: raw.timestamp,
            ..self.base_event(raw.client, transform)
        }
    }

    /// One changed touch of a touch event.
    ///
    /// Stylus touches with a reported force use it directly; other touches use
    /// the last recorded force, falling back to the default pressure.
    pub fn normalize_touch(
        &self,
        raw: &RawTouchEvent,
        touch: &RawTouch,
        transform: &ViewTransform,
    ) -> NormalizedEvent {
        let pressure = match (touch.touch_type, touch.force) {
            (TouchType::Stylus, Some(force)) => force,
            _ => self
                .touch_force(touch.identifier)
                .unwrap_or(DEFAULT_PRESSURE),
        };
        NormalizedEvent {
            pointer_id: touch.identifier.to_string(),
            pointer_type: PointerType::Touch,
            pressure,
            modifiers: raw.modifiers,
            timestamp: raw.timestamp,
            ..self.base_event(touch.client, transform)
        }
    }

    /// Unified pointer events keep their native id.
    ///
    /// Reported pressure is only kept for pens, and for touches once the
    /// platform has proven it sends real force values.
    pub fn normalize_pointer(
        &self,
        raw: &RawPointerEvent,
        capabilities: &InputCapabilities,
        transform: &ViewTransform,
    ) -> NormalizedEvent {
        let trusted = match raw.pointer_type {
            PointerType::Pen => true,
            PointerType::Touch => capabilities.can_receive_touch_force_change(),
            PointerType::Mouse => false,
        };
        NormalizedEvent {
            pointer_id: raw.pointer_id.to_string(),
            pointer_type: raw.pointer_type,
            pressure: if trusted { raw.pressure } else { DEFAULT_PRESSURE },
            modifiers: raw.modifiers,
            mouse_button: raw.button,
            timestamp: raw.timestamp,
            ..self.base_event(raw.client, transform)
        }
    }
}
