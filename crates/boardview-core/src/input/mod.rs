//! Cross-device input.
//!
//! Raw mouse, touch and pointer events are turned into [`NormalizedEvent`]s
//! by the [`normalize`] functions and routed to the gesture machine by the
//! [`listener::InputListener`].

pub mod listener;
pub mod normalize;
pub mod support;
pub mod winit_events;

use std::fmt;
use std::str::FromStr;

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub use listener::InputListener;
pub use normalize::EventNormalizer;
pub use support::{InputBackend, InputCapabilities};
pub use winit_events::{RawInput, WinitInputAdapter};

/// Pressure reported for devices without pressure sensing.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Pointer id used for every mouse event.
pub const MOUSE_POINTER_ID: &str = "mouse";

/// Kind of device that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    Mouse,
    Touch,
    Pen,
}

impl PointerType {
    pub fn as_str(self) -> &'static str {
        match self {
            PointerType::Mouse => "mouse",
            PointerType::Touch => "touch",
            PointerType::Pen => "pen",
        }
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointerType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mouse" => Ok(PointerType::Mouse),
            "touch" => Ok(PointerType::Touch),
            "pen" => Ok(PointerType::Pen),
            other => Err(ParseError::PointerType(other.to_string())),
        }
    }
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    /// Map a one-based button number (1 = left, 2 = middle, 3 = right).
    ///
    /// Zero means no button.
    pub fn from_number(number: u16) -> Option<Self> {
        match number {
            0 => None,
            1 => Some(MouseButton::Left),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Right),
            4 => Some(MouseButton::Back),
            5 => Some(MouseButton::Forward),
            n => Some(MouseButton::Other(n)),
        }
    }
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// One pointer event in canonical form.
///
/// Positions are captured in every coordinate space at normalization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub pointer_id: String,
    pub pointer_type: PointerType,
    /// Pressure in `[0, 1]`.
    pub pressure: f64,
    /// Window coordinates.
    pub client: Point,
    /// Container-relative coordinates.
    pub pointer: Point,
    /// Board coordinates under the viewport at normalization time.
    pub board: Point,
    /// Vertical wheel delta, zero for non-wheel events.
    pub delta_y: f64,
    pub modifiers: Modifiers,
    pub mouse_button: Option<MouseButton>,
    /// Milliseconds since an arbitrary fixed origin.
    pub timestamp: f64,
}

impl NormalizedEvent {
    pub fn is_mouse(&self) -> bool {
        self.pointer_type == PointerType::Mouse
    }

    pub fn is_touch(&self) -> bool {
        self.pointer_type == PointerType::Touch
    }
}

/// Raw mouse or wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawMouseEvent {
    pub client: Point,
    pub button: Option<MouseButton>,
    pub delta_y: f64,
    pub modifiers: Modifiers,
    pub timestamp: f64,
}

/// How a touch point was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchType {
    #[default]
    Direct,
    Stylus,
}

/// One touch point of a raw touch event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawTouch {
    pub identifier: i64,
    pub client: Point,
    /// Reported force, if the platform reports one.
    pub force: Option<f64>,
    pub touch_type: TouchType,
}

/// Raw touch event carrying the touches that changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTouchEvent {
    pub changed_touches: Vec<RawTouch>,
    pub modifiers: Modifiers,
    pub timestamp: f64,
}

/// Raw unified pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPointerEvent {
    pub pointer_id: i64,
    pub pointer_type: PointerType,
    pub client: Point,
    pub pressure: f64,
    pub button: Option<MouseButton>,
    pub modifiers: Modifiers,
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_type_parse() {
        assert_eq!("pen".parse::<PointerType>(), Ok(PointerType::Pen));
        assert_eq!(PointerType::Touch.to_string(), "touch");
        assert!(matches!(
            "trackball".parse::<PointerType>(),
            Err(ParseError::PointerType(s)) if s == "trackball"
        ));
    }

    #[test]
    fn test_button_numbers() {
        assert_eq!(MouseButton::from_number(0), None);
        assert_eq!(MouseButton::from_number(1), Some(MouseButton::Left));
        assert_eq!(MouseButton::from_number(3), Some(MouseButton::Right));
        assert_eq!(MouseButton::from_number(9), Some(MouseButton::Other(9)));
    }
}
