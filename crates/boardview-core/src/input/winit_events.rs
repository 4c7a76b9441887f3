//! Adapter from winit window events to raw mouse and touch events.

use kurbo::Point;
use winit::event::{
    ElementState, Force, MouseButton as WinitButton, MouseScrollDelta, Touch, TouchPhase,
    WindowEvent,
};

// Use web_time for WASM compatibility
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use super::{
    Modifiers, MouseButton, RawMouseEvent, RawPointerEvent, RawTouch, RawTouchEvent, TouchType,
};

/// Pixels scrolled per wheel line.
const LINE_HEIGHT: f64 = 20.0;

/// A raw event from any backend.
///
/// [`WinitInputAdapter`] produces the mouse and touch variants; hosts with a
/// unified pointer source build the pointer variants themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    MouseDown(RawMouseEvent),
    MouseMove(RawMouseEvent),
    MouseUp(RawMouseEvent),
    Wheel(RawMouseEvent),
    TouchStart(RawTouchEvent),
    TouchMove(RawTouchEvent),
    TouchEnd(RawTouchEvent),
    TouchCancel(RawTouchEvent),
    TouchForceChange(RawTouchEvent),
    PointerDown(RawPointerEvent),
    PointerMove(RawPointerEvent),
    PointerUp(RawPointerEvent),
    PointerCancel(RawPointerEvent),
}

/// Tracks cursor and modifier state across winit events.
///
/// winit reports button presses without a position, so the last cursor
/// position is remembered here.
#[derive(Debug, Clone)]
pub struct WinitInputAdapter {
    cursor: Point,
    modifiers: Modifiers,
    start: Instant,
}

impl Default for WinitInputAdapter {
    fn default() -> Self {
        Self {
            cursor: Point::ZERO,
            modifiers: Modifiers::default(),
            start: Instant::now(),
        }
    }
}

impl WinitInputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Milliseconds since the adapter was created.
    pub fn timestamp(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    fn mouse_event(&self, button: Option<MouseButton>, delta_y: f64) -> RawMouseEvent {
        RawMouseEvent {
            client: self.cursor,
            button,
            delta_y,
            modifiers: self.modifiers,
            timestamp: self.timestamp(),
        }
    }

    /// Translate one window event. Events that carry no pointer input return `None`.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<RawInput> {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.modifiers = Modifiers {
                    shift: state.shift_key(),
                    ctrl: state.control_key(),
                    alt: state.alt_key(),
                    meta: state.super_key(),
                };
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point::new(position.x, position.y);
                Some(RawInput::MouseMove(self.mouse_event(None, 0.0)))
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let raw = self.mouse_event(Some(convert_button(*button)), 0.0);
                Some(match state {
                    ElementState::Pressed => RawInput::MouseDown(raw),
                    ElementState::Released => RawInput::MouseUp(raw),
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling up as positive; zooming out is positive here.
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -f64::from(*y) * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y,
                };
                Some(RawInput::Wheel(self.mouse_event(None, delta_y)))
            }
            WindowEvent::Touch(touch) => {
                let raw = RawTouchEvent {
                    changed_touches: vec![convert_touch(touch)],
                    modifiers: self.modifiers,
                    timestamp: self.timestamp(),
                };
                Some(match touch.phase {
                    TouchPhase::Started => RawInput::TouchStart(raw),
                    TouchPhase::Moved => RawInput::TouchMove(raw),
                    TouchPhase::Ended => RawInput::TouchEnd(raw),
                    TouchPhase::Cancelled => RawInput::TouchCancel(raw),
                })
            }
            _ => None,
        }
    }
}

fn convert_button(button: WinitButton) -> MouseButton {
    match button {
        WinitButton::Left => MouseButton::Left,
        WinitButton::Middle => MouseButton::Middle,
        WinitButton::Right => MouseButton::Right,
        WinitButton::Back => MouseButton::Back,
        WinitButton::Forward => MouseButton::Forward,
        WinitButton::Other(n) => MouseButton::Other(n),
    }
}

fn convert_touch(touch: &Touch) -> RawTouch {
    // Only styluses report an altitude angle.
    let touch_type = match touch.force {
        Some(Force::Calibrated {
            altitude_angle: Some(_),
            ..
        }) => TouchType::Stylus,
        _ => TouchType::Direct,
    };
    RawTouch {
        identifier: touch.id as i64,
        client: Point::new(touch.location.x, touch.location.y),
        force: touch.force.map(|force| force.normalized()),
        touch_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;
    use winit::keyboard::ModifiersState;

    fn device() -> DeviceId {
        // SAFETY: the dummy id is only compared, never used to reach a device.
        unsafe { DeviceId::dummy() }
    }

    #[test]
    fn test_button_uses_last_cursor_position() {
        let mut adapter = WinitInputAdapter::new();
        adapter.translate(&WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(12.0, 34.0),
        });
        let input = adapter.translate(&WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Pressed,
            button: WinitButton::Right,
        });
        match input {
            Some(RawInput::MouseDown(raw)) => {
                assert_eq!(raw.client, Point::new(12.0, 34.0));
                assert_eq!(raw.button, Some(MouseButton::Right));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_wheel_sign() {
        let mut adapter = WinitInputAdapter::new();
        let input = adapter.translate(&WindowEvent::MouseWheel {
            device_id: device(),
            delta: MouseScrollDelta::LineDelta(0.0, -1.0),
            phase: TouchPhase::Moved,
        });
        match input {
            Some(RawInput::Wheel(raw)) => assert!(raw.delta_y > 0.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_modifiers_tracked() {
        let mut adapter = WinitInputAdapter::new();
        let changed = WindowEvent::ModifiersChanged(ModifiersState::CONTROL.into());
        assert!(adapter.translate(&changed).is_none());
        assert!(adapter.modifiers().ctrl);
        assert!(!adapter.modifiers().shift);
    }

    #[test]
    fn test_touch_phases() {
        let mut adapter = WinitInputAdapter::new();
        let touch = Touch {
            device_id: device(),
            phase: TouchPhase::Started,
            location: PhysicalPosition::new(5.0, 6.0),
            force: Some(Force::Normalized(0.3)),
            id: 11,
        };
        match adapter.translate(&WindowEvent::Touch(touch)) {
            Some(RawInput::TouchStart(raw)) => {
                let t = raw.changed_touches[0];
                assert_eq!(t.identifier, 11);
                assert_eq!(t.touch_type, TouchType::Direct);
                assert_eq!(t.force, Some(0.3));
            }
            other => panic!("unexpected {other:?}"),
        }
        let ended = Touch {
            phase: TouchPhase::Cancelled,
            ..touch
        };
        assert!(matches!(
            adapter.translate(&WindowEvent::Touch(ended)),
            Some(RawInput::TouchCancel(_))
        ));
    }
}
