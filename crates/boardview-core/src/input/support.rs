//! Input capability probing and backend selection.

use serde::{Deserialize, Serialize};

use super::{RawTouch, TouchType};

/// The raw event family the listener accepts. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputBackend {
    Pointer,
    Touch,
    Mouse,
}

/// What the host platform can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputCapabilities {
    pub pointer: bool,
    pub touch: bool,
    pub mouse: bool,
    /// Touch points carry a force value.
    pub touch_force: bool,
    /// The platform declares touch-force-change events.
    pub touch_force_change: bool,
    /// A non-stylus force change has actually been observed.
    #[serde(skip)]
    force_change_confirmed: bool,
}

impl InputCapabilities {
    /// Capabilities of the current target, as far as they are known at compile time.
    pub fn detect() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            Self {
                touch: true,
                touch_force: true,
                ..Self::default()
            }
        } else {
            Self {
                mouse: true,
                ..Self::default()
            }
        }
    }

    pub fn with_pointer(mut self, pointer: bool) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn with_touch(mut self, touch: bool) -> Self {
        self.touch = touch;
        self
    }

    pub fn with_mouse(mut self, mouse: bool) -> Self {
        self.mouse = mouse;
        self
    }

    pub fn with_touch_force_change(mut self, declared: bool) -> Self {
        self.touch_force_change = declared;
        self
    }

    /// Pick the backend: pointer first, then touch, then mouse.
    pub fn select_backend(&self) -> InputBackend {
        if self.pointer {
            InputBackend::Pointer
        } else if self.touch {
            InputBackend::Touch
        } else {
            InputBackend::Mouse
        }
    }

    /// Record a force-change notification.
    ///
    /// The platform may declare the event without ever sending it, so support
    /// is only confirmed once a non-stylus touch reports a change.
    pub fn observe_touch_force_change(&mut self, touch: &RawTouch) {
        if self.touch_force_change
            && !self.force_change_confirmed
            && touch.touch_type != TouchType::Stylus
        {
            log::debug!("Touch force change events confirmed");
            self.force_change_confirmed = true;
        }
    }

    /// Whether touch force values can be trusted as pressure.
    pub fn can_receive_touch_force_change(&self) -> bool {
        self.touch_force_change && self.force_change_confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_preference() {
        let all = InputCapabilities::default()
            .with_pointer(true)
            .with_touch(true)
            .with_mouse(true);
        assert_eq!(all.select_backend(), InputBackend::Pointer);
        assert_eq!(all.with_pointer(false).select_backend(), InputBackend::Touch);
        assert_eq!(
            InputCapabilities::default().select_backend(),
            InputBackend::Mouse
        );
    }

    #[test]
    fn test_force_change_needs_confirmation() {
        let mut caps = InputCapabilities::default().with_touch_force_change(true);
        assert!(!caps.can_receive_touch_force_change());

        let stylus = RawTouch {
            touch_type: TouchType::Stylus,
            ..RawTouch::default()
        };
        caps.observe_touch_force_change(&stylus);
        assert!(!caps.can_receive_touch_force_change());

        caps.observe_touch_force_change(&RawTouch::default());
        assert!(caps.can_receive_touch_force_change());
    }

    #[test]
    fn test_undeclared_force_change_never_confirms() {
        let mut caps = InputCapabilities::default();
        caps.observe_touch_force_change(&RawTouch::default());
        assert!(!caps.can_receive_touch_force_change());
    }
}
