//! Pan and pinch recognition.
//!
//! The [`InteractionHandler`] keeps the active pointers and the single action
//! they drive. States move Idle → Panning → Pinching → Panning → Idle; a pinch
//! can only start from a touch pan.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::geometry::{center_between, distance_between};
use crate::input::NormalizedEvent;
use crate::input::MouseButton;
use crate::viewport::Viewport;
use crate::zoom::{self, ModifierKey, ZoomLimits};

/// Thresholds and zoom policy for gesture recognition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    /// A touch held this long (ms) is a drag, not a click.
    pub click_timeout_ms: f64,
    /// A touch moved farther than this (px) is a drag, not a click.
    pub click_distance: f64,
    pub zoom_limits: ZoomLimits,
    pub modifier_key: ModifierKey,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            click_timeout_ms: 300.0,
            click_distance: 30.0,
            zoom_limits: ZoomLimits::default(),
            modifier_key: ModifierKey::default(),
        }
    }
}

/// State of a two-finger zoom, frozen when the second finger lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchAction {
    pub ignore_click: bool,
    pub initial_distance: f64,
    pub initial_scale: f64,
    /// Zoom anchor in window coordinates.
    pub center_point: Point,
}

/// What the active pointers are doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Pan { ignore_click: bool },
    Pinch(PinchAction),
}

impl Action {
    pub fn ignore_click(&self) -> bool {
        match self {
            Action::Pan { ignore_click } => *ignore_click,
            Action::Pinch(pinch) => pinch.ignore_click,
        }
    }

    fn set_ignore_click(&mut self, value: bool) {
        match self {
            Action::Pan { ignore_click } => *ignore_click = value,
            Action::Pinch(pinch) => pinch.ignore_click = value,
        }
    }
}

/// A pointer currently held down.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredEvent {
    pub down_event: NormalizedEvent,
    pub last_event: NormalizedEvent,
}

impl RegisteredEvent {
    fn new(evt: NormalizedEvent) -> Self {
        Self {
            down_event: evt.clone(),
            last_event: evt,
        }
    }

    fn pointer_id(&self) -> &str {
        &self.down_event.pointer_id
    }
}

/// Active pointers with the action they share.
///
/// Two pinching pointers hold one [`PinchAction`], so changing it through one
/// pointer is seen by the other.
#[derive(Debug, Clone, Default, PartialEq)]
enum GestureState {
    #[default]
    Idle,
    Panning {
        pointer: RegisteredEvent,
        action: Action,
    },
    Pinching {
        pointers: [RegisteredEvent; 2],
        action: Action,
    },
}

/// Recognizes pan and pinch gestures and drives the viewport.
#[derive(Debug, Clone, Default)]
pub struct InteractionHandler {
    state: GestureState,
    config: GestureConfig,
}

impl InteractionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GestureConfig) -> Self {
        Self {
            state: GestureState::Idle,
            config,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Exactly one pointer registered and it is panning.
    pub fn is_panning(&self) -> bool {
        matches!(self.state, GestureState::Panning { .. })
    }

    /// Exactly two pointers registered, sharing one pinch.
    pub fn is_pinching(&self) -> bool {
        matches!(self.state, GestureState::Pinching { .. })
    }

    pub fn pointer_count(&self) -> usize {
        match &self.state {
            GestureState::Idle => 0,
            GestureState::Panning { .. } => 1,
            GestureState::Pinching { .. } => 2,
        }
    }

    /// Registered pointer by id.
    pub fn pointer(&self, pointer_id: &str) -> Option<&RegisteredEvent> {
        match &self.state {
            GestureState::Idle => None,
            GestureState::Panning { pointer, .. } => {
                (pointer.pointer_id() == pointer_id).then_some(pointer)
            }
            GestureState::Pinching { pointers, .. } => {
                pointers.iter().find(|p| p.pointer_id() == pointer_id)
            }
        }
    }

    /// Action driven by the given pointer.
    pub fn action_for(&self, pointer_id: &str) -> Option<Action> {
        self.pointer(pointer_id)?;
        match &self.state {
            GestureState::Idle => None,
            GestureState::Panning { action, .. } | GestureState::Pinching { action, .. } => {
                Some(*action)
            }
        }
    }

    /// Register a pointer going down.
    pub fn on_down(&mut self, evt: NormalizedEvent, viewport: &Viewport) {
        let primary = !evt.is_mouse() || evt.mouse_button == Some(MouseButton::Left);
        let secondary = evt.is_mouse() && evt.mouse_button == Some(MouseButton::Right);

        if primary {
            match std::mem::take(&mut self.state) {
                // Extra pointers are ignored while pinching
                state @ GestureState::Pinching { .. } => self.state = state,
                GestureState::Panning { pointer, action } => {
                    if evt.is_touch() && pointer.down_event.is_touch() {
                        let pinch = init_pinch(&pointer, &evt, viewport.scale());
                        log::debug!(
                            "Pinch recognized between pointers {} and {}",
                            pointer.pointer_id(),
                            evt.pointer_id
                        );
                        self.state = GestureState::Pinching {
                            pointers: [pointer, RegisteredEvent::new(evt)],
                            action: Action::Pinch(pinch),
                        };
                    } else {
                        self.state = GestureState::Panning { pointer, action };
                    }
                }
                GestureState::Idle => self.start_pan(evt),
            }
        } else if secondary && matches!(self.state, GestureState::Idle) {
            self.start_pan(evt);
        }
    }

    fn start_pan(&mut self, evt: NormalizedEvent) {
        log::debug!("Pan started by pointer {}", evt.pointer_id);
        self.state = GestureState::Panning {
            pointer: RegisteredEvent::new(evt),
            action: Action::Pan {
                ignore_click: false,
            },
        };
    }

    /// Move a registered pointer, panning or zooming the viewport.
    pub fn on_move(&mut self, evt: NormalizedEvent, viewport: &mut Viewport) {
        let config = self.config;
        let (registered, action) = match &mut self.state {
            GestureState::Idle => return,
            GestureState::Panning { pointer, action } => {
                if pointer.pointer_id() != evt.pointer_id {
                    return;
                }
                (pointer, action)
            }
            GestureState::Pinching { pointers, action } => {
                match pointers.iter_mut().find(|p| p.pointer_id() == evt.pointer_id) {
                    Some(pointer) => (pointer, action),
                    None => return,
                }
            }
        };

        let ignore_click = if evt.is_touch() {
            // A touch rarely goes down and up without moving, so only a
            // long or far move counts as a drag.
            action.ignore_click()
                || evt.timestamp - registered.down_event.timestamp >= config.click_timeout_ms
                || distance_between(registered.down_event.client, evt.client)
                    > config.click_distance
        } else {
            true
        };
        action.set_ignore_click(ignore_click);
        if !ignore_click {
            return;
        }

        let previous = std::mem::replace(&mut registered.last_event, evt);
        let current = registered.last_event.client;
        let action = *action;

        match action {
            Action::Pan { .. } => {
                viewport.pan(Vec2::new(
                    current.x - previous.client.x,
                    current.y - previous.client.y,
                ));
            }
            Action::Pinch(pinch) => {
                let GestureState::Pinching { pointers, .. } = &self.state else {
                    return;
                };
                if pinch.initial_distance <= 0.0 {
                    return;
                }
                let distance =
                    distance_between(pointers[0].last_event.client, pointers[1].last_event.client);
                let ratio = distance / pinch.initial_distance;
                let new_zoom = (ratio * pinch.initial_scale * 100.0).round() as i32;
                zoom::zoom_at(viewport, pinch.center_point, new_zoom, &config.zoom_limits);
            }
        }
    }

    /// Release a pointer. Unknown pointers are ignored.
    pub fn on_up(&mut self, evt: &NormalizedEvent) {
        if self.pointer(&evt.pointer_id).is_none() {
            return;
        }
        match std::mem::take(&mut self.state) {
            GestureState::Pinching { pointers, action } => {
                let [first, second] = pointers;
                let survivor = if first.pointer_id() == evt.pointer_id {
                    second
                } else {
                    first
                };
                log::debug!(
                    "Pinch ended, pointer {} continues panning",
                    survivor.pointer_id()
                );
                self.state = GestureState::Panning {
                    pointer: survivor,
                    action: Action::Pan {
                        ignore_click: action.ignore_click(),
                    },
                };
            }
            GestureState::Panning { .. } | GestureState::Idle => {
                log::debug!("Pointer {} released", evt.pointer_id);
            }
        }
    }

    /// Wheel zoom anchored at the cursor. Does not touch the pointer registry.
    pub fn on_wheel(&self, evt: &NormalizedEvent, viewport: &mut Viewport) {
        let fine = self.config.modifier_key.is_held(&evt.modifiers);
        zoom::zoom_to_point(
            viewport,
            evt.pointer,
            evt.delta_y,
            fine,
            &self.config.zoom_limits,
        );
    }
}

fn init_pinch(other: &RegisteredEvent, evt: &NormalizedEvent, scale: f64) -> PinchAction {
    let a = other.last_event.client;
    let b = evt.client;
    PinchAction {
        ignore_click: false,
        initial_distance: distance_between(a, b),
        initial_scale: scale,
        center_point: center_between(a, b),
    }
}
