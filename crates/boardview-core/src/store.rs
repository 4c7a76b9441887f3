//! Foreground state: screen size, viewport, gestures and objects.

use std::sync::mpsc::{self, Receiver, Sender};

use kurbo::Size;

use crate::gesture::{GestureConfig, InteractionHandler};
use crate::input::{InputCapabilities, InputListener, Modifiers, RawInput};
use crate::objects::BoardObjects;
use crate::viewport::Viewport;
use crate::zoom;

/// Owns everything the foreground mutates.
///
/// Screen size, viewport and object changes are published over channels so
/// a renderer can observe them without sharing memory.
#[derive(Debug)]
pub struct Store {
    screen_size: Size,
    screen_subscribers: Vec<Sender<Size>>,
    pub viewport: Viewport,
    pub interaction: InteractionHandler,
    pub listener: InputListener,
    pub objects: BoardObjects,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(InputCapabilities::detect(), GestureConfig::default())
    }
}

impl Store {
    pub fn new(capabilities: InputCapabilities, config: GestureConfig) -> Self {
        Self {
            screen_size: Size::ZERO,
            screen_subscribers: Vec::new(),
            viewport: Viewport::new(),
            interaction: InteractionHandler::with_config(config),
            listener: InputListener::new(capabilities),
            objects: BoardObjects::new(),
        }
    }

    pub fn screen_size(&self) -> Size {
        self.screen_size
    }

    /// Record a new screen size and notify subscribers.
    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen_size = Size::new(width, height);
        let size = self.screen_size;
        self.screen_subscribers
            .retain(|subscriber| subscriber.send(size).is_ok());
    }

    pub fn subscribe_screen_size(&mut self) -> Receiver<Size> {
        let (tx, rx) = mpsc::channel();
        self.screen_subscribers.push(tx);
        rx
    }

    /// Route one raw input event through the listener. Returns whether it was handled.
    pub fn handle_input(&mut self, input: &RawInput) -> bool {
        let Self {
            viewport,
            interaction,
            listener,
            ..
        } = self;
        match input {
            RawInput::MouseDown(raw) => listener.on_mouse_down(raw, interaction, viewport),
            RawInput::MouseMove(raw) => listener.on_mouse_move(raw, interaction, viewport),
            RawInput::MouseUp(raw) => listener.on_mouse_up(raw, interaction, viewport),
            RawInput::Wheel(raw) => listener.on_wheel(raw, interaction, viewport),
            RawInput::TouchStart(raw) => listener.on_touch_start(raw, interaction, viewport),
            RawInput::TouchMove(raw) => listener.on_touch_move(raw, interaction, viewport),
            RawInput::TouchEnd(raw) => listener.on_touch_end(raw, interaction, viewport),
            RawInput::TouchCancel(raw) => listener.on_touch_cancel(raw, interaction, viewport),
            RawInput::TouchForceChange(raw) => listener.on_touch_force_change(raw),
            RawInput::PointerDown(raw) => listener.on_pointer_down(raw, interaction, viewport),
            RawInput::PointerMove(raw) => listener.on_pointer_move(raw, interaction, viewport),
            RawInput::PointerUp(raw) => listener.on_pointer_up(raw, interaction, viewport),
            RawInput::PointerCancel(raw) => listener.on_pointer_cancel(raw, interaction, viewport),
        }
    }

    /// Keyboard-style zoom step anchored at the screen center.
    pub fn zoom_to_center(&mut self, delta: f64, modifiers: &Modifiers) {
        let config = self.interaction.config();
        let fine = config.modifier_key.is_held(modifiers);
        let limits = config.zoom_limits;
        zoom::zoom_to_center(&mut self.viewport, self.screen_size, delta, fine, &limits);
    }
}
