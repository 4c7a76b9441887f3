//! Routing of raw events from the selected backend to the gesture machine.

use super::{
    EventNormalizer, InputBackend, InputCapabilities, RawMouseEvent, RawPointerEvent,
    RawTouchEvent,
};
use crate::gesture::InteractionHandler;
use crate::viewport::Viewport;

/// Accepts events from exactly one raw backend and feeds the gesture machine.
///
/// Wheel events are accepted whatever the backend. Every `on_*` method
/// returns whether the event was handled.
#[derive(Debug, Clone)]
pub struct InputListener {
    backend: InputBackend,
    capabilities: InputCapabilities,
    normalizer: EventNormalizer,
}

impl Default for InputListener {
    fn default() -> Self {
        Self::new(InputCapabilities::detect())
    }
}

impl InputListener {
    /// Probe `capabilities` once and lock in the backend.
    pub fn new(capabilities: InputCapabilities) -> Self {
        let backend = capabilities.select_backend();
        log::info!("Input backend selected: {:?}", backend);
        Self {
            backend,
            capabilities,
            normalizer: EventNormalizer::new(),
        }
    }

    pub fn backend(&self) -> InputBackend {
        self.backend
    }

    pub fn capabilities(&self) -> &InputCapabilities {
        &self.capabilities
    }

    pub fn normalizer(&self) -> &EventNormalizer {
        &self.normalizer
    }

    pub fn normalizer_mut(&mut self) -> &mut EventNormalizer {
        &mut self.normalizer
    }

    fn accepts(&self, backend: InputBackend) -> bool {
        if self.backend == backend {
            true
        } else {
            log::trace!("Dropping {:?} event, listening to {:?}", backend, self.backend);
            false
        }
    }

    // Mouse backend

    pub fn on_mouse_down(
        &mut self,
        raw: &RawMouseEvent,
        handler: &mut InteractionHandler,
        viewport: &Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Mouse) {
            return false;
        }
        let evt = self.normalizer.normalize_mouse(raw, &viewport.transform());
        handler.on_down(evt, viewport);
        true
    }

    pub fn on_mouse_move(
        &mut self,
        raw: &RawMouseEvent,
        handler: &mut InteractionHandler,
        viewport: &mut Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Mouse) {
            return false;
        }
        let evt = self.normalizer.normalize_mouse(raw, &viewport.transform());
        handler.on_move(evt, viewport);
        true
    }

    pub fn on_mouse_up(
        &mut self,
        raw: &RawMouseEvent,
        handler: &mut InteractionHandler,
        viewport: &Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Mouse) {
            return false;
        }
        let evt = self.normalizer.normalize_mouse(raw, &viewport.transform());
        handler.on_up(&evt);
        true
    }

    /// Wheel events always go through the mouse path.
    pub fn on_wheel(
        &mut self,
        raw: &RawMouseEvent,
        handler: &mut InteractionHandler,
        viewport: &mut Viewport,
    ) -> bool {
        let evt = self.normalizer.normalize_mouse(raw, &viewport.transform());
        handler.on_wheel(&evt, viewport);
        true
    }

    // Touch backend

    pub fn on_touch_start(
        &mut self,
        raw: &RawTouchEvent,
        handler: &mut InteractionHandler,
        viewport: &Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Touch) {
            return false;
        }
        for touch in &raw.changed_touches {
            if self.capabilities.can_receive_touch_force_change() {
                self.normalizer
                    .set_touch_force(touch.identifier, touch.force.unwrap_or(0.0));
            }
            let evt = self
                .normalizer
                .normalize_touch(raw, touch, &viewport.transform());
            handler.on_down(evt, viewport);
            }
        true
    }

    pub fn on_touch_move(
        &mut self,
        raw: &RawTouchEvent,
        handler: &mut InteractionHandler,
        viewport: &mut Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Touch) {
            return false;
        }
        for touch in &raw.changed_touches {
            let evt = self
                .normalizer
                .normalize_touch(raw, touch, &viewport.transform());
            handler.on_move(evt, viewport);
        }
        true
    }

    pub fn on_touch_end(
        &mut self,
        raw: &RawTouchEvent,
        handler: &mut InteractionHandler,
        viewport: &Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Touch) {
            return false;
        }
        for touch in &raw.changed_touches {
            let evt = self
                .normalizer
                .normalize_touch(raw, touch, &viewport.transform());
            handler.on_up(&evt);
            self.normalizer.remove_touch_force(touch.identifier);
            }
        true
    }

    pub fn on_touch_cancel(
        &mut self,
        raw: &RawTouchEvent,
        handler: &mut InteractionHandler,
        viewport: &Viewport,
    ) -> bool {
        self.on_touch_end(raw, handler, viewport)
    }

    /// Record updated touch forces. Also confirms platform support.
    pub fn on_touch_force_change(&mut self, raw: &RawTouchEvent) -> bool {
        for touch in &raw.changed_touches {
            self.capabilities.observe_touch_force_change(touch);
        }
        if !self.capabilities.can_receive_touch_force_change() {
            return false;
        }
        for touch in &raw.changed_touches {
            if let Some(force) = touch.force {
                self.normalizer.set_touch_force(touch.identifier, force);
            }
        }
        true
    }

    // Pointer backend

    pub fn on_pointer_down(
        &mut self,
        raw: &RawPointerEvent,
        handler: &mut InteractionHandler,
        viewport: &Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Pointer) {
            return false;
        }
        let evt = self
            .normalizer
            .normalize_pointer(raw, &self.capabilities, &viewport.transform());
        handler.on_down(evt, viewport);
        true
    }

    /// A move reporting zero pressure means the contact was lost and is
    /// handled as a release.
    pub fn on_pointer_move(
        &mut self,
        raw: &RawPointerEvent,
        handler: &mut InteractionHandler,
        viewport: &mut Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Pointer) {
            return false;
        }
        let evt = self
            .normalizer
            .normalize_pointer(raw, &self.capabilities, &viewport.transform());
        if evt.pressure > 0.0 {
            handler.on_move(evt, viewport);
        } else {
            handler.on_up(&evt);
            }
        true
    }

    pub fn on_pointer_up(
        &mut self,
        raw: &RawPointerEvent,
        handler: &mut InteractionHandler,
        viewport: &Viewport,
    ) -> bool {
        if !self.accepts(InputBackend::Pointer) {
            return false;
        }
        let evt = self
            .normalizer
            .normalize_pointer(raw, &self.capabilities, &viewport.transform());
        handler.on_up(&evt);
        true
    }

    pub fn on_pointer_cancel(
        &mut self,
        raw: &RawPointerEvent,
        handler: &mut InteractionHandler,
        viewport: &Viewport,
    ) -> bool {
        self.on_pointer_up(raw, handler, viewport)
    }
}
