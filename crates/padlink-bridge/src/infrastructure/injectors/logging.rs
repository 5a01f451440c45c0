//! Injector backend that logs events through `tracing`.
//!
//! This is the default backend of the `padlink-bridge` binary.  It lets the
//! whole browser → WebSocket → decoder path be exercised on a machine without
//! a platform input backend; run with `RUST_LOG=padlink::input=info` to watch
//! the events scroll by.

use padlink_core::{Direction, MouseButton};
use tracing::info;

use crate::application::injection::{InjectionError, InputInjector};

/// Writes one log line per injected event.
#[derive(Debug, Default)]
pub struct LoggingInjector {
    events: u64,
}

impl LoggingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total events logged since creation.
    pub fn event_count(&self) -> u64 {
        self.events
    }
}

impl InputInjector for LoggingInjector {
    fn press_key(&mut self, direction: Direction) -> Result<(), InjectionError> {
        self.events += 1;
        info!(target: "padlink::input", ?direction, "key tap");
        Ok(())
    }

    fn move_pointer(&mut self, x: f64, y: f64) -> Result<(), InjectionError> {
        self.events += 1;
        info!(target: "padlink::input", x, y, "pointer move");
        Ok(())
    }

    fn press_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), InjectionError> {
        self.events += 1;
        info!(
            target: "padlink::input",
            ?button,
            state = if pressed { "down" } else { "up" },
            "mouse button"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_call_succeeds_and_is_counted() {
        let mut injector = LoggingInjector::new();

        injector.press_key(Direction::Left).unwrap();
        injector.move_pointer(0.1, 0.9).unwrap();
        injector.press_button(MouseButton::Right, true).unwrap();
        injector.press_button(MouseButton::Right, false).unwrap();

        assert_eq!(injector.event_count(), 4);
    }
}
