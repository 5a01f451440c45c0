//! In-memory injector that records every event instead of touching the OS.
//!
//! The real backends move the cursor and press keys on the machine running
//! the tests, and their effect cannot be observed from Rust.  The
//! `RecordingInjector` pushes each event into a shared `Vec` so tests can
//! assert exactly what was injected and in what order, even after the
//! injector has been moved into a [`SharedInjector`](crate::application::SharedInjector).
//!
//! # Usage in tests
//!
//! ```rust
//! use padlink_bridge::application::{apply_command, SharedInjector};
//! use padlink_bridge::infrastructure::injectors::{InjectedEvent, RecordingInjector};
//! use padlink_core::{Command, Direction};
//!
//! let recorder = RecordingInjector::new();
//! let events = recorder.events();
//! let shared = SharedInjector::new(recorder);
//!
//! shared
//!     .with(|inj| apply_command(inj, Command::DirectionKey { direction: Direction::Left }))
//!     .unwrap();
//!
//! assert_eq!(events.snapshot(), vec![InjectedEvent::Key(Direction::Left)]);
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use padlink_core::{Direction, MouseButton};

use crate::application::injection::{InjectionError, InputInjector};

/// One event as seen by the injector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InjectedEvent {
    Key(Direction),
    Pointer { x: f64, y: f64 },
    Button { button: MouseButton, pressed: bool },
}

/// Shared view of the events a [`RecordingInjector`] has seen.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Vec<InjectedEvent>>>,
}

impl EventLog {
    fn push(&self, event: InjectedEvent) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Copies out the events recorded so far.
    pub fn snapshot(&self) -> Vec<InjectedEvent> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An injector that records calls without performing any OS call.
#[derive(Debug, Default)]
pub struct RecordingInjector {
    events: EventLog,
    /// When set, the injector fails once this many events have been recorded.
    fail_after: Option<usize>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that accepts `count` events and fails every call
    /// after that.  Use it to exercise error paths in callers.
    pub fn failing_after(count: usize) -> Self {
        Self {
            events: EventLog::default(),
            fail_after: Some(count),
        }
    }

    /// Returns a handle to the event log that stays valid after the injector
    /// is moved.
    pub fn events(&self) -> EventLog {
        self.events.clone()
    }

    fn record(&mut self, event: InjectedEvent) -> Result<(), InjectionError> {
        if self.fail_after.is_some_and(|limit| self.events.len() >= limit) {
            return Err(InjectionError::Platform(
                "recording injector failure".into(),
            ));
        }
        self.events.push(event);
        Ok(())
    }
}

impl InputInjector for RecordingInjector {
    fn press_key(&mut self, direction: Direction) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Key(direction))
    }

    fn move_pointer(&mut self, x: f64, y: f64) -> Result<(), InjectionError> {
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            return Err(InjectionError::OutOfRange { x, y });
        }
        self.record(InjectedEvent::Pointer { x, y })
    }

    fn press_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Button { button, pressed })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_call_order() {
        let mut recorder = RecordingInjector::new();
        let events = recorder.events();

        recorder.press_key(Direction::Right).unwrap();
        recorder.move_pointer(0.5, 0.5).unwrap();
        recorder.press_button(MouseButton::Left, true).unwrap();

        assert_eq!(
            events.snapshot(),
            vec![
                InjectedEvent::Key(Direction::Right),
                InjectedEvent::Pointer { x: 0.5, y: 0.5 },
                InjectedEvent::Button {
                    button: MouseButton::Left,
                    pressed: true
                },
            ]
        );
    }

    #[test]
    fn test_failing_after_limit() {
        let mut recorder = RecordingInjector::failing_after(1);

        assert!(recorder.press_key(Direction::Up).is_ok());
        assert!(matches!(
            recorder.press_key(Direction::Up),
            Err(InjectionError::Platform(_))
        ));
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn test_pointer_outside_unit_square_is_rejected() {
        let mut recorder = RecordingInjector::new();
        assert_eq!(
            recorder.move_pointer(1.5, 0.0),
            Err(InjectionError::OutOfRange { x: 1.5, y: 0.0 })
        );
        assert!(recorder.events().is_empty());
    }
}
