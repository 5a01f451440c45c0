//! The host input-injection capability and its shared, serialized handle.
//!
//! # Why a trait? (for beginners)
//!
//! Actually pressing keys on the host is platform-specific (SendInput on
//! Windows, XTest on Linux, CGEvent on macOS).  The dispatcher only needs
//! three operations, so it talks to a [`InputInjector`] trait object and the
//! concrete backend is chosen at startup.  Tests plug in a mock or the
//! [`RecordingInjector`](crate::infrastructure::injectors::RecordingInjector).
//!
//! # Serialization
//!
//! There is one injector per process but many connections.  [`SharedInjector`]
//! wraps it in `Arc<Mutex<..>>` and exposes [`SharedInjector::with`], which
//! runs a closure under a single lock acquisition.  The dispatcher uses one
//! acquisition per command, so a button press and its release from one
//! browser are never split by another browser's events.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use padlink_core::{Command, Direction, MouseButton};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Error type for input injection.
#[derive(Debug, Error, PartialEq)]
pub enum InjectionError {
    /// The platform API rejected or failed the event.
    #[error("platform error: {0}")]
    Platform(String),

    /// A pointer coordinate outside `[0, 1]` reached the injector.
    #[error("pointer position ({x}, {y}) is outside the unit square")]
    OutOfRange { x: f64, y: f64 },
}

/// Platform-agnostic input injection.
///
/// Pointer coordinates are normalized: `(0, 0)` is the top-left corner of the
/// primary display and `(1, 1)` the bottom-right.
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send {
    /// Taps (presses and releases) an arrow key.
    fn press_key(&mut self, direction: Direction) -> Result<(), InjectionError>;

    /// Moves the pointer to an absolute normalized position.
    fn move_pointer(&mut self, x: f64, y: f64) -> Result<(), InjectionError>;

    /// Presses (`pressed = true`) or releases a mouse button.
    fn press_button(&mut self, button: MouseButton, pressed: bool) -> Result<(), InjectionError>;
}

/// Replays one decoded command on `injector`.
///
/// # Errors
///
/// Returns whatever the injector returns.
pub fn apply_command(
    injector: &mut dyn InputInjector,
    command: Command,
) -> Result<(), InjectionError> {
    match command {
        Command::DirectionKey { direction } => injector.press_key(direction),
        Command::MouseMove { x, y } => injector.move_pointer(x, y),
        Command::MouseButton { button, pressed } => injector.press_button(button, pressed),
    }
}

/// Process-wide handle to the injector, cheap to clone.
#[derive(Clone)]
pub struct SharedInjector {
    inner: Arc<Mutex<Box<dyn InputInjector>>>,
    active_sessions: Arc<AtomicUsize>,
}

impl SharedInjector {
    pub fn new(injector: impl InputInjector + 'static) -> Self {
        Self::from_boxed(Box::new(injector))
    }

    pub fn from_boxed(injector: Box<dyn InputInjector>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(injector)),
            active_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Runs `f` with exclusive access to the injector.
    ///
    /// A lock poisoned by a panicking holder is recovered.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn InputInjector) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut **guard)
    }

    /// Opens a per-connection session.  The session is released when the
    /// returned guard is dropped.
    pub fn open_session(&self, session_id: Uuid) -> InjectionSession {
        let active = self.active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        info!(%session_id, active, "injection session opened");
        InjectionSession {
            injector: self.clone(),
            session_id,
        }
    }

    /// Number of sessions currently open.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }
}

/// RAII guard for one connection's use of the injector.
///
/// Dropping it, on a clean close, an error, or task cancellation, releases
/// the session.
pub struct InjectionSession {
    injector: SharedInjector,
    session_id: Uuid,
}

impl InjectionSession {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn injector(&self) -> &SharedInjector {
        &self.injector
    }
}

impl Drop for InjectionSession {
    fn drop(&mut self) {
        let remaining = self.injector.active_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(session_id = %self.session_id, remaining, "injection session released");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
