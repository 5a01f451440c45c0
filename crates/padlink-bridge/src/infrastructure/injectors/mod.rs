//! Concrete [`InputInjector`](crate::application::InputInjector) backends.
//!
//! Platform backends (SendInput, XTest, CGEvent) plug in here behind the same
//! trait; this crate ships the two that need no desktop session.

pub mod logging;
pub mod recording;

pub use logging::LoggingInjector;
pub use recording::{EventLog, InjectedEvent, RecordingInjector};
