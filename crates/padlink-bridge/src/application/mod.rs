//! Application layer for padlink-bridge.
//!
//! Knows *what* happens to a frame (decode, inject, decide whether to close)
//! but not *how* bytes reach it.  Everything here is synchronous.

pub mod dispatcher;
pub mod injection;

pub use dispatcher::{ConnectionDispatcher, ConnectionState, DispatchError, DispatchOutcome};
pub use injection::{apply_command, InjectionError, InjectionSession, InputInjector, SharedInjector};
