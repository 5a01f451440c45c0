//! Per-connection dispatch: frames in, injector calls out.
//!
//! A [`ConnectionDispatcher`] is created when a connection completes the
//! WebSocket handshake and lives until the connection ends.  It is a small
//! state machine:
//!
//! ```text
//!               text/binary ok, ping, pong, ...
//!                  ┌────┐
//!                  ▼    │
//!  upgrade ──▶   Open ──┘
//!               │    │
//!               │    └── read EOF / read error ─────────────┐
//!               │ close frame, decode or injection error,   │
//!               │ oversized frame                           ▼
//!               └──▶ Closing ── close reply sent ──▶     Closed
//! ```
//!
//! The dispatcher is synchronous and never touches the socket; the
//! infrastructure layer reads frames, calls into it, and writes the close
//! reply when told to.

use padlink_core::{decode_commands, Command, CommandError, Frame, FrameError, OpCode};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::injection::{
    apply_command, InjectionError, InjectionSession, SharedInjector,
};

/// Lifecycle of one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    /// A close reply is owed to the peer.
    Closing,
    Closed,
}

/// What the session loop should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Keep reading frames.
    Continue,
    /// Send the close reply and end the connection.
    Close,
}

/// Failures that end a connection while dispatching a payload.
#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("input injection failed: {0}")]
    Injection(#[from] InjectionError),
}

/// Drives one connection's frames into the shared injector.
pub struct ConnectionDispatcher {
    state: ConnectionState,
    session_id: Uuid,
    /// `None` once the connection is closed.
    session: Option<InjectionSession>,
    commands_dispatched: u64,
}

impl ConnectionDispatcher {
    /// Opens an injection session for `session_id` and starts in `Open`.
    pub fn new(injector: &SharedInjector, session_id: Uuid) -> Self {
        Self {
            state: ConnectionState::Open,
            session_id,
            session: Some(injector.open_session(session_id)),
            commands_dispatched: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Commands injected over the life of the connection.
    pub fn commands_dispatched(&self) -> u64 {
        self.commands_dispatched
    }

    /// Handles one decoded frame.
    ///
    /// Text and binary payloads are decoded and dispatched; a close frame
    /// asks for the close reply; every other opcode is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the payload does not decode or the
    /// injector fails.  The dispatcher is then in `Closing`.
    pub fn on_frame(&mut self, frame: &Frame) -> Result<DispatchOutcome, DispatchError> {
        if self.state != ConnectionState::Open {
            debug!(state = ?self.state, "frame after close ignored");
            return Ok(DispatchOutcome::Close);
        }

        match frame.opcode {
            OpCode::Text | OpCode::Binary => {
                if !frame.fin {
                    debug!("fragmented frame decoded on its own");
                }
                match self.dispatch_payload(&frame.payload) {
                    Ok(count) => {
                        debug!(
                            commands = count,
                            bytes = frame.payload.len(),
                            "payload dispatched"
                        );
                        Ok(DispatchOutcome::Continue)
                    }
                    Err(e) => {
                        warn!("closing connection: {e}");
                        self.state = ConnectionState::Closing;
                        Err(e)
                    }
                }
            }
            OpCode::Close => {
                debug!("close frame received");
                self.state = ConnectionState::Closing;
                Ok(DispatchOutcome::Close)
            }
            other => {
                // Ping/pong keepalive is not implemented; pings go unanswered.
                debug!(opcode = ?other, "ignoring frame");
                Ok(DispatchOutcome::Continue)
            }
        }
    }

    /// Decodes `payload` and injects each command in order.
    ///
    /// A command reaches the injector only after its terminator has been
    /// validated.  A button press and its release are injected under one
    /// lock acquisition.  Commands before a failing one stay injected and
    /// are counted in [`commands_dispatched`](Self::commands_dispatched).
    ///
    /// Returns the number of commands injected.
    pub fn dispatch_payload(&mut self, payload: &[u8]) -> Result<usize, DispatchError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(0);
        };

        let mut injected = 0;
        let result = inject_payload(session.injector(), payload, &mut injected);
        self.commands_dispatched += injected as u64;
        result.map(|()| injected)
    }

    /// Records a frame-level failure (e.g. an oversized frame).  A close
    /// reply is owed.
    pub fn on_frame_error(&mut self, error: &FrameError) {
        warn!("closing connection: {error}");
        if self.state == ConnectionState::Open {
            self.state = ConnectionState::Closing;
        }
    }

    /// The peer disconnected or the read failed.  No reply is sent.
    pub fn on_peer_closed(&mut self) {
        debug!("peer closed the connection");
        self.close();
    }

    /// Moves to `Closed` and releases the injection session.
    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
        if self.session.take().is_some() {
            debug!(
                session_id = %self.session_id,
                commands = self.commands_dispatched,
                "connection closed"
            );
        }
    }
}

/// Injects every command in `payload`, bumping `injected` after each
/// successful injector call.
fn inject_payload(
    injector: &SharedInjector,
    payload: &[u8],
    injected: &mut usize,
) -> Result<(), DispatchError> {
    let mut commands = decode_commands(payload);
    while let Some(next) = commands.next() {
        let command = next?;
        injector.with(|inj| -> Result<(), DispatchError> {
            apply_command(inj, command)?;
            *injected += 1;
            if let Command::MouseButton { pressed: true, .. } = command {
                // The decoder yields the matching release next without
                // reading further input.
                if let Some(release) = commands.next() {
                    apply_command(inj, release?)?;
                    *injected += 1;
                }
            }
            Ok(())
        })?;
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::injection::MockInputInjector;
    use crate::infrastructure::injectors::{EventLog, InjectedEvent, RecordingInjector};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use padlink_core::{Direction, MouseButton};

    fn recording_dispatcher() -> (ConnectionDispatcher, EventLog, SharedInjector) {
        let recorder = RecordingInjector::new();
        let events = recorder.events();
        let shared = SharedInjector::new(recorder);
        (ConnectionDispatcher::new(&shared, Uuid::new_v4()), events, shared)
    }

    #[test]
    fn test_commands_are_injected_in_payload_order() {
        // Arrange
        let mut seq = Sequence::new();
        let mut mock = MockInputInjector::new();
        mock.expect_press_key()
            .with(eq(Direction::Right))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_move_pointer()
            .withf(|x, y| *x == 1.0 && *y == 0.0)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_press_button()
            .with(eq(MouseButton::Left), eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        mock.expect_press_button()
            .with(eq(MouseButton::Left), eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let shared = SharedInjector::new(mock);
        let mut dispatcher = ConnectionDispatcher::new(&shared, Uuid::new_v4());

        // Act
        let outcome = dispatcher.on_frame(&Frame::text(b"DIRKr\nMOUSffff0000\nBUTT0\n".to_vec()));

        // Assert
        assert_eq!(outcome, Ok(DispatchOutcome::Continue));
        assert_eq!(dispatcher.commands_dispatched(), 4);
        assert_eq!(dispatcher.state(), ConnectionState::Open);
    }

    #[test]
    fn test_binary_frames_carry_commands() {
        let (mut dispatcher, events, _shared) = recording_dispatcher();

        dispatcher
            .on_frame(&Frame::new(OpCode::Binary, b"DIRKu\n".to_vec()))
            .unwrap();

        assert_eq!(events.snapshot(), vec![InjectedEvent::Key(Direction::Up)]);
    }

    #[test]
    fn test_malformed_command_closes_after_earlier_commands_ran() {
        let (mut dispatcher, events, _shared) = recording_dispatcher();

        let result = dispatcher.on_frame(&Frame::text(b"DIRKl\nDIRKz\nDIRKr\n".to_vec()));

        assert!(matches!(
            result,
            Err(DispatchError::Command(CommandError::Malformed { offset: 6, .. }))
        ));
        assert_eq!(events.snapshot(), vec![InjectedEvent::Key(Direction::Left)]);
        assert_eq!(dispatcher.state(), ConnectionState::Closing);
    }

    #[test]
    fn test_missing_terminator_injects_nothing() {
        let (mut dispatcher, events, _shared) = recording_dispatcher();

        let result = dispatcher.on_frame(&Frame::text(b"DIRKr".to_vec()));

        assert!(matches!(result, Err(DispatchError::Command(CommandError::Malformed { .. }))));
        assert!(events.is_empty());
    }

    #[test]
    fn test_unknown_tag_closes_connection() {
        let (mut dispatcher, _events, _shared) = recording_dispatcher();

        let result = dispatcher.on_frame(&Frame::text(b"XXXX\n".to_vec()));

        assert!(matches!(
            result,
            Err(DispatchError::Command(CommandError::UnknownCommand { offset: 0, .. }))
        ));
        assert_eq!(dispatcher.state(), ConnectionState::Closing);
    }

    #[test]
    fn test_injection_failure_closes_connection() {
        let recorder = RecordingInjector::failing_after(1);
        let events = recorder.events();
        let shared = SharedInjector::new(recorder);
        let mut dispatcher = ConnectionDispatcher::new(&shared, Uuid::new_v4());

        let result = dispatcher.on_frame(&Frame::text(b"DIRKr\nDIRKl\n".to_vec()));

        assert!(matches!(result, Err(DispatchError::Injection(_))));
        assert_eq!(events.len(), 1);
        assert_eq!(dispatcher.commands_dispatched(), 1);
        assert_eq!(dispatcher.state(), ConnectionState::Closing);
    }

    #[test]
    fn test_failed_release_still_counts_injected_press() {
        // Arrange: room for the key tap and the button press only.
        let recorder = RecordingInjector::failing_after(2);
        let events = recorder.events();
        let shared = SharedInjector::new(recorder);
        let mut dispatcher = ConnectionDispatcher::new(&shared, Uuid::new_v4());

        // Act
        let result = dispatcher.on_frame(&Frame::text(b"DIRKr\nBUTT0\n".to_vec()));

        // Assert
        assert!(matches!(result, Err(DispatchError::Injection(_))));
        assert_eq!(
            events.snapshot(),
            vec![
                InjectedEvent::Key(Direction::Right),
                InjectedEvent::Button {
                    button: MouseButton::Left,
                    pressed: true,
                },
            ]
        );
        assert_eq!(dispatcher.commands_dispatched(), 2);
    }

    #[test]
    fn test_decode_error_keeps_count_of_earlier_commands() {
        let (mut dispatcher, _events, _shared) = recording_dispatcher();

        let result = dispatcher.on_frame(&Frame::text(b"DIRKl\nDIRKu\nXXXX\n".to_vec()));

        assert!(result.is_err());
        assert_eq!(dispatcher.commands_dispatched(), 2);
    }

    #[test]
    fn test_close_frame_requests_close() {
        let (mut dispatcher, _events, _shared) = recording_dispatcher();

        assert_eq!(
            dispatcher.on_frame(&Frame::close()),
            Ok(DispatchOutcome::Close)
        );
        assert_eq!(dispatcher.state(), ConnectionState::Closing);
    }

    #[test]
    fn test_control_and_reserved_opcodes_keep_connection_open() {
        let (mut dispatcher, events, _shared) = recording_dispatcher();

        for opcode in [OpCode::Ping, OpCode::Pong, OpCode::Continuation, OpCode::Other(0x3)] {
            assert_eq!(
                dispatcher.on_frame(&Frame::new(opcode, b"DIRKr\n".to_vec())),
                Ok(DispatchOutcome::Continue)
            );
        }

        assert!(events.is_empty());
        assert_eq!(dispatcher.state(), ConnectionState::Open);
    }

    #[test]
    fn test_oversized_frame_moves_to_closing() {
        let (mut dispatcher, _events, _shared) = recording_dispatcher();

        dispatcher.on_frame_error(&FrameError::PayloadTooLarge {
            declared: 4096,
            capacity: 1024,
        });

        assert_eq!(dispatcher.state(), ConnectionState::Closing);
    }

    #[test]
    fn test_close_releases_injection_session() {
        let (mut dispatcher, _events, shared) = recording_dispatcher();
        assert_eq!(shared.active_sessions(), 1);

        dispatcher.on_peer_closed();

        assert_eq!(dispatcher.state(), ConnectionState::Closed);
        assert_eq!(shared.active_sessions(), 0);
    }

    #[test]
    fn test_dropping_dispatcher_releases_session() {
        let (dispatcher, _events, shared) = recording_dispatcher();

        drop(dispatcher);

        assert_eq!(shared.active_sessions(), 0);
    }

    #[test]
    fn test_unassigned_button_id_is_accepted_without_injection() {
        let (mut dispatcher, events, _shared) = recording_dispatcher();

        let outcome = dispatcher.on_frame(&Frame::text(b"BUTT9\nDIRKd\n".to_vec()));

        assert_eq!(outcome, Ok(DispatchOutcome::Continue));
        assert_eq!(events.snapshot(), vec![InjectedEvent::Key(Direction::Down)]);
    }

    #[test]
    fn test_button_press_and_release_are_adjacent() {
        let (mut dispatcher, events, _shared) = recording_dispatcher();

        dispatcher.on_frame(&Frame::text(b"BUTT1\n".to_vec())).unwrap();

        assert_eq!(
            events.snapshot(),
            vec![
                InjectedEvent::Button {
                    button: MouseButton::Right,
                    pressed: true,
                },
                InjectedEvent::Button {
                    button: MouseButton::Right,
                    pressed: false,
                },
            ]
        );
    }
}
