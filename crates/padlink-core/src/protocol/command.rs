//! Input command decoder.
//!
//! The browser sends input as short ASCII commands inside WebSocket frame
//! payloads.  Every command starts with a 4-byte tag, carries fixed-width
//! arguments, and ends with a mandatory `'\n'`:
//!
//! ```text
//! DIRK <dir:1>                 \n   dir ∈ {r, l, u, d}          → arrow key tap
//! MOUS <x:4 hex> <y:4 hex>     \n   0000–ffff on both axes      → pointer move
//! BUTT <id:1 hex>              \n   0 left, 1 right, 2 middle   → button click
//! ```
//!
//! Several commands may be concatenated in one payload, e.g.
//! `MOUS80008000\nBUTT0\n` moves the pointer to the screen centre and clicks.
//!
//! # Decoding model
//!
//! [`decode_commands`] returns a [`Commands`] iterator.  Each call to `next()`
//! decodes just enough of the payload to yield the next [`Command`], so a
//! caller that injects every command before asking for the next one gets
//! strictly ordered side effects.  The iterator yields at most one error and
//! then stops: anything after a malformed or unknown command is never looked at.

use thiserror::Error;
use tracing::debug;

/// `DIRK` – directional key tap.
pub const TAG_DIRK: u32 = u32::from_be_bytes(*b"DIRK");
/// `MOUS` – absolute pointer move.
pub const TAG_MOUS: u32 = u32::from_be_bytes(*b"MOUS");
/// `BUTT` – mouse button click.
pub const TAG_BUTT: u32 = u32::from_be_bytes(*b"BUTT");

/// Byte that must follow every command.
pub const TERMINATOR: u8 = b'\n';

const TAG_LEN: usize = 4;
const COORDINATE_DIGITS: usize = 4;
const COORDINATE_MAX: f64 = 0xFFFF as f64;

/// Errors produced while decoding a command payload.
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    /// The 4-byte tag is not one of `DIRK`, `MOUS`, `BUTT`.
    #[error("unknown command tag 0x{tag:08X} at offset {offset}")]
    UnknownCommand { tag: u32, offset: usize },

    /// A known command had a bad argument, was truncated, or lacked its terminator.
    #[error("malformed command at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: String },
}

/// Arrow key selected by a `DIRK` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

impl Direction {
    /// Maps the single-byte `DIRK` argument to a direction.
    pub fn from_arg(arg: u8) -> Option<Self> {
        match arg {
            b'r' => Some(Direction::Right),
            b'l' => Some(Direction::Left),
            b'u' => Some(Direction::Up),
            b'd' => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Mouse button selected by a `BUTT` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// Maps a `BUTT` button id to a button.  Ids above 2 have no button.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Right),
            2 => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// One discrete input action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Press and immediately release an arrow key.
    DirectionKey { direction: Direction },
    /// Move the pointer to a normalized position; both axes are in `[0, 1]`.
    MouseMove { x: f64, y: f64 },
    /// Press (`pressed = true`) or release a mouse button.
    ///
    /// A `BUTT` command decodes into a press followed by a release.
    MouseButton { button: MouseButton, pressed: bool },
}

/// Starts decoding `payload` from offset 0.
///
/// # Examples
///
/// ```rust
/// use padlink_core::protocol::command::{decode_commands, Command, Direction};
///
/// let commands: Vec<Command> = decode_commands(b"DIRKr\nDIRKl\n")
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(
///     commands,
///     vec![
///         Command::DirectionKey { direction: Direction::Right },
///         Command::DirectionKey { direction: Direction::Left },
///     ]
/// );
/// ```
pub fn decode_commands(payload: &[u8]) -> Commands<'_> {
    Commands {
        payload,
        offset: 0,
        pending: None,
        failed: false,
    }
}

/// Iterator over the commands in one payload.  See [`decode_commands`].
pub struct Commands<'a> {
    payload: &'a [u8],
    offset: usize,
    /// Release half of a button click, yielded right after the press.
    pending: Option<Command>,
    failed: bool,
}

impl Commands<'_> {
    /// Byte offset of the next undecoded command.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn is_exhausted(&self) -> bool {
        // An empty payload is not "exhausted": the first read must still
        // report it as too short to hold a tag.
        self.offset > 0 && self.offset >= self.payload.len()
    }

    /// Decodes the wire command at `self.offset` and advances past its terminator.
    ///
    /// Returns `Ok(None)` for a syntactically valid command with no action.
    fn decode_next(&mut self) -> Result<Option<Command>, CommandError> {
        let start = self.offset;
        let tag_bytes = self.field(start, TAG_LEN, "command tag")?;
        let tag = u32::from_be_bytes([tag_bytes[0], tag_bytes[1], tag_bytes[2], tag_bytes[3]]);
        let args_at = start + TAG_LEN;

        let (command, args_len) = match tag {
            TAG_DIRK => {
                let arg = self.field(args_at, 1, "DIRK argument")?[0];
                let direction = Direction::from_arg(arg).ok_or_else(|| {
                    let reason = format!("unknown DIRK argument {:?}", char::from(arg));
                    malformed(start, reason)
                })?;
                (Some(Command::DirectionKey { direction }), 1)
            }
            TAG_MOUS => {
                let digits = self.field(args_at, 2 * COORDINATE_DIGITS, "MOUS coordinates")?;
                let (x_digits, y_digits) = digits.split_at(COORDINATE_DIGITS);
                let x = parse_hex(x_digits).ok_or_else(|| malformed(start, "MOUS x is not hex"))?;
                let y = parse_hex(y_digits).ok_or_else(|| malformed(start, "MOUS y is not hex"))?;
                let command = Command::MouseMove {
                    x: f64::from(x) / COORDINATE_MAX,
                    y: f64::from(y) / COORDINATE_MAX,
                };
                (Some(command), 2 * COORDINATE_DIGITS)
            }
            TAG_BUTT => {
                let digit = self.field(args_at, 1, "BUTT argument")?;
                let id = parse_hex(digit)
                    .ok_or_else(|| malformed(start, "BUTT id is not a hex digit"))?
                    as u8;
                let command = match MouseButton::from_id(id) {
                    Some(button) => Some(Command::MouseButton {
                        button,
                        pressed: true,
                    }),
                    None => {
                        debug!("ignoring BUTT with unassigned button id {id}");
                        None
                    }
                };
                (command, 1)
            }
            _ => return Err(CommandError::UnknownCommand { tag, offset: start }),
        };

        let terminator_at = args_at + args_len;
        match self.payload.get(terminator_at) {
            Some(&TERMINATOR) => {}
            Some(&other) => {
                return Err(malformed(
                    start,
                    format!("expected '\\n' terminator, found {:?}", char::from(other)),
                ));
            }
            None => return Err(malformed(start, "missing '\\n' terminator")),
        }
        self.offset = terminator_at + 1;

        if let Some(Command::MouseButton { button, .. }) = command {
            self.pending = Some(Command::MouseButton {
                button,
                pressed: false,
            });
        }
        Ok(command)
    }

    fn field(&self, at: usize, len: usize, what: &str) -> Result<&[u8], CommandError> {
        self.payload.get(at..at + len).ok_or_else(|| {
            malformed(
                self.offset,
                format!(
                    "{what}: need {len} bytes, got {}",
                    self.payload.len().saturating_sub(at)
                ),
            )
        })
    }
}

impl Iterator for Commands<'_> {
    type Item = Result<Command, CommandError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(command) = self.pending.take() {
            return Some(Ok(command));
        }
        loop {
            if self.failed || self.is_exhausted() {
                return None;
            }
            match self.decode_next() {
                Ok(Some(command)) => return Some(Ok(command)),
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn malformed(offset: usize, reason: impl Into<String>) -> CommandError {
    CommandError::Malformed {
        offset,
        reason: reason.into(),
    }
}

/// Parses up to four ASCII hex digits (either case).
fn parse_hex(digits: &[u8]) -> Option<u16> {
    digits.iter().try_fold(0u16, |acc, &b| {
        let nibble = char::from(b).to_digit(16)?;
        Some((acc << 4) | nibble as u16)
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
