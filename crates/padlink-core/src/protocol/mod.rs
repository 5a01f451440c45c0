//! Protocol module containing the WebSocket frame codec and the command decoder.

pub mod command;
pub mod frame;

pub use command::{decode_commands, Command, CommandError, Commands, Direction, MouseButton};
pub use frame::{decode_frame, encode_frame, Frame, FrameError, OpCode, DEFAULT_PAYLOAD_CAPACITY};
