//! WallProto - the framed message transport for the greenwall kiosk link
//!
//! One frame on the wire is a 4-byte big-endian header length, a JSON header,
//! and an optional binary blob whose exact length the header declares:
//!
//! ```text
//! [u32 header length][header bytes][blob bytes if blob_size > 0]
//! ```
//!
//! The header carries the message kind (a closed vocabulary), a string-keyed
//! payload map, and the blob length. Audio travels as blobs; everything else
//! rides in the payload.
//!
//! # Modules
//!
//! - [`message`] - message vocabulary and envelope header
//! - [`frame`] - codec over a byte stream, with bounded receive waits

pub mod frame;
pub mod message;

pub use frame::{Frames, RecvError, MAX_BLOB_BYTES, MAX_HEADER_BYTES};
pub use message::{Envelope, MessageKind};
