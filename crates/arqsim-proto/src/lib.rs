//! Wire framing for the arqsim reliable-datagram protocol.
//!
//! Every datagram the engine emits is a concatenation of one or more
//! segments. Each segment starts with a fixed 24-byte little-endian header
//! followed by `len` payload bytes:
//!
//! ```text
//! 0       4    5    6       8       12      16      20      24
//! ┌───────┬────┬────┬───────┬───────┬───────┬───────┬───────┐
//! │ conv  │cmd │frg │  wnd  │  ts   │  sn   │  una  │  len  │ payload...
//! └───────┴────┴────┴───────┴───────┴───────┴───────┴───────┘
//! ```
//!
//! The simulation harness only ever looks at `sn` (bytes 12..16) of the
//! first segment in a datagram, see [`sequence_number`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod header;
pub mod segment;

pub use errors::ProtoError;
pub use header::{Command, HEADER_SIZE, SN_OFFSET, SegmentHeader};
pub use segment::{Segment, SequenceNumber, sequence_number};
