//! Fixed-size segment header.

use bytes::BufMut;
use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
    byteorder::little_endian::{U16, U32},
};

use crate::errors::ProtoError;

/// Size of the segment header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Byte offset of the sequence number inside the header.
pub const SN_OFFSET: usize = 12;

/// Segment command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Application data.
    Push = 81,
    /// Acknowledgement of one pushed segment.
    Ack = 82,
    /// Ask the peer for its receive window.
    WindowAsk = 83,
    /// Tell the peer our receive window.
    WindowTell = 84,
}

impl TryFrom<u8> for Command {
    type Error = ProtoError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            81 => Ok(Self::Push),
            82 => Ok(Self::Ack),
            83 => Ok(Self::WindowAsk),
            84 => Ok(Self::WindowTell),
            other => Err(ProtoError::UnknownCommand(other)),
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        cmd as Self
    }
}

/// Segment header (24 bytes, little-endian).
///
/// Field layout is fixed by the wire format; `sn` must stay at
/// [`SN_OFFSET`] because the simulation harness reads it blindly.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct SegmentHeader {
    conv: U32,
    cmd: u8,
    frg: u8,
    wnd: U16,
    ts: U32,
    sn: U32,
    una: U32,
    len: U32,
}

const _: () = assert!(size_of::<SegmentHeader>() == HEADER_SIZE);

impl SegmentHeader {
    /// Create a header with zeroed ordering fields.
    pub fn new(conv: u32, cmd: Command) -> Self {
        Self {
            conv: U32::new(conv),
            cmd: cmd.into(),
            frg: 0,
            wnd: U16::new(0),
            ts: U32::new(0),
            sn: U32::new(0),
            una: U32::new(0),
            len: U32::new(0),
        }
    }

    /// Decode a header from the front of `bytes`, returning the remainder.
    ///
    /// The command byte is not validated here; use [`Self::command`].
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), ProtoError> {
        Self::read_from_prefix(bytes)
            .map_err(|_| ProtoError::Truncated { needed: HEADER_SIZE, available: bytes.len() })
    }

    /// Append the header to `buf`.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_slice(self.as_bytes());
    }

    /// Conversation id.
    pub fn conv(&self) -> u32 {
        self.conv.get()
    }

    /// Raw command byte.
    pub fn raw_command(&self) -> u8 {
        self.cmd
    }

    /// Decoded command.
    pub fn command(&self) -> Result<Command, ProtoError> {
        Command::try_from(self.cmd)
    }

    /// Fragment countdown (0 marks the last fragment of a message).
    pub fn frg(&self) -> u8 {
        self.frg
    }

    /// Advertised free receive window.
    pub fn wnd(&self) -> u16 {
        self.wnd.get()
    }

    /// Sender timestamp.
    pub fn ts(&self) -> u32 {
        self.ts.get()
    }

    /// Sequence number.
    pub fn sn(&self) -> u32 {
        self.sn.get()
    }

    /// Sender's next expected sequence number.
    pub fn una(&self) -> u32 {
        self.una.get()
    }

    /// Payload length following the header.
    pub fn len(&self) -> u32 {
        self.len.get()
    }

    /// True if the header announces no payload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set the command.
    pub fn set_command(&mut self, cmd: Command) {
        self.cmd = cmd.into();
    }

    /// Set the fragment countdown.
    pub fn set_frg(&mut self, frg: u8) {
        self.frg = frg;
    }

    /// Set the advertised window.
    pub fn set_wnd(&mut self, wnd: u16) {
        self.wnd.set(wnd);
    }

    /// Set the timestamp.
    pub fn set_ts(&mut self, ts: u32) {
        self.ts.set(ts);
    }

    /// Set the sequence number.
    pub fn set_sn(&mut self, sn: u32) {
        self.sn.set(sn);
    }

    /// Set the una field.
    pub fn set_una(&mut self, una: u32) {
        self.una.set(una);
    }

    /// Set the payload length.
    pub fn set_len(&mut self, len: u32) {
        self.len.set(len);
    }
}

impl std::fmt::Debug for SegmentHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentHeader")
            .field("conv", &self.conv())
            .field("cmd", &self.cmd)
            .field("frg", &self.frg)
            .field("wnd", &self.wnd())
            .field("ts", &self.ts())
            .field("sn", &self.sn())
            .field("una", &self.una())
            .field("len", &self.len())
            .finish()
    }
}
