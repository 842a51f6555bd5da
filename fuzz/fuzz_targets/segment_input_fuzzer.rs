//! Fuzz target for [`ControlBlock`] input handling
//!
//! Hostile or corrupt datagrams must be rejected cleanly, never crash the
//! engine or wedge its bookkeeping.
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary datagrams straight into `input`
//! - Crafted segments: valid headers with fuzzed fields (sn far outside the
//!   window, bogus una, oversized frg, lying len)
//! - Interleaving: sends, flushes, clock jumps and receives between inputs
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - Every `input` error is a malformed-input error
//! - `snd_una` never passes `snd_nxt`
//! - `recv` never reports more bytes than the buffer holds
//! - `cwnd` is at least one after any flush

#![no_main]

use arbitrary::Arbitrary;
use arqsim_core::{ControlBlock, Engine, NoDelayConfig};
use arqsim_proto::{Command, SegmentHeader};
use bytes::{Bytes, BytesMut};
use libfuzzer_sys::fuzz_target;

const CONV: u32 = 0x1122_3344;

#[derive(Debug, Clone, Arbitrary)]
enum EngineEvent {
    Send { len: u16 },
    Raw(Vec<u8>),
    Crafted(CraftedSegment),
    Update { advance_ms: u16 },
    Jump { to: u32 },
    Flush,
    Recv { buf_len: u16 },
}

#[derive(Debug, Clone, Arbitrary)]
struct CraftedSegment {
    cmd: u8,
    frg: u8,
    wnd: u16,
    ts: u32,
    sn: u32,
    una: u32,
    announced_len: Option<u32>,
    payload: Vec<u8>,
    foreign_conv: bool,
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    turbo: bool,
    events: Vec<EngineEvent>,
}

fuzz_target!(|input: FuzzInput| {
    let mut kcb = ControlBlock::new(CONV, Vec::<Bytes>::new());
    if input.turbo {
        kcb.set_nodelay(NoDelayConfig::turbo());
    }
    kcb.update(0);
    let mut now = 0u32;

    for event in input.events {
        match event {
            EngineEvent::Send { len } => {
                let payload = vec![0xA5; usize::from(len)];
                let _ = kcb.send(&payload);
            },
            EngineEvent::Raw(bytes) => {
                if let Err(err) = kcb.input(&bytes) {
                    assert!(err.is_malformed_input(), "unexpected input error {err:?}");
                }
            },
            EngineEvent::Crafted(seg) => {
                let datagram = craft(&seg);
                if let Err(err) = kcb.input(&datagram) {
                    assert!(err.is_malformed_input(), "unexpected input error {err:?}");
                }
            },
            EngineEvent::Update { advance_ms } => {
                now = now.wrapping_add(u32::from(advance_ms));
                kcb.update(now);
                assert!(kcb.congestion().cwnd >= 1);
            },
            EngineEvent::Jump { to } => {
                now = to;
                kcb.update(now);
            },
            EngineEvent::Flush => {
                kcb.flush();
                assert!(kcb.congestion().cwnd >= 1);
            },
            EngineEvent::Recv { buf_len } => {
                let mut buf = vec![0u8; usize::from(buf_len)];
                if let Ok(n) = kcb.recv(&mut buf) {
                    assert!(n <= buf.len());
                }
            },
        }

        let snapshot = kcb.congestion();
        let inflight = snapshot.snd_nxt.wrapping_sub(snapshot.snd_una);
        assert!((inflight as i32) >= 0, "snd_una passed snd_nxt");

        // drain so the sink cannot grow without bound
        kcb.sink_mut().clear();
    }
});

fn craft(seg: &CraftedSegment) -> BytesMut {
    let conv = if seg.foreign_conv { CONV ^ 1 } else { CONV };
    let cmd = match seg.cmd % 4 {
        0 => Command::Push,
        1 => Command::Ack,
        2 => Command::WindowAsk,
        _ => Command::WindowTell,
    };

    let mut header = SegmentHeader::new(conv, cmd);
    header.set_frg(seg.frg);
    header.set_wnd(seg.wnd);
    header.set_ts(seg.ts);
    header.set_sn(seg.sn);
    header.set_una(seg.una);
    header.set_len(seg.announced_len.unwrap_or(seg.payload.len() as u32));

    let mut out = BytesMut::new();
    header.encode(&mut out);
    out.extend_from_slice(&seg.payload);
    out
}
