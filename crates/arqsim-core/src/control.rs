//! ARQ control block.
//!
//! One `ControlBlock` is one end of a conversation. It segments outgoing
//! messages, retransmits on timeout or duplicate acks, reassembles incoming
//! fragments in order and runs a slow-start / congestion-avoidance window.
//!
//! # Time
//!
//! All timestamps are `u32` milliseconds supplied by the caller and compared
//! with wrapping arithmetic ([`timediff`]), so the clock may wrap.

use std::{collections::VecDeque, fmt, mem};

use arqsim_proto::{Command, HEADER_SIZE, ProtoError, SegmentHeader};
use bitflags::bitflags;
use bytes::{Bytes, BytesMut};

use crate::{
    config::{
        CLOCK_JUMP, DEAD_LINK, FASTACK_LIMIT, INTERVAL, INTERVAL_MAX, INTERVAL_MIN, MTU_DEFAULT,
        MTU_MAX, MTU_MIN, NoDelayConfig, PROBE_INIT, PROBE_LIMIT, RTO_DEFAULT, RTO_MAX,
        RTO_MIN, RTO_NODELAY, THRESH_INIT, THRESH_MIN, WND_RCV, WND_SND,
    },
    engine::{CongestionSnapshot, Engine},
    error::{EngineError, RecvError},
    sink::{LogMask, PacketSink, Tracer},
};

bitflags! {
    /// Pending window-probe work.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Probe: u8 {
        /// We must ask the peer for its window.
        const ASK_SEND = 1;
        /// We must tell the peer our window.
        const ASK_TELL = 1 << 1;
    }
}

/// Signed distance from `earlier` to `later` on the wrapping clock.
#[inline]
fn timediff(later: u32, earlier: u32) -> i32 {
    later.wrapping_sub(earlier) as i32
}

/// In-memory segment (queued, in flight or awaiting reassembly).
#[derive(Debug, Clone, Default)]
struct Seg {
    frg: u8,
    wnd: u16,
    ts: u32,
    sn: u32,
    una: u32,
    resendts: u32,
    rto: u32,
    fastack: u32,
    xmit: u32,
    data: Bytes,
}

impl Seg {
    fn with_data(frg: u8, data: Bytes) -> Self {
        Self { frg, data, ..Self::default() }
    }

    fn header(&self, conv: u32, cmd: Command) -> SegmentHeader {
        let mut header = SegmentHeader::new(conv, cmd);
        header.set_frg(self.frg);
        header.set_wnd(self.wnd);
        header.set_ts(self.ts);
        header.set_sn(self.sn);
        header.set_una(self.una);
        header.set_len(self.data.len() as u32);
        header
    }
}

/// One endpoint of a reliable conversation.
///
/// # Type Parameters
///
/// - `S`: sink receiving outgoing datagrams
pub struct ControlBlock<S: PacketSink> {
    conv: u32,
    mtu: usize,
    mss: usize,
    dead: bool,

    snd_una: u32,
    snd_nxt: u32,
    rcv_nxt: u32,

    ssthresh: u32,
    rx_rttval: i64,
    rx_srtt: i64,
    rx_rto: u32,
    rx_minrto: u32,

    snd_wnd: u32,
    rcv_wnd: u32,
    rmt_wnd: u32,
    cwnd: u32,
    incr: u32,
    probe: Probe,

    current: u32,
    interval: u32,
    ts_flush: u32,
    xmit: u32,
    nodelay: u32,
    updated: bool,

    ts_probe: u32,
    probe_wait: u32,
    dead_link: u32,

    snd_queue: VecDeque<Seg>,
    snd_buf: VecDeque<Seg>,
    rcv_queue: VecDeque<Seg>,
    rcv_buf: VecDeque<Seg>,
    acklist: Vec<(u32, u32)>,

    fastresend: u32,
    fastlimit: u32,
    nocwnd: bool,

    buffer: BytesMut,
    sink: S,
    tracer: Option<Box<dyn Tracer>>,
    log_mask: LogMask,
}

impl<S: PacketSink> ControlBlock<S> {
    /// Create a control block for conversation `conv` writing to `sink`.
    ///
    /// Nothing is emitted until the first [`Engine::update`].
    pub fn new(conv: u32, sink: S) -> Self {
        Self {
            conv,
            mtu: MTU_DEFAULT,
            mss: MTU_DEFAULT - HEADER_SIZE,
            dead: false,
            snd_una: 0,
            snd_nxt: 0,
            rcv_nxt: 0,
            ssthresh: THRESH_INIT,
            rx_rttval: 0,
            rx_srtt: 0,
            rx_rto: RTO_DEFAULT,
            rx_minrto: RTO_MIN,
            snd_wnd: WND_SND,
            rcv_wnd: WND_RCV,
            rmt_wnd: WND_RCV,
            cwnd: 0,
            incr: 0,
            probe: Probe::empty(),
            current: 0,
            interval: INTERVAL,
            ts_flush: INTERVAL,
            xmit: 0,
            nodelay: 0,
            updated: false,
            ts_probe: 0,
            probe_wait: 0,
            dead_link: DEAD_LINK,
            snd_queue: VecDeque::new(),
            snd_buf: VecDeque::new(),
            rcv_queue: VecDeque::new(),
            rcv_buf: VecDeque::new(),
            acklist: Vec::new(),
            fastresend: 0,
            fastlimit: FASTACK_LIMIT,
            nocwnd: false,
            buffer: BytesMut::with_capacity(MTU_DEFAULT),
            sink,
            tracer: None,
            log_mask: LogMask::empty(),
        }
    }

    /// Apply retransmission and congestion tuning.
    pub fn set_nodelay(&mut self, config: NoDelayConfig) {
        self.nodelay = config.nodelay;
        self.rx_minrto = if config.nodelay > 0 { RTO_NODELAY } else { RTO_MIN };
        self.interval = config.interval.clamp(INTERVAL_MIN, INTERVAL_MAX);
        self.fastresend = config.resend;
        self.nocwnd = config.no_congestion_control;
    }

    /// Set window sizes in segments. Zero leaves a window unchanged; the
    /// receive window never goes below the protocol default.
    pub fn set_window(&mut self, snd_wnd: u32, rcv_wnd: u32) {
        if snd_wnd > 0 {
            self.snd_wnd = snd_wnd;
        }
        if rcv_wnd > 0 {
            self.rcv_wnd = rcv_wnd.max(WND_RCV);
        }
    }

    /// Change the MTU. MSS follows as `mtu - 24`.
    pub fn set_mtu(&mut self, mtu: usize) -> Result<(), EngineError> {
        if !(MTU_MIN..=MTU_MAX).contains(&mtu) {
            return Err(EngineError::InvalidMtu { mtu, min: MTU_MIN, max: MTU_MAX });
        }
        self.mtu = mtu;
        self.mss = mtu - HEADER_SIZE;
        self.buffer = BytesMut::with_capacity(mtu);
        Ok(())
    }

    /// Override the slow-start threshold.
    pub fn set_ssthresh(&mut self, ssthresh: u32) {
        self.ssthresh = ssthresh;
    }

    /// Attach a diagnostics tracer, enabled for `mask`.
    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>, mask: LogMask) {
        self.tracer = Some(tracer);
        self.log_mask = mask;
    }

    /// Maximum segment payload.
    pub fn mss(&self) -> usize {
        self.mss
    }

    /// True once a segment hit the dead-link transmission count.
    pub fn is_dead_link(&self) -> bool {
        self.dead
    }

    fn trace(&mut self, kind: LogMask, message: fmt::Arguments<'_>) {
        if !self.log_mask.contains(kind) {
            return;
        }
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.trace(kind, self.current, message);
        }
    }

    fn wnd_unused(&self) -> u16 {
        let queued = self.rcv_queue.len() as u32;
        if queued < self.rcv_wnd {
            (self.rcv_wnd - queued).min(u32::from(u16::MAX)) as u16
        } else {
            0
        }
    }

    fn effective_cwnd(&self) -> u32 {
        let cwnd = self.snd_wnd.min(self.rmt_wnd);
        if self.nocwnd { cwnd } else { cwnd.min(self.cwnd) }
    }

    fn update_ack(&mut self, rtt: i64) {
        if self.rx_srtt == 0 {
            self.rx_srtt = rtt;
            self.rx_rttval = rtt / 2;
        } else {
            let delta = (rtt - self.rx_srtt).abs();
            self.rx_rttval = (3 * self.rx_rttval + delta) / 4;
            self.rx_srtt = ((7 * self.rx_srtt + rtt) / 8).max(1);
        }
        let rto = self.rx_srtt + i64::from(self.interval).max(4 * self.rx_rttval);
        self.rx_rto = rto.clamp(i64::from(self.rx_minrto), i64::from(RTO_MAX)) as u32;
    }

    fn shrink_buf(&mut self) {
        self.snd_una = self.snd_buf.front().map_or(self.snd_nxt, |seg| seg.sn);
    }

    fn parse_ack(&mut self, sn: u32) {
        if timediff(sn, self.snd_una) < 0 || timediff(sn, self.snd_nxt) >= 0 {
            return;
        }
        let hit = self.snd_buf.iter().position(|seg| seg.sn == sn || timediff(sn, seg.sn) < 0);
        if let Some(pos) = hit {
            if self.snd_buf[pos].sn == sn {
                self.snd_buf.remove(pos);
            }
        }
    }

    fn parse_una(&mut self, una: u32) {
        while self.snd_buf.front().is_some_and(|seg| timediff(una, seg.sn) > 0) {
            self.snd_buf.pop_front();
        }
    }

    fn parse_fastack(&mut self, sn: u32) {
        if timediff(sn, self.snd_una) < 0 || timediff(sn, self.snd_nxt) >= 0 {
            return;
        }
        for seg in &mut self.snd_buf {
            if timediff(sn, seg.sn) < 0 {
                break;
            }
            if sn != seg.sn {
                seg.fastack += 1;
            }
        }
    }

    fn parse_data(&mut self, seg: Seg) {
        let sn = seg.sn;
        if timediff(sn, self.rcv_nxt.wrapping_add(self.rcv_wnd)) >= 0
            || timediff(sn, self.rcv_nxt) < 0
        {
            return;
        }

        let mut insert_at = 0;
        for (idx, existing) in self.rcv_buf.iter().enumerate().rev() {
            if existing.sn == sn {
                return;
            }
            if timediff(sn, existing.sn) > 0 {
                insert_at = idx + 1;
                break;
            }
        }
        self.rcv_buf.insert(insert_at, seg);
        self.move_ready();
    }

    /// Move in-order segments from `rcv_buf` to `rcv_queue`.
    fn move_ready(&mut self) {
        while let Some(front) = self.rcv_buf.front() {
            if front.sn != self.rcv_nxt || self.rcv_queue.len() >= self.rcv_wnd as usize {
                break;
            }
            if let Some(seg) = self.rcv_buf.pop_front() {
                self.rcv_queue.push_back(seg);
                self.rcv_nxt = self.rcv_nxt.wrapping_add(1);
            }
        }
    }

    fn grow_window(&mut self) {
        if self.cwnd >= self.rmt_wnd {
            return;
        }
        let mss = self.mss as u32;
        if self.cwnd < self.ssthresh {
            self.cwnd += 1;
            self.incr = self.incr.saturating_add(mss);
        } else {
            if self.incr < mss {
                self.incr = mss;
            }
            // mss * mss exceeds u32 near the top of the MTU range
            let step = u64::from(mss) * u64::from(mss) / u64::from(self.incr) + u64::from(mss / 16);
            self.incr = self.incr.saturating_add(u32::try_from(step).unwrap_or(u32::MAX));
            if (self.cwnd + 1).saturating_mul(mss) <= self.incr {
                self.cwnd = self.incr.div_ceil(mss.max(1));
            }
        }
        if self.cwnd > self.rmt_wnd {
            self.cwnd = self.rmt_wnd;
            self.incr = self.rmt_wnd.saturating_mul(mss);
        }
    }

    /// Hand the staging buffer to the sink if it holds anything.
    fn emit(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let len = self.buffer.len();
        self.sink.output(&self.buffer);
        self.buffer.clear();
        self.trace(LogMask::OUTPUT, format_args!("output {len} bytes"));
    }

    /// Emit first if `need` more bytes would overflow the MTU.
    fn reserve(&mut self, need: usize) {
        if self.buffer.len() + need > self.mtu {
            self.emit();
        }
    }

    fn flush_probes(&mut self, mut header: SegmentHeader) {
        let current = self.current;
        if self.rmt_wnd == 0 {
            if self.probe_wait == 0 {
                self.probe_wait = PROBE_INIT;
                self.ts_probe = current.wrapping_add(self.probe_wait);
            } else if timediff(current, self.ts_probe) >= 0 {
                self.probe_wait = self.probe_wait.max(PROBE_INIT);
                self.probe_wait += self.probe_wait / 2;
                self.probe_wait = self.probe_wait.min(PROBE_LIMIT);
                self.ts_probe = current.wrapping_add(self.probe_wait);
                self.probe |= Probe::ASK_SEND;
            }
        } else {
            self.ts_probe = 0;
            self.probe_wait = 0;
        }

        header.set_sn(0);
        header.set_ts(0);
        if self.probe.contains(Probe::ASK_SEND) {
            header.set_command(Command::WindowAsk);
            self.reserve(HEADER_SIZE);
            header.encode(&mut self.buffer);
            self.trace(LogMask::OUT_PROBE, format_args!("probe window"));
        }
        if self.probe.contains(Probe::ASK_TELL) {
            header.set_command(Command::WindowTell);
            self.reserve(HEADER_SIZE);
            header.encode(&mut self.buffer);
            self.trace(LogMask::OUT_WINS, format_args!("tell window {}", header.wnd()));
        }
        self.probe = Probe::empty();
    }

    fn flush_data(&mut self, wnd: u16) {
        let current = self.current;
        let cwnd = self.effective_cwnd();

        while timediff(self.snd_nxt, self.snd_una.wrapping_add(cwnd)) < 0 {
            let Some(mut seg) = self.snd_queue.pop_front() else {
                break;
            };
            seg.wnd = wnd;
            seg.ts = current;
            seg.sn = self.snd_nxt;
            seg.una = self.rcv_nxt;
            seg.resendts = current;
            seg.rto = self.rx_rto;
            seg.fastack = 0;
            seg.xmit = 0;
            self.snd_nxt = self.snd_nxt.wrapping_add(1);
            self.snd_buf.push_back(seg);
        }

        let resent = if self.fastresend > 0 { self.fastresend } else { u32::MAX };
        let rtomin = if self.nodelay == 0 { self.rx_rto >> 3 } else { 0 };
        let mut change = false;
        let mut lost = false;

        for idx in 0..self.snd_buf.len() {
            let rx_rto = self.rx_rto;
            let seg = &mut self.snd_buf[idx];
            let mut needsend = false;

            if seg.xmit == 0 {
                needsend = true;
                seg.xmit += 1;
                seg.rto = rx_rto;
                seg.resendts = current.wrapping_add(seg.rto).wrapping_add(rtomin);
            } else if timediff(current, seg.resendts) >= 0 {
                needsend = true;
                seg.xmit += 1;
                self.xmit += 1;
                if self.nodelay == 0 {
                    seg.rto = seg.rto.saturating_add(seg.rto.max(rx_rto));
                } else {
                    let step = if self.nodelay < 2 { seg.rto } else { rx_rto };
                    seg.rto = seg.rto.saturating_add(step / 2);
                }
                seg.resendts = current.wrapping_add(seg.rto);
                lost = true;
            } else if seg.fastack >= resent
                && (seg.xmit <= self.fastlimit || self.fastlimit == 0)
            {
                needsend = true;
                seg.xmit += 1;
                seg.fastack = 0;
                seg.resendts = current.wrapping_add(seg.rto);
                change = true;
            }

            if !needsend {
                continue;
            }

            seg.ts = current;
            seg.wnd = wnd;
            seg.una = self.rcv_nxt;
            let header = seg.header(self.conv, Command::Push);
            let data = seg.data.clone();
            let xmit = seg.xmit;

            self.reserve(HEADER_SIZE + data.len());
            header.encode(&mut self.buffer);
            self.buffer.extend_from_slice(&data);
            self.trace(
                LogMask::OUT_DATA,
                format_args!("send sn={} xmit={xmit} len={}", header.sn(), data.len()),
            );

            if xmit >= self.dead_link && !self.dead {
                tracing::warn!(conv = self.conv, sn = header.sn(), xmit, "link declared dead");
                self.dead = true;
            }
        }

        self.emit();

        let mss = self.mss as u32;
        if change {
            let inflight = self.snd_nxt.wrapping_sub(self.snd_una);
            self.ssthresh = (inflight / 2).max(THRESH_MIN);
            self.cwnd = self.ssthresh.saturating_add(resent);
            self.incr = self.cwnd.saturating_mul(mss);
        }
        if lost {
            self.ssthresh = (cwnd / 2).max(THRESH_MIN);
            self.cwnd = 1;
            self.incr = mss;
        }
        if self.cwnd < 1 {
            self.cwnd = 1;
            self.incr = mss;
        }
    }
}

impl<S: PacketSink> Engine for ControlBlock<S> {
    type Sink = S;

    fn conv(&self) -> u32 {
        self.conv
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), EngineError> {
        if payload.is_empty() {
            return Err(EngineError::EmptyPayload);
        }

        let fragments = payload.len().div_ceil(self.mss);
        let limit = (self.rcv_wnd as usize).min(usize::from(u8::MAX) + 1);
        if fragments >= limit {
            return Err(EngineError::TooManyFragments { fragments, limit });
        }

        for (idx, chunk) in payload.chunks(self.mss).enumerate() {
            let frg = (fragments - idx - 1) as u8;
            self.snd_queue.push_back(Seg::with_data(frg, Bytes::copy_from_slice(chunk)));
        }
        self.trace(LogMask::SEND, format_args!("queued {} bytes in {fragments}", payload.len()));
        Ok(())
    }

    fn flush(&mut self) {
        if !self.updated {
            return;
        }

        let wnd = self.wnd_unused();
        let mut header = SegmentHeader::new(self.conv, Command::Ack);
        header.set_wnd(wnd);
        header.set_una(self.rcv_nxt);

        for (sn, ts) in mem::take(&mut self.acklist) {
            self.reserve(HEADER_SIZE);
            header.set_sn(sn);
            header.set_ts(ts);
            header.encode(&mut self.buffer);
            self.trace(LogMask::OUT_ACK, format_args!("ack sn={sn}"));
        }

        self.flush_probes(header);
        self.flush_data(wnd);
    }

    fn update(&mut self, current: u32) {
        self.current = current;
        if !self.updated {
            self.updated = true;
            self.ts_flush = current;
        }

        let mut slap = timediff(current, self.ts_flush);
        if !(-CLOCK_JUMP..CLOCK_JUMP).contains(&slap) {
            tracing::debug!(
                conv = self.conv,
                current,
                slap,
                "clock jump, resyncing flush schedule"
            );
            self.ts_flush = current;
            slap = 0;
        }

        if slap >= 0 {
            self.ts_flush = self.ts_flush.wrapping_add(self.interval);
            if timediff(current, self.ts_flush) >= 0 {
                self.ts_flush = current.wrapping_add(self.interval);
            }
            self.flush();
        }
    }

    fn input(&mut self, datagram: &[u8]) -> Result<(), EngineError> {
        let prev_una = self.snd_una;
        let mut maxack: Option<u32> = None;

        if datagram.len() < HEADER_SIZE {
            return Err(EngineError::Proto(ProtoError::Truncated {
                needed: HEADER_SIZE,
                available: datagram.len(),
            }));
        }
        self.trace(LogMask::INPUT, format_args!("input {} bytes", datagram.len()));

        let mut rest = datagram;
        while rest.len() >= HEADER_SIZE {
            let (header, payload) = SegmentHeader::decode(rest)?;
            if header.conv() != self.conv {
                return Err(EngineError::ConversationMismatch {
                    expected: self.conv,
                    actual: header.conv(),
                });
            }
            let len = header.len() as usize;
            if payload.len() < len {
                return Err(EngineError::LengthMismatch {
                    announced: len,
                    available: payload.len(),
                });
            }
            let cmd = header.command()?;

            self.rmt_wnd = u32::from(header.wnd());
            self.parse_una(header.una());
            self.shrink_buf();

            let (sn, ts) = (header.sn(), header.ts());
            match cmd {
                Command::Ack => {
                    let rtt = timediff(self.current, ts);
                    if rtt >= 0 {
                        self.update_ack(i64::from(rtt));
                    }
                    self.parse_ack(sn);
                    self.shrink_buf();
                    maxack = match maxack {
                        Some(max) if timediff(sn, max) <= 0 => Some(max),
                        _ => Some(sn),
                    };
                    let rto = self.rx_rto;
                    self.trace(LogMask::IN_ACK, format_args!("ack sn={sn} rto={rto}"));
                },
                Command::Push => {
                    self.trace(LogMask::IN_DATA, format_args!("data sn={sn} ts={ts}"));
                    if timediff(sn, self.rcv_nxt.wrapping_add(self.rcv_wnd)) < 0 {
                        self.acklist.push((sn, ts));
                        if timediff(sn, self.rcv_nxt) >= 0 {
                            let seg = Seg {
                                frg: header.frg(),
                                wnd: header.wnd(),
                                ts,
                                sn,
                                una: header.una(),
                                data: Bytes::copy_from_slice(&payload[..len]),
                                ..Seg::default()
                            };
                            self.parse_data(seg);
                        }
                    }
                },
                Command::WindowAsk => {
                    self.probe |= Probe::ASK_TELL;
                    self.trace(LogMask::IN_PROBE, format_args!("window probe"));
                },
                Command::WindowTell => {
                    self.trace(LogMask::IN_WINS, format_args!("window tell {}", header.wnd()));
                },
            }

            rest = &payload[len..];
        }

        if let Some(sn) = maxack {
            self.parse_fastack(sn);
        }

        if timediff(self.snd_una, prev_una) > 0 {
            self.grow_window();
        }

        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, RecvError> {
        let size = self.peek_size()?;
        if size > buf.len() {
            return Err(RecvError::BufferTooSmall { needed: size });
        }

        let recover = self.rcv_queue.len() >= self.rcv_wnd as usize;

        let mut len = 0;
        while let Some(seg) = self.rcv_queue.pop_front() {
            let end = len + seg.data.len();
            buf[len..end].copy_from_slice(&seg.data);
            len = end;
            self.trace(LogMask::RECV, format_args!("recv sn={}", seg.sn));
            if seg.frg == 0 {
                break;
            }
        }

        self.move_ready();

        if recover && self.rcv_queue.len() < self.rcv_wnd as usize {
            self.probe |= Probe::ASK_TELL;
        }

        Ok(len)
    }

    fn peek_size(&self) -> Result<usize, RecvError> {
        let first = self.rcv_queue.front().ok_or(RecvError::Empty)?;
        if first.frg == 0 {
            return Ok(first.data.len());
        }
        if self.rcv_queue.len() < usize::from(first.frg) + 1 {
            return Err(RecvError::Incomplete);
        }

        let mut len = 0;
        for seg in &self.rcv_queue {
            len += seg.data.len();
            if seg.frg == 0 {
                break;
            }
        }
        Ok(len)
    }

    fn pending_acks(&self) -> usize {
        self.acklist.len()
    }

    fn wait_snd(&self) -> usize {
        self.snd_buf.len() + self.snd_queue.len()
    }

    fn congestion(&self) -> CongestionSnapshot {
        CongestionSnapshot {
            current: self.current,
            snd_una: self.snd_una,
            snd_nxt: self.snd_nxt,
            cwnd: self.cwnd,
            effective_cwnd: self.effective_cwnd(),
            ssthresh: self.ssthresh,
            incr: self.incr,
            rx_rto: self.rx_rto,
            xmit_total: self.xmit,
        }
    }

    fn sink(&self) -> &S {
        &self.sink
    }

    fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: PacketSink> fmt::Debug for ControlBlock<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlBlock")
            .field("conv", &self.conv)
            .field("snd_una", &self.snd_una)
            .field("snd_nxt", &self.snd_nxt)
            .field("rcv_nxt", &self.rcv_nxt)
            .field("cwnd", &self.cwnd)
            .field("ssthresh", &self.ssthresh)
            .field("snd_queue", &self.snd_queue.len())
            .field("snd_buf", &self.snd_buf.len())
            .field("rcv_queue", &self.rcv_queue.len())
            .field("rcv_buf", &self.rcv_buf.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> ControlBlock<Vec<Bytes>> {
        let mut kcb = ControlBlock::new(1, Vec::new());
        kcb.update(0);
        kcb
    }

    #[test]
    fn timediff_wraps() {
        assert_eq!(timediff(5, u32::MAX), 6);
        assert_eq!(timediff(u32::MAX, 5), -6);
    }

    #[test]
    fn flush_before_first_update_emits_nothing() {
        let mut kcb = ControlBlock::new(1, Vec::new());
        kcb.send(b"hello").unwrap();
        kcb.flush();
        assert!(kcb.sink().is_empty());
    }

    #[test]
    fn send_fragments_count_down() {
        let mut kcb = block();
        let payload = vec![7u8; kcb.mss() * 2 + 1];
        kcb.send(&payload).unwrap();

        let frgs: Vec<u8> = kcb.snd_queue.iter().map(|seg| seg.frg).collect();
        assert_eq!(frgs, vec![2, 1, 0]);
    }

    #[test]
    fn send_rejects_oversized_message() {
        let mut kcb = block();
        let payload = vec![0u8; kcb.mss() * WND_RCV as usize];
        let err = kcb.send(&payload).unwrap_err();
        assert!(matches!(err, EngineError::TooManyFragments { fragments: 128, limit: 128 }));
    }

    #[test]
    fn first_flush_opens_window_to_one() {
        let kcb = block();
        assert_eq!(kcb.congestion().cwnd, 1);
        assert_eq!(kcb.congestion().incr, kcb.mss() as u32);
    }

    #[test]
    fn rto_follows_first_sample() {
        let mut kcb = block();
        kcb.update_ack(40);
        // srtt=40, rttval=20, rto = 40 + max(100, 80)
        assert_eq!(kcb.rx_rto, 140);
    }

    #[test]
    fn rto_clamped_to_minimum() {
        let mut kcb = block();
        kcb.set_nodelay(NoDelayConfig {
            nodelay: 0,
            interval: 10,
            resend: 0,
            no_congestion_control: false,
        });
        kcb.update_ack(0);
        assert_eq!(kcb.rx_rto, RTO_MIN);
    }

    #[test]
    fn interval_is_clamped() {
        let mut kcb = block();
        kcb.set_nodelay(NoDelayConfig { interval: 1, ..NoDelayConfig::default() });
        assert_eq!(kcb.interval, INTERVAL_MIN);
        kcb.set_nodelay(NoDelayConfig { interval: 60_000, ..NoDelayConfig::default() });
        assert_eq!(kcb.interval, INTERVAL_MAX);
    }

    #[test]
    fn receive_window_has_a_floor() {
        let mut kcb = block();
        kcb.set_window(8, 16);
        assert_eq!(kcb.snd_wnd, 8);
        assert_eq!(kcb.rcv_wnd, WND_RCV);
    }

    #[test]
    fn mtu_outside_range_rejected() {
        let mut kcb = block();
        let invalid = |mtu| EngineError::InvalidMtu { mtu, min: MTU_MIN, max: MTU_MAX };
        assert_eq!(kcb.set_mtu(20), Err(invalid(20)));
        assert_eq!(kcb.set_mtu(MTU_MAX + 1), Err(invalid(MTU_MAX + 1)));
        kcb.set_mtu(512).unwrap();
        assert_eq!(kcb.mss(), 512 - HEADER_SIZE);
        kcb.set_mtu(MTU_MAX).unwrap();
        assert_eq!(kcb.mss(), MTU_MAX - HEADER_SIZE);
    }

    #[test]
    fn congestion_avoidance_at_largest_mss() {
        let mut kcb = block();
        kcb.set_mtu(MTU_MAX).unwrap();
        kcb.rmt_wnd = WND_RCV;
        kcb.cwnd = 4;
        kcb.ssthresh = 2;
        kcb.incr = 0;

        for _ in 0..64 {
            kcb.grow_window();
        }
        assert!(kcb.cwnd > 4);
        assert!(kcb.cwnd <= kcb.rmt_wnd);
        assert!(kcb.incr >= kcb.mss as u32);
    }

    #[test]
    fn out_of_order_data_waits_for_gap() {
        let mut kcb = block();
        for sn in [2u32, 0] {
            let seg = Seg { sn, data: Bytes::from_static(b"x"), ..Seg::default() };
            kcb.parse_data(seg);
        }
        assert_eq!(kcb.rcv_nxt, 1);
        assert_eq!(kcb.rcv_buf.len(), 1);

        kcb.parse_data(Seg { sn: 1, data: Bytes::from_static(b"y"), ..Seg::default() });
        assert_eq!(kcb.rcv_nxt, 3);
        assert!(kcb.rcv_buf.is_empty());
        assert_eq!(kcb.rcv_queue.len(), 3);
    }

    #[test]
    fn duplicate_data_is_ignored() {
        let mut kcb = block();
        kcb.parse_data(Seg { sn: 3, data: Bytes::from_static(b"a"), ..Seg::default() });
        kcb.parse_data(Seg { sn: 3, data: Bytes::from_static(b"b"), ..Seg::default() });
        assert_eq!(kcb.rcv_buf.len(), 1);
        assert_eq!(kcb.rcv_buf[0].data, Bytes::from_static(b"a"));
    }
}
