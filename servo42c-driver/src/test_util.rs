//! Host-side link and clock doubles

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use servo42c_hal::clock::DelayNs;
use servo42c_hal::{Clock, UartRx, UartTx};
use servo42c_protocol::checksum;

/// Error injected into a scripted write or read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFault;

/// Build a reply frame from its body, appending the checksum
pub fn reply(body: &[u8]) -> Vec<u8> {
    let mut bytes = body.to_vec();
    bytes.push(checksum(body));
    bytes
}

/// Link that answers each successful write with the next scripted reply
///
/// Bytes queued with [`trickle`](Self::trickle) arrive at fixed simulated
/// times instead, read from the clock passed to
/// [`with_clock`](Self::with_clock).
#[derive(Debug, Default)]
pub struct ScriptedUart {
    rx: VecDeque<u8>,
    replies: VecDeque<Option<Vec<u8>>>,
    timed: VecDeque<(u64, u8)>,
    clock: Option<SimClock>,
    write_faults: VecDeque<LinkFault>,
    read_faults: VecDeque<LinkFault>,
    writes: Vec<Vec<u8>>,
    discards: usize,
}

impl ScriptedUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link that sees the same simulated time as `clock`
    pub fn with_clock(clock: &SimClock) -> Self {
        Self {
            clock: Some(clock.clone()),
            ..Self::default()
        }
    }

    /// Bytes that become readable after the next successful write
    pub fn queue_reply(&mut self, bytes: &[u8]) {
        self.replies.push_back(Some(bytes.to_vec()));
    }

    /// The next successful write gets no answer
    pub fn queue_silence(&mut self) {
        self.replies.push_back(None);
    }

    /// Bytes readable right now, before any write
    pub fn preload(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Bytes that arrive at the given simulated times in ms
    pub fn trickle(&mut self, bytes: &[(u64, u8)]) {
        self.timed.extend(bytes.iter().copied());
    }

    /// Fail the next write with `fault`; the pending reply stays queued
    pub fn fail_next_write(&mut self, fault: LinkFault) {
        self.write_faults.push_back(fault);
    }

    /// Fail the next read with `fault`; buffered bytes stay buffered
    pub fn fail_next_read(&mut self, fault: LinkFault) {
        self.read_faults.push_back(fault);
    }

    /// Every successful write, in order
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    pub fn discards(&self) -> usize {
        self.discards
    }

    fn receive_due(&mut self) {
        let Some(now) = self.clock.as_ref().map(|clock| clock.now_ms()) else {
            return;
        };
        while let Some(&(at, byte)) = self.timed.front() {
            if at > now {
                break;
            }
            self.rx.push_back(byte);
            self.timed.pop_front();
        }
    }
}

impl UartTx for ScriptedUart {
    type Error = LinkFault;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if let Some(fault) = self.write_faults.pop_front() {
            return Err(fault);
        }
        self.writes.push(data.to_vec());
        if let Some(Some(bytes)) = self.replies.pop_front() {
            self.rx.extend(bytes);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl UartRx for ScriptedUart {
    type Error = LinkFault;

    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        if let Some(fault) = self.read_faults.pop_front() {
            return Err(fault);
        }
        self.receive_due();
        Ok(self.rx.pop_front())
    }

    fn discard_input(&mut self) -> Result<(), Self::Error> {
        self.receive_due();
        self.discards += 1;
        self.rx.clear();
        Ok(())
    }
}

/// Simulated time advanced only by delays
///
/// Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct SimClock {
    now_ns: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns.set(self.now_ns.get() + ns as u64);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }
}
