//! Byte-at-a-time response framer.
//!
//! The modem talks in free-form text lines with one binary frame mixed in:
//! `+IPD,1,<len>:<payload>`. The framer recognizes a fixed set of sentinels
//! and the `+IPD` payload, one received byte per call.
//!
//! Matching is deliberately simple. In `Idle` the first byte picks exactly
//! one sentinel. Any later mismatch drops back to `Idle` and the offending
//! byte is not looked at again, so a sentinel starting on that byte is
//! missed. This is only sound because no two sentinels share a first byte;
//! the table below must keep that property.

use heapless::Vec;

use crate::packet::PacketBuffer;
use crate::status::Event;

/// Longest accepted `+IPD` length field, in characters.
pub const MAX_LENGTH_DIGITS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Flag(Event),
    PacketHeader,
}

struct Sentinel {
    bytes: &'static [u8],
    state: State,
    completion: Completion,
}

static SENTINELS: [Sentinel; 4] = [
    Sentinel {
        bytes: b"OK\r\n",
        state: State::MatchOk,
        completion: Completion::Flag(Event::Ok),
    },
    Sentinel {
        bytes: b"ready\r\n",
        state: State::MatchReady,
        completion: Completion::Flag(Event::Ready),
    },
    Sentinel {
        bytes: b"+IPD,1,",
        state: State::MatchRxHeader,
        completion: Completion::PacketHeader,
    },
    Sentinel {
        bytes: b"> ",
        state: State::MatchTxReady,
        completion: Completion::Flag(Event::TxReady),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    MatchReady,
    MatchOk,
    MatchRxHeader,
    ReadLength,
    ReadPayload,
    MatchTxReady,
}

impl State {
    fn sentinel(self) -> Option<&'static Sentinel> {
        SENTINELS.iter().find(|s| s.state == self)
    }
}

/// Why a partially received response was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    /// byte did not continue the sentinel being matched
    Mismatch,
    /// length field was empty, non-numeric or too long
    MalformedLength,
    /// declared payload does not fit the packet buffer
    Oversize { declared: usize },
    /// declared payload length of zero; nothing to deliver
    EmptyPayload,
}

/// Outcome of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// byte matched nothing while idle
    Discarded,
    /// byte advanced a match or payload in progress
    Progress,
    /// a flag sentinel fully matched
    Completed(Event),
    /// a payload is complete; read it with [`Framer::payload`]
    Packet,
    Aborted(Abort),
}

#[derive(Debug, Clone)]
pub struct Framer<const N: usize> {
    state: State,
    pos: usize,
    digits: Vec<u8, MAX_LENGTH_DIGITS>,
    declared: usize,
    payload: PacketBuffer<N>,
}

impl<const N: usize> Framer<N> {
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            pos: 0,
            digits: Vec::new(),
            declared: 0,
            payload: PacketBuffer::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The last completed (or in-progress) payload.
    pub fn payload(&self) -> &PacketBuffer<N> {
        &self.payload
    }

    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.pos = 0;
        self.digits.clear();
        self.declared = 0;
    }

    pub fn feed(&mut self, byte: u8) -> Step {
        match self.state {
            State::Idle => self.start(byte),
            State::ReadLength => self.read_length(byte),
            State::ReadPayload => self.read_payload(byte),
            matching => match matching.sentinel() {
                Some(sentinel) => self.advance(sentinel, byte),
                None => self.abort(Abort::Mismatch),
            },
        }
    }

    fn start(&mut self, byte: u8) -> Step {
        match SENTINELS.iter().find(|s| s.bytes[0] == byte) {
            Some(sentinel) => {
                self.state = sentinel.state;
                self.pos = 1;
                Step::Progress
            }
            None => Step::Discarded,
        }
    }

    fn advance(&mut self, sentinel: &Sentinel, byte: u8) -> Step {
        if sentinel.bytes[self.pos] != byte {
            return self.abort(Abort::Mismatch);
        }
        self.pos += 1;
        if self.pos < sentinel.bytes.len() {
            return Step::Progress;
        }
        self.pos = 0;
        match sentinel.completion {
            Completion::Flag(event) => {
                self.state = State::Idle;
                Step::Completed(event)
            }
            Completion::PacketHeader => {
                self.state = State::ReadLength;
                self.digits.clear();
                Step::Progress
            }
        }
    }

    fn read_length(&mut self, byte: u8) -> Step {
        if byte != b':' {
            if self.digits.push(byte).is_err() {
                return self.abort(Abort::MalformedLength);
            }
            return Step::Progress;
        }

        let Some(declared) = parse_length(&self.digits) else {
            return self.abort(Abort::MalformedLength);
        };
        if declared > N {
            return self.abort(Abort::Oversize { declared });
        }
        if declared == 0 {
            return self.abort(Abort::EmptyPayload);
        }
        self.declared = declared;
        self.payload.clear();
        self.state = State::ReadPayload;
        Step::Progress
    }

    fn read_payload(&mut self, byte: u8) -> Step {
        // declared <= N, so the push cannot fail before the length is reached
        self.payload.push(byte);
        if self.payload.len() < self.declared {
            return Step::Progress;
        }
        self.state = State::Idle;
        Step::Packet
    }

    fn abort(&mut self, reason: Abort) -> Step {
        self.reset();
        Step::Aborted(reason)
    }
}

impl<const N: usize> Default for Framer<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_length(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    core::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CAP: usize = 64;

    fn feed_all<const N: usize>(framer: &mut Framer<N>, bytes: &[u8]) -> std::vec::Vec<Step> {
        bytes.iter().map(|&b| framer.feed(b)).collect()
    }

    fn ipd(len: usize, payload: &[u8]) -> std::vec::Vec<u8> {
        let mut v = format!("+IPD,1,{len}:").into_bytes();
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn no_two_sentinels_share_a_first_byte() {
        for (i, a) in SENTINELS.iter().enumerate() {
            for b in &SENTINELS[i + 1..] {
                assert_ne!(a.bytes[0], b.bytes[0]);
            }
        }
    }

    #[test]
    fn each_flag_sentinel_completes_with_its_event_only_on_last_byte() {
        let cases: [(&[u8], Event); 3] = [
            (b"OK\r\n", Event::Ok),
            (b"ready\r\n", Event::Ready),
            (b"> ", Event::TxReady),
        ];
        for (bytes, event) in cases {
            let mut framer = Framer::<CAP>::new();
            let steps = feed_all(&mut framer, bytes);
            let (last, head) = steps.split_last().unwrap();
            assert!(head.iter().all(|s| *s == Step::Progress), "{head:?}");
            assert_eq!(*last, Step::Completed(event));
            assert_eq!(framer.state(), State::Idle);
        }
    }

    #[test]
    fn deviation_at_position_k_returns_to_idle_after_k_plus_one_bytes() {
        for sentinel in &SENTINELS {
            for k in 1..sentinel.bytes.len() {
                let wrong = sentinel.bytes[k].wrapping_add(1);
                let mut framer = Framer::<CAP>::new();
                for &b in &sentinel.bytes[..k] {
                    assert_eq!(framer.feed(b), Step::Progress);
                    assert_ne!(framer.state(), State::Idle);
                }
                assert_eq!(framer.feed(wrong), Step::Aborted(Abort::Mismatch));
                assert_eq!(framer.state(), State::Idle);
            }
        }
    }

    #[test]
    fn mismatching_byte_is_not_reconsidered() {
        let mut framer = Framer::<CAP>::new();
        // second 'O' aborts the first match and is itself dropped
        let steps = feed_all(&mut framer, b"OOK\r\n");
        assert!(!steps.iter().any(|s| matches!(s, Step::Completed(_))));
        assert_eq!(framer.state(), State::Idle);
    }

    #[test]
    fn unrelated_bytes_are_discarded_while_idle() {
        let mut framer = Framer::<CAP>::new();
        for b in b"SEND FAIL\r\n" {
            assert_eq!(framer.feed(*b), Step::Discarded);
        }
    }

    #[test]
    fn sentinel_embedded_in_a_line_is_still_seen() {
        let mut framer = Framer::<CAP>::new();
        let steps = feed_all(&mut framer, b"SEND OK\r\n");
        assert_eq!(steps.last(), Some(&Step::Completed(Event::Ok)));
    }

    #[test]
    fn ipd_frame_delivers_payload() {
        let mut framer = Framer::<CAP>::new();
        let steps = feed_all(&mut framer, b"+IPD,1,5:hello");
        assert_eq!(steps.last(), Some(&Step::Packet));
        assert_eq!(framer.payload().as_slice(), b"hello");
        assert_eq!(framer.state(), State::Idle);
    }

    #[test]
    fn declared_length_equal_to_capacity_is_accepted() {
        let mut framer = Framer::<8>::new();
        let steps = feed_all(&mut framer, &ipd(8, b"abcdefgh"));
        assert_eq!(steps.last(), Some(&Step::Packet));
        assert_eq!(framer.payload().len(), 8);
    }

    #[test]
    fn declared_length_over_capacity_is_rejected() {
        let mut framer = Framer::<8>::new();
        let steps = feed_all(&mut framer, b"+IPD,1,9:");
        assert_eq!(steps.last(), Some(&Step::Aborted(Abort::Oversize { declared: 9 })));
        assert_eq!(framer.state(), State::Idle);
        assert!(framer.payload().is_empty());
        // the would-be payload is now ordinary idle traffic
        assert_eq!(framer.feed(b'x'), Step::Discarded);
    }

    #[test]
    fn malformed_lengths_abort() {
        let headers: [&[u8]; 4] = [b"+IPD,1,:", b"+IPD,1,1a:", b"+IPD,1,+5:", b"+IPD,1, 5:"];
        for header in headers {
            let mut framer = Framer::<CAP>::new();
            let steps = feed_all(&mut framer, header);
            assert_eq!(steps.last(), Some(&Step::Aborted(Abort::MalformedLength)), "{header:?}");
            assert_eq!(framer.state(), State::Idle);
        }
    }

    #[test]
    fn overlong_length_field_aborts_before_colon() {
        let mut framer = Framer::<CAP>::new();
        let steps = feed_all(&mut framer, b"+IPD,1,123456789");
        assert_eq!(steps.last(), Some(&Step::Aborted(Abort::MalformedLength)));
        assert_eq!(framer.state(), State::Idle);
    }

    #[test]
    fn zero_length_frame_delivers_nothing() {
        let mut framer = Framer::<CAP>::new();
        let steps = feed_all(&mut framer, b"+IPD,1,0:");
        assert_eq!(steps.last(), Some(&Step::Aborted(Abort::EmptyPayload)));
        assert_eq!(framer.feed(b'O'), Step::Progress);
    }

    #[test]
    fn payload_bytes_are_not_matched_as_sentinels() {
        let mut framer = Framer::<CAP>::new();
        let steps = feed_all(&mut framer, b"+IPD,1,4:OK\r\n");
        assert_eq!(steps.last(), Some(&Step::Packet));
        assert!(!steps.contains(&Step::Completed(Event::Ok)));
        assert_eq!(framer.payload().as_slice(), b"OK\r\n");
    }

    proptest! {
        #[test]
        fn any_payload_within_capacity_round_trips(payload in proptest::collection::vec(any::<u8>(), 1..=CAP)) {
            let mut framer = Framer::<CAP>::new();
            let steps = feed_all(&mut framer, &ipd(payload.len(), &payload));
            prop_assert_eq!(steps.last(), Some(&Step::Packet));
            prop_assert_eq!(steps.iter().filter(|s| **s == Step::Packet).count(), 1);
            prop_assert_eq!(framer.payload().as_slice(), &payload[..]);
        }

        #[test]
        fn any_declared_length_over_capacity_is_rejected(declared in (CAP + 1)..100_000usize) {
            let mut framer = Framer::<CAP>::new();
            let steps = feed_all(&mut framer, format!("+IPD,1,{declared}:").as_bytes());
            prop_assert_eq!(steps.last(), Some(&Step::Aborted(Abort::Oversize { declared })));
            prop_assert_eq!(framer.state(), State::Idle);
        }
    }
}
