//! State shared between the receive interrupt and the main loop.
//!
//! `ModemLink` owns the framer, the status flags and the published packet.
//! The interrupt side only calls [`ByteSink::on_byte`]; the main loop only
//! reads flags through [`ModemLink::status`] and drains packets with
//! [`ModemLink::take_packet`]. Every touch of shared state happens inside a
//! short critical section.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;

use crate::framer::{Abort, Framer, State, Step};
use crate::packet::PacketBuffer;
use crate::status::{Event, StatusRecord};
use crate::transport::ByteSink;

/// Running totals kept by the byte path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkCounters {
    /// flag sentinels fully matched
    pub events: u32,
    /// `+IPD` payloads completed
    pub packets: u32,
    pub mismatches: u32,
    pub malformed: u32,
    pub oversize: u32,
    /// events that arrived while the previous one was still pending
    pub lost: u32,
}

impl LinkCounters {
    /// Framing errors of any kind.
    pub fn bad(&self) -> u32 {
        self.malformed + self.oversize
    }
}

pub struct ModemLink<const N: usize> {
    framer: Mutex<RefCell<Framer<N>>>,
    status: StatusRecord,
    packet: Mutex<RefCell<PacketBuffer<N>>>,
    counters: Mutex<Cell<LinkCounters>>,
}

impl<const N: usize> ModemLink<N> {
    pub const fn new() -> Self {
        Self {
            framer: Mutex::new(RefCell::new(Framer::new())),
            status: StatusRecord::new(),
            packet: Mutex::new(RefCell::new(PacketBuffer::new())),
            counters: Mutex::new(Cell::new(LinkCounters {
                events: 0,
                packets: 0,
                mismatches: 0,
                malformed: 0,
                oversize: 0,
                lost: 0,
            })),
        }
    }

    pub fn status(&self) -> &StatusRecord {
        &self.status
    }

    pub fn counters(&self) -> LinkCounters {
        critical_section::with(|cs| self.counters.borrow(cs).get())
    }

    pub fn framer_state(&self) -> State {
        critical_section::with(|cs| self.framer.borrow_ref(cs).state())
    }

    /// Hand the pending packet to the caller.
    ///
    /// Returns the payload length, or 0 if no packet is pending. The flag is
    /// cleared and the bytes copied in one critical section, so a packet
    /// completing concurrently can never be half-read.
    pub fn take_packet(&self, out: &mut [u8; N]) -> usize {
        critical_section::with(|cs| {
            if !self.status.test_and_clear(Event::RxPacket) {
                return 0;
            }
            self.packet.borrow_ref(cs).copy_into(out)
        })
    }

    /// Return the framer to idle and forget all pending events.
    pub fn reset(&self) {
        critical_section::with(|cs| {
            self.framer.borrow_ref_mut(cs).reset();
            self.packet.borrow_ref_mut(cs).clear();
            self.status.clear_all();
        });
    }

    fn record(&self, cs: critical_section::CriticalSection<'_>, step: Step) {
        let cell = self.counters.borrow(cs);
        let mut counters = cell.get();
        match step {
            Step::Discarded | Step::Progress | Step::Packet => {}
            Step::Completed(event) => {
                counters.events += 1;
                if !self.status.try_set(event) {
                    counters.lost += 1;
                    log::warn!("{event} arrived while the previous one was still pending");
                } else {
                    log::trace!("framer: {event}");
                }
            }
            Step::Aborted(Abort::Mismatch) => counters.mismatches += 1,
            Step::Aborted(Abort::MalformedLength) => {
                counters.malformed += 1;
                log::debug!("framer: malformed +IPD length field");
            }
            Step::Aborted(Abort::Oversize { declared }) => {
                counters.oversize += 1;
                log::warn!("framer: dropping +IPD frame of {declared} bytes (buffer holds {N})");
            }
            Step::Aborted(Abort::EmptyPayload) => {}
        }
        cell.set(counters);
    }

    fn publish(&self, cs: critical_section::CriticalSection<'_>, payload: &PacketBuffer<N>) {
        self.packet.borrow_ref_mut(cs).copy_from(payload);
        let cell = self.counters.borrow(cs);
        let mut counters = cell.get();
        counters.packets += 1;
        if !self.status.try_set(Event::RxPacket) {
            // the undrained packet is replaced by the newer one
            counters.lost += 1;
            log::warn!("framer: replaced an undrained packet");
        }
        cell.set(counters);
    }
}

impl<const N: usize> Default for ModemLink<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteSink for ModemLink<N> {
    fn on_byte(&self, byte: u8) {
        critical_section::with(|cs| {
            let mut framer = self.framer.borrow_ref_mut(cs);
            let step = framer.feed(byte);
            if step == Step::Packet {
                self.publish(cs, framer.payload());
            }
            self.record(cs, step);
        });
    }
}
