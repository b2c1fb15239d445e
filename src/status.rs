//! Pending-event flags shared between the byte path and the command path.

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

/// A completed modem response the framer can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// `OK\r\n`
    Ok,
    /// `ready\r\n`, printed once the modem finished rebooting
    Ready,
    /// `> `, the modem is waiting for payload bytes
    TxReady,
    /// a complete `+IPD` payload sits in the packet buffer
    RxPacket,
}

impl Event {
    pub const ALL: [Event; 4] = [Event::Ok, Event::Ready, Event::TxReady, Event::RxPacket];

    const fn mask(self) -> u8 {
        match self {
            Event::Ok => 0x01,
            Event::Ready => 0x02,
            Event::TxReady => 0x04,
            Event::RxPacket => 0x08,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Event::Ok => "OK",
            Event::Ready => "ready",
            Event::TxReady => "> prompt",
            Event::RxPacket => "+IPD packet",
        })
    }
}

/// One pending bit per [`Event`].
///
/// The framer only ever sets bits and the command path only ever clears
/// them. A second occurrence of an event that has not been consumed yet is
/// not queued: `try_set` reports it so the caller can count the loss.
pub struct StatusRecord {
    bits: Mutex<Cell<u8>>,
}

impl StatusRecord {
    pub const fn new() -> Self {
        Self {
            bits: Mutex::new(Cell::new(0)),
        }
    }

    /// Mark `event` pending. Returns `false` if it already was.
    pub fn try_set(&self, event: Event) -> bool {
        critical_section::with(|cs| {
            let bits = self.bits.borrow(cs);
            let was = bits.get();
            bits.set(was | event.mask());
            was & event.mask() == 0
        })
    }

    /// Consume a pending `event`. Returns `false` and changes nothing if it
    /// was not pending.
    pub fn test_and_clear(&self, event: Event) -> bool {
        critical_section::with(|cs| {
            let bits = self.bits.borrow(cs);
            let was = bits.get();
            bits.set(was & !event.mask());
            was & event.mask() != 0
        })
    }

    pub fn is_pending(&self, event: Event) -> bool {
        critical_section::with(|cs| self.bits.borrow(cs).get() & event.mask() != 0)
    }

    pub fn clear_all(&self) {
        critical_section::with(|cs| self.bits.borrow(cs).set(0));
    }
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_set();
        for event in Event::ALL {
            if self.is_pending(event) {
                list.entry(&event);
            }
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_set_before_consumption_is_reported_lost() {
        let status = StatusRecord::new();
        assert!(status.try_set(Event::Ok));
        assert!(!status.try_set(Event::Ok));
        assert!(status.test_and_clear(Event::Ok));
        assert!(!status.test_and_clear(Event::Ok));
    }

    #[test]
    fn flags_are_independent() {
        let status = StatusRecord::new();
        status.try_set(Event::Ready);
        status.try_set(Event::RxPacket);
        assert!(!status.test_and_clear(Event::Ok));
        assert!(status.is_pending(Event::Ready));
        assert!(status.test_and_clear(Event::RxPacket));
        assert!(status.is_pending(Event::Ready));
        assert!(!status.is_pending(Event::TxReady));
    }

    #[test]
    fn clear_all_drops_everything() {
        let status = StatusRecord::new();
        for event in Event::ALL {
            status.try_set(event);
        }
        status.clear_all();
        for event in Event::ALL {
            assert!(!status.is_pending(event));
        }
    }
}
