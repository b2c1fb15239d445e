//! Test doubles: a scripted modem behind the `Uart` trait and a stepping clock.

use std::cell::Cell;
use std::string::String;
use std::sync::Mutex;
use std::vec::Vec;
use std::time::Duration;

use crate::clock::Clock;
use crate::transport::{ByteSink, Receiver, SerialConfig, Uart};

pub(crate) fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    bytes: Mutex<Vec<u8>>,
}

impl RecordingSink {
    pub(crate) fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().unwrap().clone()
    }
}

impl ByteSink for RecordingSink {
    fn on_byte(&self, byte: u8) {
        self.bytes.lock().unwrap().push(byte);
    }
}

/// Pretends to be a modem: every CRLF-terminated line written is looked up
/// in the reply table and the matching reply is pushed through the receive
/// interrupt path before the write returns.
pub(crate) struct ScriptedUart<const Q: usize> {
    receiver: &'static Receiver<'static, Q>,
    replies: Vec<(String, Vec<u8>)>,
    written: Vec<u8>,
    line: Vec<u8>,
    configured: Option<SerialConfig>,
    rx_enabled: bool,
    refuse_rx: bool,
    tx_latency: u32,
    busy_polls: u32,
    tx_polls: usize,
}

impl<const Q: usize> ScriptedUart<Q> {
    pub(crate) fn new(receiver: &'static Receiver<'static, Q>) -> Self {
        Self {
            receiver,
            replies: Vec::new(),
            written: Vec::new(),
            line: Vec::new(),
            configured: None,
            rx_enabled: false,
            refuse_rx: false,
            tx_latency: 1,
            busy_polls: 0,
            tx_polls: 0,
        }
    }

    /// Answer `line` (without its CRLF) with `reply`.
    pub(crate) fn reply(mut self, line: &str, reply: &[u8]) -> Self {
        self.add_reply(line, reply);
        self
    }

    pub(crate) fn add_reply(&mut self, line: &str, reply: &[u8]) {
        self.replies.push((line.to_string(), reply.to_vec()));
    }

    /// Make `enable_rx_interrupt` fail.
    pub(crate) fn refusing_rx(mut self) -> Self {
        self.refuse_rx = true;
        self
    }

    /// Number of `is_tx_empty` polls each byte takes to drain.
    pub(crate) fn set_tx_latency(&mut self, polls: u32) {
        self.tx_latency = polls.max(1);
    }

    pub(crate) fn written(&self) -> &[u8] {
        &self.written
    }

    pub(crate) fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    pub(crate) fn tx_polls(&self) -> usize {
        self.tx_polls
    }

    pub(crate) fn configured(&self) -> Option<SerialConfig> {
        self.configured
    }

    pub(crate) fn rx_enabled(&self) -> bool {
        self.rx_enabled
    }

    /// Push unsolicited bytes through the receive interrupt.
    pub(crate) fn inject(&self, bytes: &[u8]) {
        for &b in bytes {
            self.receiver.on_receive(b);
        }
    }
}

impl<const Q: usize> Uart for ScriptedUart<Q> {
    type Error = &'static str;

    fn configure(&mut self, config: &SerialConfig) -> Result<(), Self::Error> {
        self.configured = Some(*config);
        Ok(())
    }

    fn write_data(&mut self, byte: u8) {
        self.written.push(byte);
        self.line.push(byte);
        self.busy_polls = self.tx_latency;
        if !self.line.ends_with(b"\r\n") {
            return;
        }
        let text = String::from_utf8_lossy(&self.line[..self.line.len() - 2]).into_owned();
        self.line.clear();
        let reply = self
            .replies
            .iter()
            .find(|(line, _)| *line == text)
            .map(|(_, reply)| reply.clone());
        if let Some(reply) = reply {
            self.inject(&reply);
        }
    }

    fn is_tx_empty(&mut self) -> bool {
        self.tx_polls += 1;
        self.busy_polls = self.busy_polls.saturating_sub(1);
        self.busy_polls == 0
    }

    fn enable_rx_interrupt(&mut self) -> Result<(), Self::Error> {
        if self.refuse_rx {
            return Err("rx irq busy");
        }
        self.rx_enabled = true;
        Ok(())
    }
}

/// Advances one millisecond every time it is read.
#[derive(Default)]
pub(crate) struct SteppingClock {
    ticks: Cell<u64>,
}

impl SteppingClock {
    pub(crate) fn elapsed(&self) -> Duration {
        Duration::from_millis(self.ticks.get())
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Duration {
        let t = self.ticks.get();
        self.ticks.set(t + 1);
        Duration::from_millis(t)
    }
}
