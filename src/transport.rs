//! Serial transport: blocking transmit plus interrupt-driven receive.
//!
//! Received bytes reach the rest of the driver by one of two paths, chosen
//! per deployment with [`RxMode`]:
//!
//! - `Callback`: each byte is handed synchronously to the registered
//!   [`ByteSink`] (the framer) from the receive interrupt.
//! - `Queue`: each byte is pushed into a [`ByteQueue`] that the main loop
//!   drains with [`SerialTransport::read_byte`].
//!
//! Bytes arriving on the path that is not selected, before the interrupt is
//! armed, or into a full queue are dropped and counted. Nothing is signalled
//! back to the modem.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::queue::ByteQueue;

/// Consumer of received bytes, called from interrupt context.
pub trait ByteSink: Sync {
    fn on_byte(&self, byte: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

/// Line settings applied by [`Uart::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    pub baud: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

impl SerialConfig {
    /// 8 data bits, no parity, one stop bit.
    pub const fn eight_n_one(baud: u32) -> Self {
        Self {
            baud,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::eight_n_one(115_200)
    }
}

/// The UART peripheral itself.
///
/// Implementations drive registers (or a host serial port). Received bytes
/// are not read through this trait: the receive interrupt hands them to
/// [`Receiver::on_receive`].
pub trait Uart {
    type Error: core::fmt::Debug;

    /// Apply line settings and enable TX/RX. Calling it again re-applies them.
    fn configure(&mut self, config: &SerialConfig) -> Result<(), Self::Error>;

    /// Load one byte into the transmit data register.
    fn write_data(&mut self, byte: u8);

    /// Transmit data register empty.
    fn is_tx_empty(&mut self) -> bool;

    /// Start delivering received bytes to the receive interrupt.
    fn enable_rx_interrupt(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RxMode {
    #[default]
    Callback,
    Queue,
}

struct RxState<'a, const Q: usize> {
    mode: RxMode,
    armed: bool,
    sink: Option<&'a dyn ByteSink>,
    queue: ByteQueue<Q>,
    dropped: u32,
}

/// Interrupt-side half of the transport.
///
/// Lives for as long as the interrupt can fire, typically in a `static`.
/// The receive interrupt handler calls [`Receiver::on_receive`] with each
/// byte read from the data register.
pub struct Receiver<'a, const Q: usize> {
    state: Mutex<RefCell<RxState<'a, Q>>>,
}

impl<'a, const Q: usize> Receiver<'a, Q> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(RxState {
                mode: RxMode::Callback,
                armed: false,
                sink: None,
                queue: ByteQueue::new(),
                dropped: 0,
            })),
        }
    }

    /// Entry point for the receive interrupt.
    pub fn on_receive(&self, byte: u8) {
        let sink = critical_section::with(|cs| {
            let mut rx = self.state.borrow_ref_mut(cs);
            if !rx.armed {
                rx.dropped = rx.dropped.wrapping_add(1);
                return None;
            }
            match rx.mode {
                RxMode::Callback => {
                    if rx.sink.is_none() {
                        rx.dropped = rx.dropped.wrapping_add(1);
                    }
                    rx.sink
                }
                RxMode::Queue => {
                    if !rx.queue.enqueue(byte) {
                        rx.dropped = rx.dropped.wrapping_add(1);
                    }
                    None
                }
            }
        });
        if let Some(sink) = sink {
            sink.on_byte(byte);
        }
    }

    /// Install the byte consumer, replacing any previous one.
    pub fn register(&self, sink: &'a dyn ByteSink) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).sink = Some(sink));
    }

    pub fn select(&self, mode: RxMode) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).mode = mode);
    }

    pub fn mode(&self) -> RxMode {
        critical_section::with(|cs| self.state.borrow_ref(cs).mode)
    }

    fn arm(&self) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).armed = true);
    }

    pub fn is_armed(&self) -> bool {
        critical_section::with(|cs| self.state.borrow_ref(cs).armed)
    }

    /// Bytes thrown away since start-up.
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).dropped)
    }

    pub fn is_rx_data_ready(&self) -> bool {
        critical_section::with(|cs| !self.state.borrow_ref(cs).queue.is_empty())
    }

    pub fn read_byte(&self) -> Option<u8> {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).queue.dequeue())
    }

    pub fn clear_rx_fifo(&self) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).queue.clear());
    }
}

impl<const Q: usize> Default for Receiver<'_, Q> {
    fn default() -> Self {
        Self::new()
    }
}

/// Main-loop half of the transport: owns the UART for transmitting and
/// refers to the shared [`Receiver`].
pub struct SerialTransport<'a, U: Uart, const Q: usize> {
    uart: U,
    receiver: &'a Receiver<'a, Q>,
}

impl<'a, U: Uart, const Q: usize> SerialTransport<'a, U, Q> {
    pub fn new(uart: U, receiver: &'a Receiver<'a, Q>) -> Self {
        Self { uart, receiver }
    }

    pub fn initialize(&mut self, config: &SerialConfig) -> Result<(), U::Error> {
        log::debug!(
            "uart: {} baud, {} data bits, {:?} parity, {:?} stop",
            config.baud,
            config.data_bits,
            config.parity,
            config.stop_bits
        );
        self.uart.configure(config)
    }

    /// Transmit `bytes`, waiting for the data register to empty after each.
    pub fn send_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.send_byte(b);
        }
    }

    pub fn send_byte(&mut self, byte: u8) {
        self.uart.write_data(byte);
        while !self.uart.is_tx_empty() {
            core::hint::spin_loop();
        }
    }

    pub fn register_byte_sink(&mut self, sink: &'a dyn ByteSink) {
        self.receiver.register(sink);
    }

    pub fn select_rx_mode(&mut self, mode: RxMode) {
        self.receiver.select(mode);
    }

    pub fn enable_receive_interrupt(&mut self) -> Result<(), U::Error> {
        self.uart.enable_rx_interrupt()?;
        self.receiver.arm();
        Ok(())
    }

    pub fn receiver(&self) -> &'a Receiver<'a, Q> {
        self.receiver
    }

    pub fn is_rx_data_ready(&self) -> bool {
        self.receiver.is_rx_data_ready()
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        self.receiver.read_byte()
    }

    pub fn clear_rx_fifo(&mut self) {
        self.receiver.clear_rx_fifo();
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }
}
