//! Driver for an ESP8266 WiFi modem running the AT command firmware.
//!
//! The modem is reached over a bare UART. Responses are free-form text with
//! one binary frame mixed in, so the driver rebuilds message boundaries from
//! the raw byte stream:
//!
//! ```text
//! rx interrupt -> Receiver -> ModemLink (Framer -> status flags, packet)
//!                                   ^
//! main loop   -> Esp8266 ----------+--> SerialTransport -> UART
//! ```
//!
//! The core is `no_std` and allocation free. Shared state lives in
//! `critical_section::Mutex`es so the receive interrupt and the main loop
//! never observe each other half way through an update. The `std` feature
//! adds [`port::HostUart`] for driving a modem from a PC serial adapter.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod clock;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod framer;
pub mod link;
pub mod packet;
#[cfg(feature = "std")]
pub mod port;
pub mod queue;
pub mod status;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::Clock;
#[cfg(feature = "std")]
pub use clock::StdClock;
pub use command::{AtCommand, SocketKind, TimeoutClass};
pub use config::{DriverConfig, RX_PACKET_CAPACITY, RX_QUEUE_CAPACITY, Timeouts};
pub use driver::{DriverState, Esp8266};
pub use error::{Error, Result};
pub use link::{LinkCounters, ModemLink};
pub use status::{Event, StatusRecord};
pub use transport::{ByteSink, Receiver, RxMode, SerialConfig, SerialTransport, Uart};
