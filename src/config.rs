use core::time::Duration;

use crate::command::TimeoutClass;
use crate::transport::SerialConfig;

/// Baud rate the ESP8266 AT firmware boots with.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Idle timeout applied to TCP server connections, in seconds.
pub const DEFAULT_SERVER_TIMEOUT_S: u16 = 300;

/// Payload bytes held per received packet.
pub const RX_PACKET_CAPACITY: usize = 64;

/// Slots in the pull-style receive queue (one stays unused).
pub const RX_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Ordinary command acknowledgements.
    pub short: Duration,
    /// Reset, which waits for the modem to reboot.
    pub long: Duration,
}

impl Timeouts {
    pub fn budget(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Short => self.short,
            TimeoutClass::Long => self.long,
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(2),
            long: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub serial: SerialConfig,
    pub timeouts: Timeouts,
    pub server_timeout_s: u16,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::eight_n_one(DEFAULT_BAUD),
            timeouts: Timeouts::default(),
            server_timeout_s: DEFAULT_SERVER_TIMEOUT_S,
        }
    }
}
