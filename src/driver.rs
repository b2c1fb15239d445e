//! Command/response sequencer for the ESP8266 AT firmware.
//!
//! Every operation writes one command line, then spins on the status flags
//! until the expected response shows up or the timeout budget runs out.
//! All operations take `&mut self`, so two commands can never be in flight
//! on the same driver at once.

use core::net::Ipv4Addr;
use core::time::Duration;

use crate::clock::Clock;
use crate::command::{AtCommand, MAX_SEND_LEN, SocketKind, TimeoutClass};
use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::link::ModemLink;
use crate::status::Event;
use crate::transport::{Receiver, RxMode, SerialTransport, Uart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Validating,
    Resetting,
    Configuring,
    Ready,
}

pub struct Esp8266<'a, U: Uart, C: Clock, const N: usize, const Q: usize> {
    transport: SerialTransport<'a, U, Q>,
    link: &'a ModemLink<N>,
    clock: C,
    config: DriverConfig,
    state: DriverState,
}

impl<'a, U: Uart, C: Clock, const N: usize, const Q: usize> Esp8266<'a, U, C, N, Q> {
    pub fn new(
        uart: U,
        receiver: &'a Receiver<'a, Q>,
        link: &'a ModemLink<N>,
        clock: C,
        config: DriverConfig,
    ) -> Self {
        Self {
            transport: SerialTransport::new(uart, receiver),
            link,
            clock,
            config,
            state: DriverState::Uninitialized,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn link(&self) -> &'a ModemLink<N> {
        self.link
    }

    pub fn transport(&self) -> &SerialTransport<'a, U, Q> {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut SerialTransport<'a, U, Q> {
        &mut self.transport
    }

    /// Bring up the serial link and the modem: `AT`, `AT+RST`, `ATE0`.
    ///
    /// Any missing acknowledgement aborts bring-up, leaves the driver
    /// `Uninitialized` and reports the stage that failed.
    pub fn initialize(&mut self) -> Result<()> {
        self.state = DriverState::Uninitialized;
        self.link.reset();

        self.transport
            .initialize(&self.config.serial)
            .map_err(|e| {
                log::error!("uart configure failed: {e:?}");
                Error::port(&e)
            })?;
        self.transport.register_byte_sink(self.link);
        self.transport.select_rx_mode(RxMode::Callback);
        self.transport.enable_receive_interrupt().map_err(|e| {
            log::error!("uart receive enable failed: {e:?}");
            Error::port(&e)
        })?;

        let steps: [(DriverState, fn(&mut Self) -> Result<()>); 3] = [
            (DriverState::Validating, Self::validate),
            (DriverState::Resetting, Self::reset),
            (DriverState::Configuring, Self::disable_echo),
        ];
        for (stage, step) in steps {
            self.state = stage;
            log::info!("modem: {stage:?}");
            if let Err(err) = step(self) {
                self.state = DriverState::Uninitialized;
                return Err(match err {
                    Error::Timeout { event, .. } => Error::BringUp { stage, event },
                    other => other,
                });
            }
        }

        self.link.status().clear_all();
        self.state = DriverState::Ready;
        log::info!("modem: Ready");
        Ok(())
    }

    /// Check that the modem answers at all.
    pub fn validate(&mut self) -> Result<()> {
        self.execute(&AtCommand::Attention)
    }

    /// Reboot the modem and wait for its `ready` banner.
    pub fn reset(&mut self) -> Result<()> {
        self.execute(&AtCommand::Reset)
    }

    pub fn disable_echo(&mut self) -> Result<()> {
        self.execute(&AtCommand::EchoOff)
    }

    pub fn set_access_point_name(&mut self, name: &str) -> Result<()> {
        self.ensure_ready()?;
        self.execute(&AtCommand::SetAccessPoint { name })
    }

    /// Open the datagram (or stream) socket on link 1 towards `ip:port`.
    pub fn start_client(&mut self, kind: SocketKind, ip: Ipv4Addr, port: u16) -> Result<()> {
        self.ensure_ready()?;
        self.execute(&AtCommand::MultiplexOn)?;
        self.execute(&AtCommand::StartConnection { kind, ip, port })
    }

    /// Listen for TCP connections on `port` and apply the configured idle
    /// timeout.
    pub fn start_tcp_server(&mut self, port: u16) -> Result<()> {
        self.ensure_ready()?;
        self.execute(&AtCommand::MultiplexOn)?;
        self.execute(&AtCommand::StartServer { port })?;
        self.set_server_timeout(self.config.server_timeout_s)
    }

    pub fn set_server_timeout(&mut self, seconds: u16) -> Result<()> {
        self.ensure_ready()?;
        self.execute(&AtCommand::ServerTimeout { seconds })
    }

    /// Send one message on link 1.
    pub fn send_message(&mut self, payload: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        if payload.is_empty() || payload.len() > MAX_SEND_LEN {
            return Err(Error::InvalidPayloadLength(payload.len()));
        }
        self.execute(&AtCommand::Send { len: payload.len() })?;
        self.transport.send_bytes(payload);
        self.transport.send_byte(b'\r');
        self.transport.send_byte(b'\n');
        Ok(())
    }

    /// Copy out the pending packet, if any. Returns its length; 0 means
    /// nothing has arrived since the last call. Never blocks.
    pub fn receive_message(&mut self, out: &mut [u8; N]) -> usize {
        self.link.take_packet(out)
    }

    /// Write a raw command line. Does not wait for anything.
    pub fn send_command(&mut self, line: &str) {
        log::debug!("> {}", line.trim_end());
        self.transport.send_bytes(line.as_bytes());
    }

    /// Spin until `event` is pending, then consume it.
    ///
    /// On timeout the flag is left as it is.
    pub fn wait_for(&mut self, event: Event, budget: Duration) -> Result<()> {
        let start = self.clock.now();
        loop {
            if self.link.status().test_and_clear(event) {
                return Ok(());
            }
            if self.clock.now().saturating_sub(start) >= budget {
                let budget_ms = whole_millis(budget);
                log::warn!("no {event} within {budget_ms} ms");
                return Err(Error::Timeout { event, budget_ms });
            }
            self.clock.relax();
        }
    }

    /// Send `cmd` and wait for its acknowledgement. A flag of the same kind
    /// left over from an earlier exchange is dropped first.
    fn execute(&mut self, cmd: &AtCommand<'_>) -> Result<()> {
        let line = cmd.to_line()?;
        if self.link.status().test_and_clear(cmd.expected()) {
            log::debug!("dropping stale {}", cmd.expected());
        }
        self.send_command(&line);
        let budget = self.budget(cmd.timeout_class());
        self.wait_for(cmd.expected(), budget)
    }

    fn budget(&self, class: TimeoutClass) -> Duration {
        self.config.timeouts.budget(class)
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            DriverState::Ready => Ok(()),
            other => Err(Error::NotReady(other)),
        }
    }
}

fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
