//! Host serial port standing in for the UART peripheral.
//!
//! A reader thread plays the part of the receive interrupt: every byte read
//! from the port is handed to the [`Receiver`] as it arrives.

use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use serialport::{DataBits, FlowControl, SerialPort, StopBits};

use crate::transport::{Parity, Receiver, SerialConfig, StopBits as Stop, Uart};

pub struct HostUart<const Q: usize> {
    dev: String,
    port: Box<dyn SerialPort>,
    receiver: &'static Receiver<'static, Q>,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl<const Q: usize> HostUart<Q> {
    pub fn open(
        dev: &str,
        config: &SerialConfig,
        rtscts: bool,
        receiver: &'static Receiver<'static, Q>,
    ) -> serialport::Result<Self> {
        let port = serialport::new(dev, config.baud)
            .timeout(Duration::from_millis(100))
            .data_bits(data_bits(config.data_bits))
            .parity(parity(config.parity))
            .stop_bits(stop_bits(config.stop_bits))
            .flow_control(if rtscts {
                FlowControl::Hardware
            } else {
                FlowControl::None
            })
            .open()?;
        Ok(Self {
            dev: dev.to_string(),
            port,
            receiver,
            stop: Arc::new(AtomicBool::new(false)),
            reader: None,
        })
    }

    pub fn dev(&self) -> &str {
        &self.dev
    }
}

impl<const Q: usize> Uart for HostUart<Q> {
    type Error = serialport::Error;

    fn configure(&mut self, config: &SerialConfig) -> Result<(), Self::Error> {
        self.port.set_baud_rate(config.baud)?;
        self.port.set_data_bits(data_bits(config.data_bits))?;
        self.port.set_parity(parity(config.parity))?;
        self.port.set_stop_bits(stop_bits(config.stop_bits))?;
        Ok(())
    }

    fn write_data(&mut self, byte: u8) {
        if let Err(e) = self.port.write_all(&[byte]) {
            log::error!("{}: write failed: {e}", self.dev);
        }
    }

    fn is_tx_empty(&mut self) -> bool {
        true
    }

    fn enable_rx_interrupt(&mut self) -> Result<(), Self::Error> {
        if self.reader.is_some() {
            return Ok(());
        }
        let mut port = self.port.try_clone()?;
        let receiver = self.receiver;
        let stop = Arc::clone(&self.stop);
        let dev = self.dev.clone();
        let handle = std::thread::Builder::new()
            .name("uart-rx".into())
            .spawn(move || {
                let mut buf = [0u8; 64];
                while !stop.load(Ordering::Relaxed) {
                    match port.read(&mut buf) {
                        Ok(n) => buf[..n].iter().for_each(|&b| receiver.on_receive(b)),
                        Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                        Err(e) => {
                            log::error!("{dev}: read failed, receive path stopped: {e}");
                            break;
                        }
                    }
                }
            })?;
        self.reader = Some(handle);
        Ok(())
    }
}

impl<const Q: usize> Drop for HostUart<Q> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

fn data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn stop_bits(stop: Stop) -> StopBits {
    match stop {
        Stop::One => StopBits::One,
        Stop::Two => StopBits::Two,
    }
}
