use anyhow::{Context, Result};
use esp_at_link::RxMode;
use esp_at_link::config::DEFAULT_SERVER_TIMEOUT_S;
use std::time::{Duration, Instant};

use crate::cli::MonitorOpts;
use crate::session;

pub fn run(opts: MonitorOpts) -> Result<()> {
    let mut modem = session::open(&opts.ser, DEFAULT_SERVER_TIMEOUT_S)?;
    let serial = opts.ser.driver_config(DEFAULT_SERVER_TIMEOUT_S).serial;
    let transport = modem.transport_mut();
    transport
        .initialize(&serial)
        .with_context(|| format!("configure {}", opts.ser.dev))?;
    transport.select_rx_mode(RxMode::Queue);
    transport
        .enable_receive_interrupt()
        .context("start receive thread")?;

    if let Some(at) = &opts.at {
        log::info!("[monitor] > {}", at);
        transport.send_bytes(at.as_bytes());
        transport.send_bytes(b"\r\n");
    }

    let start = Instant::now();
    let mut line = String::new();
    while start.elapsed().as_secs_f64() < opts.duration {
        let Some(b) = transport.read_byte() else {
            std::thread::sleep(Duration::from_millis(1));
            continue;
        };
        match b {
            b'\n' => {
                log::info!("[monitor] < {}", line);
                line.clear();
            }
            b'\r' => {}
            0x20..=0x7e => line.push(b as char),
            _ => line.push_str(&format!("\\x{:02x}", b)),
        }
    }
    if !line.is_empty() {
        log::info!("[monitor] < {}", line);
    }
    log::info!(
        "[monitor] done, {} bytes dropped",
        transport.receiver().dropped()
    );
    Ok(())
}
