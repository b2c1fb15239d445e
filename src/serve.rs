use anyhow::Result;
use esp_at_link::config::RX_PACKET_CAPACITY;
use std::time::Duration;

use crate::cli::ServeOpts;
use crate::session;
use crate::stats::Stats;

pub fn run(opts: ServeOpts) -> Result<()> {
    log::debug!("serve: {:?}", opts);
    let mut modem = session::bring_up(&opts.ser, opts.net.server_timeout)?;
    session::open_socket(&mut modem, &opts.net)?;

    let mut packet = [0u8; RX_PACKET_CAPACITY];
    let mut stats = Stats::new();

    log::info!("Starting receive loop");

    loop {
        let n = modem.receive_message(&mut packet);
        if n == 0 {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            stats.add_rx(n);
            log::debug!("[rx] {} bytes: {:02X?}", n, &packet[..n]);
            if !opts.no_echo {
                match modem.send_message(&packet[..n]) {
                    Ok(()) => stats.inc_tx(),
                    Err(err) => {
                        stats.inc_tx_failed();
                        log::warn!("[tx] echo of {} bytes failed: {}", n, err);
                    }
                }
            }
        }

        stats.maybe_print(
            opts.stats,
            modem.link().counters(),
            modem.transport().receiver().dropped(),
        );
    }
}
