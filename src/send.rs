use anyhow::{Context, Result};
use std::time::Duration;

use crate::cli::SendOpts;
use crate::session;

pub fn run(opts: SendOpts) -> Result<()> {
    let mut modem = session::bring_up(&opts.ser, opts.net.server_timeout)?;
    session::open_socket(&mut modem, &opts.net)?;

    for i in 0..opts.count {
        modem
            .send_message(opts.message.as_bytes())
            .with_context(|| format!("send #{}", i + 1))?;
        log::info!("[tx] #{} {:?}", i + 1, opts.message);
        if i + 1 < opts.count {
            std::thread::sleep(Duration::from_millis(opts.gap_ms));
        }
    }
    Ok(())
}
