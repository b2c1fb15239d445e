use anyhow::Result;
use esp_at_link::config::DEFAULT_SERVER_TIMEOUT_S;

use crate::cli::ProbeOpts;
use crate::session;

pub fn run(opts: ProbeOpts) -> Result<()> {
    let modem = session::bring_up(&opts.ser, DEFAULT_SERVER_TIMEOUT_S)?;
    let counters = modem.link().counters();
    log::info!(
        "[probe] modem ready on {} at {} baud (events={} lost={} mismatches={} dropped={})",
        opts.ser.dev,
        opts.ser.baud,
        counters.events,
        counters.lost,
        counters.mismatches,
        modem.transport().receiver().dropped()
    );
    Ok(())
}
