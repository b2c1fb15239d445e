use std::time::Instant;

use esp_at_link::LinkCounters;

#[derive(Debug, Clone)]
pub struct Stats {
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub tx_packets: u64,
    pub tx_failed: u64,
    t0: Instant,
    last: Instant,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            rx_packets: 0,
            rx_bytes: 0,
            tx_packets: 0,
            tx_failed: 0,
            t0: Instant::now(),
            last: Instant::now(),
        }
    }
    pub fn add_rx(&mut self, n: usize) {
        self.rx_packets += 1;
        self.rx_bytes += n as u64;
    }
    pub fn inc_tx(&mut self) {
        self.tx_packets += 1;
    }
    pub fn inc_tx_failed(&mut self) {
        self.tx_failed += 1;
    }

    pub fn maybe_print(&mut self, stats_int: f64, link: LinkCounters, dropped: u32) {
        if self.last.elapsed().as_secs_f64() >= stats_int {
            let dur = self.t0.elapsed().as_secs_f64().max(1e-3);
            log::info!(
                "[serve] rx={} ({:.1} B/s) tx={} tx_failed={} events={} lost={} bad={} mismatches={} dropped={} over {:.1}s",
                self.rx_packets,
                (self.rx_bytes as f64) / dur,
                self.tx_packets,
                self.tx_failed,
                link.events,
                link.lost,
                link.bad(),
                link.mismatches,
                dropped,
                dur
            );
            self.last = Instant::now();
            self.t0 = Instant::now();
            self.rx_bytes = 0;
        }
    }
}
