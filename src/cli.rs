use std::net::Ipv4Addr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use esp_at_link::config::{DEFAULT_BAUD, DEFAULT_SERVER_TIMEOUT_S};
use esp_at_link::{DriverConfig, SerialConfig, Timeouts};

#[derive(Parser, Debug, Clone)]
#[command(name = "esp-at", about = "ESP8266 AT modem driver: bring-up, echo server, sender")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Bring the modem up (AT, AT+RST, ATE0) and report
    Probe(ProbeOpts),
    /// Open the access point and socket, echo every received packet
    Serve(ServeOpts),
    /// Open the access point and socket, send a message
    Send(SendOpts),
    /// Dump raw modem output without framing
    Monitor(MonitorOpts),
}

#[derive(Args, Debug, Clone)]
pub struct SerialOpts {
    /// Serial device path
    #[arg(long, default_value = "/dev/ttyUSB0")]
    pub dev: String,
    /// Baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
    /// Enable RTS/CTS
    #[arg(long, default_value_t = false)]
    pub rtscts: bool,
    /// Budget for ordinary command acknowledgements (ms)
    #[arg(long, default_value_t = 2_000)]
    pub short_timeout_ms: u64,
    /// Budget for the reset banner (ms)
    #[arg(long, default_value_t = 10_000)]
    pub long_timeout_ms: u64,
}

impl SerialOpts {
    pub fn driver_config(&self, server_timeout_s: u16) -> DriverConfig {
        DriverConfig {
            serial: SerialConfig::eight_n_one(self.baud),
            timeouts: Timeouts {
                short: Duration::from_millis(self.short_timeout_ms),
                long: Duration::from_millis(self.long_timeout_ms),
            },
            server_timeout_s,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketMode {
    /// UDP socket towards --peer
    Udp,
    /// TCP client towards --peer
    Tcp,
    /// TCP server listening on --port
    TcpServer,
}

#[derive(Args, Debug, Clone)]
pub struct NetOpts {
    /// Access point SSID
    #[arg(long, default_value = "STM8S_Robot")]
    pub ap_name: String,
    /// Socket to open on link 1
    #[arg(long, value_enum, default_value_t = SocketMode::Udp)]
    pub socket: SocketMode,
    /// Remote address for client sockets
    #[arg(long, default_value = "192.168.4.2")]
    pub peer: Ipv4Addr,
    /// Local and remote port
    #[arg(long, default_value_t = 49999)]
    pub port: u16,
    /// TCP server idle timeout in seconds
    #[arg(long, default_value_t = DEFAULT_SERVER_TIMEOUT_S)]
    pub server_timeout: u16,
}

#[derive(Args, Debug, Clone)]
pub struct ProbeOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
}

#[derive(Args, Debug, Clone)]
pub struct ServeOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    #[command(flatten)]
    pub net: NetOpts,
    /// Do not echo received packets back
    #[arg(long, default_value_t = false)]
    pub no_echo: bool,
    /// Stats print interval in seconds
    #[arg(long, default_value_t = 5.0)]
    pub stats: f64,
}

#[derive(Args, Debug, Clone)]
pub struct SendOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    #[command(flatten)]
    pub net: NetOpts,
    /// Text to send
    #[arg(long, default_value = "Hello")]
    pub message: String,
    /// How many times to send it
    #[arg(long, default_value_t = 1)]
    pub count: u32,
    /// Pause between messages in milliseconds
    #[arg(long, default_value_t = 100)]
    pub gap_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct MonitorOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// Raw command line to write first (CRLF is appended), e.g. "AT+GMR"
    #[arg(long)]
    pub at: Option<String>,
    /// How long to listen, in seconds
    #[arg(long, default_value_t = 5.0)]
    pub duration: f64,
}
