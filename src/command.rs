//! AT command lines and the response each one waits for.

use core::fmt::{self, Write};
use core::net::Ipv4Addr;

use heapless::String;

use crate::error::{Error, Result};
use crate::status::Event;

/// Longest command line, terminator included.
pub const COMMAND_CAPACITY: usize = 64;

/// Largest payload one `AT+CIPSEND` may carry.
pub const MAX_SEND_LEN: usize = 2048;

/// The only link id used; multiplexing is switched on but not exploited.
pub const LINK_ID: u8 = 1;

pub type CommandLine = String<COMMAND_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    Udp,
    Tcp,
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SocketKind::Udp => "UDP",
            SocketKind::Tcp => "TCP",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtCommand<'a> {
    // ---- Bring-up ----
    Attention,
    Reset,
    EchoOff,

    // ---- Access point / sockets ----
    SetAccessPoint {
        name: &'a str,
    },
    MultiplexOn,
    StartConnection {
        kind: SocketKind,
        ip: Ipv4Addr,
        port: u16,
    },
    StartServer {
        port: u16,
    },
    ServerTimeout {
        seconds: u16,
    },

    // ---- Data ----
    Send {
        len: usize,
    },
}

impl AtCommand<'_> {
    /// Event that acknowledges this command.
    pub fn expected(&self) -> Event {
        match self {
            AtCommand::Reset => Event::Ready,
            AtCommand::Send { .. } => Event::TxReady,
            _ => Event::Ok,
        }
    }

    pub fn timeout_class(&self) -> TimeoutClass {
        match self {
            AtCommand::Reset => TimeoutClass::Long,
            _ => TimeoutClass::Short,
        }
    }

    /// Render the CRLF-terminated command line.
    pub fn to_line(&self) -> Result<CommandLine> {
        let mut out = CommandLine::new();
        write!(out, "{}\r\n", self).map_err(|_| Error::CommandTooLong(COMMAND_CAPACITY))?;
        Ok(out)
    }
}

impl fmt::Display for AtCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AtCommand::*;
        match self {
            Attention => f.write_str("AT"),
            Reset => f.write_str("AT+RST"),
            EchoOff => f.write_str("ATE0"),
            SetAccessPoint { name } => write!(f, "AT+CWSAP=\"{name}\",\"\",5,0"),
            MultiplexOn => f.write_str("AT+CIPMUX=1"),
            StartConnection { kind, ip, port } => {
                write!(f, "AT+CIPSTART={LINK_ID},\"{kind}\",\"{ip}\",{port},{port},0")
            }
            StartServer { port } => write!(f, "AT+CIPSERVER=1,{port}"),
            ServerTimeout { seconds } => write!(f, "AT+CIPSTO={seconds}"),
            Send { len } => write!(f, "AT+CIPSEND={LINK_ID},{len}"),
        }
    }
}
