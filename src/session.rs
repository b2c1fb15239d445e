use anyhow::{Context, Result};
use esp_at_link::config::{RX_PACKET_CAPACITY, RX_QUEUE_CAPACITY};
use esp_at_link::port::HostUart;
use esp_at_link::{Esp8266, ModemLink, Receiver, SocketKind, StdClock};

use crate::cli::{NetOpts, SerialOpts, SocketMode};

pub type Modem =
    Esp8266<'static, HostUart<RX_QUEUE_CAPACITY>, StdClock, RX_PACKET_CAPACITY, RX_QUEUE_CAPACITY>;

static RECEIVER: Receiver<'static, RX_QUEUE_CAPACITY> = Receiver::new();
static LINK: ModemLink<RX_PACKET_CAPACITY> = ModemLink::new();

/// Open the port and build the driver without talking to the modem yet.
pub fn open(ser: &SerialOpts, server_timeout_s: u16) -> Result<Modem> {
    let config = ser.driver_config(server_timeout_s);
    let uart = HostUart::open(&ser.dev, &config.serial, ser.rtscts, &RECEIVER)
        .with_context(|| format!("open {}", ser.dev))?;
    Ok(Esp8266::new(uart, &RECEIVER, &LINK, StdClock::new(), config))
}

pub fn bring_up(ser: &SerialOpts, server_timeout_s: u16) -> Result<Modem> {
    let mut modem = open(ser, server_timeout_s)?;
    modem
        .initialize()
        .with_context(|| format!("modem bring-up on {}", ser.dev))?;
    Ok(modem)
}

pub fn open_socket(modem: &mut Modem, net: &NetOpts) -> Result<()> {
    modem
        .set_access_point_name(&net.ap_name)
        .with_context(|| format!("set access point name {:?}", net.ap_name))?;
    match net.socket {
        SocketMode::Udp => modem.start_client(SocketKind::Udp, net.peer, net.port),
        SocketMode::Tcp => modem.start_client(SocketKind::Tcp, net.peer, net.port),
        SocketMode::TcpServer => modem.start_tcp_server(net.port),
    }
    .with_context(|| format!("open {:?} socket on port {}", net.socket, net.port))?;
    log::info!(
        "[session] ap={} socket={:?} peer={} port={}",
        net.ap_name,
        net.socket,
        net.peer,
        net.port
    );
    Ok(())
}
