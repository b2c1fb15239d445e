use core::fmt::{self, Write};

use heapless::String;
use thiserror::Error;

use crate::driver::DriverState;
use crate::status::Event;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no {event} within {budget_ms} ms")]
    Timeout { event: Event, budget_ms: u64 },
    #[error("bring-up aborted in {stage:?}: no {event} from modem")]
    BringUp { stage: DriverState, event: Event },
    #[error("driver not ready (state {0:?})")]
    NotReady(DriverState),
    #[error("command line longer than {0} bytes")]
    CommandTooLong(usize),
    #[error("payload length {0} outside 1..={max}", max = crate::command::MAX_SEND_LEN)]
    InvalidPayloadLength(usize),
    #[error("serial port: {0}")]
    Port(PortMessage),
}

/// Debug rendering of the UART failure, cut short when it does not fit.
pub type PortMessage = String<48>;

impl Error {
    pub(crate) fn port(cause: &impl fmt::Debug) -> Self {
        let mut msg = PortMessage::new();
        let _ = write!(msg, "{cause:?}");
        Error::Port(msg)
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
