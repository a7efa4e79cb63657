//! Bus master command protocol
//!
//! The bus master service is the firmware component that manages device enumeration and cyclic
//! I/O exchange of the local bus.  It is driven through a single "control" call which takes a
//! command frame and returns a response code plus a variable length reply.
mod frame;
mod services;
#[cfg(feature = "simulator")]
mod simulator;

pub use frame::{Command, CommandFrame, CommandTable, MappingPlacement};
pub use services::{BusMasterServices, SelectedMaster};
#[cfg(feature = "simulator")]
pub use simulator::{SimulatedModule, SimulatorMaster, RESPONSE_UNKNOWN_COMMAND};

/// Abstraction over the Axioline and Interbus master services.
pub trait BusMasterClient {
    /// Send a command frame and wait for its confirmation.
    ///
    /// The reply words are appended to `reply`, which is empty on entry.  The return value is the
    /// response code, where zero means success.
    ///
    /// **Important:** This call blocks until the bus master has processed the command.  It is
    /// never retried.
    fn control(&mut self, send: &[u16], reply: &mut Vec<u16>) -> u16;
}

impl<M: BusMasterClient + ?Sized> BusMasterClient for &mut M {
    fn control(&mut self, send: &[u16], reply: &mut Vec<u16>) -> u16 {
        (**self).control(send, reply)
    }
}

impl<M: BusMasterClient + ?Sized> BusMasterClient for Box<M> {
    fn control(&mut self, send: &[u16], reply: &mut Vec<u16>) -> u16 {
        (**self).control(send, reply)
    }
}

/// Exchange one command frame with the bus master.
///
/// A non-zero response code is turned into [`Error::BusCommandFailed`][`crate::Error`].  The
/// reply is returned as-is; interpreting it is the caller's job.
pub fn exchange<M: BusMasterClient + ?Sized>(
    client: &mut M,
    frame: &CommandFrame,
) -> Result<Vec<u16>, crate::Error> {
    let mut reply = Vec::new();
    log::trace!("Sending {}: {:04x?}", frame.command(), frame.as_words());
    let code = client.control(frame.as_slice(), &mut reply);
    log::trace!("Response 0x{:04x}: {:04x?}", code, reply);

    if code != 0 {
        return Err(crate::Error::BusCommandFailed {
            command: frame.command(),
            code,
        });
    }
    Ok(reply)
}

/// Ensure a reply holds at least `required` words.
pub(crate) fn require_reply_length(
    command: Command,
    reply: &[u16],
    required: usize,
) -> Result<(), crate::Error> {
    if reply.len() < required {
        Err(crate::Error::MalformedResponse {
            command,
            length: reply.len(),
            required,
        })
    } else {
        Ok(())
    }
}
