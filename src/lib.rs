//! # `busconductor` - Local bus bring-up for Axioline and Interbus masters
//!
//! _busconductor_ drives the configuration and startup handshake of a local fieldbus master from a
//! cyclically executed control task.  It is structured in two layers:
//!
//! - The [`master`] module abstracts the bus master service.  Commands are encoded into fixed
//!   format [`CommandFrame`][`master::CommandFrame`]s and exchanged with a
//!   [`BusMasterClient`][`master::BusMasterClient`].
//! - The [`conductor`] module implements the bring-up sequences (configure, start, status) and
//!   the edge-triggered request handling that invokes them from a periodic tick.
//!
//! # Example
//! ```no_run
//! use busconductor::{conductor, master};
//!
//! // Pick whichever bus master service is available:
//! // ================================================
//! let services = master::BusMasterServices {
//!     axioline: Some(master::SimulatorMaster::new(4)),
//!     interbus: None::<master::SimulatorMaster>,
//! };
//! let (transport, client) = services.select().unwrap();
//!
//! // Parameterize the conductor:
//! // ===========================
//! let mut conductor = conductor::Conductor::new(
//!     client,
//!     transport,
//!     conductor::ParametersBuilder::new()
//!         .topology_path("/opt/plcnext/projects/BusConductor/config.txt")
//!         .build(),
//! );
//!
//! // Control Task Cycle
//! // ==================
//! loop {
//!     let inputs = conductor::Inputs {
//!         config_req: true,
//!         config_must_match: false,
//!         start_io_req: true,
//!     };
//!     let outputs = conductor.tick(inputs);
//!     println!("Outputs: {:?}", outputs);
//!
//!     std::thread::sleep(conductor.parameters().tick_period);
//! }
//! ```

mod consts;
pub mod conductor;
mod error;
pub mod master;

#[cfg(test)]
pub mod test_utils;

pub use error::{Error, ErrorKind};

/// Physical bus technology of the local bus master
///
/// The transport is selected once when the bus master service is acquired and never changes
/// afterwards.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum BusTransport {
    /// Axioline local bus
    Axioline,
    /// Interbus (remote or local)
    Interbus,
}

impl BusTransport {
    /// Human readable name of the bus technology.
    pub fn name(self) -> &'static str {
        match self {
            BusTransport::Axioline => "Axioline",
            BusTransport::Interbus => "Interbus",
        }
    }
}

impl core::fmt::Display for BusTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for BusTransport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "axioline" | "axio" => Ok(BusTransport::Axioline),
            "interbus" | "ibs" => Ok(BusTransport::Interbus),
            _ => Err(Error::UnknownTransport(s.to_owned())),
        }
    }
}
