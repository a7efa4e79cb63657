use crate::consts;
use crate::master::{self, BusMasterClient, Command, CommandTable};

bitflags::bitflags! {
    /// Diagnostic status register of the local bus master
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DiagnosticStatus: u16 {
        // const RESERVED =          0b00000000_00000001;
        const PERIPHERAL_FAULT =     0b00000000_00000010;
        const BUS_FAULT =            0b00000000_00000100;
        const CONTROLLER_FAULT =     0b00000000_00001000;
        // const RESERVED =          0b00000000_00010000;
        const RUN =                  0b00000000_00100000;
        const ACTIVE =               0b00000000_01000000;
        const READY =                0b00000000_10000000;
        const BUS_DISABLE =          0b00000001_00000000;
        // const RESERVED =          0b00000010_00000000;
        const FORCE_MODE =           0b00000100_00000000;
    }
}

impl DiagnosticStatus {
    /// Decode the raw register value; undefined bits are dropped.
    #[inline]
    pub fn from_word(word: u16) -> Self {
        Self::from_bits_truncate(word)
    }

    /// Error on a connected device (xPF)
    #[inline(always)]
    pub fn peripheral_fault(self) -> bool {
        self.contains(Self::PERIPHERAL_FAULT)
    }

    /// Error on the bus (xBus)
    #[inline(always)]
    pub fn bus_fault(self) -> bool {
        self.contains(Self::BUS_FAULT)
    }

    /// Error on the bus master itself (xCtrl)
    #[inline(always)]
    pub fn controller_fault(self) -> bool {
        self.contains(Self::CONTROLLER_FAULT)
    }

    /// Cyclic data exchange is running (xRun)
    #[inline(always)]
    pub fn run(self) -> bool {
        self.contains(Self::RUN)
    }

    /// Bus is configured and active (xActive)
    #[inline(always)]
    pub fn active(self) -> bool {
        self.contains(Self::ACTIVE)
    }

    /// Bus master is ready (xReady)
    #[inline(always)]
    pub fn ready(self) -> bool {
        self.contains(Self::READY)
    }

    /// Bus is disabled (xBD)
    #[inline(always)]
    pub fn bus_disable(self) -> bool {
        self.contains(Self::BUS_DISABLE)
    }

    /// Outputs are forced (xForce)
    #[inline(always)]
    pub fn force_mode(self) -> bool {
        self.contains(Self::FORCE_MODE)
    }
}

/// Read and decode the diagnostic status of the local bus master.
///
/// This never alters the bus state.
pub fn read_status<M: BusMasterClient + ?Sized>(
    client: &mut M,
    table: &CommandTable,
) -> Result<DiagnosticStatus, crate::Error> {
    log::debug!("Reading {} status...", table.transport());
    let reply = master::exchange(client, &table.read_diagnostic_status()).map_err(|e| {
        log::error!("{}", e);
        e
    })?;
    log::trace!("Size of received data: {}", reply.len());
    master::require_reply_length(
        Command::ReadDiagnosticStatus,
        &reply,
        consts::REPLY_DIAG_STATUS + 1,
    )?;

    let status = DiagnosticStatus::from_word(reply[consts::REPLY_DIAG_STATUS]);
    log::debug!("xPF = {}", status.peripheral_fault());
    log::debug!("xBus = {}", status.bus_fault());
    log::debug!("xCtrl = {}", status.controller_fault());
    log::debug!("xRun = {}", status.run());
    log::debug!("xActive = {}", status.active());
    log::debug!("xReady = {}", status.ready());
    log::debug!("xBD = {}", status.bus_disable());
    log::debug!("xForce = {}", status.force_mode());
    Ok(status)
}
