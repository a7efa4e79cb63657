use crate::master::BusMasterClient;
use crate::BusTransport;

/// The bus master services offered by the host runtime
///
/// At most one of them is expected to be present, depending on which local bus the controller
/// is equipped with.
#[derive(Debug)]
pub struct BusMasterServices<A, B> {
    pub axioline: Option<A>,
    pub interbus: Option<B>,
}

impl<A, B> Default for BusMasterServices<A, B> {
    fn default() -> Self {
        Self {
            axioline: None,
            interbus: None,
        }
    }
}

/// The bus master service that was selected at startup
#[derive(Debug)]
pub enum SelectedMaster<A, B> {
    Axioline(A),
    Interbus(B),
}

impl<A, B> SelectedMaster<A, B> {
    pub fn transport(&self) -> BusTransport {
        match self {
            SelectedMaster::Axioline(_) => BusTransport::Axioline,
            SelectedMaster::Interbus(_) => BusTransport::Interbus,
        }
    }
}

impl<A: BusMasterClient, B: BusMasterClient> BusMasterClient for SelectedMaster<A, B> {
    fn control(&mut self, send: &[u16], reply: &mut Vec<u16>) -> u16 {
        match self {
            SelectedMaster::Axioline(m) => m.control(send, reply),
            SelectedMaster::Interbus(m) => m.control(send, reply),
        }
    }
}

impl<A: BusMasterClient, B: BusMasterClient> BusMasterServices<A, B> {
    /// Select the available bus master service.
    ///
    /// The Axioline master is preferred when, against expectations, both are present.
    pub fn select(self) -> Result<(BusTransport, SelectedMaster<A, B>), crate::Error> {
        let selected = if let Some(axioline) = self.axioline {
            log::info!("Subscribed to Axioline Master Service.");
            SelectedMaster::Axioline(axioline)
        } else if let Some(interbus) = self.interbus {
            log::info!("Subscribed to Interbus Master Service.");
            SelectedMaster::Interbus(interbus)
        } else {
            log::error!("Cannot subscribe to either Axioline or Interbus service.");
            return Err(crate::Error::NoBusMaster);
        };
        Ok((selected.transport(), selected))
    }
}
