use crate::master::{CommandTable, MappingPlacement};
use crate::BusTransport;

/// Conductor parameters
///
/// These parameters configure the bring-up sequences of the conductor.
///
/// # Example
/// ```
/// use busconductor::{conductor, master};
///
/// let param = conductor::Parameters {
///     axioline_mapping: master::MappingPlacement::Startup,
///     .. Default::default()
/// };
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Parameters {
    /// Path of the expected topology description
    pub topology_path: std::path::PathBuf,
    /// Also request the process data length when reading the configuration
    pub read_pd_length: bool,
    /// Placement of the process data mapping step on Axioline
    pub axioline_mapping: MappingPlacement,
    /// Placement of the process data mapping step on Interbus
    pub interbus_mapping: MappingPlacement,
    /// Reset driver code overriding the transport's default
    pub reset_code: Option<u16>,
    /// Period at which the control task should call [`Conductor::tick()`][`crate::conductor::Conductor::tick`]
    pub tick_period: std::time::Duration,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            topology_path: "/opt/plcnext/projects/BusConductor/config.txt".into(),
            read_pd_length: false,
            axioline_mapping: MappingPlacement::Configure,
            interbus_mapping: MappingPlacement::Configure,
            reset_code: None,
            tick_period: std::time::Duration::from_millis(1000),
        }
    }
}

impl Parameters {
    pub fn mapping_placement(&self, transport: BusTransport) -> MappingPlacement {
        match transport {
            BusTransport::Axioline => self.axioline_mapping,
            BusTransport::Interbus => self.interbus_mapping,
        }
    }

    /// Command code table for the given transport, with the reset code override applied.
    pub fn command_table(&self, transport: BusTransport) -> CommandTable {
        let table = CommandTable::for_transport(transport);
        match self.reset_code {
            Some(code) => table.with_reset_code(code),
            None => table,
        }
    }
}

pub struct ParametersBuilder(Parameters);

impl ParametersBuilder {
    #[inline]
    pub fn new() -> Self {
        Self(Default::default())
    }

    #[inline]
    pub fn topology_path<P: Into<std::path::PathBuf>>(&mut self, path: P) -> &mut Self {
        self.0.topology_path = path.into();
        self
    }

    #[inline]
    pub fn read_pd_length(&mut self, read_pd_length: bool) -> &mut Self {
        self.0.read_pd_length = read_pd_length;
        self
    }

    #[inline]
    pub fn mapping_placement(
        &mut self,
        transport: BusTransport,
        placement: MappingPlacement,
    ) -> &mut Self {
        match transport {
            BusTransport::Axioline => self.0.axioline_mapping = placement,
            BusTransport::Interbus => self.0.interbus_mapping = placement,
        }
        self
    }

    #[inline]
    pub fn reset_code(&mut self, code: u16) -> &mut Self {
        self.0.reset_code = Some(code);
        self
    }

    #[inline]
    pub fn tick_period(&mut self, period: std::time::Duration) -> &mut Self {
        self.0.tick_period = period;
        self
    }

    pub fn build(&self) -> Parameters {
        self.0.clone()
    }
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}
