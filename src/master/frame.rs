use crate::consts;
use crate::BusTransport;
use core::fmt;

/// Logical bus master operations
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Command {
    ResetDriver,
    CreateConfiguration,
    LoadProcessDataMapping,
    ReadConfiguration,
    EnableIoDataOutput,
    ReadDiagnosticStatus,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::ResetDriver,
        Command::CreateConfiguration,
        Command::LoadProcessDataMapping,
        Command::ReadConfiguration,
        Command::EnableIoDataOutput,
        Command::ReadDiagnosticStatus,
    ];
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Command::ResetDriver => "Reset driver",
            Command::CreateConfiguration => "Create configuration",
            Command::LoadProcessDataMapping => "Load process data mapping",
            Command::ReadConfiguration => "Read local I/O configuration",
            Command::EnableIoDataOutput => "Enable data output",
            Command::ReadDiagnosticStatus => "Read local I/O status",
        })
    }
}

/// Where the "load process data mapping" step is issued during bring-up
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum MappingPlacement {
    /// As part of the configuration sequence, between "create" and "read" configuration.
    #[default]
    Configure,
    /// As the first step of the startup sequence, before enabling data output.
    Startup,
    /// Never; the bus master maps process data on its own.
    Skip,
}

/// Translation of logical commands into wire codes for one transport
///
/// Both transports share the calling convention, but not all command codes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CommandTable {
    transport: BusTransport,
    reset_driver: u16,
}

impl CommandTable {
    pub fn for_transport(transport: BusTransport) -> Self {
        let reset_driver = match transport {
            BusTransport::Axioline => consts::AXIO_RESET_DRIVER,
            BusTransport::Interbus => consts::IBS_RESET_DRIVER,
        };
        Self {
            transport,
            reset_driver,
        }
    }

    /// Override the reset driver code.
    ///
    /// Firmware revisions disagree on this code, so it must match the actual field device.
    pub fn with_reset_code(mut self, code: u16) -> Self {
        self.reset_driver = code;
        self
    }

    #[inline(always)]
    pub fn transport(&self) -> BusTransport {
        self.transport
    }

    /// Wire code of a logical command.
    pub fn code(&self, command: Command) -> u16 {
        match command {
            Command::ResetDriver => self.reset_driver,
            Command::CreateConfiguration => consts::CREATE_CONFIGURATION,
            Command::LoadProcessDataMapping => consts::LOAD_PD_MAPPING,
            Command::ReadConfiguration => consts::READ_CONFIGURATION,
            Command::EnableIoDataOutput => consts::ENABLE_IO_DATA_OUTPUT,
            Command::ReadDiagnosticStatus => consts::READ_VALUE,
        }
    }

    /// Reverse lookup of a wire code.
    pub fn command(&self, code: u16) -> Option<Command> {
        Command::ALL.into_iter().find(|c| self.code(*c) == code)
    }

    pub fn reset_driver(&self) -> CommandFrame {
        CommandFrame::new(self.code(Command::ResetDriver), Command::ResetDriver, &[])
    }

    pub fn create_configuration(&self) -> CommandFrame {
        CommandFrame::new(
            self.code(Command::CreateConfiguration),
            Command::CreateConfiguration,
            &[consts::FRAME_REFERENCE],
        )
    }

    pub fn load_process_data_mapping(&self) -> CommandFrame {
        CommandFrame::new(
            self.code(Command::LoadProcessDataMapping),
            Command::LoadProcessDataMapping,
            &[
                consts::PD_MAPPING_DIRECTION_BOTH,
                consts::PD_MAPPING_CR_FIRST,
                consts::PD_MAPPING_MODE,
                0x0000, // reserved
            ],
        )
    }

    /// Read the configuration with device type and device id attributes, and optionally the
    /// process data length.
    pub fn read_configuration(&self, pd_length: bool) -> CommandFrame {
        let mut attributes = consts::ATTR_DEVICE_TYPE | consts::ATTR_DEVICE_ID;
        if pd_length {
            attributes |= consts::ATTR_PD_LENGTH;
        }
        CommandFrame::new(
            self.code(Command::ReadConfiguration),
            Command::ReadConfiguration,
            &[attributes],
        )
    }

    pub fn enable_io_data_output(&self) -> CommandFrame {
        CommandFrame::new(
            self.code(Command::EnableIoDataOutput),
            Command::EnableIoDataOutput,
            &[consts::IO_DATA_CR],
        )
    }

    pub fn read_diagnostic_status(&self) -> CommandFrame {
        CommandFrame::new(
            self.code(Command::ReadDiagnosticStatus),
            Command::ReadDiagnosticStatus,
            &[0x0001, consts::VAR_DIAG_STATUS],
        )
    }
}

/// Fixed format command frame
///
/// Word 0 is the command code, word 1 the parameter count and the remaining words are the
/// parameters.  Unused words are zero.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandFrame {
    command: Command,
    words: [u16; consts::FRAME_CAPACITY],
}

impl CommandFrame {
    /// Build a new frame.
    ///
    /// # Panics
    /// Panics when the parameters do not fit into the frame.
    pub fn new(code: u16, command: Command, parameters: &[u16]) -> Self {
        assert!(
            parameters.len() <= consts::FRAME_CAPACITY - 2,
            "too many parameters for a command frame"
        );
        let mut words = [0u16; consts::FRAME_CAPACITY];
        words[0] = code;
        words[1] = parameters.len() as u16;
        words[2..2 + parameters.len()].copy_from_slice(parameters);
        Self { command, words }
    }

    #[inline(always)]
    pub fn command(&self) -> Command {
        self.command
    }

    #[inline(always)]
    pub fn code(&self) -> u16 {
        self.words[0]
    }

    #[inline(always)]
    pub fn parameter_count(&self) -> usize {
        usize::from(self.words[1])
    }

    pub fn parameters(&self) -> &[u16] {
        &self.words[2..2 + self.parameter_count()]
    }

    /// Code, count and parameters, without the unused tail of the frame.
    pub fn as_words(&self) -> &[u16] {
        &self.words[..2 + self.parameter_count()]
    }

    /// The full frame as handed to the bus master.
    pub fn as_slice(&self) -> &[u16] {
        &self.words[..]
    }
}

impl fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandFrame")
            .field("command", &self.command)
            .field("code", &format_args!("0x{:04x}", self.code()))
            .field("parameters", &format_args!("{:04x?}", self.parameters()))
            .finish()
    }
}
