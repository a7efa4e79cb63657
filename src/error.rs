use crate::master::Command;

/// Errors of the bus bring-up sequences
///
/// Every error is local to one sequencer invocation.  The sequence is aborted, the bus state is
/// left at its safe value and the next request edge starts over.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bus master rejected a command with a non-zero response code.
    #[error("{command} failed. Response = 0x{code:04x}")]
    BusCommandFailed { command: Command, code: u16 },

    /// The reply to a command is too short to contain the required words.
    #[error("{command} failed. Response message too short ({length} < {required} words)")]
    MalformedResponse {
        command: Command,
        length: usize,
        required: usize,
    },

    /// A line of the topology description does not match the detected configuration.
    #[error("Line {line} in topology description ({expected}) does not match actual configuration ({actual})")]
    TopologyMismatch {
        line: usize,
        expected: String,
        actual: u16,
    },

    /// The topology description contains an empty line.
    #[error("Topology description must not contain empty lines, but line {line} is empty")]
    TopologyEmptyLine { line: usize },

    /// A line of the topology description is not a 16-bit decimal number.
    #[error("Line {line} in topology description ({token}) is not a valid entry")]
    TopologyInvalidEntry { line: usize, token: String },

    /// The topology description could not be opened or read.
    #[error("Cannot read topology description {path:?}")]
    TopologyDescriptionUnreadable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The topology description could not be created or written.
    #[error("Cannot write topology description {path:?}")]
    TopologyDescriptionUnwritable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The topology description has the wrong number of entries.
    #[error("Expected {expected} entries in topology description; found {found}")]
    TopologyLineCountMismatch { expected: usize, found: usize },

    /// I/O was requested to start before a successful configuration.
    #[error("Local I/O must be configured before attempting to start the bus")]
    NotConfigured,

    /// Neither of the bus master services is available.
    #[error("Cannot subscribe to either Axioline or Interbus service")]
    NoBusMaster,

    /// Unknown bus technology name.
    #[error("Unknown bus transport {0:?}")]
    UnknownTransport(String),
}

/// Kind of an [`Error`], without any of its payload
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ErrorKind {
    /// See [`Error::BusCommandFailed`]
    BusCommandFailed,
    /// See [`Error::MalformedResponse`]
    MalformedResponse,
    /// See [`Error::TopologyMismatch`]
    TopologyMismatch,
    /// See [`Error::TopologyEmptyLine`]
    TopologyEmptyLine,
    /// See [`Error::TopologyInvalidEntry`]
    TopologyInvalidEntry,
    /// See [`Error::TopologyDescriptionUnreadable`]
    TopologyDescriptionUnreadable,
    /// See [`Error::TopologyDescriptionUnwritable`]
    TopologyDescriptionUnwritable,
    /// See [`Error::TopologyLineCountMismatch`]
    TopologyLineCountMismatch,
    /// See [`Error::NotConfigured`]
    NotConfigured,
    /// See [`Error::NoBusMaster`]
    NoBusMaster,
    /// See [`Error::UnknownTransport`]
    UnknownTransport,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BusCommandFailed { .. } => ErrorKind::BusCommandFailed,
            Error::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Error::TopologyMismatch { .. } => ErrorKind::TopologyMismatch,
            Error::TopologyEmptyLine { .. } => ErrorKind::TopologyEmptyLine,
            Error::TopologyInvalidEntry { .. } => ErrorKind::TopologyInvalidEntry,
            Error::TopologyDescriptionUnreadable { .. } => ErrorKind::TopologyDescriptionUnreadable,
            Error::TopologyDescriptionUnwritable { .. } => ErrorKind::TopologyDescriptionUnwritable,
            Error::TopologyLineCountMismatch { .. } => ErrorKind::TopologyLineCountMismatch,
            Error::NotConfigured => ErrorKind::NotConfigured,
            Error::NoBusMaster => ErrorKind::NoBusMaster,
            Error::UnknownTransport(_) => ErrorKind::UnknownTransport,
        }
    }

    /// Response code reported by the bus master, if this error stems from a rejected command.
    pub fn response_code(&self) -> Option<u16> {
        match self {
            Error::BusCommandFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}
