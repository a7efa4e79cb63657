//! Bus master command constants

/// Reset driver (Axioline)
pub const AXIO_RESET_DRIVER: u16 = 0x1703;
/// Reset driver (Interbus)
pub const IBS_RESET_DRIVER: u16 = 0x1303;
/// Create configuration
pub const CREATE_CONFIGURATION: u16 = 0x0710;
/// Load process data mapping
pub const LOAD_PD_MAPPING: u16 = 0x0728;
/// Read configuration
pub const READ_CONFIGURATION: u16 = 0x030B;
/// Enable I/O data output
pub const ENABLE_IO_DATA_OUTPUT: u16 = 0x0701;
/// Read value (diagnostic variables)
pub const READ_VALUE: u16 = 0x0351;

/// Frame reference for "create configuration"
pub const FRAME_REFERENCE: u16 = 0x0001;

/// Address direction: both IN and OUT
pub const PD_MAPPING_DIRECTION_BOTH: u16 = 0x3000;
/// Communication relationship: 1st via PD RAM interface
pub const PD_MAPPING_CR_FIRST: u16 = 0x0001;
/// Mapping mode
pub const PD_MAPPING_MODE: u16 = 0x0021;

/// Read configuration attribute: device type
pub const ATTR_DEVICE_TYPE: u16 = 0x0001;
/// Read configuration attribute: device id
pub const ATTR_DEVICE_ID: u16 = 0x0002;
/// Read configuration attribute: process data length
pub const ATTR_PD_LENGTH: u16 = 0x0004;

/// Communication relationship for I/O data
pub const IO_DATA_CR: u16 = 0x0001;

/// Variable ID: diagnostic status register
pub const VAR_DIAG_STATUS: u16 = 0x0104;

/// Reply word holding the "more follows" indication
pub const REPLY_MORE_FOLLOWS: usize = 3;
/// Reply word holding the diagnostic status register
pub const REPLY_DIAG_STATUS: usize = 5;
/// Reply word holding the number of modules, followed by the module descriptors
pub const REPLY_MODULE_COUNT: usize = 7;
/// Words per module descriptor
pub const WORDS_PER_MODULE: usize = 4;

/// Capacity of a command frame in words
pub const FRAME_CAPACITY: usize = 100;
