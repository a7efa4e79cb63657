use crate::consts;
use std::collections::BTreeMap;
use std::sync;

/// Response code the simulator uses for command codes it does not know.
pub const RESPONSE_UNKNOWN_COMMAND: u16 = 0x0901;

/// Confirmation codes echo the request code with the highest bit set.
const CONFIRMATION: u16 = 0x8000;

/// Diagnostic status bits reported by the simulator.
const STATUS_ACTIVE: u16 = 0x0040;
const STATUS_READY: u16 = 0x0080;
const STATUS_RUN: u16 = 0x0020;

/// One I/O module attached to the simulated local bus
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SimulatedModule {
    /// The four descriptor words reported by "read configuration".
    pub descriptor: [u16; 4],
}

impl SimulatedModule {
    pub fn new(device_type: u16, device_id: u16) -> Self {
        Self {
            descriptor: [device_type, device_id, 0x0000, 0x0000],
        }
    }
}

#[derive(Debug, Default)]
struct SimulatorState {
    modules: Vec<SimulatedModule>,
    /// Commands (by wire code) which are rejected with the given response code.
    failures: BTreeMap<u16, u16>,
    /// Replies (by wire code) which are cut off after the given number of words.
    truncated: BTreeMap<u16, usize>,
    more_follows: bool,
    status_override: Option<u16>,

    driver_reset: bool,
    configured: bool,
    mapped: bool,
    running: bool,

    /// Every frame received, trimmed to code, count and parameters.
    log: Vec<Vec<u16>>,
}

impl SimulatorState {
    fn status_word(&self) -> u16 {
        if let Some(status) = self.status_override {
            return status;
        }
        let mut status = 0;
        if self.driver_reset {
            status |= STATUS_READY;
        }
        if self.configured {
            status |= STATUS_ACTIVE;
        }
        if self.running {
            status |= STATUS_RUN;
        }
        status
    }

    fn control(&mut self, send: &[u16], reply: &mut Vec<u16>) -> u16 {
        let code = send.first().copied().unwrap_or(0);
        let count = send.get(1).copied().map(usize::from).unwrap_or(0);
        let parameters = send.get(2..2 + count).unwrap_or(&[]);
        let mut logged = vec![code, count as u16];
        logged.extend_from_slice(parameters);
        self.log.push(logged);

        if let Some(response) = self.failures.get(&code) {
            log::trace!("Simulated bus master rejects 0x{:04x}", code);
            return *response;
        }

        let response = match code {
            consts::AXIO_RESET_DRIVER | consts::IBS_RESET_DRIVER => {
                self.driver_reset = true;
                self.configured = false;
                self.mapped = false;
                self.running = false;
                0
            }
            consts::CREATE_CONFIGURATION => {
                self.configured = true;
                0
            }
            consts::LOAD_PD_MAPPING => {
                self.mapped = true;
                0
            }
            consts::READ_CONFIGURATION => {
                let attributes = parameters.first().copied().unwrap_or(0);
                reply.extend_from_slice(&[
                    code | CONFIRMATION,
                    0x0000,
                    0x0000,
                    u16::from(self.more_follows),
                    attributes,
                    0x0000,
                    0x0000,
                    u16::try_from(self.modules.len()).unwrap_or(u16::MAX),
                ]);
                for module in self.modules.iter() {
                    reply.extend_from_slice(&module.descriptor);
                }
                reply[1] = u16::try_from(reply.len() - 2).unwrap_or(u16::MAX);
                0
            }
            consts::ENABLE_IO_DATA_OUTPUT => {
                self.running = true;
                0
            }
            consts::READ_VALUE => {
                reply.extend_from_slice(&[
                    code | CONFIRMATION,
                    0x0004,
                    0x0000,
                    0x0001,
                    consts::VAR_DIAG_STATUS,
                    self.status_word(),
                ]);
                0
            }
            _ => RESPONSE_UNKNOWN_COMMAND,
        };

        if let Some(length) = self.truncated.get(&code) {
            reply.truncate(*length);
        }
        response
    }
}

/// In-process bus master for tests and dry runs
///
/// All duplicates of a simulator share the same state, so one handle can be moved into a
/// [`Conductor`][`crate::conductor::Conductor`] while another one is used to inject faults and
/// inspect the commands that were sent.
#[derive(Debug, Clone)]
pub struct SimulatorMaster {
    state: sync::Arc<sync::Mutex<SimulatorState>>,
}

impl SimulatorMaster {
    /// Create a simulator with `modules` generic I/O modules attached.
    pub fn new(modules: u16) -> Self {
        Self::with_modules(
            (0..modules)
                .map(|i| SimulatedModule::new(0x0100 + i, 0x2000 + i))
                .collect(),
        )
    }

    pub fn with_modules(modules: Vec<SimulatedModule>) -> Self {
        Self {
            state: sync::Arc::new(sync::Mutex::new(SimulatorState {
                modules,
                ..Default::default()
            })),
        }
    }

    /// Another handle to the same simulated bus master.
    pub fn duplicate(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }

    fn lock(&self) -> sync::MutexGuard<'_, SimulatorState> {
        // A panic while holding the lock can only come from a failed test.
        self.state.lock().unwrap_or_else(sync::PoisonError::into_inner)
    }

    /// Reject every command with the given wire code using `response`.
    pub fn fail_command(&self, code: u16, response: u16) {
        self.lock().failures.insert(code, response);
    }

    /// Stop rejecting commands.
    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Cut off replies to the given wire code after `length` words.
    pub fn truncate_reply(&self, code: u16, length: usize) {
        self.lock().truncated.insert(code, length);
    }

    pub fn set_more_follows(&self, more_follows: bool) {
        self.lock().more_follows = more_follows;
    }

    /// Report a fixed diagnostic status word instead of the simulated one.
    pub fn set_status(&self, status: u16) {
        self.lock().status_override = Some(status);
    }

    pub fn set_modules(&self, modules: Vec<SimulatedModule>) {
        self.lock().modules = modules;
    }

    pub fn modules(&self) -> Vec<SimulatedModule> {
        self.lock().modules.clone()
    }

    /// Whether cyclic data output was enabled since the last driver reset.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// All frames received so far, trimmed to code, count and parameters.
    pub fn sent_frames(&self) -> Vec<Vec<u16>> {
        self.lock().log.clone()
    }

    /// Wire codes of all commands received so far.
    pub fn sent_codes(&self) -> Vec<u16> {
        self.lock().log.iter().map(|f| f[0]).collect()
    }

    pub fn clear_log(&self) {
        self.lock().log.clear();
    }
}

impl crate::master::BusMasterClient for SimulatorMaster {
    fn control(&mut self, send: &[u16], reply: &mut Vec<u16>) -> u16 {
        self.lock().control(send, reply)
    }
}
