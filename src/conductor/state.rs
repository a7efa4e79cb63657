/// State of the local bus as established by the bring-up sequences
///
/// Only the sequencers mutate this.  `running` always implies `configured`.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct BusState {
    /// The last configuration attempt succeeded.
    pub configured: bool,
    /// Cyclic I/O data output is enabled.
    pub running: bool,
    /// Number of I/O modules detected by the last successful configuration.
    pub detected_modules: u16,
    /// Cause of the last failed sequence, if the last sequence failed.
    pub last_error: Option<crate::ErrorKind>,
}

impl BusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful configuration.
    pub(crate) fn commit_configured(&mut self, modules: u16) {
        self.configured = true;
        self.running = false;
        self.detected_modules = modules;
        self.last_error = None;
    }

    /// Drop back to the unconfigured state after a failed configuration.
    pub(crate) fn fail_configuration(&mut self, error: &crate::Error) {
        self.configured = false;
        self.running = false;
        self.detected_modules = 0;
        self.last_error = Some(error.kind());
    }

    pub(crate) fn commit_running(&mut self) {
        debug_assert!(self.configured, "running without configuration");
        self.running = true;
        self.last_error = None;
    }

    pub(crate) fn fail_startup(&mut self, error: &crate::Error) {
        self.running = false;
        self.last_error = Some(error.kind());
    }

    /// Whether the `running` implies `configured` invariant holds.
    #[inline(always)]
    pub fn is_consistent(&self) -> bool {
        !self.running || self.configured
    }
}
