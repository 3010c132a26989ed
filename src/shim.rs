//! The integration shim (§4.8): the thin layer between the host's table
//! registry / event reporter / performance log and the core VM, which
//! otherwise knows nothing about any of them.
//!
//! The core (`crate::run`) only needs an [`EventSink`] and a byte slice. A
//! real flight-software build has its own table registry and performance
//! log types; this module stands in for them with small abstract traits so
//! the registration and timing behavior can be exercised without linking
//! against those collaborators.

use crate::output::EventSink;
use crate::program::{Program, StringTable};
use crate::status::Status;

/// A host table registry slot: the validator reads `(image_ptr, image_size)`
/// at invocation, never before and never copying it (§5 "Shared resources").
pub trait TableRegistry {
    /// Registers `callback` to run whenever the host re-validates the table
    /// named `table_id`.
    fn register(&mut self, table_id: &'static str, callback: ValidatorCallback);
}

/// A validator callback, as the host table registry invokes it: pointer and
/// length only, matching the host's own C-like table service contract.
pub type ValidatorCallback = fn(image: &[u8]) -> Status;

/// Abstract performance marker hooks (`perf_enter`/`perf_exit` in the
/// reference tooling). A no-op implementation is fine for hosts without a
/// performance log; [`LoggingPerfLog`] gives one grounded in `log`.
pub trait PerfLog {
    fn perf_enter(&mut self, id: u32);
    fn perf_exit(&mut self, id: u32);
}

/// A [`PerfLog`] that reports entry/exit at debug level instead of writing
/// to a real performance log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingPerfLog;

impl PerfLog for LoggingPerfLog {
    fn perf_enter(&mut self, id: u32) {
        log::debug!("perf marker {id:#06x}: enter");
    }

    fn perf_exit(&mut self, id: u32) {
        log::debug!("perf marker {id:#06x}: exit");
    }
}

/// The host's two success/failure result codes, named the way a table
/// services layer names them rather than after the VM's own `Status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableServicesStatus {
    Success,
    Invalid,
}

/// Translates a VM run's [`Status`] to the host's table-services result
/// code: `HaltTrue` alone is success, `HaltFalse` and every fault are
/// invalid (§4.8).
pub fn to_table_services_status(status: Status) -> TableServicesStatus {
    if status.is_halt_true() {
        TableServicesStatus::Success
    } else {
        TableServicesStatus::Invalid
    }
}

/// Wraps one validator program/string-table pair with the perf-marker
/// bracketing §4.8 requires, ready to hand to a [`TableRegistry`] as a
/// [`ValidatorCallback`]-shaped closure.
///
/// The VM entry point itself is `crate::run`, which additionally takes a
/// sink (§5's `run(program, image, strings, sink)`); this shim owns that
/// sink and the perf id so the registered callback can be a bare function
/// pointer at the registry boundary.
pub struct ValidatorEntry<'p, 's, S, P> {
    program: &'p Program,
    strings: &'s [&'s str],
    perf_id: u32,
    sink: S,
    perf_log: P,
}

impl<'p, 's, S, P> ValidatorEntry<'p, 's, S, P>
where
    S: EventSink,
    P: PerfLog,
{
    pub fn new(program: &'p Program, strings: &'s [&'s str], perf_id: u32, sink: S, perf_log: P) -> Self {
        Self { program, strings, perf_id, sink, perf_log }
    }

    /// Runs the validator over `image`, bracketed by perf markers, and
    /// translates the result to the host's table-services code.
    pub fn invoke(&mut self, image: &[u8]) -> TableServicesStatus {
        self.perf_log.perf_enter(self.perf_id);
        let string_table = StringTable::new(self.strings);
        let mut engine = crate::ExecutionEngine::new(self.program, image, string_table);
        let jump_table = crate::JumpTable::new();
        let status = engine.execute(&jump_table, &mut self.sink);
        self.perf_log.perf_exit(self.perf_id);
        to_table_services_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[derive(Default)]
    struct NullPerfLog;
    impl PerfLog for NullPerfLog {
        fn perf_enter(&mut self, _id: u32) {}
        fn perf_exit(&mut self, _id: u32) {}
    }

    #[test]
    fn halt_true_maps_to_success() {
        assert_eq!(to_table_services_status(Status::HaltTrue), TableServicesStatus::Success);
    }

    #[test]
    fn halt_false_and_faults_map_to_invalid() {
        assert_eq!(to_table_services_status(Status::HaltFalse), TableServicesStatus::Invalid);
        assert_eq!(to_table_services_status(Status::NoProgram), TableServicesStatus::Invalid);
        assert_eq!(to_table_services_status(Status::InterpreterBug), TableServicesStatus::Invalid);
    }

    #[test]
    fn validator_entry_runs_the_program_and_reports_perf_markers() {
        let program = crate::validator::build_program();
        let image = [0u8; crate::validator::IMAGE_LEN];
        let mut events = Vec::new();
        let sink = move |event_id: u32, severity: u32, line: &[u8]| {
            events.push((event_id, severity, line.to_vec()));
        };
        let mut entry = ValidatorEntry::new(&program, &crate::validator::STRINGS, 0x42, sink, NullPerfLog);
        let result = entry.invoke(&image);
        assert_eq!(result, TableServicesStatus::Success);
    }
}
