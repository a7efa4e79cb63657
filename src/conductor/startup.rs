use crate::conductor::{BusState, Parameters};
use crate::master::{self, BusMasterClient, CommandTable, MappingPlacement};

/// Run the startup sequence and commit its outcome to `state`.
///
/// Refuses with [`Error::NotConfigured`][`crate::Error::NotConfigured`] without touching the bus
/// when the local bus is not configured.
///
/// Success is declared from the response code of "enable data output" alone.  The RUN flag of
/// the diagnostic status is not checked.
pub fn start_io<M: BusMasterClient + ?Sized>(
    client: &mut M,
    table: &CommandTable,
    p: &Parameters,
    state: &mut BusState,
) -> Result<(), crate::Error> {
    if !state.configured {
        return Err(crate::Error::NotConfigured);
    }

    match run_startup(client, table, p) {
        Ok(()) => {
            state.commit_running();
            Ok(())
        }
        Err(e) => {
            log::error!("{}", e);
            state.fail_startup(&e);
            Err(e)
        }
    }
}

fn run_startup<M: BusMasterClient + ?Sized>(
    client: &mut M,
    table: &CommandTable,
    p: &Parameters,
) -> Result<(), crate::Error> {
    if p.mapping_placement(table.transport()) == MappingPlacement::Startup {
        crate::conductor::configure::load_process_data_mapping(client, table)?;
    }

    log::info!("Enabling I/O data output...");
    master::exchange(client, &table.enable_io_data_output())?;
    log::info!("Done enabling data output.");

    Ok(())
}
