use crate::conductor::{BusState, Parameters};
use crate::consts;
use crate::master::{self, BusMasterClient, Command, CommandTable, MappingPlacement};

/// Result of a successful configuration sequence
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DetectedConfiguration {
    /// Number of I/O modules found on the local bus.
    pub modules: u16,
    /// Raw reply of the "read configuration" command.
    pub reply: Vec<u16>,
}

/// Run the configuration sequence and commit its outcome to `state`.
///
/// The sequence resets the driver, creates a configuration, loads the process data mapping (if
/// placed here for this transport), reads back the detected configuration and, when `validate`
/// is set, compares it against the topology description from the parameters.
pub fn configure<M: BusMasterClient + ?Sized>(
    client: &mut M,
    table: &CommandTable,
    p: &Parameters,
    validate: bool,
    state: &mut BusState,
) -> Result<DetectedConfiguration, crate::Error> {
    state.running = false;
    match run_configuration(client, table, p, validate) {
        Ok(detected) => {
            log::info!(
                "Local I/O configured, {} modules detected.",
                detected.modules
            );
            state.commit_configured(detected.modules);
            Ok(detected)
        }
        Err(e) => {
            log::error!("{}", e);
            state.fail_configuration(&e);
            Err(e)
        }
    }
}

fn run_configuration<M: BusMasterClient + ?Sized>(
    client: &mut M,
    table: &CommandTable,
    p: &Parameters,
    validate: bool,
) -> Result<DetectedConfiguration, crate::Error> {
    log::info!("Resetting local I/O driver...");
    master::exchange(client, &table.reset_driver())?;
    log::info!("Done resetting driver.");

    log::info!("Creating local I/O configuration...");
    master::exchange(client, &table.create_configuration())?;
    log::info!("Done creating configuration.");

    if p.mapping_placement(table.transport()) == MappingPlacement::Configure {
        load_process_data_mapping(client, table)?;
    }

    log::info!("Reading local I/O configuration...");
    let reply = master::exchange(client, &table.read_configuration(p.read_pd_length))?;
    master::require_reply_length(
        Command::ReadConfiguration,
        &reply,
        consts::REPLY_MODULE_COUNT + 1,
    )?;
    log::info!("Done reading local I/O configuration.");

    if reply[consts::REPLY_MORE_FOLLOWS] != 0 {
        // Continuation frames are never requested; only the first frame is evaluated.
        log::warn!("More modules follow than fit into one reply; evaluating the first reply only.");
    }

    let modules = reply[consts::REPLY_MODULE_COUNT];
    log::debug!("Detected {} modules: {:04x?}", modules, &reply[consts::REPLY_MODULE_COUNT..]);

    if validate {
        log::info!("Validating local I/O configuration against {:?}...", p.topology_path);
        crate::conductor::topology::validate_file(&p.topology_path, &reply, modules)?;
        log::info!("Local I/O configuration matches the topology description.");
    }

    Ok(DetectedConfiguration { modules, reply })
}

/// Map module process data into the controller's memory image.
pub(crate) fn load_process_data_mapping<M: BusMasterClient + ?Sized>(
    client: &mut M,
    table: &CommandTable,
) -> Result<(), crate::Error> {
    log::info!("Loading local I/O process data mapping...");
    master::exchange(client, &table.load_process_data_mapping())?;
    log::info!("Done loading process data mapping.");
    Ok(())
}
