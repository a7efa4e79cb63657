use busconductor::conductor::{self, ExpectedTopology};
use busconductor::master::{self, MappingPlacement};
use busconductor::BusTransport;
use console::style;
use gumdrop::Options;

#[derive(Debug, Options)]
struct BcToolOptions {
    help: bool,

    #[options(command)]
    command: Option<BcToolCommand>,
}

#[derive(Debug, Options)]
enum BcToolCommand {
    /// Parse a topology description and show its contents.
    Check(CheckOptions),
    /// Decode a diagnostic status register value.
    DecodeStatus(DecodeStatusOptions),
    /// Run the bring-up sequence against a simulated bus master.
    Simulate(SimulateOptions),
    /// Write the topology description matching a simulated bus.
    Teach(TeachOptions),
}

#[derive(Debug, Options)]
struct CheckOptions {
    help: bool,

    /// Path to the topology description.
    #[options(free, required)]
    path: std::path::PathBuf,
}

#[derive(Debug, Options)]
struct DecodeStatusOptions {
    help: bool,

    /// Register value, decimal or 0x-prefixed hexadecimal.
    #[options(free, required)]
    word: String,
}

#[derive(Debug, Options)]
struct SimulateOptions {
    help: bool,

    /// Bus technology (axioline or interbus).
    #[options(default = "axioline")]
    transport: String,

    /// Number of simulated I/O modules.
    #[options(default = "4")]
    modules: u16,

    /// Number of control task ticks to run.
    #[options(no_short, default = "4")]
    ticks: u32,

    /// Tick period in milliseconds.
    #[options(default = "1000")]
    period_ms: u64,

    /// Validate against this topology description while configuring.
    #[options(no_short)]
    topology: Option<std::path::PathBuf>,

    /// Placement of the process data mapping step (configure, startup or skip).
    #[options(no_short, default = "configure")]
    mapping: String,
}

#[derive(Debug, Options)]
struct TeachOptions {
    help: bool,

    /// Number of simulated I/O modules.
    #[options(default = "4")]
    modules: u16,

    /// Path of the topology description to write.
    #[options(free, required)]
    out: std::path::PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = BcToolOptions::parse_args_default_or_exit();
    let res = match args.command {
        Some(BcToolCommand::Check(args)) => run_check(&args),
        Some(BcToolCommand::DecodeStatus(args)) => run_decode_status(&args),
        Some(BcToolCommand::Simulate(args)) => run_simulate(&args),
        Some(BcToolCommand::Teach(args)) => run_teach(&args),
        None => {
            eprintln!("No subcommand specified, try --help.");
            std::process::exit(1);
        }
    };

    if let Err(e) = res {
        eprintln!("{} {}", style("error:").red().bold(), e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run_check(args: &CheckOptions) -> Result<(), busconductor::Error> {
    let topology = ExpectedTopology::from_file(&args.path)?;

    let Some(count) = topology.module_count() else {
        println!("{}", style("Topology description is empty.").yellow());
        return Ok(());
    };

    println!("{}", style(format!("Modules: {}", count)).bold());
    for (i, module) in topology.modules().enumerate() {
        println!("  #{:<3} {:?}", i + 1, module);
    }

    if topology.is_complete() {
        println!("{}", style("Description is complete.").green());
    } else {
        println!(
            "{}",
            style(format!(
                "Expected {} entries for {} modules; found {}",
                conductor::topology::expected_lines(count),
                count,
                topology.tokens().len()
            ))
            .red()
        );
    }
    Ok(())
}

fn parse_word(s: &str) -> Option<u16> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn run_decode_status(args: &DecodeStatusOptions) -> Result<(), busconductor::Error> {
    let Some(word) = parse_word(&args.word) else {
        eprintln!("Not a 16-bit value: {:?}", args.word);
        std::process::exit(1);
    };
    let status = conductor::DiagnosticStatus::from_word(word);

    println!("{}", style(format!("Status 0x{:04x}:", word)).bold());
    let flags = [
        ("Peripheral fault", status.peripheral_fault()),
        ("Bus fault", status.bus_fault()),
        ("Controller fault", status.controller_fault()),
        ("Run", status.run()),
        ("Active", status.active()),
        ("Ready", status.ready()),
        ("Bus disable", status.bus_disable()),
        ("Force mode", status.force_mode()),
    ];
    for (name, set) in flags {
        let value = if set {
            style("yes").green()
        } else {
            style("no").dim()
        };
        println!("  {:<18} {}", name, value);
    }
    Ok(())
}

fn parse_mapping(s: &str) -> Option<MappingPlacement> {
    match s {
        "configure" => Some(MappingPlacement::Configure),
        "startup" => Some(MappingPlacement::Startup),
        "skip" => Some(MappingPlacement::Skip),
        _ => None,
    }
}

fn run_simulate(args: &SimulateOptions) -> Result<(), busconductor::Error> {
    let transport: BusTransport = args.transport.parse()?;
    let Some(mapping) = parse_mapping(&args.mapping) else {
        eprintln!("Unknown mapping placement {:?}", args.mapping);
        std::process::exit(1);
    };

    let mut builder = conductor::ParametersBuilder::new();
    builder
        .mapping_placement(transport, mapping)
        .tick_period(std::time::Duration::from_millis(args.period_ms));
    if let Some(path) = &args.topology {
        builder.topology_path(path);
    }

    let sim = master::SimulatorMaster::new(args.modules);
    let mut bus = conductor::Conductor::new(sim.duplicate(), transport, builder.build());

    println!(
        "{}",
        style(format!(
            "Simulating {} local bus with {} modules",
            transport, args.modules
        ))
        .bold()
    );

    for tick in 0..args.ticks {
        // Raise the configure request on the second tick and the start request one tick later.
        let inputs = conductor::Inputs {
            config_req: tick >= 1,
            config_must_match: args.topology.is_some(),
            start_io_req: tick >= 2,
        };
        let outputs = bus.tick(inputs);
        println!(
            "[tick {:3}] CONFIGURED={} RUNNING={} NUM_MODULES={}",
            tick, outputs.configured, outputs.running, outputs.num_modules
        );

        if tick + 1 < args.ticks {
            std::thread::sleep(bus.parameters().tick_period);
        }
    }

    if bus.state().configured {
        let status = bus.read_status()?;
        println!("Final status: {:?}", status);
    }
    println!("Commands sent: {:04x?}", sim.sent_codes());
    Ok(())
}

fn run_teach(args: &TeachOptions) -> Result<(), busconductor::Error> {
    let p = conductor::Parameters::default();
    let table = p.command_table(BusTransport::Axioline);
    let mut sim = master::SimulatorMaster::new(args.modules);
    let mut state = conductor::BusState::new();

    let detected = conductor::configure(&mut sim, &table, &p, false, &mut state)?;
    let topology = ExpectedTopology::from_reply(&detected.reply)?;

    topology.write_file(&args.out)?;

    println!(
        "Wrote description of {} modules to {:?}",
        detected.modules, args.out
    );
    Ok(())
}
