use std::path::{Path, PathBuf};
use std::process;

use tracing::info;

use crate::config::{load_config, MeasurementConfig};
use crate::constants::DEFAULT_SIMULATED_RECEIVER_KELVIN;
use crate::error::{Error, Stage};
use crate::instrument::{
    InstrumentSession, Resource, ScpiSession, SimulatedAnalyzer, SweepSettings,
};
use crate::measurement::SourceTemperatures;
use crate::operator::{
    prompt_averages, prompt_source_temperatures, prompt_sweep_settings, ConsoleOperator, Operator,
};
use crate::procedure::{YFactorMeasurement, YFactorProcedure};
use crate::report::{record_summary, MeasurementRecord};

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum Command {
    Version,
    Help,
    Read(PathBuf),
    Measure(Options),
}

#[derive(Debug, Default, PartialEq)]
pub struct Options {
    pub resource: Option<String>,
    pub config_path: Option<PathBuf>,
    pub simulate: bool,
    pub output_name: Option<String>,
}

fn value_for(flag: &str, value: Option<&String>) -> Result<String, Box<dyn std::error::Error>> {
    match value {
        Some(value) if !value.starts_with('-') => Ok(value.clone()),
        _ => Err(format!("missing value for `{}`", flag).into()),
    }
}

/// Parse `args` (program name first) without acting on them.
pub fn parse_args(args: &[String]) -> Result<Command, Box<dyn std::error::Error>> {
    let mut options = Options::default();
    let mut read_path = None;
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--version" | "-v" => return Ok(Command::Version),
            "--help" | "-h" => return Ok(Command::Help),
            "--resource" | "-r" => options.resource = Some(value_for(arg, iter.next())?),
            "--config" | "-c" => {
                options.config_path = Some(PathBuf::from(value_for(arg, iter.next())?))
            }
            "--output" | "-o" => options.output_name = Some(value_for(arg, iter.next())?),
            "--read" => read_path = Some(PathBuf::from(value_for(arg, iter.next())?)),
            "--simulate" => options.simulate = true,
            other => return Err(format!("unexpected argument `{}`", other).into()),
        }
    }

    if let Some(path) = read_path {
        if options != Options::default() {
            return Err("`--read` cannot be combined with measurement options".into());
        }
        return Ok(Command::Read(path));
    }
    if options.simulate && options.resource.is_some() {
        return Err("`--simulate` and `--resource` are mutually exclusive".into());
    }
    Ok(Command::Measure(options))
}

pub struct Config {}

impl Config {
    pub fn run(args: &[String]) -> Result<Config, Box<dyn std::error::Error>> {
        match parse_args(args)? {
            Command::Version => {
                print_version();
                process::exit(0);
            }
            Command::Help => {
                print_help();
                process::exit(0);
            }
            Command::Read(path) => {
                let cwd = std::env::current_dir()?;
                let full_path = cwd.join(path);
                println!("Reading: {}", full_path.display());
                let record = MeasurementRecord::load(&full_path)?;
                println!("{}", record_summary(&record));
            }
            Command::Measure(options) => {
                let mut operator = ConsoleOperator::stdio();
                measure(&options, &mut operator)?;
            }
        }
        Ok(Config {})
    }
}

fn measure(options: &Options, operator: &mut dyn Operator) -> Result<(), Error> {
    let cwd = std::env::current_dir()?;
    let config = match &options.config_path {
        Some(path) => {
            let full_path = cwd.join(path);
            println!("Config Path: {}", full_path.display());
            load_config(&full_path)?
        }
        None => MeasurementConfig::default(),
    };

    let temperatures = match &config.sources {
        Some(sources) => sources.to_temperatures()?,
        None => prompt_source_temperatures(operator, SourceTemperatures::default())?,
    };
    let (sweep, averages) = match &config.sweep {
        Some(sweep) => (sweep.to_settings()?, sweep.averages()?),
        None => {
            operator
                .say("\nSpectrum Analyzer Setup")
                .map_err(Error::Operator)?;
            let sweep = prompt_sweep_settings(operator, &SweepSettings::default())?;
            let averages = prompt_averages(operator, 1)?;
            (sweep, averages)
        }
    };

    let mut session = open_session(options, &config, operator, temperatures, averages)?;
    let measurement = YFactorProcedure::new(session.as_mut(), temperatures, sweep)
        .with_averages(averages)
        .run(operator)?;
    drop(session);

    save_measurement(&measurement, options.output_name.as_deref(), &cwd, operator)
}

fn open_session(
    options: &Options,
    config: &MeasurementConfig,
    operator: &mut dyn Operator,
    temperatures: SourceTemperatures,
    averages: usize,
) -> Result<Box<dyn InstrumentSession>, Error> {
    if options.simulate {
        info!(
            "using simulated analyzer with a {}K receiver",
            DEFAULT_SIMULATED_RECEIVER_KELVIN
        );
        // the simulator swaps sources on its own after each averaged measurement
        let analyzer = SimulatedAnalyzer::new(DEFAULT_SIMULATED_RECEIVER_KELVIN, temperatures)
            .with_traces_per_source(averages);
        return Ok(Box::new(analyzer));
    }

    let resource = match options.resource.clone().or_else(|| config.instrument.resource.clone()) {
        Some(resource) => resource,
        None => operator
            .prompt("Instrument resource (e.g. TCPIP0::192.168.1.100::5025::SOCKET):")
            .map_err(Error::Operator)?,
    };
    if resource.is_empty() {
        return Err(Error::invalid(
            "no instrument resource given, use --resource or --simulate",
        ));
    }
    let resource: Resource = resource
        .parse()
        .map_err(|err| Error::invalid(format!("{}", err)))?;
    println!("Connecting to {}", resource);
    let session = ScpiSession::connect(&resource, config.instrument.timeout())
        .map_err(|err| Error::instrument(Stage::Connect, err))?;
    Ok(Box::new(session))
}

fn save_measurement(
    measurement: &YFactorMeasurement,
    output_name: Option<&str>,
    directory: &Path,
    operator: &mut dyn Operator,
) -> Result<(), Error> {
    let name = match output_name {
        Some(name) => name.to_string(),
        None => operator
            .prompt("\nEnter a name to save this measurement (blank to skip):")
            .map_err(Error::Operator)?,
    };
    if name.trim().is_empty() {
        operator
            .say("Measurement not saved.")
            .map_err(Error::Operator)?;
        return Ok(());
    }

    let record = MeasurementRecord::now(measurement);
    let path = record.save(directory, &name)?;
    operator
        .say(&format!("Saved measurement to: {}", path.display()))
        .map_err(Error::Operator)?;

    #[cfg(feature = "report")]
    {
        let html_path = path.with_extension("html");
        operator
            .say(&format!("Generating HTML report at: {}", html_path.display()))
            .map_err(Error::Operator)?;
        crate::html::generate_html_report(&record, measurement.spectrum.as_ref(), &html_path)?;
    }

    Ok(())
}

pub fn print_version() {
    println!("yfactor {}", env!("CARGO_PKG_VERSION"));
}

pub fn print_error(error: &str) {
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";
    println!("{}Problem parsing arguments: {error}{}", RED, RESET);
}

pub fn print_failure(error: &str) {
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";
    println!("{}Problem running yfactor: {error}{}", RED, RESET);
}

pub fn print_help() {
    // ANSI color codes
    const BOLD: &str = "\x1b[1m";
    const CYAN: &str = "\x1b[36m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    println!("📡 Y-factor noise temperature measurement{}", RESET);
    println!();
    println!("{}{}VERSION:{}", BOLD, YELLOW, RESET);
    println!("    {}{}{}", GREEN, env!("CARGO_PKG_VERSION"), RESET);
    println!();
    println!("{}{}USAGE:{}", BOLD, YELLOW, RESET);
    println!("    {} yfactor [OPTIONS]{}", GREEN, RESET);
    println!();
    println!("     Connects to a spectrum analyzer, measures the noise power with a hot");
    println!("     and then a cold source connected, and reports the Y-factor and the");
    println!("     system noise temperature. Settings not given in a config file are");
    println!("     prompted for.");
    println!();
    println!("{}{}OPTIONS:{}", BOLD, YELLOW, RESET);
    println!(
        "    {}  -r, --resource <RESOURCE>{}  Instrument address, e.g. TCPIP0::192.168.1.100::5025::SOCKET",
        GREEN, RESET
    );
    println!(
        "    {}  -c, --config <FILE>{}        TOML measurement configuration",
        GREEN, RESET
    );
    println!(
        "    {}      --simulate{}             Measure a simulated analyzer",
        GREEN, RESET
    );
    println!(
        "    {}  -o, --output <NAME>{}        Save the measurement under NAME",
        GREEN, RESET
    );
    println!(
        "    {}      --read <FILE>{}          Print a saved measurement",
        GREEN, RESET
    );
    println!(
        "    {}  -v, --version{}              Print version information",
        GREEN, RESET
    );
    println!(
        "    {}  -h, --help{}                 Print help information",
        GREEN, RESET
    );
    println!();
    println!("{}{}EXAMPLES:{}", BOLD, YELLOW, RESET);
    println!("    {} # Interactive, over the analyzer's raw socket{}", CYAN, RESET);
    println!("    {} yfactor -r 192.168.1.100:5025{}", GREEN, RESET);
    println!();
    println!("    {} # Settings from a file, saved as lna{}", CYAN, RESET);
    println!("    {} yfactor -c files/measurement.toml -o lna{}", GREEN, RESET);
    println!();
    println!("    {} # Try it without hardware{}", CYAN, RESET);
    println!("    {} yfactor --simulate{}", GREEN, RESET);
    println!();
    println!("    {} # Show a saved measurement{}", CYAN, RESET);
    println!(
        "    {} yfactor --read 2026-10-18T09-30-00_yfactor_lna.toml{}",
        GREEN, RESET
    );
    println!();
}
