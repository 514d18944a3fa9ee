use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

use hwpulse::commands;
use hwpulse::commands::watch::WatchOptions;
use hwpulse::core::config::MonitorConfig;

fn cli() -> Command {
    Command::new("hwpulse")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hardware telemetry from HWiNFO, LibreHardwareMonitor, NVML and OS counters")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Config file (defaults to $HWPULSE_CONFIG or the user config directory)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Only log errors")
                .action(clap::ArgAction::SetTrue)
                .global(true)
        )
        .subcommand(
            Command::new("watch")
                .about("Poll the sensors and print a snapshot on every tick")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("MS")
                        .help("Poll interval in milliseconds (minimum 100)")
                        .value_parser(clap::value_parser!(u64))
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON object per line")
                        .action(clap::ArgAction::SetTrue)
                )
                .arg(
                    Arg::new("count")
                        .short('n')
                        .long("count")
                        .value_name("N")
                        .help("Exit after N snapshots")
                        .value_parser(clap::value_parser!(u64))
                )
        )
        .subcommand(
            Command::new("status")
                .about("Show which telemetry backends are available")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(clap::ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("sensors")
                .about("List raw sensor readings from the sensor backends")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print as JSON")
                        .action(clap::ArgAction::SetTrue)
                )
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    if matches.get_flag("silent") {
        hwpulse::init_logging_with_level(log::LevelFilter::Error);
    } else {
        hwpulse::init_logging();
    }

    let config = MonitorConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path));

    match matches.subcommand() {
        Some(("watch", sub_matches)) => {
            commands::watch(&config, &watch_options(sub_matches))?;
        }
        Some(("status", sub_matches)) => {
            commands::status(&config, sub_matches.get_flag("json"))?;
        }
        Some(("sensors", sub_matches)) => {
            commands::sensors(&config, sub_matches.get_flag("json"))?;
        }
        _ => unreachable!("subcommand_required prevents this"),
    }

    Ok(())
}

fn watch_options(matches: &ArgMatches) -> WatchOptions {
    WatchOptions {
        interval_ms: matches.get_one::<u64>("interval").copied(),
        json: matches.get_flag("json"),
        count: matches.get_one::<u64>("count").copied(),
    }
}
