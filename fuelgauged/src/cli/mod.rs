#![allow(clippy::print_stdout, clippy::print_stderr)]
//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::path::Path;

use argh::FromArgs;
use eyre::{eyre, Result};
use log::{info, LevelFilter};
use stderrlog::{LogLevelNum, StdErrLog};

use crate::config::Config;
use crate::fuelgauged::{fuelgauged_loop, FuelgaugedLoopResult};
use crate::gauge::GaugeSource;

mod show_settings;
mod version;

use self::show_settings::show_settings;
use self::version::format_version;

#[derive(FromArgs)]
/// Battery fuel gauge daemon. Samples the state of charge, reports it and
/// halts the node when the battery is confirmed low.
struct FuelgaugedArgs {
    /// use configuration file
    #[argh(option, short = 'c')]
    config_file: Option<String>,

    /// show settings
    #[argh(switch, short = 's')]
    show_settings: bool,

    /// show version
    #[argh(switch, short = 'v')]
    version: bool,

    /// verbose output
    #[argh(switch, short = 'V')]
    verbose: bool,

    /// print one battery reading and exit
    #[argh(switch)]
    read_once: bool,
}

fn build_logger(level: LevelFilter) -> StdErrLog {
    let mut log = stderrlog::new();

    log.module("fuelgauged");
    log.verbosity(LogLevelNum::from(level));

    log
}

fn init_logger(level: LevelFilter) -> Result<()> {
    build_logger(level)
        .init()
        .map_err(|e| eyre!("Failed to initialize logger: {}", e))
}

fn read_once(config: &Config) -> Result<()> {
    let mut gauge = config.build_gauge();
    gauge.begin()?;
    gauge.quick_start()?;
    println!("{:.1}", gauge.read_percentage()?);
    Ok(())
}

fn run(args: FuelgaugedArgs) -> Result<()> {
    if args.version {
        println!("{}", format_version());
        return Ok(());
    }

    init_logger(match args.verbose {
        true => LevelFilter::Trace,
        false => LevelFilter::Info,
    })?;

    let config_path = args.config_file.as_ref().map(Path::new);

    if args.show_settings {
        return show_settings(config_path);
    }

    if args.read_once {
        return read_once(&Config::read_from_system(config_path)?);
    }

    loop {
        let config = Config::read_from_system(config_path)?;
        match fuelgauged_loop(config)? {
            FuelgaugedLoopResult::Terminate => return Ok(()),
            FuelgaugedLoopResult::Relaunch => info!("Reloading configuration"),
        }
    }
}

pub fn main() {
    let args: FuelgaugedArgs = argh::from_env();

    if let Err(e) = run(args) {
        eprintln!("{:#}", e);
        std::process::exit(-1);
    }
}
