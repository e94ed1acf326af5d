/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! tweakvec: show or change how the Raspberry Pi composite video output is encoded.

mod cli;

use {
    anyhow::Result,
    clap::ArgMatches,
    colored::*,
    machine::{session, Session},
    std::process::ExitCode,
    tracing_subscriber::EnvFilter,
};

fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    init_logging(matches.get_flag("verbose"));

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(matches: &ArgMatches) -> Result<()> {
    let request = cli::Request::from_matches(matches);
    let session = Session::open(&cli::session_config(matches))?;

    if request.is_query() {
        for (name, value) in session.current_config()?.entries() {
            println!("{} = {}", name, value.unwrap_or_default());
        }
        return Ok(());
    }

    let current_standard = if request.needs_current_standard() {
        session.current_config()?.standard
    } else {
        None
    };
    session.apply(&request.resolve(current_standard), request.force)?;
    Ok(())
}

fn report(err: &anyhow::Error) {
    eprintln!("{} {}", "error:".red().bold(), err);
    if let Some(err) = err.downcast_ref::<session::Error>() {
        if err.is_platform_mismatch() {
            eprintln!("{}", "Are you running on a Raspberry Pi?".yellow());
        } else if err.is_permission_denied() {
            eprintln!(
                "{}",
                "You must be root or have access to /dev/mem to run tweakvec".yellow()
            );
        }
    }
}
