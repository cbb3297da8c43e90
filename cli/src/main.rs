#![forbid(unsafe_code)]

use std::io::{IsTerminal, Write};
use std::process::exit;

use clap::{ArgAction, ArgGroup, Parser};
use ls8_emulator::loader::LoadError;
use ls8_emulator::runtime::ProcessorError;
use tracing::debug;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;

mod run;

use crate::run::RunOpt;

/// Exit status when the program could not be loaded
const EXIT_LOAD_FAILURE: i32 = 2;

/// Exit status when the step limit was reached
const EXIT_STEP_LIMIT: i32 = 3;

#[derive(Parser)]
#[command(version, about, group = ArgGroup::new("format"))]
struct Opt {
    /// Increase the level of verbosity. Can be used multiple times.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Force colored output. Default is to check if the output is a tty
    #[arg(short = 'c', long, global = true, group = "format")]
    color: bool,

    /// Force non-colored output. Default is to check if the output is a tty
    #[arg(short = 'C', long, global = true, group = "format")]
    no_color: bool,

    /// Use JSON output for log messages
    #[arg(short, long, global = true, group = "format")]
    json: bool,

    #[command(flatten)]
    run: RunOpt,
}

impl Opt {
    const fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "ls8_emulator=info,ls8_cli=info,warn",
            2 => "ls8_emulator=debug,ls8_cli=debug,info",
            3 => "ls8_emulator=trace,ls8_cli=trace,debug",
            4..=u8::MAX => "trace",
        }
    }

    fn should_use_colors(&self) -> bool {
        if self.color {
            true
        } else if self.no_color {
            false
        } else {
            std::io::stderr().is_terminal()
        }
    }

    fn filter_layer(&self) -> EnvFilter {
        // Parse log level from env, or infer it from args
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_filter()))
    }
}

/// Write an error to `out` and pick the exit status matching it.
///
/// Errors are always written, whatever the log filter is.
fn report(error: anyhow::Error, out: &mut impl Write) -> i32 {
    let error = match error.downcast::<LoadError>() {
        Ok(load_error) => {
            let _ = writeln!(out, "{:?}", miette::Report::new(load_error));
            return EXIT_LOAD_FAILURE;
        }
        Err(error) => error,
    };

    debug!(?error, "Execution failed");
    let _ = writeln!(out, "Error: {error:#}");
    match error.downcast_ref::<ProcessorError>() {
        Some(ProcessorError::StepLimitExceeded { .. }) => EXIT_STEP_LIMIT,
        _ => 1,
    }
}

fn main() {
    // First, parse the arguments
    let opt = Opt::parse();

    // Then, setup the tracing formatter for logging and instrumentation.
    // Logs go to stderr, stdout only carries the program output.
    let registry = tracing_subscriber::Registry::default().with(opt.filter_layer());

    if opt.json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .without_time()
            .with_ansi(opt.should_use_colors())
            .with_target(false)
            .with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    }

    // And run the program
    if let Err(e) = opt.run.exec() {
        exit(report(e, &mut std::io::stderr()));
    }
}
