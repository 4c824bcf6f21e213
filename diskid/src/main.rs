use anyhow::Result;
use clap::Parser;
use console::style;
use diskid_core::error::ProbeError;
use diskid_core::platform;
use diskid_core::probe::{self, RunError, ScanOptions};
use diskid_core::report::Reporter;
use std::io::stdout;
use std::process;
use tracing::debug;

mod logging;

#[derive(Parser)]
#[command(name = "diskid")]
#[command(
    about = "Lists attached disks with their interface path, physical drive path and serial number",
    version
)]
struct Cli {
    /// Stop at the first device that cannot be probed
    #[arg(long = "fail-fast")]
    fail_fast: bool,

    /// Also print vendor, product, revision, bus type and capacity
    #[arg(short = 'd', long = "details")]
    details: bool,

    /// Increase log verbosity on stderr (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Prints the one-line diagnostic for a failed probe step.
fn report_failure(e: &ProbeError) {
    eprintln!("{}", style(e).red());
}

/// Runs the scan and returns the process exit status.
fn run(cli: &Cli) -> Result<u32> {
    let options = ScanOptions {
        fail_fast: cli.fail_fast,
        details: cli.details,
    };

    let mut system = platform::open()?;
    let mut reporter = Reporter::new(stdout().lock(), options.details);

    match probe::run(&mut system, options, &mut reporter, report_failure) {
        Ok(summary) => {
            debug!(reported = summary.reported, "scan finished");
            Ok(summary.exit_code())
        }
        Err(RunError::Probe(e)) => Err(e.into()),
        Err(RunError::Output(e)) => Err(e.into()),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => match e.downcast_ref::<ProbeError>() {
            Some(probe_error) => {
                report_failure(probe_error);
                probe_error.code
            }
            None => {
                eprintln!("{} {:#}", style("error:").red().bold(), e);
                1
            }
        },
    };

    process::exit(code as i32);
}
