//! godl CLI entrypoint.
//!
//! Fetches the Go release listing and brings the destination tree up to
//! date. Results go to stdout and progress and failures to stderr; the exit
//! status is non-zero only when the run could not start or the listing was
//! unusable.

use clap::Parser;
use godl::cli::Cli;
use godl::error::{MirrorError, Result, describe};
use godl::mirror::run_mirror;
use godl::output::{Console, write_line};
use godl::reconcile::RunSummary;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<RunSummary> {
    let config = cli.resolve_config()?;
    log::debug!("resolved configuration: {config:?}");
    let mut console = Console::new(stdout, stderr).with_quiet(cli.quiet);
    run_mirror(&config, cli.dry_run, &mut console)
}

fn exit_code_for_run_result(
    result: Result<RunSummary>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> i32 {
    match result {
        Ok(summary) => {
            write_line(stdout, summary.summary_line());
            0
        }
        Err(err) => {
            write_line(stderr, format_args!("godl: {}", describe(&err)));
            exit_code_for_error(&err)
        }
    }
}

fn exit_code_for_error(err: &MirrorError) -> i32 {
    match err {
        MirrorError::Config(_) => 2,
        MirrorError::CatalogUnavailable { .. }
        | MirrorError::CatalogInvalid { .. }
        | MirrorError::Destination { .. } => 1,
    }
}
