use std::process::ExitCode;

use clap::Parser;
use pkctl::utils::ErrorWithCauses;
use pkctl::Cli;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = if cli.blocking {
        pkctl::run_blocking(cli)
    } else {
        let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                eprintln!("error: could not start the async runtime: {e}");
                return ExitCode::FAILURE;
            }
        };
        runtime.block_on(pkctl::run(cli))
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", ErrorWithCauses(e));
            ExitCode::FAILURE
        }
    }
}
