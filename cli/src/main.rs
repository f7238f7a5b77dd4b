//! Preboot CLI - decide where the workload runs before it starts

use std::process::ExitCode;

use clap::Parser;

use preboot_cli::cli::Cli;
use preboot_cli::infra::logging;
use preboot_cli::output::json;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let as_json = cli.json;
    logging::init(cli.verbose, cli.no_color);

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if as_json {
                match json::format_error(&format!("{e:#}"), json::error_code(&e)) {
                    Ok(out) => println!("{out}"),
                    Err(_) => eprintln!("Error: {e:#}"),
                }
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
