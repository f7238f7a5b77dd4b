//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags, ServiceFlags};
use crate::commands;
use crate::infra::config::YamlConfigStore;
use crate::infra::state::SessionFile;
use crate::output::OutputContext;

/// Decide where the workload runs before it starts
#[derive(Parser)]
#[command(
    name = "preboot",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Preboot service base URL
    #[arg(long, global = true, env = "PREBOOT_BASE_URL")]
    pub base_url: Option<String>,

    /// Skip interactive prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show engine status and trusted peers
    Status,

    /// Scan the LAN for peers
    Scan,

    /// Probe one peer
    Probe(commands::probe::ProbeArgs),

    /// Verify this machine for local execution
    Verify,

    /// Connect, disconnect or query the VPN tunnel
    Vpn(commands::vpn::VpnArgs),

    /// Choose where to run and start the session
    Launch(commands::launch::LaunchArgs),

    /// Show or stop the active session
    Session {
        #[command(subcommand)]
        command: Option<commands::session::SessionCommand>,
    },

    /// Wait until the preboot service answers
    Wait(commands::wait::WaitArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            base_url,
            yes,
            command,
        } = self;

        // Commands that must work without a reachable or valid service.
        match command {
            Command::Version => {
                return commands::version::run(&OutputContext::new(no_color, quiet), json);
            }
            Command::Config(cmd) => {
                let ctx = OutputContext::new(no_color, quiet);
                return commands::config::run(&ctx, json, cmd, &YamlConfigStore);
            }
            Command::Session { command } => {
                let ctx = OutputContext::new(no_color, quiet);
                let store = SessionFile::new()?;
                return commands::session::run(&ctx, json, command.unwrap_or_default(), &store)
                    .await;
            }
            _ => {}
        }

        let app = AppContext::new(&AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags { yes },
            service: ServiceFlags { base_url },
        })
        .await?;

        match command {
            Command::Status => commands::status::run(&app).await,
            Command::Scan => commands::scan::run(&app).await,
            Command::Probe(args) => commands::probe::run(&app, &args).await,
            Command::Verify => commands::verify::run(&app).await,
            Command::Vpn(args) => commands::vpn::run(&app, &args).await,
            Command::Launch(args) => commands::launch::run(&app, &args).await,
            Command::Wait(args) => commands::wait::run(&app, &args).await,
            Command::Version | Command::Config(_) | Command::Session { .. } => {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
