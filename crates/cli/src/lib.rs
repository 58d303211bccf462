pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "clearaway",
    about = "ClearAway quote intake CLI",
    long_about = "Submit quote requests through the configured delivery transport, build mailto links, browse the service area, and inspect configuration.",
    after_help = "Examples:\n  clearaway submit --name \"A Smith\" --postcode \"SW1A 1AA\" --contact a@x.com --details \"Old sofa\" --file sofa.jpg\n  clearaway areas --county Surrey\n  clearaway doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Stage attachments and submit a quote request through the configured transport"
    )]
    Submit {
        #[command(flatten)]
        quote: QuoteArgs,
        #[arg(long, help = "Override delivery.transport for this submission")]
        transport: Option<String>,
        #[arg(long, help = "Override delivery.attachment_mode (full|metadata_only)")]
        attachment_mode: Option<String>,
    },
    #[command(about = "Print a mailto: link carrying the quote request")]
    Mailto {
        #[command(flatten)]
        quote: QuoteArgs,
    },
    #[command(about = "List the counties and towns served")]
    Areas {
        #[arg(long, help = "Expand one county to list its towns")]
        county: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and delivery transport readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Clone, Debug, Default, Args)]
pub struct QuoteArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub postcode: String,
    #[arg(long, default_value = "", help = "Email address or phone number")]
    pub contact: String,
    #[arg(long, default_value = "")]
    pub details: String,
    #[arg(long = "file", help = "Photo to attach; repeat for several")]
    pub files: Vec<PathBuf>,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Submit { quote, transport, attachment_mode } => {
            commands::submit::run(&quote, transport.as_deref(), attachment_mode.as_deref())
        }
        Command::Mailto { quote } => commands::mailto::run(&quote),
        Command::Areas { county } => commands::areas::run(county.as_deref()),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
