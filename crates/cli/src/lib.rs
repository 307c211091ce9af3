pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::QuotationArgs;

#[derive(Debug, Parser)]
#[command(
    name = "quoter",
    about = "Quotation builder and document submission CLI",
    long_about = "Price an order against the catalog, preview the document payload, and submit it to the document API.",
    after_help = "Examples:\n  quoter preview --order order.json\n  quoter submit --order order.json --catalog prices.json\n  quoter catalog\n  quoter config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Build the quotation and print the document payload without submitting it")]
    Preview {
        #[command(flatten)]
        args: QuotationArgs,
        #[arg(long, help = "Pretty-print the payload")]
        pretty: bool,
    },
    #[command(about = "Build the quotation and create the document through the document API")]
    Submit {
        #[command(flatten)]
        args: QuotationArgs,
    },
    #[command(about = "List the products and unit prices in the price catalog")]
    Catalog {
        #[arg(long, help = "Price catalog JSON (overrides catalog.path)")]
        catalog: Option<PathBuf>,
        #[arg(long, help = "Config file (defaults to quoter.toml or config/quoter.toml)")]
        config: Option<PathBuf>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Preview { args, pretty } => commands::preview::run(&args, pretty),
        Command::Submit { args } => commands::submit::run(&args),
        Command::Catalog { catalog, config } => commands::catalog::run(catalog, config),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
