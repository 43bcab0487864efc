//! # Proteus CLI Entry Point
//!
//! The main executable for the Proteus tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs logging.
//! 2. **Connection**: Builds the [`ClientConfig`] and connects through `proteus_core`.
//! 3. **Execution**: Delegates schema resolution to the `ReflectionClient`.
//! 4. **Presentation**: Formats and prints the result or the error to standard output/error.

mod cli;
mod formatter;
mod logging;

use clap::Parser;
use cli::{Cli, Commands, ExportCommands};
use formatter::{ExportSummary, FormattedString, GenericError, ServiceList};
use proteus_core::{ClientConfig, ReflectionClient, prost::Message};
use std::path::Path;
use std::process;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    logging::init(args.verbose);

    let config = match args.client_config() {
        Ok(config) => config,
        Err(err) => exit_with(GenericError("Invalid configuration", format!("{err:#}"))),
    };

    match args.command {
        Commands::List => list_services(&config).await,
        Commands::Describe { symbol } => describe_symbol(&config, &symbol).await,
        Commands::Export { sub } => match sub {
            ExportCommands::Symbol { symbol, output } => {
                export(&config, Lookup::Symbol(&symbol), &output).await
            }
            ExportCommands::File { filename, output } => {
                export(&config, Lookup::File(&filename), &output).await
            }
        },
    }
}

enum Lookup<'a> {
    Symbol(&'a str),
    File(&'a str),
}

fn exit_with(message: impl Into<FormattedString>) -> ! {
    eprintln!("{}", message.into());
    process::exit(1);
}

async fn connect_or_exit(config: &ClientConfig) -> ReflectionClient {
    match ReflectionClient::connect(config).await {
        Ok(client) => client,
        Err(err) => exit_with(err),
    }
}

async fn list_services(config: &ClientConfig) {
    let mut client = connect_or_exit(config).await;

    match client.list_services().await {
        Ok(services) => println!("{}", FormattedString::from(ServiceList(services))),
        Err(err) => exit_with(err),
    }
}

async fn describe_symbol(config: &ClientConfig, symbol: &str) {
    let mut client = connect_or_exit(config).await;

    match client.describe_symbol(symbol).await {
        Ok(descriptor) => println!("{}", FormattedString::from(descriptor)),
        Err(err) => exit_with(err),
    }
}

async fn export(config: &ClientConfig, lookup: Lookup<'_>, output: &Path) {
    let mut client = connect_or_exit(config).await;

    let result = match lookup {
        Lookup::Symbol(symbol) => client.file_descriptor_set_by_symbol(symbol).await,
        Lookup::File(filename) => client.file_descriptor_set_by_filename(filename).await,
    };

    let fd_set = match result {
        Ok(fd_set) => fd_set,
        Err(err) => exit_with(err),
    };

    if let Err(err) = std::fs::write(output, fd_set.encode_to_vec()) {
        exit_with(GenericError("Failed to write descriptor set", err));
    }

    println!(
        "{}",
        FormattedString::from(ExportSummary(fd_set, output.to_path_buf()))
    );
}
