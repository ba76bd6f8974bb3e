// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod common;

use commands::{ServeArgs, init_config_command, serve_command};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "cachegate")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the remote tree over HTTP
    Serve(ServeArgs),
    /// Write an example configuration file
    InitConfig {
        /// Where to write the file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve_command(args).await,
        Commands::InitConfig { path, force } => init_config_command(&path, force),
    }
}
