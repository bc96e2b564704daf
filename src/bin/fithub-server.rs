// ABOUTME: FitHub HTTP server binary serving the admin back office and user dashboard
// ABOUTME: Loads configuration from the environment with optional command line overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

#![recursion_limit = "256"]

//! # FitHub Server Binary
//!
//! Starts the HTTP API. All configuration comes from environment
//! variables; the flags below override the most commonly changed ones.

use anyhow::Result;
use clap::Parser;
use fithub_server::{
    config::{DatabaseUrl, ServerConfig},
    logging, server,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fithub-server")]
#[command(about = "FitHub - fitness platform back office and dashboard API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url {
        config.database_url = DatabaseUrl::parse_url(&url);
    }

    info!("Starting FitHub server");
    if let Err(e) = server::run(config).await {
        error!("Server error: {e:#}");
        return Err(e);
    }
    Ok(())
}
