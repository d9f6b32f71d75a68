// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PrintRelay — local print server
//
// Entry point. Initialises logging, loads the configuration, wires the print
// pipeline and UI channel, autostarts the server, and shuts it down cleanly
// on Ctrl-C.

mod cli;
mod services;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use cli::Cli;
use printrelay_core::error::Result;
use services::app_services::AppServices;
use services::data_dir;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "PrintRelay starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "PrintRelay failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dir = data_dir::data_dir(cli.data_dir.as_deref())?;
    let mut services = AppServices::init(&dir, cli.config.as_deref())?;
    cli.apply(services.config_mut());
    info!(
        platform = ?services.platform(),
        config = %services.config_path().display(),
        addr = %format!("{}:{}", services.config().server.ip, services.config().server.port),
        "configuration ready"
    );

    let handle = services.spawn_channel();

    if !cli.silent {
        // The desktop UI registers itself by asking for printers first.
        match handle.get_printers().await {
            Ok(printers) => info!(count = printers.len(), "UI session registered"),
            Err(e) => warn!(error = %e, "UI session registered, printer lookup failed"),
        }
    }

    let status = services.autostart(&handle).await;
    info!(%status, "ready");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    let status = handle.stop_server().await?;
    info!(%status, "PrintRelay stopped");
    Ok(())
}
