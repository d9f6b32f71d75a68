// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use printrelay_core::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "printrelay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: <data dir>/config.json)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory (default: $XDG_DATA_HOME/printrelay)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Bind address for the print server, overriding the configuration
    #[arg(long)]
    pub ip: Option<String>,

    /// Port for the print server, overriding the configuration
    #[arg(long)]
    pub port: Option<u16>,

    /// Do not start the print server automatically
    #[arg(long)]
    pub no_autostart: bool,

    /// Run without registering a UI session (`GET /printers` answers null)
    #[arg(long)]
    pub silent: bool,

    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(ip) = &self.ip {
            config.server.ip = ip.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_autostart {
            config.server.autostart = false;
        }
    }
}
