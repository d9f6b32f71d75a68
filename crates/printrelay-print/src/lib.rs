// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PrintRelay Print — the job pipeline (resolve, translate, execute), the
// HTTP print API and its server lifecycle, and the in-process UI channel.
// Domain types live in `printrelay-core`.

pub mod artifact;
pub mod batch;
pub mod channel;
pub mod command;
pub mod executor;
pub mod http;
pub mod printers;
pub mod process;
pub mod render;
pub mod resolver;
pub mod server;
pub mod session;
pub mod tls;

#[cfg(test)]
mod testing;

pub use batch::BatchCoordinator;
pub use channel::{ChannelHandle, ChannelService, UiRequest};
pub use command::{CommandTranslator, Platform, PrintCommand};
pub use executor::PrintExecutor;
pub use printers::{PrinterDirectory, SystemPrinterDirectory};
pub use render::{ChromiumRenderer, DocumentRenderer};
pub use resolver::ContentResolver;
pub use server::PrintServer;
pub use session::SessionContext;
