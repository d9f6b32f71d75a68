// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// UI session context.
//
// Printer enumeration is only offered once a UI session has registered with
// the core; until then `GET /printers` answers `null`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use printrelay_core::error::Result;

use crate::printers::PrinterDirectory;

/// Registration state of the UI collaborator plus the printer directory it
/// unlocks.
pub struct SessionContext {
    registered: AtomicBool,
    directory: Arc<dyn PrinterDirectory>,
}

impl SessionContext {
    pub fn new(directory: Arc<dyn PrinterDirectory>) -> Self {
        Self {
            registered: AtomicBool::new(false),
            directory,
        }
    }

    /// Mark the UI session as present. Idempotent.
    pub fn register(&self) {
        if !self.registered.swap(true, Ordering::SeqCst) {
            info!("UI session registered");
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Printer names, or `None` while no UI session is registered.
    pub async fn printers(&self) -> Result<Option<Vec<String>>> {
        if !self.is_registered() {
            return Ok(None);
        }
        self.directory.list().await.map(Some)
    }

    /// Printer names for the UI itself; registers the session first.
    pub async fn printers_for_ui(&self) -> Result<Vec<String>> {
        self.register();
        self.directory.list().await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct Fixed;

    #[async_trait]
    impl PrinterDirectory for Fixed {
        async fn list(&self) -> Result<Vec<String>> {
            Ok(vec!["P1".into(), "P2".into()])
        }
    }

    #[tokio::test]
    async fn printers_hidden_until_registered() {
        let session = SessionContext::new(Arc::new(Fixed));
        assert_eq!(session.printers().await.unwrap(), None);

        session.register();
        assert_eq!(
            session.printers().await.unwrap(),
            Some(vec!["P1".to_owned(), "P2".to_owned()])
        );
    }

    #[tokio::test]
    async fn ui_lookup_registers_the_session() {
        let session = SessionContext::new(Arc::new(Fixed));
        assert!(!session.is_registered());
        assert_eq!(session.printers_for_ui().await.unwrap().len(), 2);
        assert!(session.is_registered());
    }
}
