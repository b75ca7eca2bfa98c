use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::{
    models::{Client, ImportDocument, Program},
    normalize::{NormalizeError, normalize_with_report},
    roster::ClientRoster,
};

/// Where raw import documents come from.
#[async_trait]
pub trait ImportSource: Send + Sync {
    async fn fetch_import(&self, id: &str) -> anyhow::Result<Option<ImportDocument>>;
}

/// Where the trainer's clients come from.
#[async_trait]
pub trait ClientSource: Send + Sync {
    async fn fetch_clients(&self, trainer_id: &str) -> anyhow::Result<Vec<Client>>;
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("failed to load import data: {0:#}")]
    Source(#[source] anyhow::Error),
}

/// Everything the review screen needs, normalized once.
#[derive(Debug, Clone)]
pub struct ReviewState {
    pub import: ImportDocument,
    pub program: Program,
    pub roster: ClientRoster,
    pub discarded_weeks: usize,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Ready(Box<ReviewState>),
    /// The token fired before the results could be applied.
    Cancelled,
}

pub struct ReviewLoader<'a> {
    imports: &'a dyn ImportSource,
    clients: &'a dyn ClientSource,
}

impl<'a> ReviewLoader<'a> {
    pub fn new(imports: &'a dyn ImportSource, clients: &'a dyn ClientSource) -> Self {
        Self { imports, clients }
    }

    /// Fetches the import and the client list concurrently, then normalizes the
    /// program. Late results are dropped once `cancel` has fired.
    #[instrument(skip(self, cancel))]
    pub async fn load(
        &self,
        import_id: &str,
        trainer_id: &str,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome, LoadError> {
        if cancel.is_cancelled() {
            return Ok(LoadOutcome::Cancelled);
        }

        let (import, clients) = tokio::join!(
            self.imports.fetch_import(import_id),
            self.clients.fetch_clients(trainer_id),
        );

        if cancel.is_cancelled() {
            debug!("load cancelled, dropping fetched results");
            return Ok(LoadOutcome::Cancelled);
        }

        let import = import.map_err(LoadError::Source)?;
        let clients = clients.map_err(LoadError::Source)?;

        let report = normalize_with_report(import.as_ref())?;
        let import = import.ok_or(NormalizeError::MissingImport)?;

        debug!(
            weeks = report.program.weeks.len(),
            clients = clients.len(),
            "review state ready"
        );

        Ok(LoadOutcome::Ready(Box::new(ReviewState {
            import,
            program: report.program,
            roster: ClientRoster::new(clients),
            discarded_weeks: report.discarded_weeks,
        })))
    }
}
