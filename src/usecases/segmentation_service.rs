//! Segmentation service. Runs a full reclassification pass and manual overrides.
//!
//! Classification is CPU-bound, so the population is split into chunks that run on the
//! blocking pool. Partial outcomes are merged in chunk order, which keeps the change list
//! in the same order as the loaded population.

use crate::domain::{
    CustomerRecord, DomainError, Segment, SegmentChange, SegmentationOutcome, SegmentationRunner,
};
use crate::ports::CustomerRepoPort;
use crate::shared::config::DEFAULT_SEGMENTATION_CHUNK_SIZE;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one segmentation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationSummary {
    pub total: usize,
    pub outcome: SegmentationOutcome,
    /// Rows actually written by the store.
    pub applied: usize,
}

impl SegmentationSummary {
    pub fn changed(&self) -> usize {
        self.outcome.changes.len()
    }
}

pub struct SegmentationService {
    repo: Arc<dyn CustomerRepoPort>,
    chunk_size: usize,
}

impl SegmentationService {
    pub fn new(repo: Arc<dyn CustomerRepoPort>, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_SEGMENTATION_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { repo, chunk_size }
    }

    /// Classify every stored customer as of `now` and persist the changes.
    pub async fn run_segmentation(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SegmentationSummary, DomainError> {
        let population = self.repo.load_customers().await?;
        let total = population.len();
        info!(customers = total, chunk_size = self.chunk_size, "segmentation started");

        let outcome = self.classify_chunked(population, now).await?;
        for skipped in &outcome.skipped {
            warn!(customer = %skipped.id, reason = %skipped.reason, "customer skipped");
        }

        let applied = self.repo.apply_changes(&outcome.changes).await?;
        info!(
            customers = total,
            changed = outcome.changes.len(),
            applied,
            skipped = outcome.skipped.len(),
            "segmentation complete"
        );

        Ok(SegmentationSummary {
            total,
            outcome,
            applied,
        })
    }

    async fn classify_chunked(
        &self,
        population: Vec<CustomerRecord>,
        now: DateTime<Utc>,
    ) -> Result<SegmentationOutcome, DomainError> {
        let mut handles = Vec::new();
        let mut rest = population;
        while !rest.is_empty() {
            let tail = rest.split_off(rest.len().min(self.chunk_size));
            let chunk = std::mem::replace(&mut rest, tail);
            handles.push(tokio::task::spawn_blocking(move || {
                SegmentationRunner::run(&chunk, now)
            }));
        }

        let mut outcome = SegmentationOutcome::default();
        for handle in handles {
            let part = handle
                .await
                .map_err(|e| DomainError::Task(format!("classification task: {}", e)))?;
            outcome = outcome.merge(part);
        }
        Ok(outcome)
    }

    /// Set a customer's segment by hand. Risk follows the segment's default.
    pub async fn assign_segment(
        &self,
        id: &str,
        segment: Segment,
    ) -> Result<SegmentChange, DomainError> {
        let record = self
            .repo
            .get_customer(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;

        let change = SegmentChange::manual(&record, segment);
        self.repo.apply_changes(std::slice::from_ref(&change)).await?;
        info!(
            customer = %id,
            segment = %segment,
            risk = %change.new_risk,
            "segment assigned manually"
        );
        Ok(change)
    }
}
