//! Analytics service. Loads the population and runs the aggregator off the async runtime.

use crate::domain::{
    AnalyticsAggregator, AnalyticsReport, BankingPatterns, CustomerRecord, DomainError,
    SegmentationAnalytics,
};
use crate::ports::CustomerRepoPort;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

pub struct AnalyticsService {
    repo: Arc<dyn CustomerRepoPort>,
    aggregator: AnalyticsAggregator,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn CustomerRepoPort>, growth_window_months: u32) -> Self {
        Self {
            repo,
            aggregator: AnalyticsAggregator::new(growth_window_months),
        }
    }

    async fn compute<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: FnOnce(AnalyticsAggregator, Vec<CustomerRecord>) -> T + Send + 'static,
    {
        let population = self.repo.load_customers().await?;
        let aggregator = self.aggregator;
        tokio::task::spawn_blocking(move || f(aggregator, population))
            .await
            .map_err(|e| DomainError::Task(format!("analytics task: {}", e)))
    }

    /// Segment counts, risk counts and recent growth.
    pub async fn segmentation_analytics(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SegmentationAnalytics, DomainError> {
        self.compute(move |agg, pop| agg.segmentation(&pop, now))
            .await
    }

    /// Transaction patterns, account types and employment mix.
    pub async fn banking_patterns(&self) -> Result<BankingPatterns, DomainError> {
        self.compute(|agg, pop| agg.banking(&pop)).await
    }

    pub async fn report(&self, now: DateTime<Utc>) -> Result<AnalyticsReport, DomainError> {
        let report = self
            .compute(move |agg, pop| agg.report(&pop, now))
            .await?;
        info!(
            population = report.population,
            skipped = report.skipped,
            segments = report.segmentation.segment_counts.len(),
            "analytics report generated"
        );
        Ok(report)
    }
}
