//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here: segment classification, health scoring,
//! population analytics and batch diffing. Dependencies flow inward.

pub mod analytics;
pub mod catalog;
pub mod classifier;
pub mod entities;
pub mod errors;
pub mod health;
pub mod segmentation;

pub use analytics::{
    AccountTypeCount, AnalyticsAggregator, AnalyticsReport, BankingPatterns, EmploymentCount,
    GrowthBucket, RiskCount, SegmentCount, SegmentationAnalytics, TransactionPattern,
};
pub use catalog::{SegmentCatalog, SegmentProfile};
pub use classifier::{Classification, classify};
pub use entities::{
    AccountType, CustomerRecord, EmploymentStatus, LoanRecord, LoanType, RiskProfile, Segment,
    SegmentChange,
};
pub use errors::{DomainError, InvalidRecord};
pub use health::{FinancialHealthReport, HealthFactors, HealthRating, score};
pub use segmentation::{SegmentationOutcome, SegmentationRunner, SkippedRecord};
