//! Application use cases. Orchestrate domain logic via ports.

pub mod analytics_service;
pub mod profile_service;
pub mod segmentation_service;
pub mod transfer_service;

pub use analytics_service::AnalyticsService;
pub use profile_service::{ProfileService, SegmentDetails, SegmentationProfile};
pub use segmentation_service::{SegmentationService, SegmentationSummary};
pub use transfer_service::{ImportSummary, TransferService};
