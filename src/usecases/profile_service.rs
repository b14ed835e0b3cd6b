//! Profile service. Per-customer segmentation profile and the paged customer listing.

use crate::domain::{
    CustomerRecord, DomainError, FinancialHealthReport, RiskProfile, Segment, SegmentCatalog,
    score,
};
use crate::ports::{CustomerPage, CustomerRepoPort};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const PLACEHOLDER_NAME: &str = "Not Yet Segmented";
pub const PLACEHOLDER_DESCRIPTION: &str =
    "Your segment will be determined based on your profile and banking behavior.";

/// Segment details as shown to a customer. Falls back to a placeholder when unsegmented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentDetails {
    pub segment: Option<Segment>,
    pub name: String,
    pub description: String,
    pub characteristics: Vec<String>,
    pub recommendations: Vec<String>,
}

impl SegmentDetails {
    pub fn for_segment(segment: Option<Segment>) -> Self {
        match segment {
            Some(seg) => {
                let p = SegmentCatalog::profile(seg);
                Self {
                    segment,
                    name: p.name.to_string(),
                    description: p.description.to_string(),
                    characteristics: p.characteristics.iter().map(|s| s.to_string()).collect(),
                    recommendations: p.recommendations.iter().map(|s| s.to_string()).collect(),
                }
            }
            None => Self {
                segment: None,
                name: PLACEHOLDER_NAME.to_string(),
                description: PLACEHOLDER_DESCRIPTION.to_string(),
                characteristics: Vec::new(),
                recommendations: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentationProfile {
    pub customer_id: String,
    pub name: String,
    pub segment: SegmentDetails,
    pub risk_profile: RiskProfile,
    pub financial_health: FinancialHealthReport,
    pub last_updated: DateTime<Utc>,
}

impl SegmentationProfile {
    pub fn from_record(record: &CustomerRecord) -> Result<Self, DomainError> {
        let financial_health = score(record).map_err(|reason| DomainError::InvalidRecord {
            id: record.id.clone(),
            reason,
        })?;
        Ok(Self {
            customer_id: record.id.clone(),
            name: record.full_name(),
            segment: SegmentDetails::for_segment(record.segment),
            risk_profile: record.risk_profile,
            financial_health,
            last_updated: record.last_updated(),
        })
    }
}

pub struct ProfileService {
    repo: Arc<dyn CustomerRepoPort>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn CustomerRepoPort>) -> Self {
        Self { repo }
    }

    pub async fn segmentation_profile(&self, id: &str) -> Result<SegmentationProfile, DomainError> {
        let record = self
            .repo
            .get_customer(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;
        SegmentationProfile::from_record(&record)
    }

    /// Page through customers newest first, optionally restricted to one segment.
    pub async fn list_customers(
        &self,
        segment: Option<Segment>,
        page: usize,
        limit: usize,
    ) -> Result<CustomerPage, DomainError> {
        self.repo.list_customers(segment, page, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::JsonRepo;
    use crate::domain::entities::fixtures::{customer, date, instant};
    use crate::domain::{HealthRating, InvalidRecord};

    async fn service(customers: &[CustomerRecord]) -> (tempfile::TempDir, ProfileService) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(JsonRepo::new(dir.path().join("customers.json")));
        repo.upsert_customers(customers).await.unwrap();
        (dir, ProfileService::new(repo))
    }

    #[tokio::test]
    async fn profile_uses_catalog_entry() {
        let mut c = customer("c-1", date(1997, 5, 1));
        c.annual_income = Some(40_000.0);
        c.segment = Some(Segment::YoungSaver);
        c.risk_profile = RiskProfile::High;
        c.updated_at = Some(instant(2025, 2, 1));
        let (_dir, svc) = service(&[c]).await;

        let profile = svc.segmentation_profile("c-1").await.unwrap();
        assert_eq!(profile.segment.name, "Young Saver");
        assert!(!profile.segment.recommendations.is_empty());
        assert_eq!(profile.risk_profile, RiskProfile::High);
        assert_eq!(profile.financial_health.score, 80);
        assert_eq!(profile.financial_health.rating, HealthRating::Excellent);
        assert_eq!(profile.last_updated, instant(2025, 2, 1));
    }

    #[tokio::test]
    async fn unsegmented_customer_gets_placeholder() {
        let (_dir, svc) = service(&[customer("c-2", date(1990, 1, 1))]).await;
        let profile = svc.segmentation_profile("c-2").await.unwrap();
        assert_eq!(profile.segment.segment, None);
        assert_eq!(profile.segment.name, PLACEHOLDER_NAME);
        assert_eq!(profile.segment.description, PLACEHOLDER_DESCRIPTION);
        assert!(profile.segment.characteristics.is_empty());
    }

    #[tokio::test]
    async fn invalid_record_is_reported() {
        let mut c = customer("c-3", date(1990, 1, 1));
        c.date_of_birth = None;
        let (_dir, svc) = service(&[c]).await;
        let err = svc.segmentation_profile("c-3").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidRecord {
                reason: InvalidRecord::MissingDateOfBirth,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_customer_is_not_found() {
        let (_dir, svc) = service(&[]).await;
        assert!(matches!(
            svc.segmentation_profile("nobody").await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_filters_and_pages() {
        let mut customers = Vec::new();
        for i in 0..5u32 {
            let mut c = customer(&format!("c-{}", i), date(1990, 1, 1));
            c.created_at = instant(2025, 1, i + 1);
            if i % 2 == 0 {
                c.segment = Some(Segment::MortgageSeeker);
            }
            customers.push(c);
        }
        let (_dir, svc) = service(&customers).await;

        let page = svc.list_customers(None, 1, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.customers[0].id, "c-4");

        let seekers = svc
            .list_customers(Some(Segment::MortgageSeeker), 2, 2)
            .await
            .unwrap();
        assert_eq!(seekers.total, 3);
        assert_eq!(seekers.current_page, 2);
        assert_eq!(seekers.customers.len(), 1);
        assert_eq!(seekers.customers[0].id, "c-0");
    }
}
