//! Transfer service. Moves customer populations between CSV files and the store.

use crate::adapters::transfer::{customers_from_csv, customers_to_csv};
use crate::domain::{DomainError, Segment};
use crate::ports::CustomerRepoPort;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

/// Result of a CSV import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub rejected: usize,
}

pub struct TransferService {
    repo: Arc<dyn CustomerRepoPort>,
}

impl TransferService {
    pub fn new(repo: Arc<dyn CustomerRepoPort>) -> Self {
        Self { repo }
    }

    /// Import customers from a CSV file, replacing existing ones with the same id.
    /// Malformed rows are logged and skipped.
    pub async fn import_csv(&self, path: &Path) -> Result<ImportSummary, DomainError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::Import(format!("read {}: {}", path.display(), e)))?;
        let import = customers_from_csv(&content, Utc::now())
            .map_err(|e| DomainError::Import(format!("parse {}: {}", path.display(), e)))?;

        for row in &import.rejected {
            warn!(path = %path.display(), line = row.line, reason = %row.reason, "CSV row rejected");
        }

        let imported = self.repo.upsert_customers(&import.customers).await?;
        info!(
            path = %path.display(),
            imported,
            rejected = import.rejected.len(),
            "CSV import complete"
        );
        Ok(ImportSummary {
            imported,
            rejected: import.rejected.len(),
        })
    }

    /// Import only when the store holds no customers. Returns None when skipped.
    pub async fn seed_if_empty(&self, path: &Path) -> Result<Option<ImportSummary>, DomainError> {
        if self.repo.count().await? > 0 {
            info!(path = %path.display(), "store not empty, seed import skipped");
            return Ok(None);
        }
        self.import_csv(path).await.map(Some)
    }

    /// Export customers (newest first, optionally one segment) to a CSV file.
    /// Returns the number of rows written.
    pub async fn export_csv(
        &self,
        path: &Path,
        segment: Option<Segment>,
    ) -> Result<usize, DomainError> {
        let mut customers = self.repo.load_customers().await?;
        if segment.is_some() {
            customers.retain(|c| c.segment == segment);
        }
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let csv = customers_to_csv(&customers)
            .map_err(|e| DomainError::Export(format!("Failed to generate CSV: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Export(format!("create {}: {}", parent.display(), e)))?;
        }
        fs::write(path, csv)
            .await
            .map_err(|e| DomainError::Export(format!("write {}: {}", path.display(), e)))?;

        info!(path = %path.display(), rows = customers.len(), "CSV export complete");
        Ok(customers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::JsonRepo;
    use crate::domain::entities::fixtures::{customer, date};

    const SAMPLE: &str = "\
id,first_name,last_name,email,phone,date_of_birth,employment_status,annual_income,account_type,average_account_balance,monthly_transaction_amount,loan_history,segment,risk_profile,created_at
c-1,John,Doe,john@example.com,,1990-05-15,employed,75000,checking,15420.50,45,,,,2024-03-10
c-2,Jane,Roe,,,1958-02-01,retired,95000,savings,250000,30,,retired_affluent,low,2024-04-10
c-3,Bad,Row,,,1958-02-01,astronaut,95000,savings,250000,30,,,,
";

    fn setup() -> (tempfile::TempDir, Arc<JsonRepo>, TransferService) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(JsonRepo::new(dir.path().join("customers.json")));
        let service = TransferService::new(repo.clone());
        (dir, repo, service)
    }

    #[tokio::test]
    async fn import_then_export() {
        let (dir, repo, service) = setup();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, SAMPLE).unwrap();

        let summary = service.import_csv(&input).await.unwrap();
        assert_eq!(summary, ImportSummary { imported: 2, rejected: 1 });
        assert_eq!(repo.count().await.unwrap(), 2);

        let output = dir.path().join("out").join("customers.csv");
        assert_eq!(service.export_csv(&output, None).await.unwrap(), 2);
        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert!(lines[0].starts_with("ID,Name,"));
        assert!(lines[1].starts_with("c-2,Jane Roe,"));
        assert!(lines[2].contains(",Not Segmented,"));

        let retired = dir.path().join("retired.csv");
        assert_eq!(
            service
                .export_csv(&retired, Some(Segment::RetiredAffluent))
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn non_finite_cells_are_rejected_on_import() {
        let (dir, repo, service) = setup();
        let input = dir.path().join("in.csv");
        let header = SAMPLE.lines().next().unwrap();
        std::fs::write(
            &input,
            format!(
                "{}\nc-9,Nan,Row,,,1999-01-01,student,NaN,savings,inf,10,,,,\n",
                header
            ),
        )
        .unwrap();

        let summary = service.import_csv(&input).await.unwrap();
        assert_eq!(summary, ImportSummary { imported: 0, rejected: 1 });
        assert!(repo.get_customer("c-9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seed_skips_non_empty_store() {
        let (dir, repo, service) = setup();
        repo.upsert_customers(&[customer("existing", date(1990, 1, 1))])
            .await
            .unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, SAMPLE).unwrap();
        assert_eq!(service.seed_if_empty(&input).await.unwrap(), None);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_file_is_import_error() {
        let (dir, _repo, service) = setup();
        let err = service
            .import_csv(&dir.path().join("absent.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Import(_)));
    }
}
