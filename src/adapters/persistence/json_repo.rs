//! Implements CustomerRepoPort using a single JSON file.
//!
//! The whole population is cached in memory and rewritten on every change.
//! Suited to small installations and demos; use SqliteRepo for anything larger.

use crate::domain::segmentation::apply_changes;
use crate::domain::{CustomerRecord, DomainError, Segment, SegmentChange};
use crate::ports::{CustomerPage, CustomerRepoPort};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    customers: Vec<CustomerRecord>,
}

/// JSON file-based customer store.
pub struct JsonRepo {
    path: std::path::PathBuf,
    cache: tokio::sync::RwLock<StoreData>,
}

impl JsonRepo {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: tokio::sync::RwLock::new(StoreData::default()),
        }
    }

    /// Load the store from disk. A missing file is an empty store; a corrupt one is an error.
    pub async fn load(&self) -> Result<(), DomainError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).map_err(|e| {
                DomainError::Repo(format!("parse {}: {}", self.path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "customer store not found, starting empty");
                StoreData::default()
            }
            Err(e) => return Err(DomainError::Repo(e.to_string())),
        };
        info!(
            path = %self.path.display(),
            customers = data.customers.len(),
            "JSON customer store loaded"
        );
        *self.cache.write().await = data;
        Ok(())
    }

    /// Atomic save using write-replace pattern.
    /// 1. Write to temp file
    /// 2. sync_all() to ensure flush to disk
    /// 3. Atomic rename to target path
    async fn save(&self, data: &StoreData) -> Result<(), DomainError> {
        let json =
            serde_json::to_string_pretty(data).map_err(|e| DomainError::Repo(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Repo(format!("create data dir: {}", e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Repo(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Repo(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Repo(format!("sync temp file: {}", e)))?;
        drop(f); // Close file handle before rename

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::Repo(format!("atomic rename failed: {}", e)))?;

        Ok(())
    }

    fn newest_first(mut customers: Vec<CustomerRecord>) -> Vec<CustomerRecord> {
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        customers
    }
}

#[async_trait::async_trait]
impl CustomerRepoPort for JsonRepo {
    async fn load_customers(&self) -> Result<Vec<CustomerRecord>, DomainError> {
        let cache = self.cache.read().await;
        Ok(Self::newest_first(cache.customers.clone()))
    }

    async fn get_customer(&self, id: &str) -> Result<Option<CustomerRecord>, DomainError> {
        let cache = self.cache.read().await;
        Ok(cache.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn upsert_customers(&self, customers: &[CustomerRecord]) -> Result<usize, DomainError> {
        if customers.is_empty() {
            return Ok(0);
        }
        // serde_json writes non-finite floats as null.
        for c in customers {
            c.validate_numbers()
                .map_err(|reason| DomainError::InvalidRecord {
                    id: c.id.clone(),
                    reason,
                })?;
        }
        let mut cache = self.cache.write().await;
        for c in customers {
            match cache.customers.iter_mut().find(|existing| existing.id == c.id) {
                Some(existing) => *existing = c.clone(),
                None => cache.customers.push(c.clone()),
            }
        }
        self.save(&cache).await?;
        info!(
            path = %self.path.display(),
            count = customers.len(),
            "upserted customers"
        );
        Ok(customers.len())
    }

    async fn apply_changes(&self, changes: &[SegmentChange]) -> Result<usize, DomainError> {
        if changes.is_empty() {
            return Ok(0);
        }
        let mut cache = self.cache.write().await;
        let applied = apply_changes(&mut cache.customers, changes, Utc::now());
        if applied > 0 {
            self.save(&cache).await?;
        }
        Ok(applied)
    }

    async fn list_customers(
        &self,
        segment: Option<Segment>,
        page: usize,
        limit: usize,
    ) -> Result<CustomerPage, DomainError> {
        let cache = self.cache.read().await;
        let filtered: Vec<CustomerRecord> = cache
            .customers
            .iter()
            .filter(|c| segment.is_none() || c.segment == segment)
            .cloned()
            .collect();
        Ok(CustomerPage::paginate(
            Self::newest_first(filtered),
            page,
            limit,
        ))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.cache.read().await.customers.len())
    }
}
