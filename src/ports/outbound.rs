//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{CustomerRecord, DomainError, Segment, SegmentChange};

/// One page of a customer listing, newest first.
#[derive(Debug, Clone, Default)]
pub struct CustomerPage {
    pub customers: Vec<CustomerRecord>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl CustomerPage {
    /// Rows skipped before page `page` (1-based). Saturates instead of overflowing.
    pub fn offset(page: usize, limit: usize) -> usize {
        (page.max(1) - 1).saturating_mul(limit.max(1))
    }

    /// Slice an already filtered, newest-first list into page `page` (1-based) of `limit` rows.
    pub fn paginate(customers: Vec<CustomerRecord>, page: usize, limit: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total = customers.len();
        let customers = customers
            .into_iter()
            .skip(Self::offset(page, limit))
            .take(limit)
            .collect();
        Self {
            customers,
            total,
            total_pages: total.div_ceil(limit),
            current_page: page,
        }
    }
}

/// Customer store. Owns the record lifecycle; the core only reads populations and hands back diffs.
#[async_trait::async_trait]
pub trait CustomerRepoPort: Send + Sync {
    /// Load the full population.
    async fn load_customers(&self) -> Result<Vec<CustomerRecord>, DomainError>;

    /// Fetch one customer by id. Returns None if absent.
    async fn get_customer(&self, id: &str) -> Result<Option<CustomerRecord>, DomainError>;

    /// Insert or replace customers by id. Returns the number written.
    async fn upsert_customers(&self, customers: &[CustomerRecord]) -> Result<usize, DomainError>;

    /// Apply segment changes (segment, risk profile, updated_at). Returns how many were applied;
    /// changes for unknown ids are ignored.
    async fn apply_changes(&self, changes: &[SegmentChange]) -> Result<usize, DomainError>;

    /// List customers, optionally filtered by segment, newest first.
    async fn list_customers(
        &self,
        segment: Option<Segment>,
        page: usize,
        limit: usize,
    ) -> Result<CustomerPage, DomainError>;

    /// Number of stored customers.
    async fn count(&self) -> Result<usize, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::fixtures::{customer, date};

    #[test]
    fn paginate_counts_pages_and_slices() {
        let all: Vec<_> = (0..25)
            .map(|i| customer(&format!("c{i}"), date(1990, 1, 1)))
            .collect();
        let page = CustomerPage::paginate(all.clone(), 3, 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.customers.len(), 5);
        assert_eq!(page.customers[0].id, "c20");

        let past_end = CustomerPage::paginate(all, 9, 10);
        assert!(past_end.customers.is_empty());
    }

    #[test]
    fn paginate_guards_zero_limit_and_page() {
        let all = vec![customer("only", date(1990, 1, 1))];
        let page = CustomerPage::paginate(all, 0, 0);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.customers.len(), 1);
    }

    #[test]
    fn huge_page_number_is_empty_not_a_panic() {
        let all = vec![customer("only", date(1990, 1, 1))];
        let page = CustomerPage::paginate(all, usize::MAX / 2, 10);
        assert!(page.customers.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.current_page, usize::MAX / 2);
        assert_eq!(CustomerPage::offset(usize::MAX, usize::MAX), usize::MAX);
        assert_eq!(CustomerPage::offset(3, 10), 20);
    }
}
