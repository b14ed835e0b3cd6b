//! Population analytics: grouped counts, rounded means and extrema over customer records.
//!
//! Every projection is a pure function of the population (and `now` for growth). Groups are
//! only emitted when non-empty, so no mean is ever computed over zero records.
//! Records with non-finite numbers are left out of every projection and counted as skipped.

use crate::domain::entities::{AccountType, CustomerRecord, EmploymentStatus, RiskProfile, Segment};
use chrono::{DateTime, Datelike, Months, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default trailing window for segment growth.
pub const DEFAULT_GROWTH_WINDOW_MONTHS: u32 = 6;

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCount {
    pub segment: Option<Segment>,
    pub count: usize,
    pub avg_balance: f64,
    pub avg_income: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCount {
    pub risk_profile: RiskProfile,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthBucket {
    pub year: i32,
    pub month: u32,
    pub segment: Option<Segment>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPattern {
    pub segment: Option<Segment>,
    pub count: usize,
    pub avg_transaction_amount: f64,
    pub max_transaction_amount: f64,
    pub min_transaction_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTypeCount {
    pub account_type: AccountType,
    pub count: usize,
    pub avg_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentCount {
    pub employment_status: EmploymentStatus,
    pub count: usize,
    pub avg_income: f64,
}

/// Segment-oriented projections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentationAnalytics {
    pub segment_counts: Vec<SegmentCount>,
    pub risk_profile_counts: Vec<RiskCount>,
    pub segment_growth: Vec<GrowthBucket>,
}

/// Behavioral projections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankingPatterns {
    pub transaction_patterns: Vec<TransactionPattern>,
    pub account_type_distribution: Vec<AccountTypeCount>,
    pub employment_distribution: Vec<EmploymentCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    /// Records that contributed to the projections.
    pub population: usize,
    /// Records left out because of non-finite numbers.
    pub skipped: usize,
    pub segmentation: SegmentationAnalytics,
    pub banking: BankingPatterns,
}

/// Running sums for one group.
#[derive(Debug, Clone, Copy)]
struct Acc {
    count: usize,
    sum_a: f64,
    sum_b: f64,
    max: f64,
    min: f64,
}

impl Default for Acc {
    fn default() -> Self {
        Self {
            count: 0,
            sum_a: 0.0,
            sum_b: 0.0,
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
        }
    }
}

impl Acc {
    fn push(&mut self, a: f64, b: f64) {
        self.count += 1;
        self.sum_a += a;
        self.sum_b += b;
        self.max = self.max.max(a);
        self.min = self.min.min(a);
    }

    fn mean_a(&self) -> f64 {
        round2(self.sum_a / self.count as f64)
    }

    fn mean_b(&self) -> f64 {
        round2(self.sum_b / self.count as f64)
    }
}

/// Group records by `key`, accumulating `(a, b)` per record. Keys come back in their natural order.
fn group_by<'a, K, I>(
    records: I,
    key: impl Fn(&CustomerRecord) -> K,
    values: impl Fn(&CustomerRecord) -> (f64, f64),
) -> Vec<(K, Acc)>
where
    K: Ord,
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut groups: BTreeMap<K, Acc> = BTreeMap::new();
    for r in records {
        let (a, b) = values(r);
        groups.entry(key(r)).or_default().push(a, b);
    }
    groups.into_iter().collect()
}

fn sort_by_count_desc<K>(groups: &mut [(K, Acc)]) {
    // Stable: ties keep key order.
    groups.sort_by(|(_, x), (_, y)| y.count.cmp(&x.count));
}

/// Aggregator over a population. Holds only the growth window.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsAggregator {
    growth_window_months: u32,
}

impl Default for AnalyticsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_GROWTH_WINDOW_MONTHS)
    }
}

impl AnalyticsAggregator {
    pub fn new(growth_window_months: u32) -> Self {
        Self {
            growth_window_months,
        }
    }

    fn usable(population: &[CustomerRecord]) -> impl Iterator<Item = &CustomerRecord> {
        population.iter().filter(|r| r.validate_numbers().is_ok())
    }

    /// Count, mean balance and mean income per segment, largest group first.
    pub fn segment_distribution(&self, population: &[CustomerRecord]) -> Vec<SegmentCount> {
        let mut groups = group_by(
            Self::usable(population),
            |r| r.segment,
            |r| (r.balance(), r.income()),
        );
        sort_by_count_desc(&mut groups);
        groups
            .into_iter()
            .map(|(segment, acc)| SegmentCount {
                segment,
                count: acc.count,
                avg_balance: acc.mean_a(),
                avg_income: acc.mean_b(),
            })
            .collect()
    }

    /// Count per risk profile, in low/medium/high order.
    pub fn risk_distribution(&self, population: &[CustomerRecord]) -> Vec<RiskCount> {
        group_by(
            Self::usable(population),
            |r| r.risk_profile,
            |_| (0.0, 0.0),
        )
        .into_iter()
        .map(|(risk_profile, acc)| RiskCount {
            risk_profile,
            count: acc.count,
        })
        .collect()
    }

    /// Earliest creation instant still inside the growth window.
    pub fn growth_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_months(Months::new(self.growth_window_months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// New customers per (year, month, segment) over the trailing window, oldest month first.
    pub fn segment_growth(
        &self,
        population: &[CustomerRecord],
        now: DateTime<Utc>,
    ) -> Vec<GrowthBucket> {
        let cutoff = self.growth_cutoff(now);
        group_by(
            Self::usable(population).filter(|r| r.created_at >= cutoff),
            |r| (r.created_at.year(), r.created_at.month(), r.segment),
            |_| (0.0, 0.0),
        )
        .into_iter()
        .map(|((year, month, segment), acc)| GrowthBucket {
            year,
            month,
            segment,
            count: acc.count,
        })
        .collect()
    }

    /// Monthly transaction amount statistics per segment.
    pub fn transaction_patterns(&self, population: &[CustomerRecord]) -> Vec<TransactionPattern> {
        group_by(
            Self::usable(population),
            |r| r.segment,
            |r| (r.monthly_transactions(), 0.0),
        )
        .into_iter()
        .map(|(segment, acc)| TransactionPattern {
            segment,
            count: acc.count,
            avg_transaction_amount: acc.mean_a(),
            max_transaction_amount: acc.max,
            min_transaction_amount: acc.min,
        })
        .collect()
    }

    pub fn account_type_distribution(&self, population: &[CustomerRecord]) -> Vec<AccountTypeCount> {
        let mut groups = group_by(
            Self::usable(population),
            |r| r.account_type,
            |r| (r.balance(), 0.0),
        );
        sort_by_count_desc(&mut groups);
        groups
            .into_iter()
            .map(|(account_type, acc)| AccountTypeCount {
                account_type,
                count: acc.count,
                avg_balance: acc.mean_a(),
            })
            .collect()
    }

    pub fn employment_distribution(&self, population: &[CustomerRecord]) -> Vec<EmploymentCount> {
        let mut groups = group_by(
            Self::usable(population),
            |r| r.employment_status,
            |r| (r.income(), 0.0),
        );
        sort_by_count_desc(&mut groups);
        groups
            .into_iter()
            .map(|(employment_status, acc)| EmploymentCount {
                employment_status,
                count: acc.count,
                avg_income: acc.mean_a(),
            })
            .collect()
    }

    pub fn segmentation(
        &self,
        population: &[CustomerRecord],
        now: DateTime<Utc>,
    ) -> SegmentationAnalytics {
        SegmentationAnalytics {
            segment_counts: self.segment_distribution(population),
            risk_profile_counts: self.risk_distribution(population),
            segment_growth: self.segment_growth(population, now),
        }
    }

    pub fn banking(&self, population: &[CustomerRecord]) -> BankingPatterns {
        BankingPatterns {
            transaction_patterns: self.transaction_patterns(population),
            account_type_distribution: self.account_type_distribution(population),
            employment_distribution: self.employment_distribution(population),
        }
    }

    /// All projections at once.
    pub fn report(&self, population: &[CustomerRecord], now: DateTime<Utc>) -> AnalyticsReport {
        let usable = Self::usable(population).count();
        AnalyticsReport {
            generated_at: now,
            population: usable,
            skipped: population.len() - usable,
            segmentation: self.segmentation(population, now),
            banking: self.banking(population),
        }
    }
}
