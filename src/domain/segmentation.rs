//! Batch segmentation. Classifies a population and returns the diff to persist.
//!
//! Nothing here writes: the store applies the emitted changes.

use crate::domain::classifier::classify;
use crate::domain::entities::{CustomerRecord, SegmentChange};
use crate::domain::errors::InvalidRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record the runner could not classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationOutcome {
    /// Records looked at, including skipped ones.
    pub evaluated: usize,
    pub changes: Vec<SegmentChange>,
    pub skipped: Vec<SkippedRecord>,
}

impl SegmentationOutcome {
    /// Concatenate partial outcomes (e.g. per chunk), preserving order.
    pub fn merge(mut self, other: SegmentationOutcome) -> Self {
        self.evaluated += other.evaluated;
        self.changes.extend(other.changes);
        self.skipped.extend(other.skipped);
        self
    }
}

/// Change for a single record, if its classified segment differs from the stored one.
///
/// Unclassified results never produce a change: an existing segment is kept.
pub fn diff_record(
    record: &CustomerRecord,
    now: DateTime<Utc>,
) -> Result<Option<SegmentChange>, InvalidRecord> {
    let result = classify(record, now)?;
    let change = result
        .segment
        .filter(|seg| record.segment != Some(*seg))
        .map(|seg| SegmentChange {
            id: record.id.clone(),
            old_segment: record.segment,
            new_segment: seg,
            old_risk: record.risk_profile,
            new_risk: result.risk_profile.unwrap_or_else(|| seg.risk_profile()),
        });
    Ok(change)
}

pub struct SegmentationRunner;

impl SegmentationRunner {
    pub fn run(population: &[CustomerRecord], now: DateTime<Utc>) -> SegmentationOutcome {
        let mut outcome = SegmentationOutcome {
            evaluated: population.len(),
            ..Default::default()
        };
        for record in population {
            match diff_record(record, now) {
                Ok(Some(change)) => outcome.changes.push(change),
                Ok(None) => {}
                Err(reason) => outcome.skipped.push(SkippedRecord {
                    id: record.id.clone(),
                    reason: reason.to_string(),
                }),
            }
        }
        outcome
    }
}

/// Apply changes to an in-memory population. Used by stores and tests.
/// Returns how many records were updated.
pub fn apply_changes(
    population: &mut [CustomerRecord],
    changes: &[SegmentChange],
    at: DateTime<Utc>,
) -> usize {
    let mut applied = 0;
    for change in changes {
        if let Some(record) = population.iter_mut().find(|r| r.id == change.id) {
            record.segment = Some(change.new_segment);
            record.risk_profile = change.new_risk;
            record.updated_at = Some(at);
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::fixtures::{customer, date, instant};
    use crate::domain::entities::{RiskProfile, Segment};

    fn population() -> Vec<CustomerRecord> {
        let mut retired = customer("retired", date(1960, 4, 1));
        retired.annual_income = Some(120_000.0);
        retired.average_account_balance = Some(400_000.0);

        let mut pro = customer("pro", date(1985, 4, 1));
        pro.annual_income = Some(75_000.0);
        pro.segment = Some(Segment::EstablishedProfessional);
        pro.risk_profile = RiskProfile::Low;

        let mut young = customer("young", date(2000, 4, 1));
        young.annual_income = Some(25_000.0);
        young.segment = Some(Segment::MortgageSeeker);

        let mut nobody = customer("nobody", date(1975, 4, 1));
        nobody.annual_income = Some(20_000.0);
        nobody.segment = Some(Segment::MortgageSeeker);

        let mut broken = customer("broken", date(1990, 4, 1));
        broken.date_of_birth = None;

        vec![retired, pro, young, nobody, broken]
    }

    #[test]
    fn emits_changes_only_for_new_segments() {
        let outcome = SegmentationRunner::run(&population(), instant(2025, 6, 1));
        assert_eq!(outcome.evaluated, 5);
        assert_eq!(
            outcome.changes,
            vec![
                SegmentChange {
                    id: "retired".to_string(),
                    old_segment: None,
                    new_segment: Segment::RetiredAffluent,
                    old_risk: RiskProfile::Medium,
                    new_risk: RiskProfile::Low,
                },
                SegmentChange {
                    id: "young".to_string(),
                    old_segment: Some(Segment::MortgageSeeker),
                    new_segment: Segment::YoungSaver,
                    old_risk: RiskProfile::Medium,
                    new_risk: RiskProfile::High,
                },
            ]
        );
    }

    #[test]
    fn unclassified_keeps_existing_segment() {
        let pop = population();
        let nobody = pop.iter().find(|r| r.id == "nobody").unwrap();
        assert_eq!(diff_record(nobody, instant(2025, 6, 1)), Ok(None));
    }

    #[test]
    fn invalid_records_are_skipped_without_aborting() {
        let outcome = SegmentationRunner::run(&population(), instant(2025, 6, 1));
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].id, "broken");
        assert_eq!(outcome.skipped[0].reason, "date of birth is missing");
        assert_eq!(outcome.changes.len(), 2);
    }

    #[test]
    fn second_run_after_applying_is_empty() {
        let now = instant(2025, 6, 1);
        let mut pop = population();
        let first = SegmentationRunner::run(&pop, now);
        let applied = apply_changes(&mut pop, &first.changes, now);
        assert_eq!(applied, first.changes.len());

        let second = SegmentationRunner::run(&pop, now);
        assert!(second.changes.is_empty());
        let young = pop.iter().find(|r| r.id == "young").unwrap();
        assert_eq!(young.risk_profile, RiskProfile::High);
        assert_eq!(young.updated_at, Some(now));
    }

    #[test]
    fn empty_population() {
        let outcome = SegmentationRunner::run(&[], instant(2025, 6, 1));
        assert_eq!(outcome, SegmentationOutcome::default());
    }

    #[test]
    fn merge_concatenates_in_order() {
        let now = instant(2025, 6, 1);
        let pop = population();
        let (left, right) = pop.split_at(2);
        let merged = SegmentationRunner::run(left, now).merge(SegmentationRunner::run(right, now));
        assert_eq!(merged, SegmentationRunner::run(&pop, now));
    }
}
