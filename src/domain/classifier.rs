//! Rule-based segment classifier.
//!
//! Rules form an ordered table evaluated top to bottom; the first rule whose predicate holds
//! assigns the segment. The conditions overlap, so the order is part of the contract.

use crate::domain::entities::{CustomerRecord, RiskProfile, Segment};
use crate::domain::errors::InvalidRecord;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Attributes a rule may inspect, resolved once per record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationInput {
    pub age: i32,
    pub income: f64,
    pub balance: f64,
    pub has_loans: bool,
}

/// One row of the rule table.
pub struct SegmentRule {
    pub segment: Segment,
    pub description: &'static str,
    pub predicate: fn(&ClassificationInput) -> bool,
}

/// The rule table, highest precedence first.
pub static RULES: [SegmentRule; 4] = [
    SegmentRule {
        segment: Segment::RetiredAffluent,
        description: "age >= 60, income > 80000, balance > 100000",
        predicate: |c| c.age >= 60 && c.income > 80_000.0 && c.balance > 100_000.0,
    },
    SegmentRule {
        segment: Segment::EstablishedProfessional,
        description: "30 <= age < 60, income > 50000",
        predicate: |c| (30..60).contains(&c.age) && c.income > 50_000.0,
    },
    SegmentRule {
        segment: Segment::MortgageSeeker,
        description: "25 <= age < 40, has loans or balance > 50000",
        predicate: |c| (25..40).contains(&c.age) && (c.has_loans || c.balance > 50_000.0),
    },
    SegmentRule {
        segment: Segment::YoungSaver,
        description: "age < 30, income < 50000",
        predicate: |c| c.age < 30 && c.income < 50_000.0,
    },
];

/// Result of classifying one record. Both fields are None when no rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub segment: Option<Segment>,
    pub risk_profile: Option<RiskProfile>,
}

impl Classification {
    pub const UNCLASSIFIED: Classification = Classification {
        segment: None,
        risk_profile: None,
    };

    fn assigned(segment: Segment) -> Self {
        Self {
            segment: Some(segment),
            risk_profile: Some(segment.risk_profile()),
        }
    }
}

/// Age in whole years as a plain calendar-year difference.
///
/// Does not check whether the birthday has passed in `now`'s year; segment boundaries
/// were tuned against this convention.
pub fn age_at(date_of_birth: NaiveDate, now: DateTime<Utc>) -> i32 {
    now.year() - date_of_birth.year()
}

/// Resolve the rule inputs for a record. Fails on invalid records.
pub fn classification_input(
    record: &CustomerRecord,
    now: DateTime<Utc>,
) -> Result<ClassificationInput, InvalidRecord> {
    let dob = record.validate()?;
    Ok(ClassificationInput {
        age: age_at(dob, now),
        income: record.income(),
        balance: record.balance(),
        has_loans: !record.loan_history.is_empty(),
    })
}

/// First rule in `RULES` matching `input`, if any.
pub fn matching_rule(input: &ClassificationInput) -> Option<&'static SegmentRule> {
    RULES.iter().find(|rule| (rule.predicate)(input))
}

/// Classify `record` as of `now`. Pure: same inputs, same output.
pub fn classify(
    record: &CustomerRecord,
    now: DateTime<Utc>,
) -> Result<Classification, InvalidRecord> {
    let input = classification_input(record, now)?;
    Ok(matching_rule(&input)
        .map(|rule| Classification::assigned(rule.segment))
        .unwrap_or(Classification::UNCLASSIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::fixtures::{customer, date, instant, loan};

    fn now() -> DateTime<Utc> {
        instant(2025, 6, 15)
    }

    fn born_years_ago(years: i32) -> NaiveDate {
        date(2025 - years, 3, 1)
    }

    #[test]
    fn age_is_calendar_year_difference() {
        // Birthday later in the year has not happened yet, still counted.
        assert_eq!(age_at(date(1990, 12, 31), instant(2025, 1, 1)), 35);
        assert_eq!(age_at(date(1990, 1, 1), instant(2025, 12, 31)), 35);
    }

    #[test]
    fn scenario_retired_affluent() {
        let mut c = customer("a", born_years_ago(62));
        c.annual_income = Some(90_000.0);
        c.average_account_balance = Some(150_000.0);
        let result = classify(&c, now()).unwrap();
        assert_eq!(result.segment, Some(Segment::RetiredAffluent));
        assert_eq!(result.risk_profile, Some(RiskProfile::Low));
    }

    #[test]
    fn scenario_established_professional() {
        let mut c = customer("b", born_years_ago(35));
        c.annual_income = Some(60_000.0);
        c.average_account_balance = Some(10_000.0);
        let result = classify(&c, now()).unwrap();
        assert_eq!(result.segment, Some(Segment::EstablishedProfessional));
        assert_eq!(result.risk_profile, Some(RiskProfile::Low));
    }

    #[test]
    fn scenario_young_saver() {
        let mut c = customer("c", born_years_ago(28));
        c.annual_income = Some(40_000.0);
        c.average_account_balance = Some(0.0);
        let result = classify(&c, now()).unwrap();
        assert_eq!(result.segment, Some(Segment::YoungSaver));
        assert_eq!(result.risk_profile, Some(RiskProfile::High));
    }

    #[test]
    fn retired_affluent_requires_strictly_greater_income_and_balance() {
        let mut c = customer("edge", born_years_ago(60));
        c.annual_income = Some(80_000.0);
        c.average_account_balance = Some(100_001.0);
        assert_ne!(
            classify(&c, now()).unwrap().segment,
            Some(Segment::RetiredAffluent)
        );

        c.annual_income = Some(80_001.0);
        assert_eq!(
            classify(&c, now()).unwrap().segment,
            Some(Segment::RetiredAffluent)
        );
    }

    #[test]
    fn mortgage_seeker_by_loans_or_balance() {
        let mut c = customer("m", born_years_ago(27));
        c.annual_income = Some(55_000.0);
        c.loan_history = vec![loan(200_000.0)];
        let result = classify(&c, now()).unwrap();
        assert_eq!(result.segment, Some(Segment::MortgageSeeker));
        assert_eq!(result.risk_profile, Some(RiskProfile::Medium));

        let mut c = customer("m2", born_years_ago(27));
        c.annual_income = Some(55_000.0);
        c.average_account_balance = Some(50_000.01);
        assert_eq!(
            classify(&c, now()).unwrap().segment,
            Some(Segment::MortgageSeeker)
        );
    }

    #[test]
    fn earlier_rule_wins_when_several_match() {
        // 35 with high income and loans satisfies both professional and mortgage rules.
        let mut c = customer("o", born_years_ago(35));
        c.annual_income = Some(70_000.0);
        c.loan_history = vec![loan(10_000.0)];
        assert_eq!(
            classify(&c, now()).unwrap().segment,
            Some(Segment::EstablishedProfessional)
        );

        // 27, low income, with a loan: mortgage rule precedes young saver.
        let mut c = customer("p", born_years_ago(27));
        c.annual_income = Some(20_000.0);
        c.loan_history = vec![loan(5_000.0)];
        assert_eq!(
            classify(&c, now()).unwrap().segment,
            Some(Segment::MortgageSeeker)
        );
    }

    #[test]
    fn unmatched_record_is_unclassified() {
        // 45 with modest income matches nothing.
        let mut c = customer("u", born_years_ago(45));
        c.annual_income = Some(30_000.0);
        assert_eq!(classify(&c, now()).unwrap(), Classification::UNCLASSIFIED);

        // Young but earning exactly 50000: young saver needs income < 50000.
        let mut c = customer("u2", born_years_ago(22));
        c.annual_income = Some(50_000.0);
        assert_eq!(classify(&c, now()).unwrap(), Classification::UNCLASSIFIED);
    }

    #[test]
    fn missing_fields_default_to_zero() {
        // No income, no balance, age 20: young saver.
        let c = customer("z", born_years_ago(20));
        assert_eq!(
            classify(&c, now()).unwrap().segment,
            Some(Segment::YoungSaver)
        );
    }

    #[test]
    fn classify_is_deterministic() {
        let mut c = customer("d", born_years_ago(33));
        c.annual_income = Some(51_000.0);
        let first = classify(&c, now()).unwrap();
        for _ in 0..10 {
            assert_eq!(classify(&c, now()).unwrap(), first);
        }
    }

    #[test]
    fn invalid_record_is_rejected() {
        let mut c = customer("x", born_years_ago(33));
        c.date_of_birth = None;
        assert_eq!(classify(&c, now()), Err(InvalidRecord::MissingDateOfBirth));

        let mut c = customer("y", born_years_ago(33));
        c.average_account_balance = Some(f64::NAN);
        assert!(matches!(
            classify(&c, now()),
            Err(InvalidRecord::NonFiniteField { .. })
        ));
    }

    #[test]
    fn rule_table_order_is_fixed() {
        let order: Vec<Segment> = RULES.iter().map(|r| r.segment).collect();
        assert_eq!(
            order,
            vec![
                Segment::RetiredAffluent,
                Segment::EstablishedProfessional,
                Segment::MortgageSeeker,
                Segment::YoungSaver,
            ]
        );
    }
}
