//! Financial health score: a bounded 0-100 heuristic over income, savings coverage,
//! debt burden and transaction activity.
//!
//! Each bonus chain is a threshold table sorted from most to least favorable; the first
//! satisfied row wins.

use crate::domain::entities::CustomerRecord;
use crate::domain::errors::InvalidRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

const BASE_SCORE: i32 = 50;
const ACTIVITY_BONUS: i32 = 10;

/// Income bonus: income > boundary.
const INCOME_BONUSES: [(f64, i32); 4] = [
    (100_000.0, 20),
    (60_000.0, 15),
    (30_000.0, 10),
    (15_000.0, 5),
];

/// Savings bonus: months of income held as balance > boundary.
const SAVINGS_BONUSES: [(f64, i32); 4] = [(12.0, 20), (6.0, 15), (3.0, 10), (1.0, 5)];

/// Debt bonus: debt-to-income < boundary. Lower is better.
const DEBT_BONUSES: [(f64, i32); 4] = [(0.1, 20), (0.3, 15), (0.5, 10), (1.0, 5)];

fn bonus_above(value: f64, table: &[(f64, i32)]) -> i32 {
    table
        .iter()
        .find(|(boundary, _)| value > *boundary)
        .map_or(0, |(_, bonus)| *bonus)
}

fn bonus_below(value: f64, table: &[(f64, i32)]) -> i32 {
    table
        .iter()
        .find(|(boundary, _)| value < *boundary)
        .map_or(0, |(_, bonus)| *bonus)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthRating {
    Excellent,
    Good,
    Average,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl HealthRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => HealthRating::Excellent,
            65..=79 => HealthRating::Good,
            45..=64 => HealthRating::Average,
            _ => HealthRating::NeedsImprovement,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthRating::Excellent => "Excellent",
            HealthRating::Good => "Good",
            HealthRating::Average => "Average",
            HealthRating::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for HealthRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse labels reported next to the score.
///
/// Derived independently of the bonuses, so they can disagree with the score near band edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthFactors {
    pub income: String,
    pub savings: String,
    pub debt: String,
    pub activity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialHealthReport {
    pub score: u8,
    pub rating: HealthRating,
    pub factors: HealthFactors,
}

/// Intermediate ratios, exposed for explanation and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthInputs {
    pub income: f64,
    pub savings_ratio: f64,
    pub debt_to_income: f64,
    pub monthly_transactions: f64,
}

impl HealthInputs {
    pub fn from_record(record: &CustomerRecord) -> Self {
        let income = record.income();
        let savings_ratio = record.balance() / income.max(1.0) * 12.0;
        let debt_to_income = if income > 0.0 {
            record.total_debt() / income
        } else {
            0.0
        };
        Self {
            income,
            savings_ratio,
            debt_to_income,
            monthly_transactions: record.monthly_transactions(),
        }
    }

    pub fn raw_score(&self) -> i32 {
        let mut score = BASE_SCORE;
        score += bonus_above(self.income, &INCOME_BONUSES);
        score += bonus_above(self.savings_ratio, &SAVINGS_BONUSES);
        score += bonus_below(self.debt_to_income, &DEBT_BONUSES);
        if self.monthly_transactions > 0.0 && self.monthly_transactions < self.income / 3.0 {
            score += ACTIVITY_BONUS;
        }
        score
    }

    pub fn factors(&self) -> HealthFactors {
        let label = |cond: bool, yes: &str, no: &str| (if cond { yes } else { no }).to_string();
        HealthFactors {
            income: label(self.income > 0.0, "Good", "Not Provided"),
            savings: label(self.savings_ratio > 3.0, "Good", "Could be Improved"),
            debt: label(self.debt_to_income < 0.5, "Manageable", "High"),
            activity: label(self.monthly_transactions > 0.0, "Active", "Inactive"),
        }
    }
}

/// Score a single record. Fails on invalid records instead of returning a misleading score.
pub fn score(record: &CustomerRecord) -> Result<FinancialHealthReport, InvalidRecord> {
    record.validate()?;
    let inputs = HealthInputs::from_record(record);
    let score = inputs.raw_score().clamp(0, 100) as u8;
    Ok(FinancialHealthReport {
        score,
        rating: HealthRating::from_score(score),
        factors: inputs.factors(),
    })
}
