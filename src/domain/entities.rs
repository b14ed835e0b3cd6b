//! Domain entities. Pure data structures for the core business.
//!
//! No storage/IO types here; adapters map rows and CSV lines into these.

use crate::domain::errors::InvalidRecord;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer segment. The unclassified state is modelled as `Option::<Segment>::None`.
///
/// Variant order is the natural order used to break ties in sorted reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    YoungSaver,
    EstablishedProfessional,
    MortgageSeeker,
    RetiredAffluent,
}

impl Segment {
    pub const ALL: [Segment; 4] = [
        Segment::YoungSaver,
        Segment::EstablishedProfessional,
        Segment::MortgageSeeker,
        Segment::RetiredAffluent,
    ];

    /// Stable identifier, as stored and exchanged (`young_saver`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::YoungSaver => "young_saver",
            Segment::EstablishedProfessional => "established_professional",
            Segment::MortgageSeeker => "mortgage_seeker",
            Segment::RetiredAffluent => "retired_affluent",
        }
    }

    /// Parse a stored identifier. Returns None for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|seg| seg.as_str() == s.trim())
    }

    /// Risk profile implied by the segment.
    ///
    /// Retired affluent and established professionals are low risk, mortgage seekers medium,
    /// everyone else high.
    pub fn risk_profile(&self) -> RiskProfile {
        match self {
            Segment::RetiredAffluent | Segment::EstablishedProfessional => RiskProfile::Low,
            Segment::MortgageSeeker => RiskProfile::Medium,
            Segment::YoungSaver => RiskProfile::High,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskProfile::Low => "low",
            RiskProfile::Medium => "medium",
            RiskProfile::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "low" => Some(RiskProfile::Low),
            "medium" => Some(RiskProfile::Medium),
            "high" => Some(RiskProfile::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    Unemployed,
    Retired,
    Student,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "employed",
            EmploymentStatus::SelfEmployed => "self-employed",
            EmploymentStatus::Unemployed => "unemployed",
            EmploymentStatus::Retired => "retired",
            EmploymentStatus::Student => "student",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "employed" => Some(EmploymentStatus::Employed),
            "self-employed" => Some(EmploymentStatus::SelfEmployed),
            "unemployed" => Some(EmploymentStatus::Unemployed),
            "retired" => Some(EmploymentStatus::Retired),
            "student" => Some(EmploymentStatus::Student),
            _ => None,
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Checking,
    Both,
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Checking => "checking",
            AccountType::Both => "both",
            AccountType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "savings" => Some(AccountType::Savings),
            "checking" => Some(AccountType::Checking),
            "both" => Some(AccountType::Both),
            "other" => Some(AccountType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Personal,
    Home,
    Auto,
    Education,
    Other,
}

/// One entry of a customer's loan history. Only `amount` feeds the health score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    #[serde(default)]
    pub amount: Option<f64>,
    /// Free-form (`active`, `paid`, `defaulted`, ...).
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub loan_type: Option<LoanType>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl LoanRecord {
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }
}

/// A bank customer as seen by segmentation and analytics.
///
/// Age is never stored: it is derived from `date_of_birth` at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Required. A record without it cannot be classified or scored.
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    pub employment_status: EmploymentStatus,
    #[serde(default)]
    pub annual_income: Option<f64>,
    pub account_type: AccountType,
    #[serde(default)]
    pub average_account_balance: Option<f64>,
    #[serde(default)]
    pub monthly_transaction_amount: Option<f64>,
    #[serde(default)]
    pub loan_history: Vec<LoanRecord>,
    #[serde(default)]
    pub segment: Option<Segment>,
    #[serde(default)]
    pub risk_profile: RiskProfile,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CustomerRecord {
    pub fn income(&self) -> f64 {
        self.annual_income.unwrap_or(0.0)
    }

    pub fn balance(&self) -> f64 {
        self.average_account_balance.unwrap_or(0.0)
    }

    pub fn monthly_transactions(&self) -> f64 {
        self.monthly_transaction_amount.unwrap_or(0.0)
    }

    pub fn total_debt(&self) -> f64 {
        self.loan_history.iter().map(LoanRecord::amount_or_zero).sum()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Timestamp of the last write, falling back to creation time.
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Reject non-finite numeric fields (NaN, ±inf), including loan amounts.
    pub fn validate_numbers(&self) -> Result<(), InvalidRecord> {
        let fields = [
            ("annual_income", self.annual_income),
            ("average_account_balance", self.average_account_balance),
            ("monthly_transaction_amount", self.monthly_transaction_amount),
        ];
        for (field, value) in fields {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(InvalidRecord::NonFiniteField { field });
            }
        }
        if self
            .loan_history
            .iter()
            .any(|l| l.amount.is_some_and(|v| !v.is_finite()))
        {
            return Err(InvalidRecord::NonFiniteField {
                field: "loan_history.amount",
            });
        }
        Ok(())
    }

    /// Full validation used before classification and scoring.
    /// Returns the date of birth on success.
    pub fn validate(&self) -> Result<NaiveDate, InvalidRecord> {
        let dob = self.date_of_birth.ok_or(InvalidRecord::MissingDateOfBirth)?;
        self.validate_numbers()?;
        Ok(dob)
    }
}

/// A pending segment/risk update for one customer. Produced by the core, applied by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentChange {
    pub id: String,
    pub old_segment: Option<Segment>,
    pub new_segment: Segment,
    pub old_risk: RiskProfile,
    pub new_risk: RiskProfile,
}

impl SegmentChange {
    /// Operator override: put `record` into `segment`, re-deriving its risk profile.
    pub fn manual(record: &CustomerRecord, segment: Segment) -> Self {
        Self {
            id: record.id.clone(),
            old_segment: record.segment,
            new_segment: segment,
            old_risk: record.risk_profile,
            new_risk: segment.risk_profile(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn segment_identifiers_round_trip_through_parse() {
        for seg in Segment::ALL {
            assert_eq!(Segment::parse(seg.as_str()), Some(seg));
        }
        assert_eq!(Segment::parse("vip"), None);
    }

    #[test]
    fn segment_serializes_snake_case() {
        let json = serde_json::to_string(&Segment::RetiredAffluent).unwrap();
        assert_eq!(json, "\"retired_affluent\"");
    }

    #[test]
    fn employment_status_uses_kebab_case() {
        let json = serde_json::to_string(&EmploymentStatus::SelfEmployed).unwrap();
        assert_eq!(json, "\"self-employed\"");
        assert_eq!(
            EmploymentStatus::parse("self-employed"),
            Some(EmploymentStatus::SelfEmployed)
        );
    }

    #[test]
    fn missing_numbers_default_to_zero() {
        let c = customer("c1", date(1990, 1, 1));
        assert_eq!(c.income(), 0.0);
        assert_eq!(c.balance(), 0.0);
        assert_eq!(c.monthly_transactions(), 0.0);
        assert_eq!(c.total_debt(), 0.0);
    }

    #[test]
    fn total_debt_sums_loans_treating_missing_amount_as_zero() {
        let mut c = customer("c1", date(1990, 1, 1));
        c.loan_history = vec![loan(1000.0), LoanRecord::default(), loan(250.5)];
        assert_eq!(c.total_debt(), 1250.5);
    }

    #[test]
    fn validate_rejects_missing_date_of_birth() {
        let mut c = customer("c1", date(1990, 1, 1));
        c.date_of_birth = None;
        assert_eq!(c.validate(), Err(InvalidRecord::MissingDateOfBirth));
    }

    #[test]
    fn validate_rejects_non_finite_fields() {
        let mut c = customer("c1", date(1990, 1, 1));
        c.annual_income = Some(f64::NAN);
        assert_eq!(
            c.validate(),
            Err(InvalidRecord::NonFiniteField {
                field: "annual_income"
            })
        );

        let mut c = customer("c2", date(1990, 1, 1));
        c.loan_history = vec![loan(f64::INFINITY)];
        assert_eq!(
            c.validate_numbers(),
            Err(InvalidRecord::NonFiniteField {
                field: "loan_history.amount"
            })
        );
    }

    #[test]
    fn manual_change_derives_risk_from_segment() {
        let c = customer("c1", date(1990, 1, 1));
        let change = SegmentChange::manual(&c, Segment::MortgageSeeker);
        assert_eq!(change.old_segment, None);
        assert_eq!(change.old_risk, RiskProfile::Medium);
        assert_eq!(change.new_risk, RiskProfile::Medium);

        let change = SegmentChange::manual(&c, Segment::YoungSaver);
        assert_eq!(change.new_risk, RiskProfile::High);
    }

    #[test]
    fn last_updated_falls_back_to_created_at() {
        let mut c = customer("c1", date(1990, 1, 1));
        assert_eq!(c.last_updated(), c.created_at);
        let later = instant(2025, 3, 1);
        c.updated_at = Some(later);
        assert_eq!(c.last_updated(), later);
    }
}
