//! CSV import. Parses a customer population with the `csv` crate and serde.
//!
//! Expected header (comma-delimited, any column order):
//! `id,first_name,last_name,email,phone,date_of_birth,employment_status,annual_income,
//! account_type,average_account_balance,monthly_transaction_amount,loan_history,segment,
//! risk_profile,created_at`
//!
//! `loan_history` is a JSON array of loan objects. Empty numeric cells mean "not provided".
//! A row that cannot be mapped is rejected on its own; the rest of the file still imports.

use crate::domain::{
    AccountType, CustomerRecord, EmploymentStatus, LoanRecord, RiskProfile, Segment,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CsvCustomerRow {
    id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
    employment_status: String,
    #[serde(default)]
    annual_income: Option<f64>,
    account_type: String,
    #[serde(default)]
    average_account_balance: Option<f64>,
    #[serde(default)]
    monthly_transaction_amount: Option<f64>,
    #[serde(default)]
    loan_history: Option<String>,
    #[serde(default)]
    segment: Option<String>,
    #[serde(default)]
    risk_profile: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

/// A CSV row that could not be imported. `line` is 1-based and counts the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct CsvImport {
    pub customers: Vec<CustomerRecord>,
    pub rejected: Vec<RejectedRow>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl CsvCustomerRow {
    fn into_record(self, imported_at: DateTime<Utc>) -> Result<CustomerRecord, String> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err("missing id".to_string());
        }
        let date_of_birth = match non_empty(self.date_of_birth) {
            Some(s) => Some(
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|_| format!("invalid date_of_birth '{}'", s))?,
            ),
            None => None,
        };
        let employment_status = EmploymentStatus::parse(&self.employment_status).ok_or_else(|| {
            format!("invalid employment_status '{}'", self.employment_status)
        })?;
        let account_type = AccountType::parse(&self.account_type)
            .ok_or_else(|| format!("invalid account_type '{}'", self.account_type))?;
        let loan_history: Vec<LoanRecord> = match non_empty(self.loan_history) {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| format!("invalid loan_history: {}", e))?,
            None => Vec::new(),
        };
        let segment = match non_empty(self.segment) {
            Some(s) => Some(Segment::parse(&s).ok_or_else(|| format!("invalid segment '{}'", s))?),
            None => None,
        };
        let risk_profile = match non_empty(self.risk_profile) {
            Some(s) => RiskProfile::parse(&s).ok_or_else(|| format!("invalid risk_profile '{}'", s))?,
            None => RiskProfile::default(),
        };
        let created_at = match non_empty(self.created_at) {
            Some(s) => parse_timestamp(&s).ok_or_else(|| format!("invalid created_at '{}'", s))?,
            None => imported_at,
        };

        let record = CustomerRecord {
            id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: non_empty(self.email),
            phone: non_empty(self.phone),
            date_of_birth,
            employment_status,
            annual_income: self.annual_income,
            account_type,
            average_account_balance: self.average_account_balance,
            monthly_transaction_amount: self.monthly_transaction_amount,
            loan_history,
            segment,
            risk_profile,
            created_at,
            updated_at: None,
        };
        record.validate_numbers().map_err(|e| e.to_string())?;
        Ok(record)
    }
}

/// Parse customers from CSV text. Only a malformed header is fatal.
///
/// Rows without `created_at` are stamped with `imported_at`. Rows carrying non-finite
/// numbers (`NaN`, `inf`) are rejected.
pub fn customers_from_csv(
    input: &str,
    imported_at: DateTime<Utc>,
) -> Result<CsvImport, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(input.as_bytes());
    let headers = rdr.headers()?.clone();

    let mut import = CsvImport::default();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                import.rejected.push(RejectedRow {
                    line: e.position().map_or(0, |p| p.line()),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());
        let mapped = record
            .deserialize::<CsvCustomerRow>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(|row| row.into_record(imported_at));
        match mapped {
            Ok(customer) => import.customers.push(customer),
            Err(reason) => import.rejected.push(RejectedRow { line, reason }),
        }
    }
    Ok(import)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEADER: &str = "id,first_name,last_name,email,phone,date_of_birth,employment_status,annual_income,account_type,average_account_balance,monthly_transaction_amount,loan_history,segment,risk_profile,created_at";

    fn imported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn imports_full_row() {
        let csv = format!(
            "{}\n{}\n",
            HEADER,
            r#"c-1,John,Doe,john.doe@example.com,+1234567890,1990-05-15,employed,75000,checking,15420.50,45,"[{""amount"":12000,""status"":""active"",""type"":""auto""}]",established_professional,low,2024-03-10T09:30:00Z"#
        );
        let import = customers_from_csv(&csv, imported_at()).unwrap();
        assert!(import.rejected.is_empty());
        let c = &import.customers[0];
        assert_eq!(c.id, "c-1");
        assert_eq!(c.full_name(), "John Doe");
        assert_eq!(c.date_of_birth, NaiveDate::from_ymd_opt(1990, 5, 15));
        assert_eq!(c.average_account_balance, Some(15_420.5));
        assert_eq!(c.loan_history.len(), 1);
        assert_eq!(c.total_debt(), 12_000.0);
        assert_eq!(c.segment, Some(Segment::EstablishedProfessional));
        assert_eq!(c.risk_profile, RiskProfile::Low);
        assert_eq!(
            c.created_at,
            Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn empty_cells_become_defaults() {
        let csv = format!("{}\nc-2,Ann,Lee,,,1999-01-01,student,,savings,,,,,,\n", HEADER);
        let import = customers_from_csv(&csv, imported_at()).unwrap();
        let c = &import.customers[0];
        assert_eq!(c.email, None);
        assert_eq!(c.annual_income, None);
        assert!(c.loan_history.is_empty());
        assert_eq!(c.segment, None);
        assert_eq!(c.risk_profile, RiskProfile::Medium);
        assert_eq!(c.created_at, imported_at());
    }

    #[test]
    fn bad_rows_are_rejected_individually() {
        let csv = format!(
            "{}\n{}\n{}\n{}\n",
            HEADER,
            "ok,A,B,,,1980-01-01,retired,90000,both,200000,100,,,,2025-01-01",
            "bad-seg,A,B,,,1980-01-01,retired,90000,both,200000,100,,vip,,",
            "bad-num,A,B,,,1980-01-01,retired,lots,both,200000,100,,,,",
        );
        let import = customers_from_csv(&csv, imported_at()).unwrap();
        assert_eq!(import.customers.len(), 1);
        assert_eq!(import.customers[0].id, "ok");
        assert_eq!(import.rejected.len(), 2);
        assert_eq!(import.rejected[0].line, 3);
        assert!(import.rejected[0].reason.contains("invalid segment"));
        assert_eq!(import.rejected[1].line, 4);
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let csv = format!(
            "{}\n{}\n{}\n{}\n",
            HEADER,
            "nan-income,A,B,,,1999-01-01,student,NaN,savings,100,10,,,,",
            "inf-balance,A,B,,,1999-01-01,student,20000,savings,inf,10,,,,",
            r#"inf-loan,A,B,,,1999-01-01,student,20000,savings,100,10,"[{""amount"":1e999}]",,,"#,
        );
        let import = customers_from_csv(&csv, imported_at()).unwrap();
        assert!(import.customers.is_empty());
        let lines: Vec<u64> = import.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert!(import.rejected[0].reason.contains("annual_income"));
        assert!(import.rejected[1].reason.contains("average_account_balance"));
    }

    #[test]
    fn line_numbers_follow_multiline_cells() {
        let csv = format!(
            "{}\n{}\n{}\n",
            HEADER,
            "ok,\"Multi\nLine\",B,,,1980-01-01,retired,90000,both,200000,100,,,,",
            "bad,A,B,,,1980-01-01,astronaut,90000,both,200000,100,,,,",
        );
        let import = customers_from_csv(&csv, imported_at()).unwrap();
        assert_eq!(import.customers.len(), 1);
        assert_eq!(import.customers[0].first_name, "Multi\nLine");
        assert_eq!(import.rejected.len(), 1);
        assert_eq!(import.rejected[0].line, 4);
    }

    #[test]
    fn empty_input_imports_nothing() {
        let import = customers_from_csv(&format!("{}\n", HEADER), imported_at()).unwrap();
        assert!(import.customers.is_empty());
        assert!(import.rejected.is_empty());
    }
}
