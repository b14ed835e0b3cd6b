//! CSV export of the customer listing. Uses the `csv` crate for quoting and escaping.

use crate::domain::CustomerRecord;
use crate::domain::catalog::NOT_SEGMENTED;

pub const EXPORT_HEADER: [&str; 12] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Segment",
    "Risk Profile",
    "Employment Status",
    "Annual Income",
    "Account Type",
    "Avg. Balance",
    "Monthly Transactions",
    "Join Date",
];

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Convert customers to a CSV string, one row per customer, in the given order.
///
/// Format: comma-delimited with the [`EXPORT_HEADER`] row. Unsegmented customers
/// export as "Not Segmented"; missing numbers export as empty cells.
pub fn customers_to_csv(customers: &[CustomerRecord]) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    wtr.write_record(EXPORT_HEADER)?;

    for c in customers {
        let segment = c.segment.map_or(NOT_SEGMENTED, |s| s.as_str());
        wtr.write_record([
            c.id.as_str(),
            &c.full_name(),
            c.email.as_deref().unwrap_or(""),
            c.phone.as_deref().unwrap_or(""),
            segment,
            c.risk_profile.as_str(),
            c.employment_status.as_str(),
            &number(c.annual_income),
            c.account_type.as_str(),
            &number(c.average_account_balance),
            &number(c.monthly_transaction_amount),
            &c.created_at.format("%Y-%m-%d").to_string(),
        ])?;
    }

    wtr.flush()?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;

    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}
