//! Bulk transfer of customer populations in and out of CSV.

pub mod csv_export;
pub mod csv_import;

pub use csv_export::customers_to_csv;
pub use csv_import::{CsvImport, RejectedRow, customers_from_csv};
