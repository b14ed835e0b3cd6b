//! SQLite-backed customer store via libsql. Implements CustomerRepoPort.
//!
//! Single `customers` table keyed by id. Loan history is kept as a JSON column; timestamps
//! are Unix milliseconds so ordering by `created_at` is a plain integer sort.
//! Database file: {data_dir}/customers.db

use crate::domain::{
    AccountType, CustomerRecord, DomainError, EmploymentStatus, LoanRecord, RiskProfile, Segment,
    SegmentChange,
};
use crate::ports::{CustomerPage, CustomerRepoPort};
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Database, Row, Value, params};
use std::path::{Path, PathBuf};
use tracing::info;

const CUSTOMERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    date_of_birth TEXT,
    employment_status TEXT NOT NULL,
    annual_income REAL,
    account_type TEXT NOT NULL,
    average_account_balance REAL,
    monthly_transaction_amount REAL,
    loan_history_json TEXT NOT NULL DEFAULT '[]',
    segment TEXT,
    risk_profile TEXT NOT NULL DEFAULT 'medium',
    created_at INTEGER NOT NULL,
    updated_at INTEGER
)"#;
const SEGMENT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_customers_segment ON customers (segment, created_at DESC)";
const CREATED_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_customers_created ON customers (created_at DESC)";

const SELECT_COLUMNS: &str = "id, first_name, last_name, email, phone, date_of_birth, \
     employment_status, annual_income, account_type, average_account_balance, \
     monthly_transaction_amount, loan_history_json, segment, risk_profile, created_at, updated_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn column(row: &Row, idx: i32) -> Result<Value, DomainError> {
    row.get_value(idx)
        .map_err(|e| DomainError::Repo(format!("column {}: {}", idx, e)))
}

/// Nullable TEXT column. NULL is None; any other non-text value is an error.
fn opt_text(row: &Row, idx: i32) -> Result<Option<String>, DomainError> {
    match column(row, idx)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(DomainError::Repo(format!(
            "column {}: expected text, found {:?}",
            idx, other
        ))),
    }
}

fn text(row: &Row, idx: i32) -> Result<String, DomainError> {
    opt_text(row, idx)?.ok_or_else(|| DomainError::Repo(format!("column {}: unexpected NULL", idx)))
}

/// Nullable REAL column. Integers are widened; text and blobs are errors.
fn opt_real(row: &Row, idx: i32) -> Result<Option<f64>, DomainError> {
    match column(row, idx)? {
        Value::Null => Ok(None),
        Value::Real(v) => Ok(Some(v)),
        Value::Integer(v) => Ok(Some(v as f64)),
        other => Err(DomainError::Repo(format!(
            "column {}: expected real, found {:?}",
            idx, other
        ))),
    }
}

fn opt_integer(row: &Row, idx: i32) -> Result<Option<i64>, DomainError> {
    match column(row, idx)? {
        Value::Null => Ok(None),
        Value::Integer(v) => Ok(Some(v)),
        other => Err(DomainError::Repo(format!(
            "column {}: expected integer, found {:?}",
            idx, other
        ))),
    }
}

fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// SQLite customer store. One database file (customers.db) in the given base directory.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup; the returned repo is safe to share via Arc.
    ///
    /// Sets WAL mode and synchronous=NORMAL for concurrent read/write.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join("customers.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Repo(e.to_string()))?;

        // PRAGMA returns a row (new value); use query and consume rows (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{} failed: {}", pragma, e)))?;
            while rows
                .next()
                .await
                .map_err(|e| DomainError::Repo(e.to_string()))?
                .is_some()
            {}
        }

        for ddl in [CUSTOMERS_TABLE, SEGMENT_INDEX, CREATED_INDEX] {
            conn.execute(ddl, ())
                .await
                .map_err(|e| DomainError::Repo(e.to_string()))?;
        }

        info!(path = %db_path.display(), "SQLite customer store connected (WAL)");

        Ok(Self {
            db,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<libsql::Connection, DomainError> {
        self.db.connect().map_err(|e| DomainError::Repo(e.to_string()))
    }

    async fn query_customers(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<CustomerRecord>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut customers = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            customers.push(Self::row_to_customer(&row)?);
        }
        Ok(customers)
    }

    fn row_to_customer(row: &Row) -> Result<CustomerRecord, DomainError> {
        let id = text(row, 0)?;
        let bad = |what: &str, value: &str| {
            DomainError::Repo(format!("customer {}: invalid {} '{}'", id, what, value))
        };

        let date_of_birth = match opt_text(row, 5)? {
            Some(s) => Some(
                NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|_| bad("date_of_birth", &s))?,
            ),
            None => None,
        };
        let employment = text(row, 6)?;
        let employment_status =
            EmploymentStatus::parse(&employment).ok_or_else(|| bad("employment_status", &employment))?;
        let account = text(row, 8)?;
        let account_type =
            AccountType::parse(&account).ok_or_else(|| bad("account_type", &account))?;
        let loans_json = opt_text(row, 11)?.unwrap_or_else(|| "[]".to_string());
        let loan_history: Vec<LoanRecord> =
            serde_json::from_str(&loans_json).map_err(|_| bad("loan_history_json", &loans_json))?;
        let segment = match opt_text(row, 12)? {
            Some(s) => Some(Segment::parse(&s).ok_or_else(|| bad("segment", &s))?),
            None => None,
        };
        let risk = opt_text(row, 13)?.unwrap_or_else(|| "medium".to_string());
        let risk_profile = RiskProfile::parse(&risk).ok_or_else(|| bad("risk_profile", &risk))?;
        let created_ms = opt_integer(row, 14)?.ok_or_else(|| bad("created_at", "NULL"))?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms)
            .ok_or_else(|| bad("created_at", &created_ms.to_string()))?;
        let updated_at = match opt_integer(row, 15)? {
            Some(ms) => Some(
                DateTime::<Utc>::from_timestamp_millis(ms)
                    .ok_or_else(|| bad("updated_at", &ms.to_string()))?,
            ),
            None => None,
        };

        Ok(CustomerRecord {
            first_name: text(row, 1)?,
            last_name: text(row, 2)?,
            email: opt_text(row, 3)?,
            phone: opt_text(row, 4)?,
            date_of_birth,
            employment_status,
            annual_income: opt_real(row, 7)?,
            account_type,
            average_account_balance: opt_real(row, 9)?,
            monthly_transaction_amount: opt_real(row, 10)?,
            loan_history,
            segment,
            risk_profile,
            created_at,
            updated_at,
            id,
        })
    }
}

#[async_trait::async_trait]
impl CustomerRepoPort for SqliteRepo {
    async fn load_customers(&self) -> Result<Vec<CustomerRecord>, DomainError> {
        let sql = format!("SELECT {} FROM customers ORDER BY created_at DESC", SELECT_COLUMNS);
        self.query_customers(&sql, ()).await
    }

    async fn get_customer(&self, id: &str) -> Result<Option<CustomerRecord>, DomainError> {
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", SELECT_COLUMNS);
        Ok(self
            .query_customers(&sql, params![id])
            .await?
            .into_iter()
            .next())
    }

    async fn upsert_customers(&self, customers: &[CustomerRecord]) -> Result<usize, DomainError> {
        if customers.is_empty() {
            return Ok(0);
        }
        // NaN is stored as NULL and inf as a REAL; neither reads back as written.
        for c in customers {
            c.validate_numbers()
                .map_err(|reason| DomainError::InvalidRecord {
                    id: c.id.clone(),
                    reason,
                })?;
        }
        let conn = self.conn()?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        for c in customers {
            let loans_json = serde_json::to_string(&c.loan_history)
                .map_err(|e| DomainError::Repo(e.to_string()))?;
            tx.execute(
                r#"
                INSERT INTO customers (id, first_name, last_name, email, phone, date_of_birth,
                    employment_status, annual_income, account_type, average_account_balance,
                    monthly_transaction_amount, loan_history_json, segment, risk_profile,
                    created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                ON CONFLICT (id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    email = excluded.email,
                    phone = excluded.phone,
                    date_of_birth = excluded.date_of_birth,
                    employment_status = excluded.employment_status,
                    annual_income = excluded.annual_income,
                    account_type = excluded.account_type,
                    average_account_balance = excluded.average_account_balance,
                    monthly_transaction_amount = excluded.monthly_transaction_amount,
                    loan_history_json = excluded.loan_history_json,
                    segment = excluded.segment,
                    risk_profile = excluded.risk_profile,
                    updated_at = excluded.updated_at
                "#,
                params![
                    c.id.as_str(),
                    c.first_name.as_str(),
                    c.last_name.as_str(),
                    c.email.clone(),
                    c.phone.clone(),
                    c.date_of_birth.map(|d| d.format(DATE_FORMAT).to_string()),
                    c.employment_status.as_str(),
                    c.annual_income,
                    c.account_type.as_str(),
                    c.average_account_balance,
                    c.monthly_transaction_amount,
                    loans_json,
                    c.segment.map(|s| s.as_str()),
                    c.risk_profile.as_str(),
                    c.created_at.timestamp_millis(),
                    c.updated_at.map(|t| t.timestamp_millis()),
                ],
            )
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        }
        tx.commit()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        info!(
            path = %self.db_path.display(),
            count = customers.len(),
            "upserted customers"
        );
        Ok(customers.len())
    }

    async fn apply_changes(&self, changes: &[SegmentChange]) -> Result<usize, DomainError> {
        if changes.is_empty() {
            return Ok(0);
        }
        let now = Utc::now().timestamp_millis();
        let conn = self.conn()?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut applied = 0usize;
        for change in changes {
            let affected = tx
                .execute(
                    "UPDATE customers SET segment = ?1, risk_profile = ?2, updated_at = ?3 WHERE id = ?4",
                    params![
                        change.new_segment.as_str(),
                        change.new_risk.as_str(),
                        now,
                        change.id.as_str()
                    ],
                )
                .await
                .map_err(|e| DomainError::Repo(e.to_string()))?;
            applied += affected as usize;
        }
        tx.commit()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        Ok(applied)
    }

    async fn list_customers(
        &self,
        segment: Option<Segment>,
        page: usize,
        limit: usize,
    ) -> Result<CustomerPage, DomainError> {
        let limit = limit.max(1);
        let page = page.max(1);
        let filter = segment.map(|s| s.as_str());

        let conn = self.conn()?;
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM customers WHERE ?1 IS NULL OR segment = ?1",
                params![filter],
            )
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let total: i64 = match rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            Some(row) => row.get(0).map_err(|e| DomainError::Repo(e.to_string()))?,
            None => 0,
        };

        let sql = format!(
            "SELECT {} FROM customers WHERE ?1 IS NULL OR segment = ?1 \
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
            SELECT_COLUMNS
        );
        let customers = self
            .query_customers(
                &sql,
                params![
                    filter,
                    to_sql_int(limit),
                    to_sql_int(CustomerPage::offset(page, limit))
                ],
            )
            .await?;

        let total = total as usize;
        Ok(CustomerPage {
            customers,
            total,
            total_pages: total.div_ceil(limit),
            current_page: page,
        })
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query("SELECT COUNT(*) FROM customers", ())
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        match rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            Some(row) => {
                let n: i64 = row.get(0).map_err(|e| DomainError::Repo(e.to_string()))?;
                Ok(n as usize)
            }
            None => Ok(0),
        }
    }
}
