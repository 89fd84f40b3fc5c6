use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, ErrorCode};
use tracing::info;

use super::domain::{ContactMessage, InterestedLoan, User};
use super::repository::{LoanStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    email TEXT,
    message TEXT
);
CREATE TABLE IF NOT EXISTS interested_loans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_email TEXT NOT NULL,
    bank TEXT,
    loan_type TEXT,
    rate TEXT,
    docs TEXT
);
";

/// SQLite-backed [`LoanStore`] sharing one connection behind a mutex.
pub struct SqliteLoanStore {
    conn: Mutex<Connection>,
}

impl SqliteLoanStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self::with_connection(conn)?;
        info!(path = %path.display(), "database initialized");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".to_string()))
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

fn read_loan(row: &rusqlite::Row<'_>) -> rusqlite::Result<InterestedLoan> {
    Ok(InterestedLoan {
        bank: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        loan_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        rate: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        docs: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

impl LoanStore for SqliteLoanStore {
    fn create_user(
        &self,
        name: &str,
        email: &str,
        password_digest: &str,
    ) -> Result<User, StoreError> {
        let conn = self.conn()?;
        match conn.execute(
            "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3)",
            params![name, email, password_digest],
        ) {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                email: email.to_string(),
            }),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    fn find_user(&self, email: &str, password_digest: &str) -> Result<Option<User>, StoreError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, email FROM users WHERE email = ?1 AND password = ?2")?;
        let mut rows = stmt.query_map(params![email, password_digest], |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        })?;
        let user = rows.next().transpose()?;
        Ok(user)
    }

    fn insert_contact(&self, message: &ContactMessage) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO contacts (name, email, message) VALUES (?1, ?2, ?3)",
            params![message.name, message.email, message.message],
        )?;
        Ok(())
    }

    fn add_interest(&self, user_email: &str, loan: &InterestedLoan) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO interested_loans (user_email, bank, loan_type, rate, docs)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user_email, loan.bank, loan.loan_type, loan.rate, loan.docs],
        )?;
        Ok(())
    }

    fn list_interests(&self, user_email: &str) -> Result<Vec<InterestedLoan>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT bank, loan_type, rate, docs FROM interested_loans
             WHERE user_email = ?1 ORDER BY id",
        )?;
        let loans = stmt
            .query_map(params![user_email], read_loan)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(loans)
    }

    fn remove_interest(
        &self,
        user_email: &str,
        bank: &str,
        loan_type: &str,
    ) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM interested_loans WHERE user_email = ?1 AND bank = ?2 AND loan_type = ?3",
            params![user_email, bank, loan_type],
        )?;
        Ok(removed)
    }

    fn count_interests(&self, user_email: &str) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM interested_loans WHERE user_email = ?1",
            params![user_email],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
