use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use finance_core::{
    NewTaxRecord, NewUser, Page, PageRequest, RepositoryError, TaxLedger, TaxRecord, TaxRegime,
    User, UserStore, Watchlist, join_deductions, split_deductions,
};
use sqlx::{Row, sqlite::SqlitePool};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn user_exists(
        &self,
        username: &str,
    ) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(row.is_some())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User, RepositoryError> {
    Ok(User {
        username: row
            .try_get("username")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        security_question: row
            .try_get("security_question")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        answer_hash: row
            .try_get("answer_hash")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {}", e)))?,
    })
}

fn row_to_tax_record(row: &sqlx::sqlite::SqliteRow) -> Result<TaxRecord, RepositoryError> {
    let regime: String = row
        .try_get("regime")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
    let deductions: String = row
        .try_get("deductions")
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

    Ok(TaxRecord {
        id: row
            .try_get("id")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        username: row
            .try_get("username")
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        date: row
            .try_get::<NaiveDate, _>("record_date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get record_date: {}", e)))?,
        income: get_decimal(row, "income")?,
        regime: regime
            .parse::<TaxRegime>()
            .map_err(|e| RepositoryError::Database(e.to_string()))?,
        deductions: split_deductions(&deductions),
        taxable_income: get_decimal(row, "taxable_income")?,
        base_tax: get_decimal(row, "base_tax")?,
        cess: get_decimal(row, "cess")?,
        final_tax: get_decimal(row, "final_tax")?,
    })
}

#[async_trait]
impl UserStore for SqliteRepository {
    async fn create_user(
        &self,
        user: NewUser,
    ) -> Result<User, RepositoryError> {
        let user = user.into_user(Utc::now());

        sqlx::query(
            "INSERT INTO users (username, password_hash, security_question, answer_hash, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.security_question)
        .bind(&user.answer_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!("user '{}' already exists", user.username))
            } else {
                RepositoryError::Database(e.to_string())
            }
        })?;

        debug!(username = %user.username, "user created");
        Ok(user)
    }

    async fn get_user(
        &self,
        username: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query(
            "SELECT username, password_hash, security_question, answer_hash, created_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row_to_user(&row)
    }

    async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE username = ?")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn rename_user(
        &self,
        username: &str,
        new_username: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        // Child rows reference users(username), so the new row must exist
        // before they move and the old one can only go after.
        let copied = sqlx::query(
            "INSERT INTO users (username, password_hash, security_question, answer_hash, created_at)
             SELECT ?, password_hash, security_question, answer_hash, created_at
             FROM users WHERE username = ?",
        )
        .bind(new_username)
        .bind(username)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepositoryError::Conflict(format!("user '{}' already exists", new_username))
            } else {
                RepositoryError::Database(e.to_string())
            }
        })?;

        if copied.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        for statement in [
            "UPDATE tax_records SET username = ? WHERE username = ?",
            "UPDATE watchlist SET username = ? WHERE username = ?",
        ] {
            sqlx::query(statement)
                .bind(new_username)
                .bind(username)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(from = username, to = new_username, "user renamed");
        self.get_user(new_username).await
    }

    async fn delete_user(
        &self,
        username: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        for statement in [
            "DELETE FROM watchlist WHERE username = ?",
            "DELETE FROM tax_records WHERE username = ?",
        ] {
            sqlx::query(statement)
                .bind(username)
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(username, "user deleted");
        Ok(())
    }

    async fn list_usernames(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT username FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("username")
                    .map_err(|e| RepositoryError::Database(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl TaxLedger for SqliteRepository {
    async fn append_record(
        &self,
        record: NewTaxRecord,
    ) -> Result<TaxRecord, RepositoryError> {
        if !self.user_exists(&record.username).await? {
            return Err(RepositoryError::NotFound);
        }

        let result = sqlx::query(
            "INSERT INTO tax_records (
                username, record_date, income, regime, deductions,
                taxable_income, base_tax, cess, final_tax
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.username)
        .bind(record.date)
        .bind(decimal_to_text(record.income))
        .bind(record.regime.as_str())
        .bind(join_deductions(&record.deductions))
        .bind(decimal_to_text(record.taxable_income))
        .bind(decimal_to_text(record.base_tax))
        .bind(decimal_to_text(record.cess))
        .bind(decimal_to_text(record.final_tax))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                RepositoryError::NotFound
            } else {
                RepositoryError::Database(e.to_string())
            }
        })?;

        Ok(record.with_id(result.last_insert_rowid()))
    }

    async fn list_records(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<Page<TaxRecord>, RepositoryError> {
        let total = self.count_records(username).await?;

        let rows = sqlx::query(
            "SELECT id, username, record_date, income, regime, deductions,
                    taxable_income, base_tax, cess, final_tax
             FROM tax_records WHERE username = ?
             ORDER BY id
             LIMIT ? OFFSET ?",
        )
        .bind(username)
        .bind(i64::try_from(page.limit()).unwrap_or(i64::MAX))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let items = rows
            .iter()
            .map(row_to_tax_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn count_records(
        &self,
        username: &str,
    ) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM tax_records WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(u64::try_from(total).unwrap_or_default())
    }
}

#[async_trait]
impl Watchlist for SqliteRepository {
    async fn add_symbol(
        &self,
        username: &str,
        symbol: &str,
    ) -> Result<bool, RepositoryError> {
        if !self.user_exists(username).await? {
            return Err(RepositoryError::NotFound);
        }

        let result = sqlx::query("INSERT OR IGNORE INTO watchlist (username, symbol) VALUES (?, ?)")
            .bind(username)
            .bind(symbol)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_symbol(
        &self,
        username: &str,
        symbol: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM watchlist WHERE username = ? AND symbol = ?")
            .bind(username)
            .bind(symbol)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_symbols(
        &self,
        username: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT symbol FROM watchlist WHERE username = ? ORDER BY id")
            .bind(username)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("symbol")
                    .map_err(|e| RepositoryError::Database(e.to_string()))
            })
            .collect()
    }
}
