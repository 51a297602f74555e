use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::error::DatabaseError;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{
    Cents, ExpenseId, FoodExpense, GameSnapshot, Player, PlayerId, Withdrawal,
};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying players, withdrawals and expenses.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database URL, with foreign keys enforced.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Cheap liveness probe.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    // ========================
    // Player operations
    // ========================

    /// Save a new player (withdrawals are saved separately).
    pub async fn save_player(&self, player: &Player) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO players (id, name, final_amount_cents, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(player.id.to_string())
        .bind(&player.name)
        .bind(player.final_amount_cents)
        .bind(player.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save player")?;
        Ok(())
    }

    /// Get a player by ID, withdrawals included.
    pub async fn get_player(&self, id: PlayerId) -> Result<Option<Player>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(
            "SELECT id, name, final_amount_cents, created_at FROM players WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch player")?;

        match row {
            Some(row) => {
                let mut player = Self::row_to_player(&row)?;
                player.withdrawals = fetch_withdrawals_for(&mut *conn, player.id).await?;
                Ok(Some(player))
            }
            None => Ok(None),
        }
    }

    /// Get a player by name, withdrawals included.
    pub async fn get_player_by_name(&self, name: &str) -> Result<Option<Player>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(
            "SELECT id, name, final_amount_cents, created_at FROM players WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch player by name")?;

        match row {
            Some(row) => {
                let mut player = Self::row_to_player(&row)?;
                player.withdrawals = fetch_withdrawals_for(&mut *conn, player.id).await?;
                Ok(Some(player))
            }
            None => Ok(None),
        }
    }

    /// List all players in the order they joined, withdrawals included.
    pub async fn list_players(&self) -> Result<Vec<Player>> {
        let mut conn = self.pool.acquire().await?;
        fetch_players(&mut *conn).await
    }

    /// Rename a player.
    pub async fn rename_player(&self, id: PlayerId, name: &str) -> Result<()> {
        sqlx::query("UPDATE players SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to rename player")?;
        Ok(())
    }

    /// Record how much cash a player handed back.
    pub async fn set_final_amount(&self, id: PlayerId, amount_cents: Cents) -> Result<()> {
        sqlx::query("UPDATE players SET final_amount_cents = ? WHERE id = ?")
            .bind(amount_cents)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update final amount")?;
        Ok(())
    }

    /// Delete a player and their withdrawals.
    pub async fn delete_player(&self, id: PlayerId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM withdrawals WHERE player_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete withdrawals")?;
        sqlx::query("DELETE FROM players WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete player")?;
        tx.commit().await?;
        Ok(())
    }

    /// Count expenses a player pays for or consumes.
    pub async fn count_expenses_for_player(&self, id: PlayerId) -> Result<i64> {
        let id_str = id.to_string();
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM food_expenses e
            WHERE e.payer_id = ?
               OR EXISTS (
                   SELECT 1 FROM expense_consumers c
                   WHERE c.expense_id = e.id AND c.player_id = ?
               )
            "#,
        )
        .bind(&id_str)
        .bind(&id_str)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count expenses for player")?;

        Ok(row.get("count"))
    }

    fn row_to_player(row: &SqliteRow) -> Result<Player> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Player {
            id: Uuid::parse_str(&id_str).context("Invalid player ID")?,
            name: row.get("name"),
            withdrawals: Vec::new(),
            final_amount_cents: row.get("final_amount_cents"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Withdrawal operations
    // ========================

    /// Save a withdrawal for a player.
    pub async fn save_withdrawal(&self, player_id: PlayerId, withdrawal: &Withdrawal) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO withdrawals (id, player_id, amount_cents, added_by, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(withdrawal.id.to_string())
        .bind(player_id.to_string())
        .bind(withdrawal.amount_cents)
        .bind(&withdrawal.added_by)
        .bind(withdrawal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save withdrawal")?;
        Ok(())
    }

    // ========================
    // Expense operations
    // ========================

    /// Save an expense and its consumers atomically.
    pub async fn save_expense(&self, expense: &FoodExpense) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO food_expenses (id, amount_cents, payer_id, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(expense.id.to_string())
        .bind(expense.amount_cents)
        .bind(expense.payer.to_string())
        .bind(&expense.description)
        .bind(expense.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save expense")?;

        for (position, consumer) in expense.consumers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO expense_consumers (expense_id, player_id, position) VALUES (?, ?, ?)",
            )
            .bind(expense.id.to_string())
            .bind(consumer.to_string())
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .context("Failed to save expense consumer")?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Get an expense by ID.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<FoodExpense>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query(
            "SELECT id, amount_cents, payer_id, description, created_at FROM food_expenses WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch expense")?;

        match row {
            Some(row) => {
                let mut expense = Self::row_to_expense(&row)?;
                let consumers = sqlx::query(
                    "SELECT player_id FROM expense_consumers WHERE expense_id = ? ORDER BY position",
                )
                .bind(id.to_string())
                .fetch_all(&mut *conn)
                .await
                .context("Failed to fetch expense consumers")?;

                expense.consumers = consumers
                    .iter()
                    .map(|row| parse_id(row, "player_id"))
                    .collect::<Result<_>>()?;
                Ok(Some(expense))
            }
            None => Ok(None),
        }
    }

    /// Delete an expense and its consumer rows.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM expense_consumers WHERE expense_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete expense consumers")?;
        sqlx::query("DELETE FROM food_expenses WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete expense")?;
        tx.commit().await?;
        Ok(())
    }

    fn row_to_expense(row: &SqliteRow) -> Result<FoodExpense> {
        let created_at_str: String = row.get("created_at");

        Ok(FoodExpense {
            id: parse_id(row, "id")?,
            amount_cents: row.get("amount_cents"),
            payer: parse_id(row, "payer_id")?,
            consumers: Vec::new(),
            description: row.get("description"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Snapshot
    // ========================

    /// Read every player and expense inside one transaction so a concurrent
    /// write can't land between the two reads.
    pub async fn load_snapshot(&self) -> Result<GameSnapshot> {
        let mut tx = self.pool.begin().await?;
        let players = fetch_players(&mut *tx).await?;
        let expenses = fetch_expenses(&mut *tx).await?;
        tx.commit().await?;
        Ok(GameSnapshot::new(players, expenses))
    }
}

async fn fetch_players(conn: &mut SqliteConnection) -> Result<Vec<Player>> {
    let rows = sqlx::query(
        "SELECT id, name, final_amount_cents, created_at FROM players ORDER BY rowid",
    )
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list players")?;

    let mut players = rows
        .iter()
        .map(Repository::row_to_player)
        .collect::<Result<Vec<_>>>()?;

    let withdrawal_rows = sqlx::query(
        "SELECT id, player_id, amount_cents, added_by, created_at FROM withdrawals ORDER BY rowid",
    )
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list withdrawals")?;

    let mut by_player: HashMap<PlayerId, Vec<Withdrawal>> = HashMap::new();
    for row in &withdrawal_rows {
        let player_id = parse_id(row, "player_id")?;
        by_player
            .entry(player_id)
            .or_default()
            .push(row_to_withdrawal(row)?);
    }

    for player in &mut players {
        player.withdrawals = by_player.remove(&player.id).unwrap_or_default();
    }

    Ok(players)
}

async fn fetch_withdrawals_for(
    conn: &mut SqliteConnection,
    player_id: PlayerId,
) -> Result<Vec<Withdrawal>> {
    let rows = sqlx::query(
        r#"
        SELECT id, player_id, amount_cents, added_by, created_at
        FROM withdrawals
        WHERE player_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(player_id.to_string())
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch withdrawals")?;

    rows.iter().map(row_to_withdrawal).collect()
}

async fn fetch_expenses(conn: &mut SqliteConnection) -> Result<Vec<FoodExpense>> {
    let rows = sqlx::query(
        "SELECT id, amount_cents, payer_id, description, created_at FROM food_expenses ORDER BY rowid",
    )
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list expenses")?;

    let mut expenses = rows
        .iter()
        .map(Repository::row_to_expense)
        .collect::<Result<Vec<_>>>()?;

    let consumer_rows = sqlx::query(
        "SELECT expense_id, player_id FROM expense_consumers ORDER BY expense_id, position",
    )
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list expense consumers")?;

    let mut by_expense: HashMap<ExpenseId, Vec<PlayerId>> = HashMap::new();
    for row in &consumer_rows {
        by_expense
            .entry(parse_id(row, "expense_id")?)
            .or_default()
            .push(parse_id(row, "player_id")?);
    }

    for expense in &mut expenses {
        expense.consumers = by_expense.remove(&expense.id).unwrap_or_default();
    }

    Ok(expenses)
}

fn row_to_withdrawal(row: &SqliteRow) -> Result<Withdrawal> {
    let created_at_str: String = row.get("created_at");
    Ok(Withdrawal {
        id: parse_id(row, "id")?,
        amount_cents: row.get("amount_cents"),
        added_by: row.get("added_by"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

fn parse_id(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.get(column);
    Uuid::parse_str(&value).with_context(|| format!("Invalid {} in database", column))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .context("Invalid timestamp")?
        .with_timezone(&Utc))
}

/// True when `err` came from a UNIQUE or PRIMARY KEY constraint.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    database_error(err).is_some_and(|e| e.is_unique_violation())
}

/// True when `err` came from a FOREIGN KEY constraint.
pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    database_error(err).is_some_and(|e| e.is_foreign_key_violation())
}

fn database_error(err: &anyhow::Error) -> Option<&dyn DatabaseError> {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => Some(db.as_ref()),
        _ => None,
    }
}
