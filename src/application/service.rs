use tracing::{info, warn};

use crate::domain::{
    check_reconciled, normalize_name, split_expense, validate_final_amount,
    validate_withdrawal_amount, Cents, ExpenseId, FoodExpense, GameSnapshot,
    LedgerNets, Player, PlayerId, PlayerLedger, SettlementReport, Withdrawal, DEFAULT_ADDED_BY,
};
use crate::storage::{is_foreign_key_violation, is_unique_violation, Repository};

use super::AppError;

/// Application service providing the game operations.
/// This is the primary interface for any client (CLI, HTTP API, tests).
pub struct GameService {
    repo: Repository,
    currency_symbol: String,
}

/// An expense with payer and consumer names resolved.
#[derive(Debug, Clone)]
pub struct ExpenseInfo {
    pub expense: FoodExpense,
    pub payer_name: String,
    pub consumer_names: Vec<String>,
    pub share_cents: Cents,
    pub remainder_cents: Cents,
}

/// Cash taken from and returned to the bank, across all players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankSummary {
    pub total_taken: Cents,
    pub total_returned: Cents,
    /// Returned minus taken; zero once everyone has cashed out.
    pub difference: Cents,
    pub is_balanced: bool,
}

impl GameService {
    /// Create a new game service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            currency_symbol: "$".to_string(),
        }
    }

    /// Use a different currency symbol in settlement descriptions.
    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    /// True when the database answers queries.
    pub async fn is_healthy(&self) -> bool {
        self.repo.ping().await
    }

    // ========================
    // Player operations
    // ========================

    /// Add a player to the game.
    pub async fn add_player(&self, name: &str) -> Result<Player, AppError> {
        let name = normalize_name(name).ok_or_else(|| AppError::InvalidName(name.to_string()))?;

        if self.repo.get_player_by_name(&name).await?.is_some() {
            return Err(AppError::PlayerAlreadyExists(name));
        }

        let player = Player::new(name);
        // A concurrent add can still win the race to the UNIQUE index.
        self.repo.save_player(&player).await.map_err(|err| {
            if is_unique_violation(&err) {
                AppError::PlayerAlreadyExists(player.name.clone())
            } else {
                err.into()
            }
        })?;
        info!(player = %player.name, id = %player.id, "player added");
        Ok(player)
    }

    /// List players in the order they joined.
    pub async fn list_players(&self) -> Result<Vec<Player>, AppError> {
        Ok(self.repo.list_players().await?)
    }

    /// Get a player by name.
    pub async fn get_player(&self, name: &str) -> Result<Player, AppError> {
        self.repo
            .get_player_by_name(name.trim())
            .await?
            .ok_or_else(|| AppError::PlayerNotFound(name.to_string()))
    }

    /// Get a player by ID.
    pub async fn get_player_by_id(&self, id: PlayerId) -> Result<Player, AppError> {
        self.repo
            .get_player(id)
            .await?
            .ok_or_else(|| AppError::PlayerNotFound(id.to_string()))
    }

    /// Change a player's name.
    pub async fn rename_player(&self, id: PlayerId, new_name: &str) -> Result<Player, AppError> {
        let player = self.get_player_by_id(id).await?;
        let new_name =
            normalize_name(new_name).ok_or_else(|| AppError::InvalidName(new_name.to_string()))?;

        if new_name != player.name {
            if self.repo.get_player_by_name(&new_name).await?.is_some() {
                return Err(AppError::PlayerAlreadyExists(new_name));
            }
            self.repo
                .rename_player(id, &new_name)
                .await
                .map_err(|err| {
                    if is_unique_violation(&err) {
                        AppError::PlayerAlreadyExists(new_name.clone())
                    } else {
                        err.into()
                    }
                })?;
            info!(from = %player.name, to = %new_name, "player renamed");
        }

        self.get_player_by_id(id).await
    }

    /// Apply an edit from the players table: optional rename and/or a new
    /// returned amount. Validation happens before anything is written.
    pub async fn update_player(
        &self,
        id: PlayerId,
        name: Option<&str>,
        final_amount_cents: Option<Cents>,
    ) -> Result<Player, AppError> {
        if let Some(amount) = final_amount_cents {
            validate_final_amount(amount)?;
        }
        if let Some(name) = name {
            self.rename_player(id, name).await?;
        }
        match final_amount_cents {
            Some(amount) => self.set_final_amount(id, amount).await,
            None => self.get_player_by_id(id).await,
        }
    }

    /// Remove a player and their withdrawals.
    ///
    /// Refused while an expense still names the player, since dropping them
    /// would change everyone else's share.
    pub async fn delete_player(&self, id: PlayerId) -> Result<Player, AppError> {
        let player = self.get_player_by_id(id).await?;

        let expenses = self.repo.count_expenses_for_player(id).await?;
        if expenses > 0 {
            return Err(AppError::PlayerHasExpenses {
                name: player.name,
                expenses,
            });
        }

        if let Err(err) = self.repo.delete_player(id).await {
            // An expense recorded after the count above trips the foreign key.
            if is_foreign_key_violation(&err) {
                let expenses = self.repo.count_expenses_for_player(id).await?;
                return Err(AppError::PlayerHasExpenses {
                    name: player.name,
                    expenses,
                });
            }
            return Err(err.into());
        }
        info!(player = %player.name, "player removed");
        Ok(player)
    }

    // ========================
    // Bank operations
    // ========================

    /// Record cash taken from the bank.
    pub async fn add_withdrawal(
        &self,
        player_id: PlayerId,
        amount_cents: Cents,
        added_by: Option<&str>,
    ) -> Result<Player, AppError> {
        validate_withdrawal_amount(amount_cents)?;
        let player = self.get_player_by_id(player_id).await?;

        let added_by = added_by
            .and_then(normalize_name)
            .unwrap_or_else(|| DEFAULT_ADDED_BY.to_string());
        let withdrawal = Withdrawal::new(amount_cents, added_by);
        self.repo.save_withdrawal(player.id, &withdrawal).await?;
        info!(
            player = %player.name,
            amount_cents,
            added_by = %withdrawal.added_by,
            "withdrawal recorded"
        );

        self.get_player_by_id(player_id).await
    }

    /// Record how much cash a player handed back.
    pub async fn set_final_amount(
        &self,
        player_id: PlayerId,
        amount_cents: Cents,
    ) -> Result<Player, AppError> {
        validate_final_amount(amount_cents)?;
        let player = self.get_player_by_id(player_id).await?;

        self.repo.set_final_amount(player.id, amount_cents).await?;
        info!(player = %player.name, amount_cents, "final amount recorded");

        self.get_player_by_id(player_id).await
    }

    /// Totals across the bank, for the pre-results check.
    pub async fn bank_summary(&self) -> Result<BankSummary, AppError> {
        let players = self.repo.list_players().await?;
        let ledger = PlayerLedger::new(&players);
        let total_taken = ledger.total_taken();
        let total_returned = ledger.total_returned();
        let nets: LedgerNets = ledger.nets();

        Ok(BankSummary {
            total_taken,
            total_returned,
            difference: total_returned - total_taken,
            is_balanced: check_reconciled(&nets).is_ok(),
        })
    }

    // ========================
    // Expense operations
    // ========================

    /// Record a shared expense. The payer and every consumer must exist.
    pub async fn add_expense(
        &self,
        amount_cents: Cents,
        payer_id: PlayerId,
        consumer_ids: &[PlayerId],
        description: Option<String>,
    ) -> Result<ExpenseInfo, AppError> {
        let mut expense = FoodExpense::new(amount_cents, payer_id, consumer_ids.iter().copied())?;
        if let Some(desc) = description.as_deref().and_then(normalize_name) {
            expense = expense.with_description(desc);
        }

        let players = self.repo.list_players().await?;
        for id in std::iter::once(&expense.payer).chain(&expense.consumers) {
            if !players.iter().any(|p| p.id == *id) {
                return Err(AppError::PlayerNotFound(id.to_string()));
            }
        }

        self.repo.save_expense(&expense).await?;
        info!(
            id = %expense.id,
            amount_cents,
            consumers = expense.consumers.len(),
            "food expense recorded"
        );

        Ok(describe_expense(expense, &players))
    }

    /// List expenses with names resolved, in the order they were recorded.
    pub async fn list_expenses(&self) -> Result<Vec<ExpenseInfo>, AppError> {
        let snapshot = self.repo.load_snapshot().await?;
        Ok(snapshot
            .expenses
            .into_iter()
            .map(|e| describe_expense(e, &snapshot.players))
            .collect())
    }

    /// Get a single expense with names resolved.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<ExpenseInfo, AppError> {
        let expense = self
            .repo
            .get_expense(id)
            .await?
            .ok_or_else(|| AppError::ExpenseNotFound(id.to_string()))?;
        let players = self.repo.list_players().await?;
        Ok(describe_expense(expense, &players))
    }

    /// Delete an expense.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<FoodExpense, AppError> {
        let expense = self
            .repo
            .get_expense(id)
            .await?
            .ok_or_else(|| AppError::ExpenseNotFound(id.to_string()))?;
        self.repo.delete_expense(id).await?;
        info!(id = %id, "food expense removed");
        Ok(expense)
    }

    // ========================
    // Results
    // ========================

    /// Every player and expense, read consistently.
    pub async fn snapshot(&self) -> Result<GameSnapshot, AppError> {
        Ok(self.repo.load_snapshot().await?)
    }

    /// Net every player's poker and food position and work out who pays whom.
    pub async fn compute_results(&self) -> Result<SettlementReport, AppError> {
        let snapshot = self.repo.load_snapshot().await?;
        match snapshot.settle(&self.currency_symbol) {
            Ok(report) => {
                info!(
                    players = snapshot.players.len(),
                    transfers = report.settlements.len(),
                    "results computed"
                );
                Ok(report)
            }
            Err(imbalance) => {
                warn!(
                    ledger = %imbalance.ledger,
                    credited = imbalance.credited,
                    debited = imbalance.debited,
                    "ledger does not reconcile"
                );
                Err(imbalance.into())
            }
        }
    }
}

fn describe_expense(expense: FoodExpense, players: &[Player]) -> ExpenseInfo {
    let name_of = |id: &PlayerId| {
        players
            .iter()
            .find(|p| p.id == *id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let split = split_expense(&expense);

    ExpenseInfo {
        payer_name: name_of(&expense.payer),
        consumer_names: expense.consumers.iter().map(name_of).collect(),
        share_cents: split.share,
        remainder_cents: split.remainder,
        expense,
    }
}
