use serde::{Deserialize, Serialize};

use super::{format_cents, Cents, FoodExpense, Player, PlayerId, MAX_AMOUNT_CENTS};

/// Which of the two independent ledgers a set of nets came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    /// Cash taken from and returned to the bank
    Poker,
    /// Shared food and drink expenses
    Food,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Poker => "poker",
            LedgerKind::Food => "food",
        }
    }

    /// Labels for the credited and debited totals, used in reports.
    pub fn total_labels(&self) -> (&'static str, &'static str) {
        match self {
            LedgerKind::Poker => ("returned to bank", "taken from bank"),
            LedgerKind::Food => ("paid", "consumed"),
        }
    }
}

impl std::fmt::Display for LedgerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-player nets of one ledger, in player listing order, plus the
/// credited and debited totals they were built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerNets {
    pub kind: LedgerKind,
    pub entries: Vec<(PlayerId, Cents)>,
    pub credited: Cents,
    pub debited: Cents,
}

impl LedgerNets {
    fn build(kind: LedgerKind, rows: impl Iterator<Item = (PlayerId, Cents, Cents)>) -> Self {
        let mut nets = LedgerNets {
            kind,
            entries: Vec::new(),
            credited: 0,
            debited: 0,
        };
        for (player, credit, debit) in rows {
            nets.credited += credit;
            nets.debited += debit;
            nets.entries.push((player, credit - debit));
        }
        nets
    }

    /// Net for a player, zero when the player is not part of this ledger.
    pub fn net_of(&self, player: PlayerId) -> Cents {
        self.entries
            .iter()
            .find(|(id, _)| *id == player)
            .map(|(_, net)| *net)
            .unwrap_or(0)
    }

    /// Signed sum of every entry. Zero for a reconciled ledger.
    pub fn sum(&self) -> Cents {
        self.credited - self.debited
    }
}

// ========================
// Poker ledger
// ========================

/// Read-only view over the bank withdrawals and returns of every player.
pub struct PlayerLedger<'a> {
    players: &'a [Player],
}

impl<'a> PlayerLedger<'a> {
    pub fn new(players: &'a [Player]) -> Self {
        Self { players }
    }

    pub fn total_withdrawn(&self, player: &Player) -> Cents {
        player.total_withdrawn()
    }

    /// Final amount returned minus total withdrawn.
    pub fn net_poker(&self, player: &Player) -> Cents {
        player.final_amount_cents - self.total_withdrawn(player)
    }

    /// Total cash taken from the bank by all players.
    pub fn total_taken(&self) -> Cents {
        self.players.iter().map(Player::total_withdrawn).sum()
    }

    /// Total cash handed back to the bank by all players.
    pub fn total_returned(&self) -> Cents {
        self.players.iter().map(|p| p.final_amount_cents).sum()
    }

    pub fn nets(&self) -> LedgerNets {
        LedgerNets::build(
            LedgerKind::Poker,
            self.players
                .iter()
                .map(|p| (p.id, p.final_amount_cents, p.total_withdrawn())),
        )
    }
}

// ========================
// Expense ledger
// ========================

/// How one expense divides between its consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseSplit {
    /// Debited to each consumer
    pub share: Cents,
    /// Cents left over after the even split, absorbed by the payer
    pub remainder: Cents,
    /// What the payer is credited: `amount - remainder`
    pub payer_credit: Cents,
}

/// Split an expense evenly, rounding each share down to the cent.
/// `share * consumers + remainder == amount` always holds.
pub fn split_expense(expense: &FoodExpense) -> ExpenseSplit {
    let count = expense.consumers.len() as Cents;
    debug_assert!(count > 0, "expense without consumers");
    let share = expense.amount_cents / count;
    let remainder = expense.amount_cents - share * count;
    ExpenseSplit {
        share,
        remainder,
        payer_credit: expense.amount_cents - remainder,
    }
}

/// Read-only view over shared expenses.
pub struct ExpenseLedger<'a> {
    expenses: &'a [FoodExpense],
}

impl<'a> ExpenseLedger<'a> {
    pub fn new(expenses: &'a [FoodExpense]) -> Self {
        Self { expenses }
    }

    /// Credits as payer minus shares as consumer. A payer who also consumed
    /// their own expense gets both terms.
    pub fn net_food(&self, player: PlayerId) -> Cents {
        let (credit, debit) = self.credit_and_debit(player);
        credit - debit
    }

    fn credit_and_debit(&self, player: PlayerId) -> (Cents, Cents) {
        self.expenses.iter().fold((0, 0), |(credit, debit), expense| {
            let split = split_expense(expense);
            let credit = if expense.payer == player {
                credit + split.payer_credit
            } else {
                credit
            };
            let debit = if expense.consumers.contains(&player) {
                debit + split.share
            } else {
                debit
            };
            (credit, debit)
        })
    }

    /// Food nets for the listed players. Expenses referring to players
    /// outside the list leave the totals unbalanced on purpose.
    pub fn nets(&self, players: &[Player]) -> LedgerNets {
        LedgerNets::build(
            LedgerKind::Food,
            players.iter().map(|p| {
                let (credit, debit) = self.credit_and_debit(p.id);
                (p.id, credit, debit)
            }),
        )
    }
}

// ========================
// Amount validation
// ========================

/// Validate a new withdrawal amount (must be positive).
pub fn validate_withdrawal_amount(amount_cents: Cents) -> Result<(), AmountError> {
    if amount_cents <= 0 {
        return Err(AmountError::NotPositive(amount_cents));
    }
    check_upper_bound(amount_cents)
}

/// Validate a returned amount (zero is allowed, negative is not).
pub fn validate_final_amount(amount_cents: Cents) -> Result<(), AmountError> {
    if amount_cents < 0 {
        return Err(AmountError::Negative(amount_cents));
    }
    check_upper_bound(amount_cents)
}

fn check_upper_bound(amount_cents: Cents) -> Result<(), AmountError> {
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(AmountError::TooLarge(amount_cents));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    NotPositive(Cents),
    Negative(Cents),
    TooLarge(Cents),
}

impl std::fmt::Display for AmountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountError::NotPositive(amount) => {
                write!(f, "amount must be positive, got {} cents", amount)
            }
            AmountError::Negative(amount) => {
                write!(f, "amount cannot be negative, got {} cents", amount)
            }
            AmountError::TooLarge(amount) => write!(
                f,
                "amount {} is above the limit of {}",
                format_cents(*amount),
                format_cents(MAX_AMOUNT_CENTS)
            ),
        }
    }
}

impl std::error::Error for AmountError {}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn expense(amount: Cents, payer: &Player, consumers: &[&Player]) -> FoodExpense {
        FoodExpense::new(amount, payer.id, consumers.iter().map(|p| p.id)).unwrap()
    }

    #[test]
    fn test_net_poker() {
        let a = Player::new("A").with_withdrawal(2000).with_withdrawal(2000).with_final_amount(2000);
        let b = Player::new("B").with_final_amount(2000);
        let players = vec![a, b];
        let ledger = PlayerLedger::new(&players);

        assert_eq!(ledger.total_withdrawn(&players[0]), 4000);
        assert_eq!(ledger.net_poker(&players[0]), -2000);
        assert_eq!(ledger.net_poker(&players[1]), 2000);
        assert_eq!(ledger.total_taken(), 4000);
        assert_eq!(ledger.total_returned(), 4000);
    }

    #[test]
    fn test_poker_nets_follow_listing_order() {
        let players = vec![
            Player::new("Zed").with_withdrawal(1000),
            Player::new("Amy").with_final_amount(1000),
        ];
        let nets = PlayerLedger::new(&players).nets();

        assert_eq!(nets.kind, LedgerKind::Poker);
        assert_eq!(nets.entries, vec![(players[0].id, -1000), (players[1].id, 1000)]);
        assert_eq!(nets.credited, 1000);
        assert_eq!(nets.debited, 1000);
        assert_eq!(nets.sum(), 0);
    }

    #[test]
    fn test_even_split() {
        let (a, b, c) = (Player::new("A"), Player::new("B"), Player::new("C"));
        let split = split_expense(&expense(3000, &a, &[&a, &b, &c]));
        assert_eq!(
            split,
            ExpenseSplit {
                share: 1000,
                remainder: 0,
                payer_credit: 3000
            }
        );
    }

    #[test]
    fn test_uneven_split_remainder_goes_to_payer() {
        let (a, b, c) = (Player::new("A"), Player::new("B"), Player::new("C"));
        let e = expense(1000, &a, &[&a, &b, &c]);
        let split = split_expense(&e);

        assert_eq!(split.share, 333);
        assert_eq!(split.remainder, 1);
        assert_eq!(split.share * 3 + split.remainder, e.amount_cents);
    }

    #[test]
    fn test_split_conserves_every_cent() {
        let payer = Player::new("P");
        for amount in [1, 2, 7, 99, 100, 1001, 12345] {
            for count in 1..=7 {
                let consumers: Vec<PlayerId> = (0..count).map(|_| Uuid::new_v4()).collect();
                let e = FoodExpense::new(amount, payer.id, consumers).unwrap();
                let split = split_expense(&e);
                assert_eq!(split.share * count + split.remainder, amount);
                assert_eq!(split.payer_credit, split.share * count);
                assert!(split.remainder < count);
            }
        }
    }

    #[test]
    fn test_food_nets_scenario() {
        let players = vec![Player::new("A"), Player::new("B"), Player::new("C")];
        let expenses = vec![expense(3000, &players[0], &[&players[0], &players[1], &players[2]])];
        let ledger = ExpenseLedger::new(&expenses);

        assert_eq!(ledger.net_food(players[0].id), 2000);
        assert_eq!(ledger.net_food(players[1].id), -1000);
        assert_eq!(ledger.net_food(players[2].id), -1000);

        let nets = ledger.nets(&players);
        assert_eq!(nets.kind, LedgerKind::Food);
        assert_eq!(nets.sum(), 0);
        assert_eq!(nets.net_of(players[0].id), 2000);
    }

    #[test]
    fn test_payer_outside_consumers() {
        let players = vec![Player::new("A"), Player::new("B"), Player::new("C")];
        let expenses = vec![expense(1000, &players[0], &[&players[1], &players[2]])];
        let ledger = ExpenseLedger::new(&expenses);

        assert_eq!(ledger.net_food(players[0].id), 1000);
        assert_eq!(ledger.net_food(players[1].id), -500);
        let nets = ledger.nets(&players);
        assert_eq!(nets.credited, 1000);
        assert_eq!(nets.debited, 1000);
    }

    #[test]
    fn test_food_nets_balance_with_remainders() {
        let players = vec![Player::new("A"), Player::new("B"), Player::new("C")];
        let expenses = vec![
            expense(1000, &players[0], &[&players[0], &players[1], &players[2]]),
            expense(701, &players[1], &[&players[0], &players[2]]),
            expense(5, &players[2], &[&players[0], &players[1], &players[2]]),
        ];
        let ledger = ExpenseLedger::new(&expenses);
        let nets = ledger.nets(&players);

        assert_eq!(nets.sum(), 0);
        // 999 + 700 + 3 credited after remainders
        assert_eq!(nets.credited, 1702);
        assert_eq!(nets.debited, 1702);
        let total: Cents = nets.entries.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_food_nets_flag_unknown_players() {
        let players = vec![Player::new("A"), Player::new("B")];
        let ghost = Player::new("Ghost");
        let expenses = vec![expense(1000, &players[0], &[&players[1], &ghost])];
        let nets = ExpenseLedger::new(&expenses).nets(&players);

        assert_eq!(nets.credited, 1000);
        assert_eq!(nets.debited, 500);
        assert_ne!(nets.sum(), 0);
    }

    #[test]
    fn test_net_of_unknown_player_is_zero() {
        let players = vec![Player::new("A")];
        let nets = PlayerLedger::new(&players).nets();
        assert_eq!(nets.net_of(Uuid::new_v4()), 0);
    }

    #[test]
    fn test_amount_validation() {
        assert!(validate_withdrawal_amount(2000).is_ok());
        assert_eq!(validate_withdrawal_amount(0), Err(AmountError::NotPositive(0)));
        assert!(validate_final_amount(0).is_ok());
        assert_eq!(validate_final_amount(-1), Err(AmountError::Negative(-1)));
    }

    #[test]
    fn test_amount_upper_bound() {
        assert!(validate_withdrawal_amount(MAX_AMOUNT_CENTS).is_ok());
        assert!(validate_final_amount(MAX_AMOUNT_CENTS).is_ok());
        assert_eq!(
            validate_withdrawal_amount(MAX_AMOUNT_CENTS + 1),
            Err(AmountError::TooLarge(MAX_AMOUNT_CENTS + 1))
        );
        assert_eq!(
            validate_final_amount(9_000_000_000_000_000_000),
            Err(AmountError::TooLarge(9_000_000_000_000_000_000))
        );
    }
}
