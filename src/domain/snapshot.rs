use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    assemble, combine, settle, ExpenseLedger, FoodExpense, LedgerImbalance, Player,
    PlayerLedger, SettlementReport,
};

/// Every player and expense, read at a single point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub players: Vec<Player>,
    pub expenses: Vec<FoodExpense>,
}

impl GameSnapshot {
    pub fn new(players: Vec<Player>, expenses: Vec<FoodExpense>) -> Self {
        Self { players, expenses }
    }

    /// Run both ledgers, the aggregator, the solver and the assembler.
    pub fn settle(&self, currency_symbol: &str) -> Result<SettlementReport, LedgerImbalance> {
        let poker = PlayerLedger::new(&self.players).nets();
        let food = ExpenseLedger::new(&self.expenses).nets(&self.players);

        let balances = combine(&poker, &food)?;
        let transfers = settle(&balances);
        debug!(
            players = self.players.len(),
            expenses = self.expenses.len(),
            transfers = transfers.len(),
            "settled snapshot"
        );

        Ok(assemble(
            &self.players,
            &poker,
            &food,
            &transfers,
            currency_symbol,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LedgerKind;

    #[test]
    fn test_poker_only_game() {
        let a = Player::new("A")
            .with_withdrawal(2000)
            .with_withdrawal(2000)
            .with_final_amount(2000);
        let b = Player::new("B").with_final_amount(2000);
        let snapshot = GameSnapshot::new(vec![a, b], Vec::new());

        let report = snapshot.settle("$").unwrap();
        assert_eq!(report.settlements, vec!["A pays B $20.00"]);
        assert_eq!(report.poker_summary.get("A"), Some(-2000));
        assert_eq!(report.poker_summary.get("B"), Some(2000));
    }

    #[test]
    fn test_food_offsets_poker() {
        // Poker: A +20, B -20. Food: B paid 10 shared by both, so A -5, B +5.
        let a = Player::new("A").with_withdrawal(2000).with_final_amount(4000);
        let b = Player::new("B").with_withdrawal(2000);
        let food = FoodExpense::new(1000, b.id, [a.id, b.id]).unwrap();
        let snapshot = GameSnapshot::new(vec![a, b], vec![food]);

        let report = snapshot.settle("$").unwrap();
        assert_eq!(report.food_summary.get("A"), Some(-500));
        assert_eq!(report.food_summary.get("B"), Some(500));
        assert_eq!(report.settlements, vec!["B pays A $15.00"]);
    }

    #[test]
    fn test_unreturned_cash_is_an_imbalance() {
        let a = Player::new("A").with_withdrawal(2000).with_final_amount(1500);
        let b = Player::new("B");
        let snapshot = GameSnapshot::new(vec![a, b], Vec::new());

        let err = snapshot.settle("$").unwrap_err();
        assert_eq!(err.ledger, LedgerKind::Poker);
        assert_eq!(err.debited - err.credited, 500);
    }

    #[test]
    fn test_empty_game_settles_to_nothing() {
        let report = GameSnapshot::default().settle("$").unwrap();
        assert!(report.settlements.is_empty());
        assert!(report.poker_summary.is_empty());
    }

    #[test]
    fn test_settle_twice_is_identical() {
        let a = Player::new("A").with_withdrawal(3000).with_final_amount(1000);
        let b = Player::new("B").with_withdrawal(2000).with_final_amount(3500);
        let c = Player::new("C").with_final_amount(500);
        let food = FoodExpense::new(1000, c.id, [a.id, b.id, c.id]).unwrap();
        let snapshot = GameSnapshot::new(vec![a, b, c], vec![food]);

        assert_eq!(snapshot.settle("$").unwrap(), snapshot.settle("$").unwrap());
    }
}
