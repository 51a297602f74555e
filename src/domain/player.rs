use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type PlayerId = Uuid;
pub type WithdrawalId = Uuid;

/// Recorded when no operator name is supplied with a withdrawal.
pub const DEFAULT_ADDED_BY: &str = "admin";

/// Cash taken from the shared bank by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub id: WithdrawalId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    /// Who recorded the withdrawal
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl Withdrawal {
    pub fn new(amount_cents: Cents, added_by: impl Into<String>) -> Self {
        assert!(amount_cents > 0, "Withdrawal amount must be positive");
        Self {
            id: Uuid::new_v4(),
            amount_cents,
            added_by: added_by.into(),
            created_at: Utc::now(),
        }
    }
}

/// A seat at the game. `final_amount_cents` is the cash the player handed
/// back to the bank when they stopped playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub withdrawals: Vec<Withdrawal>,
    pub final_amount_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            withdrawals: Vec::new(),
            final_amount_cents: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_final_amount(mut self, final_amount_cents: Cents) -> Self {
        self.final_amount_cents = final_amount_cents;
        self
    }

    pub fn with_withdrawal(mut self, amount_cents: Cents) -> Self {
        self.withdrawals
            .push(Withdrawal::new(amount_cents, DEFAULT_ADDED_BY));
        self
    }

    /// Sum of every withdrawal this player made.
    pub fn total_withdrawn(&self) -> Cents {
        self.withdrawals.iter().map(|w| w.amount_cents).sum()
    }
}

/// Normalize a player name, rejecting blank input.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_starts_empty() {
        let player = Player::new("Alice");
        assert_eq!(player.name, "Alice");
        assert_eq!(player.final_amount_cents, 0);
        assert!(player.withdrawals.is_empty());
        assert_eq!(player.total_withdrawn(), 0);
    }

    #[test]
    fn test_total_withdrawn_sums_all_withdrawals() {
        let player = Player::new("Bob")
            .with_withdrawal(2000)
            .with_withdrawal(2000)
            .with_withdrawal(550);
        assert_eq!(player.total_withdrawn(), 4550);
        assert_eq!(player.withdrawals[0].added_by, DEFAULT_ADDED_BY);
    }

    #[test]
    #[should_panic(expected = "Withdrawal amount must be positive")]
    fn test_withdrawal_requires_positive_amount() {
        Withdrawal::new(0, "admin");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Carol "), Some("Carol".to_string()));
        assert_eq!(normalize_name("   "), None);
    }

    #[test]
    fn test_player_serializes_camel_case() {
        let player = Player::new("Dan").with_final_amount(1500);
        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["finalAmountCents"], 1500);
        assert!(json["withdrawals"].as_array().unwrap().is_empty());
    }
}
