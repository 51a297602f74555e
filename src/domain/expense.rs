use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{format_cents, Cents, PlayerId, MAX_AMOUNT_CENTS};

pub type ExpenseId = Uuid;

/// Shared food or drink bought by one player and split between consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodExpense {
    pub id: ExpenseId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub payer: PlayerId,
    /// Distinct consumers, first-seen order. May include the payer.
    pub consumers: Vec<PlayerId>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FoodExpense {
    /// Build a validated expense. Duplicate consumer ids collapse to one entry.
    pub fn new(
        amount_cents: Cents,
        payer: PlayerId,
        consumers: impl IntoIterator<Item = PlayerId>,
    ) -> Result<Self, ExpenseError> {
        if amount_cents <= 0 {
            return Err(ExpenseError::NonPositiveAmount(amount_cents));
        }
        if amount_cents > MAX_AMOUNT_CENTS {
            return Err(ExpenseError::AmountTooLarge(amount_cents));
        }

        let consumers = dedup_consumers(consumers);
        if consumers.is_empty() {
            return Err(ExpenseError::NoConsumers);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            amount_cents,
            payer,
            consumers,
            description: None,
            created_at: Utc::now(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

fn dedup_consumers(consumers: impl IntoIterator<Item = PlayerId>) -> Vec<PlayerId> {
    let mut seen = HashSet::new();
    consumers
        .into_iter()
        .filter(|id| seen.insert(*id))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseError {
    NonPositiveAmount(Cents),
    AmountTooLarge(Cents),
    NoConsumers,
}

impl std::fmt::Display for ExpenseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseError::NonPositiveAmount(amount) => {
                write!(f, "expense amount must be positive, got {} cents", amount)
            }
            ExpenseError::AmountTooLarge(amount) => write!(
                f,
                "expense amount {} is above the limit of {}",
                format_cents(*amount),
                format_cents(MAX_AMOUNT_CENTS)
            ),
            ExpenseError::NoConsumers => write!(f, "expense needs at least one consumer"),
        }
    }
}

impl std::error::Error for ExpenseError {}
