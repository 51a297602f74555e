use serde::{Deserialize, Serialize};

use super::{format_cents, Cents, LedgerKind, LedgerNets, PlayerId};

/// Largest signed total a ledger may carry and still count as reconciled.
pub const IMBALANCE_TOLERANCE_CENTS: Cents = 1;

/// Combined position of one player: positive is owed money, negative owes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetBalance {
    pub player: PlayerId,
    pub poker: Cents,
    pub food: Cents,
    pub balance: Cents,
}

/// Merge poker and food nets into one balance per player.
///
/// Both ledgers must reconcile on their own first. An unbalanced ledger means
/// something was never entered (usually a return amount) and is reported, not
/// patched over.
pub fn combine(poker: &LedgerNets, food: &LedgerNets) -> Result<Vec<NetBalance>, LedgerImbalance> {
    check_reconciled(poker)?;
    check_reconciled(food)?;

    let mut balances: Vec<NetBalance> = poker
        .entries
        .iter()
        .map(|&(player, net)| {
            let food_net = food.net_of(player);
            NetBalance {
                player,
                poker: net,
                food: food_net,
                balance: net + food_net,
            }
        })
        .collect();

    // Players only present in the food ledger still get a balance.
    for &(player, net) in &food.entries {
        if !balances.iter().any(|b| b.player == player) {
            balances.push(NetBalance {
                player,
                poker: 0,
                food: net,
                balance: net,
            });
        }
    }

    Ok(balances)
}

/// Fail with [`LedgerImbalance`] when the ledger's totals differ by more than
/// [`IMBALANCE_TOLERANCE_CENTS`].
pub fn check_reconciled(nets: &LedgerNets) -> Result<(), LedgerImbalance> {
    if nets.sum().abs() > IMBALANCE_TOLERANCE_CENTS {
        return Err(LedgerImbalance {
            ledger: nets.kind,
            credited: nets.credited,
            debited: nets.debited,
        });
    }
    Ok(())
}

/// A ledger whose credited and debited totals do not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerImbalance {
    pub ledger: LedgerKind,
    pub credited: Cents,
    pub debited: Cents,
}

impl LedgerImbalance {
    pub fn difference(&self) -> Cents {
        self.credited - self.debited
    }
}

impl std::fmt::Display for LedgerImbalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (credited_label, debited_label) = self.ledger.total_labels();
        write!(
            f,
            "{} totals don't match: {} {}, {} {} (difference {})",
            self.ledger,
            debited_label,
            format_cents(self.debited),
            credited_label,
            format_cents(self.credited),
            format_cents(self.difference())
        )
    }
}

impl std::error::Error for LedgerImbalance {}
