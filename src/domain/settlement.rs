use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Cents, NetBalance, PlayerId};

/// A single payment that moves money from a debtor to a creditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Debtor (pays)
    pub from: PlayerId,
    /// Creditor (receives)
    pub to: PlayerId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
}

/// Heap key: largest remaining amount first, then lowest player id.
type Party = (Cents, Reverse<PlayerId>);

/// Turn net balances into debtor -> creditor transfers.
///
/// Greedy: repeatedly match the largest creditor with the largest debtor
/// (ties go to the lower player id) and transfer the smaller of the two
/// amounts. Every step retires at least one party, so `n` unsettled parties
/// produce at most `n - 1` transfers. The output is deterministic for a given
/// input but is not guaranteed to be the smallest possible set.
pub fn settle(balances: &[NetBalance]) -> Vec<Transfer> {
    let mut creditors: BinaryHeap<Party> = BinaryHeap::new();
    let mut debtors: BinaryHeap<Party> = BinaryHeap::new();

    for entry in balances {
        if entry.balance > 0 {
            creditors.push((entry.balance, Reverse(entry.player)));
        } else if entry.balance < 0 {
            debtors.push((-entry.balance, Reverse(entry.player)));
        }
    }

    let mut transfers = Vec::with_capacity(creditors.len() + debtors.len());

    while let (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) =
        (creditors.pop(), debtors.pop())
    {
        let amount = credit.min(debt);
        debug!(%debtor, %creditor, amount, "settlement transfer");
        transfers.push(Transfer {
            from: debtor,
            to: creditor,
            amount_cents: amount,
        });

        if credit > amount {
            creditors.push((credit - amount, Reverse(creditor)));
        }
        if debt > amount {
            debtors.push((debt - amount, Reverse(debtor)));
        }
    }

    // Only reachable when the balances carried a tolerated rounding residue.
    for (left, Reverse(player)) in creditors.into_iter().chain(debtors) {
        debug!(%player, left, "unsettled rounding residue");
    }

    transfers
}
