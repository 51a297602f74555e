use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::{
    format_cents, format_money, Cents, LedgerImbalance, LedgerKind, LedgerNets, Player, PlayerId,
    Transfer,
};

/// Player name -> amount, kept in player listing order.
/// Serializes as a JSON object with amounts rendered as `"-10.00"` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary(pub Vec<(String, Cents)>);

impl Summary {
    pub fn get(&self, name: &str) -> Option<Cents> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Cents)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, cents) in &self.0 {
            map.serialize_entry(name, &format_cents(*cents))?;
        }
        map.end()
    }
}

/// A transfer with player names resolved, for display and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedTransfer {
    pub from: String,
    pub to: String,
    pub amount_cents: Cents,
}

/// Everything the results screen needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub poker_summary: Summary,
    pub food_summary: Summary,
    pub settlements: Vec<String>,
    #[serde(skip)]
    pub transfers: Vec<NamedTransfer>,
}

/// Package ledger nets and solver output into a report.
///
/// Pure: identical input always yields identical output.
pub fn assemble(
    players: &[Player],
    poker: &LedgerNets,
    food: &LedgerNets,
    transfers: &[Transfer],
    currency_symbol: &str,
) -> SettlementReport {
    let summary = |nets: &LedgerNets| {
        Summary(
            players
                .iter()
                .map(|p| (p.name.clone(), nets.net_of(p.id)))
                .collect(),
        )
    };

    let name_of = |id: PlayerId| {
        players
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let transfers: Vec<NamedTransfer> = transfers
        .iter()
        .map(|t| NamedTransfer {
            from: name_of(t.from),
            to: name_of(t.to),
            amount_cents: t.amount_cents,
        })
        .collect();

    SettlementReport {
        poker_summary: summary(poker),
        food_summary: summary(food),
        settlements: transfers
            .iter()
            .map(|t| describe_transfer(t, currency_symbol))
            .collect(),
        transfers,
    }
}

/// "A pays B $20.00"
pub fn describe_transfer(transfer: &NamedTransfer, currency_symbol: &str) -> String {
    format!(
        "{} pays {} {}",
        transfer.from,
        transfer.to,
        format_money(currency_symbol, transfer.amount_cents)
    )
}

/// Tagged payload for the results endpoint: either the report or the
/// imbalance that prevented it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultsResponse {
    Ok(SettlementReport),
    Imbalance(ImbalancePayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImbalancePayload {
    pub ledger: LedgerKind,
    pub credited: String,
    pub debited: String,
    pub difference: String,
    pub message: String,
}

impl From<LedgerImbalance> for ImbalancePayload {
    fn from(imbalance: LedgerImbalance) -> Self {
        Self {
            ledger: imbalance.ledger,
            credited: format_cents(imbalance.credited),
            debited: format_cents(imbalance.debited),
            difference: format_cents(imbalance.difference()),
            message: imbalance.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_summary_serializes_in_order() {
        let summary = Summary(vec![
            ("Zed".to_string(), 2000),
            ("Amy".to_string(), -1000),
            ("Bo".to_string(), -1000),
        ]);
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"Zed":"20.00","Amy":"-10.00","Bo":"-10.00"}"#);
        assert_eq!(summary.get("Amy"), Some(-1000));
        assert_eq!(summary.get("Nobody"), None);
    }

    #[test]
    fn test_describe_transfer() {
        let t = NamedTransfer {
            from: "A".into(),
            to: "B".into(),
            amount_cents: 2000,
        };
        assert_eq!(describe_transfer(&t, "$"), "A pays B $20.00");
    }

    #[test]
    fn test_assemble_resolves_names() {
        let players = vec![Player::new("A"), Player::new("B")];
        let poker = LedgerNets {
            kind: LedgerKind::Poker,
            entries: vec![(players[0].id, -2000), (players[1].id, 2000)],
            credited: 2000,
            debited: 2000,
        };
        let food = LedgerNets {
            kind: LedgerKind::Food,
            entries: vec![(players[0].id, 0), (players[1].id, 0)],
            credited: 0,
            debited: 0,
        };
        let transfers = vec![Transfer {
            from: players[0].id,
            to: players[1].id,
            amount_cents: 2000,
        }];

        let report = assemble(&players, &poker, &food, &transfers, "$");
        assert_eq!(report.settlements, vec!["A pays B $20.00"]);
        assert_eq!(report.poker_summary.get("A"), Some(-2000));
        assert_eq!(report.food_summary.get("B"), Some(0));
        assert_eq!(report.transfers[0].to, "B");
    }

    #[test]
    fn test_unknown_player_falls_back_to_id() {
        let stranger = Uuid::from_u128(42);
        let players = vec![Player::new("A")];
        let empty = LedgerNets {
            kind: LedgerKind::Food,
            entries: Vec::new(),
            credited: 0,
            debited: 0,
        };
        let transfers = vec![Transfer {
            from: stranger,
            to: players[0].id,
            amount_cents: 1,
        }];
        let report = assemble(&players, &empty, &empty, &transfers, "$");
        assert_eq!(report.transfers[0].from, stranger.to_string());
    }

    #[test]
    fn test_results_response_is_tagged() {
        let ok = ResultsResponse::Ok(SettlementReport {
            poker_summary: Summary::default(),
            food_summary: Summary::default(),
            settlements: vec!["A pays B $1.00".into()],
            transfers: Vec::new(),
        });
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["settlements"][0], "A pays B $1.00");
        assert!(json.get("transfers").is_none());

        let err = ResultsResponse::Imbalance(
            LedgerImbalance {
                ledger: LedgerKind::Poker,
                credited: 1500,
                debited: 2000,
            }
            .into(),
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "imbalance");
        assert_eq!(json["ledger"], "poker");
        assert_eq!(json["difference"], "-5.00");
    }
}
