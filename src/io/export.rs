use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::GameService;
use crate::domain::{format_cents, GameSnapshot, PlayerLedger};

/// Full export of every record, for backups and debugging a bad night.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotExport {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: GameSnapshot,
}

/// What to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Players,
    Expenses,
    Settlements,
    Snapshot,
}

impl ExportKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "players" => Some(ExportKind::Players),
            "expenses" | "food" => Some(ExportKind::Expenses),
            "settlements" | "results" => Some(ExportKind::Settlements),
            "snapshot" | "full" => Some(ExportKind::Snapshot),
            _ => None,
        }
    }
}

/// Exporter for converting game data to CSV or JSON.
pub struct Exporter<'a> {
    service: &'a GameService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a GameService) -> Self {
        Self { service }
    }

    /// Export the requested kind, returning the number of records written.
    pub async fn export<W: Write>(&self, kind: ExportKind, writer: W) -> Result<usize> {
        match kind {
            ExportKind::Players => self.export_players_csv(writer).await,
            ExportKind::Expenses => self.export_expenses_csv(writer).await,
            ExportKind::Settlements => self.export_settlements_csv(writer).await,
            ExportKind::Snapshot => self.export_snapshot_json(writer).await,
        }
    }

    /// Export players with their bank totals to CSV.
    pub async fn export_players_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let players = self.service.list_players().await?;
        let ledger = PlayerLedger::new(&players);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["name", "withdrawals", "taken", "returned", "poker_net"])?;
        for player in &players {
            csv_writer.write_record([
                player.name.clone(),
                player.withdrawals.len().to_string(),
                format_cents(ledger.total_withdrawn(player)),
                format_cents(player.final_amount_cents),
                format_cents(ledger.net_poker(player)),
            ])?;
        }

        csv_writer.flush()?;
        Ok(players.len())
    }

    /// Export food expenses to CSV. Consumers are `;`-separated names.
    pub async fn export_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "amount",
            "payer",
            "consumers",
            "share",
            "description",
        ])?;
        for info in &expenses {
            csv_writer.write_record([
                info.expense.id.to_string(),
                format_cents(info.expense.amount_cents),
                info.payer_name.clone(),
                info.consumer_names.join(";"),
                format_cents(info.share_cents),
                info.expense.description.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(expenses.len())
    }

    /// Export the settlement transfers to CSV. Fails on an unbalanced ledger.
    pub async fn export_settlements_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let report = self.service.compute_results().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["from", "to", "amount"])?;
        for transfer in &report.transfers {
            csv_writer.write_record([
                transfer.from.clone(),
                transfer.to.clone(),
                format_cents(transfer.amount_cents),
            ])?;
        }

        csv_writer.flush()?;
        Ok(report.transfers.len())
    }

    /// Export every player and expense as pretty JSON.
    pub async fn export_snapshot_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let snapshot = self.service.snapshot().await?;
        let count = snapshot.players.len() + snapshot.expenses.len();
        let export = SnapshotExport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            snapshot,
        };

        serde_json::to_writer_pretty(&mut writer, &export)?;
        writeln!(writer)?;
        Ok(count)
    }
}
