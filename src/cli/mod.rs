use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::api::{self, AppState};
use crate::application::{AppError, GameService};
use crate::config::{Config, ConfigOverrides};
use crate::domain::{
    format_cents, format_money, parse_cents, Cents, PlayerLedger, ResultsResponse,
};

/// Pokerbank - home game bank and settlement tracker
#[derive(Parser)]
#[command(name = "pokerbank")]
#[command(about = "Track the bank, buy-ins and shared food at a home poker game, then settle up")]
#[command(version)]
pub struct Cli {
    /// Database file path [env: POKERBANK_DB, default: pokerbank.db]
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Currency symbol for settlements [env: POKERBANK_CURRENCY, default: $]
    #[arg(long, global = true)]
    pub currency: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Player management commands
    #[command(subcommand)]
    Player(PlayerCommands),

    /// Take cash from the bank for a player
    Withdraw {
        /// Player name
        player: String,

        /// Amount (e.g., "20" or "20.00"; defaults to the configured buy-in)
        #[arg(allow_negative_numbers = true)]
        amount: Option<String>,

        /// Who handed out the cash
        #[arg(long = "by")]
        added_by: Option<String>,
    },

    /// Record the cash a player handed back to the bank
    Return {
        /// Player name
        player: String,

        /// Amount returned (e.g., "35.50"); replaces any earlier value
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Shared food and drink expenses
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Show bank totals and whether they reconcile
    Status,

    /// Compute summaries and who pays whom
    Results {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: players, expenses, settlements, snapshot
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Serve the HTTP API used by the web UI
    Serve {
        /// Bind address [env: POKERBANK_BIND, default: 127.0.0.1:8080]
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PlayerCommands {
    /// Add a player (names must be unique)
    Add {
        /// Player name
        name: String,
    },

    /// List all players with bank totals
    List,

    /// Show a player's withdrawals
    Show {
        /// Player name
        name: String,
    },

    /// Rename a player
    Rename {
        /// Current name
        name: String,

        /// New name
        new_name: String,
    },

    /// Remove a player and their withdrawals
    Remove {
        /// Player name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record a shared expense
    Add {
        /// Amount paid (e.g., "30.00")
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// Player who paid
        #[arg(long)]
        payer: String,

        /// Comma-separated players who shared it (may include the payer)
        #[arg(long, value_delimiter = ',', required = true)]
        consumers: Vec<String>,

        /// What was bought
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List shared expenses
    List,

    /// Remove an expense
    Remove {
        /// Expense ID
        id: String,
    },
}

impl Cli {
    fn config(&self, bind: Option<String>) -> Result<Config> {
        Ok(Config::load(ConfigOverrides {
            database: self.database.clone(),
            bind,
            currency_symbol: self.currency.clone(),
        })?)
    }

    async fn connect(config: &Config) -> Result<GameService> {
        let service = GameService::connect(&config.database)
            .await
            .with_context(|| {
                format!(
                    "Cannot open database '{}'. Run `pokerbank init` first",
                    config.database
                )
            })?;
        Ok(service.with_currency_symbol(config.currency_symbol.clone()))
    }

    pub async fn run(self) -> Result<()> {
        let bind = match &self.command {
            Commands::Serve { bind } => bind.clone(),
            _ => None,
        };
        let config = self.config(bind)?;

        match self.command {
            Commands::Init => {
                GameService::init(&config.database).await?;
                println!("Database initialized: {}", config.database);
            }

            Commands::Player(player_cmd) => {
                let service = Self::connect(&config).await?;
                run_player_command(&service, player_cmd).await?;
            }

            Commands::Withdraw {
                player,
                amount,
                added_by,
            } => {
                let service = Self::connect(&config).await?;
                let amount_cents = match amount {
                    Some(a) => parse_amount(&a)?,
                    None => config.default_buy_in_cents,
                };
                let target = service.get_player(&player).await?;
                let updated = service
                    .add_withdrawal(target.id, amount_cents, added_by.as_deref())
                    .await?;

                println!(
                    "{} took {} from the bank (total {})",
                    updated.name,
                    format_money(service.currency_symbol(), amount_cents),
                    format_money(service.currency_symbol(), updated.total_withdrawn())
                );
            }

            Commands::Return { player, amount } => {
                let service = Self::connect(&config).await?;
                let amount_cents = parse_amount(&amount)?;
                let target = service.get_player(&player).await?;
                let updated = service.set_final_amount(target.id, amount_cents).await?;

                println!(
                    "{} returned {}",
                    updated.name,
                    format_money(service.currency_symbol(), updated.final_amount_cents)
                );
            }

            Commands::Expense(expense_cmd) => {
                let service = Self::connect(&config).await?;
                run_expense_command(&service, expense_cmd).await?;
            }

            Commands::Status => {
                let service = Self::connect(&config).await?;
                run_status_command(&service).await?;
            }

            Commands::Results { format } => {
                let service = Self::connect(&config).await?;
                run_results_command(&service, &format).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = Self::connect(&config).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }

            Commands::Serve { .. } => {
                let service = Self::connect(&config).await?;
                let state = AppState::new(service, config.default_buy_in_cents);
                api::serve(state, config.bind).await?;
            }
        }

        Ok(())
    }
}

fn parse_amount(amount: &str) -> Result<Cents> {
    parse_cents(amount)
        .with_context(|| format!("Invalid amount '{}'. Use '20.00' or '20'", amount))
}

async fn run_player_command(service: &GameService, cmd: PlayerCommands) -> Result<()> {
    let symbol = service.currency_symbol();
    match cmd {
        PlayerCommands::Add { name } => {
            let player = service.add_player(&name).await?;
            println!("Added player: {}", player.name);
        }

        PlayerCommands::List => {
            let players = service.list_players().await?;
            if players.is_empty() {
                println!("No players yet.");
            } else {
                let ledger = PlayerLedger::new(&players);
                println!(
                    "{:<20} {:>12} {:>12} {:>12}",
                    "PLAYER", "TAKEN", "RETURNED", "NET"
                );
                println!("{}", "-".repeat(59));
                for player in &players {
                    println!(
                        "{:<20} {:>12} {:>12} {:>12}",
                        truncate(&player.name, 20),
                        format_cents(ledger.total_withdrawn(player)),
                        format_cents(player.final_amount_cents),
                        format_cents(ledger.net_poker(player))
                    );
                }
            }
        }

        PlayerCommands::Show { name } => {
            let player = service.get_player(&name).await?;
            println!("Player: {}", player.name);
            println!("  ID:        {}", player.id);
            println!(
                "  Joined:    {}",
                player.created_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!(
                "  Taken:     {}",
                format_money(symbol, player.total_withdrawn())
            );
            println!(
                "  Returned:  {}",
                format_money(symbol, player.final_amount_cents)
            );
            if !player.withdrawals.is_empty() {
                println!();
                println!("  Withdrawals:");
                for w in &player.withdrawals {
                    println!(
                        "    - {} at {} by {}",
                        format_money(symbol, w.amount_cents),
                        w.created_at.format("%H:%M:%S"),
                        w.added_by
                    );
                }
            }
        }

        PlayerCommands::Rename { name, new_name } => {
            let player = service.get_player(&name).await?;
            let renamed = service.rename_player(player.id, &new_name).await?;
            println!("Renamed {} to {}", name, renamed.name);
        }

        PlayerCommands::Remove { name } => {
            let player = service.get_player(&name).await?;
            service.delete_player(player.id).await?;
            println!("Removed player: {}", player.name);
        }
    }
    Ok(())
}

async fn run_expense_command(service: &GameService, cmd: ExpenseCommands) -> Result<()> {
    let symbol = service.currency_symbol();
    match cmd {
        ExpenseCommands::Add {
            amount,
            payer,
            consumers,
            description,
        } => {
            let amount_cents = parse_amount(&amount)?;
            let payer = service.get_player(&payer).await?;
            let mut consumer_ids = Vec::with_capacity(consumers.len());
            for name in &consumers {
                consumer_ids.push(service.get_player(name).await?.id);
            }

            let info = service
                .add_expense(amount_cents, payer.id, &consumer_ids, description)
                .await?;
            println!(
                "Recorded expense: {} paid by {}, {} each for {} ({})",
                format_money(symbol, info.expense.amount_cents),
                info.payer_name,
                format_money(symbol, info.share_cents),
                info.consumer_names.join(", "),
                info.expense.id
            );
        }

        ExpenseCommands::List => {
            let expenses = service.list_expenses().await?;
            if expenses.is_empty() {
                println!("No food expenses.");
            } else {
                println!(
                    "{:<36} {:>10} {:<15} DESCRIPTION / CONSUMERS",
                    "ID", "AMOUNT", "PAYER"
                );
                println!("{}", "-".repeat(90));
                for info in &expenses {
                    let desc = info.expense.description.as_deref().unwrap_or("");
                    println!(
                        "{:<36} {:>10} {:<15} {} [{}]",
                        info.expense.id,
                        format_cents(info.expense.amount_cents),
                        truncate(&info.payer_name, 15),
                        truncate(desc, 20),
                        info.consumer_names.join(", ")
                    );
                }
            }
        }

        ExpenseCommands::Remove { id } => {
            let expense_id =
                Uuid::parse_str(&id).context("Invalid expense ID format (expected UUID)")?;
            let expense = service.delete_expense(expense_id).await?;
            println!(
                "Removed expense: {} ({})",
                format_money(symbol, expense.amount_cents),
                expense.id
            );
        }
    }
    Ok(())
}

async fn run_status_command(service: &GameService) -> Result<()> {
    let symbol = service.currency_symbol();
    let summary = service.bank_summary().await?;

    println!("Taken from bank:  {:>12}", format_money(symbol, summary.total_taken));
    println!(
        "Returned to bank: {:>12}",
        format_money(symbol, summary.total_returned)
    );
    println!("{}", "-".repeat(31));
    println!(
        "Difference:       {:>12}  {}",
        format_money(symbol, summary.difference),
        if summary.is_balanced { "OK" } else { "UNBALANCED!" }
    );

    if !summary.is_balanced {
        println!();
        println!("Make sure every player has returned what they took from the bank.");
    }
    Ok(())
}

async fn run_results_command(service: &GameService, format: &str) -> Result<()> {
    let report = match service.compute_results().await {
        Ok(report) => report,
        Err(AppError::LedgerImbalance(imbalance)) => {
            if format == "json" {
                let payload = ResultsResponse::Imbalance(imbalance.into());
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            anyhow::bail!("Cannot settle: {}", imbalance);
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        "json" => {
            let payload = ResultsResponse::Ok(report);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        "table" => {
            println!("{:<20} {:>12} {:>12}", "PLAYER", "POKER", "FOOD");
            println!("{}", "-".repeat(46));
            for (name, poker) in report.poker_summary.iter() {
                let food = report.food_summary.get(name).unwrap_or(0);
                println!(
                    "{:<20} {:>12} {:>12}",
                    truncate(name, 20),
                    format_cents(*poker),
                    format_cents(food)
                );
            }
            println!();

            if report.settlements.is_empty() {
                println!("Everyone is square.");
            } else {
                println!("Settlements:");
                for line in &report.settlements {
                    println!("  {}", line);
                }
            }
        }
        other => anyhow::bail!("Unknown format '{}'. Use table or json", other),
    }
    Ok(())
}

async fn run_export_command(
    service: &GameService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::{ExportKind, Exporter};
    use std::fs::File;
    use std::io::{stdout, Write};

    let kind = ExportKind::from_str(export_type).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown export type '{}'. Use players, expenses, settlements or snapshot",
            export_type
        )
    })?;

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create file: {}", path))?,
        ),
        None => Box::new(stdout()),
    };

    let count = Exporter::new(service).export(kind, writer).await?;

    if let Some(path) = output {
        eprintln!("Exported {} record(s) to {}", count, path);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
