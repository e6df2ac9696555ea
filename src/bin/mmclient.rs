#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for reading the newest messages of every configured account

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use mmclient::extract::{self, MessageDetail, MessageSummary};
use mmclient::{
    AccountRegistry, ClientConfig, ConnectionManager, FetchOutcome, ImapConnector,
    ManagerOptions,
};
use serde::Serialize;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mmclient")]
#[command(about = "Read-only multi-account IMAP inbox reader")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the newest messages of every account
    List {
        /// Messages per account (default: MMCLIENT_MAX_FETCH or 6)
        #[arg(long)]
        max: Option<usize>,
    },

    /// Show one message in full
    Show {
        /// Account index, as configured in the accounts file
        #[arg(long)]
        account: i64,

        /// Row in that account's list, 1 being the newest
        #[arg(long)]
        row: usize,

        /// Messages per account (default: MMCLIENT_MAX_FETCH or 6)
        #[arg(long)]
        max: Option<usize>,
    },
}

#[derive(Serialize)]
struct InboxView {
    index: i64,
    account: String,
    messages: Vec<MessageSummary>,
}

#[derive(Serialize)]
struct FailureView {
    index: i64,
    account: String,
    error: String,
}

#[derive(Serialize)]
struct ListView {
    inboxes: Vec<InboxView>,
    failures: Vec<FailureView>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    let registry = AccountRegistry::load(&config.accounts_path)?;
    let connector = ImapConnector::from_config(&config)?;
    let options = ManagerOptions {
        failure_policy: config.failure_policy,
        parallel: config.parallel,
    };
    let mut manager = ConnectionManager::new(connector, registry, options);

    let result = match &args.command {
        Command::List { max } => {
            cmd_list(&mut manager, args, max.unwrap_or(config.max_fetch)).await
        }
        Command::Show { account, row, max } => {
            cmd_show(
                &mut manager,
                args,
                *account,
                *row,
                max.unwrap_or(config.max_fetch),
            )
            .await
        }
    };

    // Release every session whatever happened above.
    let closed = manager.close_all().await;
    result?;
    closed?;
    Ok(())
}

async fn cmd_list(
    manager: &mut ConnectionManager<ImapConnector>,
    args: &Args,
    max: usize,
) -> anyhow::Result<()> {
    let outcome = manager.fetch_all(max).await?;
    let view = list_view(&outcome);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_list(&view);
    }

    Ok(())
}

async fn cmd_show(
    manager: &mut ConnectionManager<ImapConnector>,
    args: &Args,
    index: i64,
    row: usize,
    max: usize,
) -> anyhow::Result<()> {
    let outcome = manager.fetch_all(max).await?;

    if let Some(failure) = outcome.failures.iter().find(|f| f.account.index == index) {
        bail!("{}", failure.error);
    }
    let inbox = outcome
        .inboxes
        .iter()
        .find(|inbox| inbox.account.index == index)
        .with_context(|| format!("No account with index {index}"))?;

    let Some(message) = row.checked_sub(1).and_then(|i| inbox.messages.get(i)) else {
        bail!(
            "Row {row} out of range: {} has {} message(s)",
            inbox.account.label(),
            inbox.messages.len()
        );
    };

    let detail: MessageDetail = extract::render(message)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
    } else {
        println!("{}", detail.to_text());
    }

    Ok(())
}

fn list_view(outcome: &FetchOutcome) -> ListView {
    let inboxes = outcome
        .inboxes
        .iter()
        .map(|inbox| InboxView {
            index: inbox.account.index,
            account: inbox.account.label(),
            messages: inbox
                .messages
                .iter()
                .map(|message| {
                    extract::summarize(message).unwrap_or_else(|e| {
                        warn!("Unreadable message in {}: {}", inbox.account.label(), e);
                        MessageSummary::default()
                    })
                })
                .collect(),
        })
        .collect();

    let failures = outcome
        .failures
        .iter()
        .map(|failure| FailureView {
            index: failure.account.index,
            account: failure.account.label(),
            error: failure.error.to_string(),
        })
        .collect();

    ListView { inboxes, failures }
}

fn print_list(view: &ListView) {
    for inbox in &view.inboxes {
        println!("== {} ==", inbox.account);

        if inbox.messages.is_empty() {
            println!("No messages.\n");
            continue;
        }

        println!("{:<4} {:<32} {:<32} {}", "Row", "Date", "From", "Subject");
        println!("{}", "-".repeat(110));
        for (row, summary) in inbox.messages.iter().enumerate() {
            println!(
                "{:<4} {:<32} {:<32} {}",
                row + 1,
                truncate(&summary.date, 31),
                truncate(&summary.from, 31),
                truncate(&summary.subject, 40),
            );
        }
        println!("\n{} message(s)\n", inbox.messages.len());
    }

    for failure in &view.failures {
        eprintln!("Skipped {}: {}", failure.account, failure.error);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
