use anyhow::Result;
use colored::Colorize;
use spotter::{
    models::Client,
    storage::{NewClient, Store},
    types::{ClientStatus, Config, OutputFmt, emit},
};

use crate::cli::ClientCmd;

pub async fn handle(cmd: ClientCmd, store: &Store, cfg: &Config, fmt: OutputFmt) -> Result<()> {
    let trainer_id = cfg.trainer_id();

    match cmd {
        ClientCmd::Add {
            name,
            email,
            inactive,
            unlinked,
        } => {
            if name.trim().is_empty() {
                println!("{} client name must not be empty", "error:".red().bold());
                return Ok(());
            }

            let status = if inactive {
                ClientStatus::Inactive
            } else {
                ClientStatus::Active
            };
            let res = store
                .add_client(
                    &trainer_id,
                    NewClient {
                        name: name.clone(),
                        email,
                        status,
                        linked: !unlinked,
                    },
                )
                .await;

            match res {
                Ok(client) => emit(fmt, &client, || {
                    println!("{} client \"{}\" added", "info:".blue().bold(), client.name)
                }),
                Err(e) if is_unique_violation(&e) => println!(
                    "{} client \"{}\" already exists — use `client list` to view all clients",
                    "warning:".yellow().bold(),
                    name
                ),
                Err(e) => return Err(e),
            }
        }

        ClientCmd::List { all } => {
            let clients = if all {
                store.list_clients(&trainer_id).await?
            } else {
                store.active_clients(&trainer_id).await?
            };

            emit(fmt, &clients, || pretty_print(&clients));
        }
    }

    Ok(())
}

fn pretty_print(clients: &[Client]) {
    if clients.is_empty() {
        println!("{}", "  (no clients found)".dimmed());
        return;
    }

    println!("{}", "Clients:".cyan().bold());

    let idx_w = clients.len().to_string().len();
    for (i, c) in clients.iter().enumerate() {
        let idx = format!("{:>width$}", i + 1, width = idx_w).yellow();
        let email = c
            .email
            .as_deref()
            .map(|e| format!("<{e}>").dimmed().to_string())
            .unwrap_or_default();

        let mut flags = Vec::new();
        if c.status == ClientStatus::Inactive {
            flags.push("inactive".red().to_string());
        }
        if !c.linked {
            flags.push("unlinked".yellow().to_string());
        }

        println!(" {} • {} {} {}", idx, c.name.bold(), email, flags.join(" "));
    }
}

/// 2067 = SQLITE_CONSTRAINT_UNIQUE
fn is_unique_violation(e: &anyhow::Error) -> bool {
    matches!(
        e.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("2067")
    )
}
