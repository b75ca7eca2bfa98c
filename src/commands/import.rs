use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use spotter::{
    dispatch::{DispatchError, Dispatcher},
    loader::{LoadOutcome, ReviewLoader, ReviewState},
    models::{Exercise, ImportDocument, Prescription, Program, Routine, Set},
    normalize::normalize_program,
    presenter::{ProgramPresenter, ProgramSummary},
    storage::{NewImport, Store},
    types::{Config, ImportStatus, OutputFmt, emit},
    utils::{format_age, plain_len, term_width, truncate},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::ImportCmd;

#[derive(Serialize)]
struct ImportJson {
    idx: usize,
    id: String,
    name: String,
    status: ImportStatus,
    created_at: String,
}

#[derive(Serialize)]
struct ReviewJson<'a> {
    import_id: &'a str,
    status: ImportStatus,
    discarded_weeks: usize,
    summary: ProgramSummary,
    program: &'a Program,
}

pub async fn handle(cmd: ImportCmd, store: &Store, cfg: &Config, fmt: OutputFmt) -> Result<()> {
    let trainer_id = cfg.trainer_id();

    match cmd {
        ImportCmd::Add {
            file,
            name,
            sheets_url,
            spreadsheet_id,
        } => {
            let json_str = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading `{file}`"))?;
            let raw: Value =
                serde_json::from_str(&json_str).with_context(|| format!("parsing `{file}`"))?;

            let import = new_import(raw, name, sheets_url, spreadsheet_id)
                .with_context(|| format!("`{file}` is not a program import"))?;

            // Warn early; the raw import is stored either way.
            if let Some(program) = &import.program {
                if normalize_program(program, None).is_err() {
                    println!(
                        "{} `{}` has no usable program object",
                        "warning:".yellow().bold(),
                        file
                    );
                }
            }

            let doc = store.add_import(&trainer_id, import).await?;
            emit(fmt, &doc, || {
                println!(
                    "{} `{}` ({})",
                    "ok:".green().bold(),
                    display_name(&doc),
                    doc.id.dimmed()
                )
            });
        }

        ImportCmd::List => {
            let docs = store.list_imports(&trainer_id).await?;
            let rows = docs
                .iter()
                .enumerate()
                .map(|(i, d)| ImportJson {
                    idx: i + 1,
                    id: d.id.clone(),
                    name: display_name(d),
                    status: d.status,
                    created_at: d.created_at.to_rfc3339(),
                })
                .collect::<Vec<_>>();

            emit(fmt, &rows, || pretty_print_list(&docs));
        }

        ImportCmd::Show { import, week } => {
            let Some(doc) = resolve(store, &trainer_id, &import).await? else {
                return Ok(());
            };
            let Some(state) = load_review(store, &doc.id, &trainer_id).await? else {
                return Ok(());
            };

            if state.import.status == ImportStatus::Pending {
                store
                    .set_import_status(&state.import.id, ImportStatus::Reviewed)
                    .await?;
            }

            let presenter = ProgramPresenter::new(&state.program);
            let review = ReviewJson {
                import_id: &state.import.id,
                status: state.import.status,
                discarded_weeks: state.discarded_weeks,
                summary: presenter.summary(),
                program: &state.program,
            };

            emit(fmt, &review, || {
                warn_discarded(state.discarded_weeks);
                pretty_print_program(&state.program, week)
            });
        }

        ImportCmd::Send {
            import,
            client,
            message,
        } => {
            let Some(endpoint) = cfg.dispatch_url() else {
                println!(
                    "{} no delivery endpoint – run `spotter config set dispatch.url <URL>`",
                    "error:".red().bold()
                );
                return Ok(());
            };
            let dispatcher =
                Dispatcher::new(endpoint, Duration::from_secs(cfg.dispatch_timeout_secs()?))?;

            let Some(doc) = resolve(store, &trainer_id, &import).await? else {
                return Ok(());
            };
            let Some(state) = load_review(store, &doc.id, &trainer_id).await? else {
                return Ok(());
            };

            // The roster accepts an index, id or name; the dispatcher checks the id.
            let client_id = match state.roster.resolve(&client) {
                Some(c) => c.id.clone(),
                None if client.trim().is_empty() => String::new(),
                None => {
                    print!("{} no active client `{}`", "error:".red().bold(), client);
                    match state.roster.suggest(&client) {
                        Some(s) => println!(" – did you mean `{}`?", s.name.green()),
                        None => println!(),
                    }
                    return Ok(());
                }
            };

            let res = dispatcher
                .send(
                    &state.roster,
                    &client_id,
                    &state.program,
                    message.as_deref(),
                    &state.import.id,
                )
                .await;

            match res {
                Ok(receipt) => {
                    store
                        .set_import_status(&state.import.id, ImportStatus::Sent)
                        .await?;
                    let name = state
                        .roster
                        .get(&receipt.client_id)
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| receipt.client_id.clone());
                    emit(fmt, &receipt, || {
                        println!(
                            "{} sent `{}` to {}",
                            "ok:".green().bold(),
                            state.program.name,
                            name.bold()
                        )
                    });
                }
                Err(DispatchError::NoClientSelected) => {
                    println!("{} no client selected", "error:".red().bold());
                }
                Err(e @ DispatchError::Transport(_)) => {
                    store
                        .set_import_status(&state.import.id, ImportStatus::Failed)
                        .await?;
                    return Err(e).context("sending program – run the command again to retry");
                }
                Err(e) => return Err(e.into()),
            }
        }

        ImportCmd::Delete { import } => {
            let Some(doc) = resolve(store, &trainer_id, &import).await? else {
                return Ok(());
            };
            if store.delete_import(&doc.id).await? {
                println!("{} deleted `{}`", "ok:".green().bold(), display_name(&doc));
            }
        }
    }

    Ok(())
}

/// Accepts `{ "program": {...}, "name": ... }` or a bare program object.
fn new_import(
    raw: Value,
    name: Option<String>,
    sheets_url: Option<String>,
    spreadsheet_id: Option<String>,
) -> Result<NewImport> {
    let Value::Object(mut obj) = raw else {
        bail!("expected a JSON object");
    };

    let field = |obj: &serde_json::Map<String, Value>, key: &str| {
        obj.get(key).and_then(Value::as_str).map(str::to_string)
    };

    if obj.contains_key("program") {
        Ok(NewImport {
            name: name.or_else(|| field(&obj, "name")),
            sheets_url: sheets_url.or_else(|| field(&obj, "sheetsUrl")),
            spreadsheet_id: spreadsheet_id.or_else(|| field(&obj, "spreadsheetId")),
            program: obj.remove("program").filter(|p| !p.is_null()),
        })
    } else {
        Ok(NewImport {
            name,
            program: Some(Value::Object(obj)),
            sheets_url,
            spreadsheet_id,
        })
    }
}

async fn resolve(store: &Store, trainer_id: &str, needle: &str) -> Result<Option<ImportDocument>> {
    let doc = store.resolve_import(trainer_id, needle).await?;
    if doc.is_none() {
        println!("{} no import `{}`", "error:".red().bold(), needle);
    }
    Ok(doc)
}

/// Loads and normalizes one import; Ctrl-C abandons the load.
async fn load_review(store: &Store, import_id: &str, trainer_id: &str) -> Result<Option<ReviewState>> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let loader = ReviewLoader::new(store, store);
    let outcome = loader.load(import_id, trainer_id, &cancel).await;
    watcher.abort();

    match outcome {
        Ok(LoadOutcome::Ready(state)) => Ok(Some(*state)),
        Ok(LoadOutcome::Cancelled) => {
            debug!(import_id, "review load cancelled");
            println!("{} cancelled", "warning:".yellow().bold());
            Ok(None)
        }
        Err(e) => {
            println!("{} {} – go back and re-import it", "error:".red().bold(), e);
            Ok(None)
        }
    }
}

fn display_name(doc: &ImportDocument) -> String {
    doc.name
        .clone()
        .filter(|n| !n.is_empty())
        .or_else(|| {
            doc.program
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| spotter::normalize::DEFAULT_PROGRAM_NAME.to_string())
}

fn warn_discarded(discarded: usize) {
    if discarded > 0 {
        println!(
            "{} program is not periodized – {} later week(s) were dropped, only week 1 is kept",
            "warning:".yellow().bold(),
            discarded
        );
    }
}

fn pretty_print_list(docs: &[ImportDocument]) {
    if docs.is_empty() {
        println!("{}", "  (no imports found)".dimmed());
        return;
    }

    println!("{}", "Imports:".cyan().bold());

    let idx_w = docs.len().to_string().len();
    let max_name = term_width().saturating_sub(idx_w + 30).max(16);
    let now = Utc::now();

    let mut left = Vec::<String>::new();
    let mut right = Vec::<String>::new();
    for (i, d) in docs.iter().enumerate() {
        let idx = format!("{:>width$}", i + 1, width = idx_w).yellow();
        let status = match d.status {
            ImportStatus::Pending => d.status.to_string().yellow(),
            ImportStatus::Reviewed => d.status.to_string().blue(),
            ImportStatus::Sent => d.status.to_string().green(),
            ImportStatus::Failed => d.status.to_string().red(),
        };
        left.push(format!(
            " {} • {} {}",
            idx,
            truncate(&display_name(d), max_name).bold(),
            status
        ));
        right.push(
            format!("added {}", format_age(now - d.created_at))
                .dimmed()
                .to_string(),
        );
    }

    let pad_plain = left.iter().map(|s| plain_len(s)).max().unwrap_or(0);
    for (l, r) in left.into_iter().zip(right) {
        let pad = pad_plain + (l.len() - plain_len(&l));
        println!("{:<pad$} {} {}", l, "|".blue(), r, pad = pad);
    }
}

fn pretty_print_program(program: &Program, only_week: Option<u32>) {
    let presenter = ProgramPresenter::new(program);

    let kind = if program.is_periodized {
        "periodized"
    } else {
        "single week"
    };
    println!(
        "{} {}",
        program.name.cyan().bold(),
        format!("({kind}, {} weeks)", presenter.program_weeks()).dimmed()
    );
    if let Some(desc) = &program.description {
        println!("  {}", desc.dimmed());
    }
    println!(
        "  {} routines • {} exercises • {} sets",
        presenter.routine_count().to_string().yellow(),
        presenter.total_exercises().to_string().yellow(),
        presenter.total_sets().to_string().yellow()
    );

    for week in &program.weeks {
        if only_week.is_some_and(|w| w != week.week_number) {
            continue;
        }

        println!("\n{}", format!("Week {}", week.week_number).bold());
        let routines = presenter.week_routines(week.week_number);
        if routines.is_empty() {
            println!("{}", "  (no routines)".dimmed());
        }
        for (i, routine) in routines.iter().enumerate() {
            print_routine(routine, week.week_number, i + 1 == routines.len());
        }
    }
}

fn print_routine(routine: &Routine, week_number: u32, last: bool) {
    let (connector, rail) = if last { ("└─", "   ") } else { ("├─", "│  ") };
    let name = if routine.name.is_empty() {
        "(unnamed routine)".dimmed().to_string()
    } else {
        routine.name.bold().to_string()
    };
    println!(" {} {}", connector, name);

    for (i, exercise) in routine.exercises.iter().enumerate() {
        println!(
            " {} {} • {}",
            rail,
            (i + 1).to_string().yellow(),
            exercise.name
        );
        for set in week_sets(exercise, week_number) {
            println!(" {}     {}", rail, describe_set(set).dimmed());
        }
    }
}

/// Sets prescribed for `week_number`; flat exercises use the same sets every week.
fn week_sets(exercise: &Exercise, week_number: u32) -> &[Set] {
    match &exercise.prescription {
        Prescription::Flat(sets) => sets.as_slice(),
        Prescription::Periodized(weeks) => weeks
            .iter()
            .find(|w| w.week_number == week_number)
            .map(|w| w.sets.as_slice())
            .unwrap_or(&[]),
    }
}

fn describe_set(set: &Set) -> String {
    let mut parts = vec![format!("set {}:", set.set_number)];
    if let Some(reps) = &set.reps {
        parts.push(format!("{} reps", value_text(reps)));
    }
    if let Some(weight) = &set.weight {
        parts.push(format!("@ {}", value_text(weight)));
    }
    if let Some(rpe) = &set.rpe {
        parts.push(format!("RPE {}", value_text(rpe)));
    }
    if let Some(rest) = &set.rest {
        parts.push(format!("rest {}", value_text(rest)));
    }
    if set.warmup == Some(true) {
        parts.push("(warm-up)".to_string());
    }
    if let Some(notes) = &set.notes {
        parts.push(format!("– {notes}"));
    }
    parts.iter().join(" ")
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
