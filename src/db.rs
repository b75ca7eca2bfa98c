use std::str::FromStr;

use anyhow::Result;
use sqlx::{
    Executor, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS program_imports (
    id             TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL,
    name           TEXT,
    program        TEXT,
    status         TEXT NOT NULL DEFAULT 'pending',
    spreadsheet_id TEXT,
    sheets_url     TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS clients (
    id         TEXT PRIMARY KEY,
    trainer_id TEXT NOT NULL,
    name       TEXT NOT NULL,
    email      TEXT,
    status     TEXT NOT NULL DEFAULT 'active',
    linked     INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    UNIQUE (trainer_id, name)
);
"#;

pub async fn open(path: &str) -> Result<DB> {
    let opts = SqliteConnectOptions::from_str(path)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    pool.execute(SCHEMA).await?;
    Ok(pool)
}
