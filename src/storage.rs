use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::debug;
use uuid::Uuid;

use crate::{
    loader::{ClientSource, ImportSource},
    models::{Client, ImportDocument},
    types::{ClientStatus, ImportStatus},
};

/// New import as handed over by the spreadsheet conversion step.
#[derive(Debug, Default)]
pub struct NewImport {
    pub name: Option<String>,
    pub program: Option<Value>,
    pub spreadsheet_id: Option<String>,
    pub sheets_url: Option<String>,
}

#[derive(Debug)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub status: ClientStatus,
    pub linked: bool,
}

/// SQLite-backed store for raw imports and the trainer's clients.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /* ───────────────────────────── imports ───────────────────────────── */

    pub async fn add_import(&self, user_id: &str, import: NewImport) -> Result<ImportDocument> {
        let now = Utc::now();
        let doc = ImportDocument {
            id: Uuid::new_v4().to_string(),
            name: import.name,
            program: import.program,
            status: ImportStatus::Pending,
            created_at: now,
            updated_at: now,
            user_id: user_id.to_string(),
            spreadsheet_id: import.spreadsheet_id,
            sheets_url: import.sheets_url,
        };

        let program_json = doc
            .program
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"INSERT INTO program_imports
                 (id,user_id,name,program,status,spreadsheet_id,sheets_url,created_at,updated_at)
               VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)"#,
        )
        .bind(&doc.id)
        .bind(&doc.user_id)
        .bind(doc.name.as_deref())
        .bind(program_json)
        .bind(doc.status.to_string())
        .bind(doc.spreadsheet_id.as_deref())
        .bind(doc.sheets_url.as_deref())
        .bind(doc.created_at.to_rfc3339())
        .bind(doc.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("inserting program import")?;

        debug!(id = %doc.id, "stored program import");
        Ok(doc)
    }

    /// Imports of `user_id`, newest first.
    pub async fn list_imports(&self, user_id: &str) -> Result<Vec<ImportDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT *
            FROM   program_imports
            WHERE  user_id = ?
            ORDER  BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(import_from_row).collect()
    }

    pub async fn get_import(&self, id: &str) -> Result<Option<ImportDocument>> {
        let row = sqlx::query("SELECT * FROM program_imports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(import_from_row).transpose()
    }

    /// Resolves a 1-based index (as shown by `import list`) or an id.
    pub async fn resolve_import(&self, user_id: &str, needle: &str) -> Result<Option<ImportDocument>> {
        if let Ok(idx) = needle.parse::<usize>() {
            let imports = self.list_imports(user_id).await?;
            if let Some(doc) = idx.checked_sub(1).and_then(|i| imports.into_iter().nth(i)) {
                return Ok(Some(doc));
            }
        }

        Ok(self
            .get_import(needle)
            .await?
            .filter(|doc| doc.user_id == user_id))
    }

    pub async fn set_import_status(&self, id: &str, status: ImportStatus) -> Result<()> {
        sqlx::query("UPDATE program_imports SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status.to_string())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_import(&self, id: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM program_imports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    /* ───────────────────────────── clients ───────────────────────────── */

    pub async fn add_client(&self, trainer_id: &str, client: NewClient) -> Result<Client> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"INSERT INTO clients (id,trainer_id,name,email,status,linked,created_at)
               VALUES (?1,?2,?3,?4,?5,?6,?7)"#,
        )
        .bind(&id)
        .bind(trainer_id)
        .bind(&client.name)
        .bind(client.email.as_deref())
        .bind(client.status.to_string())
        .bind(client.linked)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Client {
            id,
            name: client.name,
            email: client.email,
            status: client.status,
            linked: client.linked,
        })
    }

    /// Every client of the trainer, whatever their status.
    pub async fn list_clients(&self, trainer_id: &str) -> Result<Vec<Client>> {
        let rows = sqlx::query("SELECT * FROM clients WHERE trainer_id = ? ORDER BY name")
            .bind(trainer_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(client_from_row).collect()
    }

    /// Active, linked clients only.
    pub async fn active_clients(&self, trainer_id: &str) -> Result<Vec<Client>> {
        let rows = sqlx::query(
            r#"
            SELECT *
            FROM   clients
            WHERE  trainer_id = ? AND status = 'active' AND linked = 1
            ORDER  BY name
            "#,
        )
        .bind(trainer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(client_from_row).collect()
    }
}

#[async_trait]
impl ImportSource for Store {
    async fn fetch_import(&self, id: &str) -> Result<Option<ImportDocument>> {
        self.get_import(id).await
    }
}

#[async_trait]
impl ClientSource for Store {
    async fn fetch_clients(&self, trainer_id: &str) -> Result<Vec<Client>> {
        self.active_clients(trainer_id).await
    }
}

fn import_from_row(row: &SqliteRow) -> Result<ImportDocument> {
    let id: String = row.get("id");
    let program: Option<String> = row.get("program");
    let program = program
        .map(|p| serde_json::from_str::<Value>(&p))
        .transpose()
        .with_context(|| format!("import `{id}` holds invalid program JSON"))?;
    let status: String = row.get("status");

    Ok(ImportDocument {
        name: row.get("name"),
        program,
        status: status.parse()?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
        user_id: row.get("user_id"),
        spreadsheet_id: row.get("spreadsheet_id"),
        sheets_url: row.get("sheets_url"),
        id,
    })
}

fn client_from_row(row: &SqliteRow) -> Result<Client> {
    let status: String = row.get("status");

    Ok(Client {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        status: status.parse()?,
        linked: row.get("linked"),
    })
}

fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.get(column);
    Ok(DateTime::parse_from_rfc3339(&raw)
        .with_context(|| format!("bad timestamp in `{column}`: {raw}"))?
        .with_timezone(&Utc))
}
