// Account store.
//
// Accounts live in SQLite as one JSON document per row, mirroring the
// upstream document store: `id` is the 24-hex external key, `doc` is the
// serialized account body with its optional embedded `transactions` array.
// All reads go through a typed serde projection at this boundary; a stored
// document that does not match the expected shape is an error here, not an
// undefined value propagated into the pipeline.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

use crate::normalize::DateValue;

/// An embedded transaction as stored. Date representation is heterogeneous
/// until normalization (see `normalize`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub date: DateValue,
}

/// A stored account record. `transactions` is optional: accounts created
/// before their first transaction carry no array at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub transactions: Option<Vec<Transaction>>,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            doc TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

pub fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    // External keys are hex and compare case-insensitively; the stored key
    // column is canonical lowercase so lookups are a plain equality.
    let id = account.id.to_ascii_lowercase();
    let doc = serde_json::to_string(account).context("Failed to serialize account")?;

    conn.execute(
        "INSERT OR REPLACE INTO accounts (id, doc) VALUES (?1, ?2)",
        params![id, doc],
    )?;

    Ok(())
}

/// Fetch one account by external key. `Ok(None)` means no such account.
/// Keys match case-insensitively; the column holds lowercase.
pub fn get_account(conn: &Connection, id: &str) -> Result<Option<Account>> {
    let id = id.to_ascii_lowercase();
    let doc: Option<String> = conn
        .query_row("SELECT doc FROM accounts WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;

    match doc {
        Some(json) => {
            let account = serde_json::from_str(&json)
                .with_context(|| format!("Malformed account document for id {}", id))?;
            Ok(Some(account))
        }
        None => Ok(None),
    }
}

/// Fetch every account, in stable key order.
pub fn get_all_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare("SELECT id, doc FROM accounts ORDER BY id")?;

    let docs = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let doc: String = row.get(1)?;
            Ok((id, doc))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut accounts = Vec::with_capacity(docs.len());
    for (id, json) in docs {
        let account: Account = serde_json::from_str(&json)
            .with_context(|| format!("Malformed account document for id {}", id))?;
        accounts.push(account);
    }

    Ok(accounts)
}

// ============================================================================
// Store lifecycle
// ============================================================================

/// Connection lifecycle. Requests may arrive before the background connect
/// finishes; they must observe NotReady, never a crash.
#[derive(Debug)]
pub enum StoreState {
    Uninitialized,
    Connecting,
    Ready(Connection),
    Failed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store not ready")]
    NotReady,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Process-wide handle to the account store. Queries only proceed once the
/// state is Ready; every other state maps to `StoreError::NotReady`.
pub struct Store {
    state: Mutex<StoreState>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            state: Mutex::new(StoreState::Uninitialized),
        }
    }

    /// Open the database file and move Uninitialized -> Connecting -> Ready.
    /// On failure the state lands in Failed and the error is returned so the
    /// caller can decide whether it is fatal.
    pub fn connect(&self, path: &Path) -> Result<()> {
        *self.state.lock().unwrap() = StoreState::Connecting;

        let result = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))
            .and_then(|conn| {
                setup_database(&conn)?;
                Ok(conn)
            });

        match result {
            Ok(conn) => {
                *self.state.lock().unwrap() = StoreState::Ready(conn);
                Ok(())
            }
            Err(e) => {
                *self.state.lock().unwrap() = StoreState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// In-memory store, ready immediately. Used by tests and fixtures.
    pub fn connect_in_memory(&self) -> Result<()> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        setup_database(&conn)?;
        *self.state.lock().unwrap() = StoreState::Ready(conn);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock().unwrap(), StoreState::Ready(_))
    }

    /// Run a read against the connection, if ready.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T, StoreError> {
        let state = self.state.lock().unwrap();
        match &*state {
            StoreState::Ready(conn) => f(conn).map_err(StoreError::Backend),
            _ => Err(StoreError::NotReady),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}
