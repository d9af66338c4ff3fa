use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_database, Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use super::store::{DocKey, DocumentStore, DocumentStoreError, MAX_COMMIT_ATTEMPTS};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// V 0
const DOCUMENT_TABLE_V_0: Table = Table {
    name: "document",
    columns: &[
        sqlite_column!("user_handle", &SqlType::Text, non_null = true),
        sqlite_column!("doc_id", &SqlType::Text, non_null = true),
        sqlite_column!("body", &SqlType::Text, non_null = true),
        sqlite_column!("version", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_handle", "doc_id"]],
    indices: &[("idx_document_user_handle", "user_handle")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[DOCUMENT_TABLE_V_0],
    migration: None,
}];

/// SQLite-backed [`DocumentStore`]. Documents are stored as JSON text with a
/// monotonically increasing per-document version; commits are guarded by a
/// version check so a lost race re-runs the update against fresh state.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_database(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteDocumentStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn read_row(&self, key: &DocKey) -> Result<Option<(String, i64)>, DocumentStoreError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT body, version FROM {} WHERE user_handle = ?1 AND doc_id = ?2",
                DOCUMENT_TABLE_V_0.name
            ),
            params![key.user, key.doc],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .with_context(|| format!("Failed to read document {}", key))
        .map_err(DocumentStoreError::Backend)
    }

    fn parse(key: &DocKey, body: &str) -> Result<Value, DocumentStoreError> {
        serde_json::from_str(body).map_err(|source| DocumentStoreError::Corrupt {
            key: key.to_string(),
            source,
        })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn read(&self, key: &DocKey) -> Result<Option<Value>, DocumentStoreError> {
        match self.read_row(key)? {
            Some((body, _)) => Ok(Some(Self::parse(key, &body)?)),
            None => Ok(None),
        }
    }

    fn atomic_update(
        &self,
        key: &DocKey,
        apply: &dyn Fn(Option<Value>) -> anyhow::Result<Value>,
    ) -> Result<Value, DocumentStoreError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let row = self.read_row(key)?;
            let (snapshot, read_version) = match row {
                Some((body, version)) => (Some(Self::parse(key, &body)?), Some(version)),
                None => (None, None),
            };

            let next = apply(snapshot).map_err(DocumentStoreError::Apply)?;
            let body = serde_json::to_string(&next)
                .context("Failed to serialize document")
                .map_err(DocumentStoreError::Backend)?;

            let conn = self.conn.lock().unwrap();
            let committed = match read_version {
                Some(version) => conn
                    .execute(
                        &format!(
                            "UPDATE {} SET body = ?1, version = ?2, \
                             updated = (cast(strftime('%s','now') as int)) \
                             WHERE user_handle = ?3 AND doc_id = ?4 AND version = ?5",
                            DOCUMENT_TABLE_V_0.name
                        ),
                        params![body, version + 1, key.user, key.doc, version],
                    )
                    .with_context(|| format!("Failed to update document {}", key))
                    .map_err(DocumentStoreError::Backend)?,
                None => conn
                    .execute(
                        &format!(
                            "INSERT OR IGNORE INTO {} (user_handle, doc_id, body, version) \
                             VALUES (?1, ?2, ?3, 1)",
                            DOCUMENT_TABLE_V_0.name
                        ),
                        params![key.user, key.doc, body],
                    )
                    .with_context(|| format!("Failed to insert document {}", key))
                    .map_err(DocumentStoreError::Backend)?,
            };

            if committed == 1 {
                return Ok(next);
            }
            // The snapshot went stale before the commit landed, retry
        }

        Err(DocumentStoreError::ConflictExhausted {
            key: key.to_string(),
            attempts: MAX_COMMIT_ATTEMPTS,
        })
    }
}
