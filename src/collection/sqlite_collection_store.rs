use super::collection_store::CollectionStore;
use super::models::{MediaType, TrackedItem};
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_database, Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// V 0
const COLLECTION_ITEM_TABLE_V_0: Table = Table {
    name: "collection_item",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("user_handle", &SqlType::Text, non_null = true),
        sqlite_column!("media_id", &SqlType::Integer, non_null = true),
        sqlite_column!("media_type", &SqlType::Text, non_null = true),
        sqlite_column!("user_rating", &SqlType::Integer),
        sqlite_column!("start_date", &SqlType::Text),
        sqlite_column!("completion_date", &SqlType::Text),
        sqlite_column!("note", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_handle", "media_id"]],
    indices: &[("idx_collection_item_user_handle", "user_handle")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[COLLECTION_ITEM_TABLE_V_0],
    migration: None,
}];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct SqliteCollectionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCollectionStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_database(db_path, VERSIONED_SCHEMAS)?;
        Ok(SqliteCollectionStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn date_to_column(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn date_from_column(value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .with_context(|| format!("Invalid stored date {}", s))
        })
        .transpose()
}

fn item_from_row(row: &Row) -> rusqlite::Result<(TrackedItem, Option<String>, Option<String>)> {
    let media_type_str: String = row.get(1)?;
    let media_type = MediaType::from_str(&media_type_str).map_err(|_| {
        rusqlite::Error::InvalidColumnType(1, "media_type".to_string(), rusqlite::types::Type::Text)
    })?;
    let item = TrackedItem {
        media_id: row.get(0)?,
        media_type,
        user_rating: row.get::<usize, Option<i64>>(2)?.map(|r| r as u8),
        start_date: None,
        completion_date: None,
        note: row.get(5)?,
    };
    Ok((item, row.get(3)?, row.get(4)?))
}

const ITEM_COLUMNS: &str = "media_id, media_type, user_rating, start_date, completion_date, note";

impl CollectionStore for SqliteCollectionStore {
    fn upsert_item(&self, user: &str, item: &TrackedItem) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (user_handle, media_id, media_type, user_rating, start_date, completion_date, note) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT (user_handle, media_id) DO UPDATE SET \
                 media_type = excluded.media_type, user_rating = excluded.user_rating, \
                 start_date = excluded.start_date, completion_date = excluded.completion_date, \
                 note = excluded.note",
                COLLECTION_ITEM_TABLE_V_0.name
            ),
            params![
                user,
                item.media_id,
                item.media_type.as_str(),
                item.user_rating.map(|r| r as i64),
                date_to_column(item.start_date),
                date_to_column(item.completion_date),
                item.note,
            ],
        )
        .with_context(|| format!("Failed to upsert item {} for {}", item.media_id, user))?;
        Ok(())
    }

    fn get_item(&self, user: &str, media_id: i64) -> Result<Option<TrackedItem>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM {} WHERE user_handle = ?1 AND media_id = ?2",
                    ITEM_COLUMNS, COLLECTION_ITEM_TABLE_V_0.name
                ),
                params![user, media_id],
                item_from_row,
            )
            .optional()?;

        match row {
            Some((mut item, start, completion)) => {
                item.start_date = date_from_column(start)?;
                item.completion_date = date_from_column(completion)?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    fn get_user_items(&self, user: &str) -> Result<Vec<TrackedItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE user_handle = ?1 ORDER BY created, id",
            ITEM_COLUMNS, COLLECTION_ITEM_TABLE_V_0.name
        ))?;
        let rows = stmt
            .query_map(params![user], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(rows.len());
        for (mut item, start, completion) in rows {
            item.start_date = date_from_column(start)?;
            item.completion_date = date_from_column(completion)?;
            items.push(item);
        }
        Ok(items)
    }

    fn set_rating(&self, user: &str, media_id: i64, rating: u8) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET user_rating = ?1 WHERE user_handle = ?2 AND media_id = ?3",
                COLLECTION_ITEM_TABLE_V_0.name
            ),
            params![rating as i64, user, media_id],
        )?;
        if updated == 0 {
            bail!("Item {} not found for user {}", media_id, user);
        }
        Ok(())
    }

    fn set_dates(
        &self,
        user: &str,
        media_id: i64,
        start_date: Option<NaiveDate>,
        completion_date: Option<NaiveDate>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        if let Some(date) = start_date {
            let updated = conn.execute(
                &format!(
                    "UPDATE {} SET start_date = ?1 WHERE user_handle = ?2 AND media_id = ?3",
                    COLLECTION_ITEM_TABLE_V_0.name
                ),
                params![date_to_column(Some(date)), user, media_id],
            )?;
            if updated == 0 {
                bail!("Item {} not found for user {}", media_id, user);
            }
        }
        if let Some(date) = completion_date {
            let updated = conn.execute(
                &format!(
                    "UPDATE {} SET completion_date = ?1 WHERE user_handle = ?2 AND media_id = ?3",
                    COLLECTION_ITEM_TABLE_V_0.name
                ),
                params![date_to_column(Some(date)), user, media_id],
            )?;
            if updated == 0 {
                bail!("Item {} not found for user {}", media_id, user);
            }
        }
        Ok(())
    }

    fn set_note(&self, user: &str, media_id: i64, note: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET note = ?1 WHERE user_handle = ?2 AND media_id = ?3",
                COLLECTION_ITEM_TABLE_V_0.name
            ),
            params![note, user, media_id],
        )?;
        if updated == 0 {
            bail!("Item {} not found for user {}", media_id, user);
        }
        Ok(())
    }

    fn delete_item(&self, user: &str, media_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            &format!(
                "DELETE FROM {} WHERE user_handle = ?1 AND media_id = ?2",
                COLLECTION_ITEM_TABLE_V_0.name
            ),
            params![user, media_id],
        )?;
        Ok(deleted > 0)
    }
}
