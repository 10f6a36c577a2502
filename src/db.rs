use std::{fs, path::Path};

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::models::{EventOverview, Message, NewMessage};

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(dir = %parent.display(), error = %err, "unable to create store directory");
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS messages(
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                user_email TEXT NOT NULL,
                user_name TEXT,
                user_image TEXT,
                content TEXT NOT NULL,
                event_data TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS messages_created_at ON messages(created_at);",
        )?;
        Ok(())
    }

    pub fn insert_message(&self, message: &NewMessage) -> rusqlite::Result<Message> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut hasher = Sha256::new();
        hasher.update(message.user_id.as_bytes());
        hasher.update(b"|");
        hasher.update(created_at.as_bytes());
        hasher.update(b"|");
        hasher.update(message.content.as_bytes());
        let id = format!("{:x}", hasher.finalize());

        self.conn.execute(
            "INSERT INTO messages (id, user_id, user_email, user_name, user_image, content, event_data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)",
            params![
                id,
                message.user_id,
                message.user_email,
                message.user_name,
                message.user_image,
                message.content,
                created_at
            ],
        )?;

        Ok(Message {
            id,
            user_id: message.user_id.clone(),
            user_email: message.user_email.clone(),
            user_name: message.user_name.clone(),
            user_image: message.user_image.clone(),
            content: message.content.clone(),
            event_data: None,
            created_at,
        })
    }

    /// The newest `limit` messages, oldest first.
    pub fn list_messages(&self, limit: usize) -> rusqlite::Result<Vec<Message>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, user_email, user_name, user_image, content, event_data, created_at
             FROM (SELECT rowid AS seq, * FROM messages ORDER BY created_at DESC, rowid DESC LIMIT ?1)
             ORDER BY created_at ASC, seq ASC",
        )?;
        let rows = stmt.query_map(params![limit], message_from_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn get_message(&self, id: &str) -> rusqlite::Result<Option<Message>> {
        self.conn
            .query_row(
                "SELECT id, user_id, user_email, user_name, user_image, content, event_data, created_at
                 FROM messages WHERE id = ?1",
                params![id],
                message_from_row,
            )
            .optional()
    }

    /// Returns `None` when no message has that id.
    pub fn update_event_data(
        &self,
        id: &str,
        event: &EventOverview,
    ) -> rusqlite::Result<Option<Message>> {
        let payload = serde_json::to_string(event)
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
        let updated = self.conn.execute(
            "UPDATE messages SET event_data = ?2 WHERE id = ?1",
            params![id, payload],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_message(id)
    }
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let event_data: Option<String> = row.get(6)?;
    let event_data = event_data
        .map(|payload| {
            serde_json::from_str::<EventOverview>(&payload).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(err),
                )
            })
        })
        .transpose()?;

    Ok(Message {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_email: row.get(2)?,
        user_name: row.get(3)?,
        user_image: row.get(4)?,
        content: row.get(5)?,
        event_data,
        created_at: row.get(7)?,
    })
}
