//! Local state that outlives a session: the signed-in credentials and
//! per-user UI preferences such as the contact table layout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

const APP_NAME: &str = "contactdesk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

pub struct Store {
    conn: Connection,
}

pub fn data_dir() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine data directories")?;
    Ok(base.data_dir().join(APP_NAME))
}

pub fn default_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("state.db"))
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open state database {}", path.display()))?;
        let mut store = Self { conn };
        store.setup()?;
        Ok(store)
    }

    fn setup(&mut self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session (
              id      INTEGER PRIMARY KEY CHECK (id = 1),
              token   TEXT NOT NULL,
              user_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS preferences (
              user_id TEXT NOT NULL,
              key     TEXT NOT NULL,
              value   TEXT NOT NULL,
              PRIMARY KEY (user_id, key)
            );
        "#,
        )?;
        Ok(())
    }

    pub fn session(&self) -> Result<Option<Session>> {
        let session = self
            .conn
            .query_row("SELECT token, user_id FROM session WHERE id = 1", [], |row| {
                Ok(Session {
                    token: row.get(0)?,
                    user_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(session)
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.conn.execute(
            "INSERT INTO session (id, token, user_id) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET token = excluded.token, user_id = excluded.user_id",
            params![session.token, session.user_id],
        )?;
        Ok(())
    }

    pub fn clear_session(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session", [])?;
        Ok(())
    }

    /// Read a JSON preference. A value that no longer parses is treated as
    /// absent so a format change never locks the user out.
    pub fn preference<T: DeserializeOwned>(&self, user_id: &str, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(user_id, key, error = %err, "discarding unreadable preference");
                Ok(None)
            }
        }
    }

    pub fn set_preference<T: Serialize>(&self, user_id: &str, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO preferences (user_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value",
            params![user_id, key, raw],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_session_roundtrip_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("nested/state.db")).unwrap();
        assert_eq!(store.session().unwrap(), None);

        let session = Session {
            token: "abc".into(),
            user_id: "u1".into(),
        };
        store.save_session(&session).unwrap();
        store
            .save_session(&Session {
                token: "def".into(),
                user_id: "u1".into(),
            })
            .unwrap();
        assert_eq!(store.session().unwrap().unwrap().token, "def");

        store.clear_session().unwrap();
        assert_eq!(store.session().unwrap(), None);
    }

    #[test]
    fn test_preferences_are_per_user() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");
        {
            let store = Store::open(&path).unwrap();
            let mut widths = BTreeMap::new();
            widths.insert("email".to_string(), 30u16);
            store.set_preference("u1", "widths", &widths).unwrap();
        }
        let store = Store::open(&path).unwrap();
        let loaded: Option<BTreeMap<String, u16>> = store.preference("u1", "widths").unwrap();
        assert_eq!(loaded.unwrap().get("email"), Some(&30));
        let other: Option<BTreeMap<String, u16>> = store.preference("u2", "widths").unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_unreadable_preference_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("state.db")).unwrap();
        store.set_preference("u1", "widths", &"not a map").unwrap();
        let loaded: Option<BTreeMap<String, u16>> = store.preference("u1", "widths").unwrap();
        assert!(loaded.is_none());
    }
}
