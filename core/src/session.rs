//! Chat session log, kept in its own database file next to the cookbook.

use std::path::Path;

use chrono::Local;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, params};
use tracing::{debug, error};

use crate::config::DatabaseConfig;
use crate::error::{Result, StorageContext, YummyError};
use crate::models::{Base, MessageRole, NewSessionMessage, Session, SessionMessage, SessionStats};

impl ToSql for MessageRole {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MessageRole {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: YummyError| FromSqlError::Other(Box::new(e)))
    }
}

pub struct SessionLog {
    conn: Connection,
}

impl SessionLog {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_storage(|| format!("Failed to open session log: {}", path.display()))?;
        let log = SessionLog { conn };
        log.migrate()?;
        debug!(path = %path.display(), "opened session log");
        Ok(log)
    }

    /// Open `config.session_log_db_name` inside `data_dir`.
    pub fn open_in(data_dir: &Path, config: &DatabaseConfig) -> Result<Self> {
        Self::open(&data_dir.join(&config.session_log_db_name))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().storage("Failed to open in-memory session log")?;
        let log = SessionLog { conn };
        log.migrate()?;
        Ok(log)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .storage("Failed to enable foreign keys")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .storage("Failed to read session log version")?;

        if version < 1 {
            self.conn
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS sessions (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        deleted_at TEXT
                    );

                    CREATE TABLE IF NOT EXISTS session_messages (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        session_id INTEGER NOT NULL REFERENCES sessions(id),
                        message TEXT NOT NULL DEFAULT '',
                        role TEXT NOT NULL,
                        model_name TEXT NOT NULL DEFAULT '',
                        content TEXT NOT NULL DEFAULT '',
                        input_tokens INTEGER NOT NULL DEFAULT 0,
                        output_tokens INTEGER NOT NULL DEFAULT 0,
                        total_tokens INTEGER NOT NULL DEFAULT 0,
                        created_at TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        deleted_at TEXT
                    );

                    CREATE INDEX IF NOT EXISTS idx_session_messages_session
                        ON session_messages(session_id);

                    PRAGMA user_version = 1;",
                )
                .storage("Failed to migrate session log")?;
        }
        Ok(())
    }

    fn session_from_row(row: &rusqlite::Row) -> rusqlite::Result<Session> {
        Ok(Session {
            base: Base {
                id: row.get(0)?,
                created_at: row.get(1)?,
                updated_at: row.get(2)?,
                deleted_at: row.get(3)?,
            },
        })
    }

    // Expects columns:
    // 0: id, 1: session_id, 2: message, 3: role, 4: model_name, 5: content,
    // 6: input_tokens, 7: output_tokens, 8: total_tokens,
    // 9: created_at, 10: updated_at, 11: deleted_at
    fn message_from_row(row: &rusqlite::Row) -> rusqlite::Result<SessionMessage> {
        Ok(SessionMessage {
            base: Base {
                id: row.get(0)?,
                created_at: row.get(9)?,
                updated_at: row.get(10)?,
                deleted_at: row.get(11)?,
            },
            session_id: row.get(1)?,
            message: row.get(2)?,
            role: row.get(3)?,
            model_name: row.get(4)?,
            content: row.get(5)?,
            input_tokens: row.get(6)?,
            output_tokens: row.get(7)?,
            total_tokens: row.get(8)?,
        })
    }

    fn session_exists(&self, id: i64) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE id = ?1 AND deleted_at IS NULL",
                params![id],
                |row| row.get(0),
            )
            .storage("Failed to look up session")?;
        Ok(count > 0)
    }

    pub fn create_session(&self) -> Result<i64> {
        let now = Local::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO sessions (created_at, updated_at) VALUES (?1, ?1)",
                params![now],
            )
            .storage("Failed to create session")?;
        let id = self.conn.last_insert_rowid();
        debug!(id, "created chat session");
        Ok(id)
    }

    /// Append a message and bump the session's `updated_at`.
    pub fn save_message(&self, session_id: i64, msg: &NewSessionMessage) -> Result<i64> {
        if !self.session_exists(session_id)? {
            return Err(YummyError::NotFound {
                entity: "session",
                id: session_id,
            });
        }
        let now = Local::now().to_rfc3339();
        let tx = self
            .conn
            .unchecked_transaction()
            .storage("Failed to begin transaction")?;

        let write = || -> Result<i64> {
            tx.execute(
                "INSERT INTO session_messages (session_id, message, role, model_name, content,
                    input_tokens, output_tokens, total_tokens, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    session_id,
                    msg.message,
                    msg.role,
                    msg.model_name,
                    msg.content,
                    msg.input_tokens,
                    msg.output_tokens,
                    msg.total_tokens,
                    now,
                ],
            )
            .storage("Failed to save session message")?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
                params![now, session_id],
            )
            .storage("Failed to touch session")?;
            Ok(id)
        };
        let id = write().inspect_err(|e| {
            error!(session_id, error = %e, "saving session message failed, rolling back");
        })?;

        tx.commit().storage("Failed to commit session message")?;
        Ok(id)
    }

    /// Messages of one session in the order they were written.
    pub fn session_messages(&self, session_id: i64) -> Result<Vec<SessionMessage>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, session_id, message, role, model_name, content, input_tokens,
                        output_tokens, total_tokens, created_at, updated_at, deleted_at
                 FROM session_messages
                 WHERE session_id = ?1 AND deleted_at IS NULL
                 ORDER BY created_at, id",
            )
            .storage("Failed to prepare message query")?;
        stmt.query_map(params![session_id], Self::message_from_row)
            .and_then(Iterator::collect)
            .with_storage(|| format!("Failed to load messages for session {session_id}"))
    }

    pub fn session_stats(&self, session_id: i64) -> Result<SessionStats> {
        self.conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(input_tokens), 0), COALESCE(SUM(output_tokens), 0)
                 FROM session_messages WHERE session_id = ?1 AND deleted_at IS NULL",
                params![session_id],
                |row| {
                    Ok(SessionStats {
                        session_id,
                        message_count: row.get(0)?,
                        total_input_tokens: row.get(1)?,
                        total_output_tokens: row.get(2)?,
                    })
                },
            )
            .storage("Failed to compute session stats")
    }

    /// All sessions, most recently active first.
    pub fn all_sessions(&self) -> Result<Vec<Session>> {
        self.sessions_where("")
    }

    /// Sessions with at least one message, most recently active first.
    pub fn non_empty_sessions(&self) -> Result<Vec<Session>> {
        self.sessions_where(
            "AND EXISTS (SELECT 1 FROM session_messages m
                         WHERE m.session_id = s.id AND m.deleted_at IS NULL)",
        )
    }

    fn sessions_where(&self, filter: &str) -> Result<Vec<Session>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT s.id, s.created_at, s.updated_at, s.deleted_at FROM sessions s
                 WHERE s.deleted_at IS NULL {filter}
                 ORDER BY s.updated_at DESC, s.id DESC"
            ))
            .storage("Failed to prepare session query")?;
        stmt.query_map([], Self::session_from_row)
            .and_then(Iterator::collect)
            .storage("Failed to list sessions")
    }

    /// Remove a session and its messages.
    pub fn delete_session(&self, session_id: i64) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .storage("Failed to begin transaction")?;
        tx.execute(
            "DELETE FROM session_messages WHERE session_id = ?1",
            params![session_id],
        )
        .storage("Failed to delete session messages")?;
        let rows = tx
            .execute("DELETE FROM sessions WHERE id = ?1", params![session_id])
            .storage("Failed to delete session")?;
        if rows == 0 {
            return Err(YummyError::NotFound {
                entity: "session",
                id: session_id,
            });
        }
        tx.commit().storage("Failed to commit session deletion")?;
        debug!(session_id, "deleted chat session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: MessageRole, text: &str, input: i64, output: i64) -> NewSessionMessage {
        NewSessionMessage {
            message: text.to_string(),
            role,
            model_name: "llama3.1:8b".to_string(),
            content: text.to_string(),
            input_tokens: input,
            output_tokens: output,
            total_tokens: input + output,
        }
    }

    #[test]
    fn test_create_and_save_messages() {
        let log = SessionLog::open_in_memory().unwrap();
        let id = log.create_session().unwrap();
        log.save_message(id, &message(MessageRole::Human, "What's for dinner?", 12, 0))
            .unwrap();
        log.save_message(id, &message(MessageRole::Ai, "Try the Kale Salad.", 0, 30))
            .unwrap();

        let messages = log.session_messages(id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::Human);
        assert_eq!(messages[1].role, MessageRole::Ai);
        assert_eq!(messages[1].content, "Try the Kale Salad.");
    }

    #[test]
    fn test_session_stats() {
        let log = SessionLog::open_in_memory().unwrap();
        let id = log.create_session().unwrap();
        let empty = log.session_stats(id).unwrap();
        assert_eq!(empty.message_count, 0);
        assert_eq!(empty.total_input_tokens, 0);

        log.save_message(id, &message(MessageRole::Human, "hi", 10, 0))
            .unwrap();
        log.save_message(id, &message(MessageRole::Ai, "hello", 5, 20))
            .unwrap();
        let stats = log.session_stats(id).unwrap();
        assert_eq!(
            stats,
            SessionStats {
                session_id: id,
                message_count: 2,
                total_input_tokens: 15,
                total_output_tokens: 20,
            }
        );
    }

    #[test]
    fn test_save_to_unknown_session_is_not_found() {
        let log = SessionLog::open_in_memory().unwrap();
        let err = log
            .save_message(9, &message(MessageRole::System, "x", 0, 0))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sessions_listing() {
        let log = SessionLog::open_in_memory().unwrap();
        let quiet = log.create_session().unwrap();
        let chatty = log.create_session().unwrap();
        log.save_message(chatty, &message(MessageRole::Human, "hey", 1, 0))
            .unwrap();

        let all: Vec<i64> = log.all_sessions().unwrap().iter().map(|s| s.base.id).collect();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], chatty);
        assert!(all.contains(&quiet));

        let non_empty = log.non_empty_sessions().unwrap();
        assert_eq!(non_empty.len(), 1);
        assert_eq!(non_empty[0].base.id, chatty);
    }

    #[test]
    fn test_delete_session() {
        let log = SessionLog::open_in_memory().unwrap();
        let id = log.create_session().unwrap();
        log.save_message(id, &message(MessageRole::Tool, "lookup", 0, 0))
            .unwrap();

        log.delete_session(id).unwrap();
        assert!(log.all_sessions().unwrap().is_empty());
        assert!(log.session_messages(id).unwrap().is_empty());
        assert!(log.delete_session(id).unwrap_err().is_not_found());
    }
}
