// Copyright (c) 2026 Michael Campbell. All rights reserved.
// messaging-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Message Store
// Description: Durable Store backed by SQLite WAL, one connection per
//              process guarded by a mutex.
// Purpose: Implement messaging_core::Store with transactional semantics.
// Dependencies: messaging-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every row is kept as an indexed column set plus a canonical JSON
//! snapshot of the full entity, the same shape the teacher's durable store
//! uses for its run-state rows. Multi-statement writes run inside a
//! `BEGIN IMMEDIATE` transaction so a writer never loses a race to another
//! writer on the same connection; `SQLite`'s serializable isolation exceeds
//! the read-committed floor the contract requires.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use messaging_core::AttributeBag;
use messaging_core::AuditRecord;
use messaging_core::AuditSubject;
use messaging_core::Campaign;
use messaging_core::CampaignId;
use messaging_core::ConsentState;
use messaging_core::Cursor;
use messaging_core::DeliveryReceipt;
use messaging_core::E164;
use messaging_core::InboundEvent;
use messaging_core::Message;
use messaging_core::MessageId;
use messaging_core::MessageStatus;
use messaging_core::MessageTransitionFields;
use messaging_core::RecipientPage;
use messaging_core::Recipient;
use messaging_core::RuleNode;
use messaging_core::Segment;
use messaging_core::SegmentId;
use messaging_core::Store;
use messaging_core::StoreError;
use messaging_core::Template;
use messaging_core::TemplateId;
use messaging_core::Timestamp;
use messaging_core::merge_attributes;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite`-backed store.
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds before a lock wait gives up.
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    /// Creates a config pointing at `path` with the default busy timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), busy_timeout_ms: 5_000 }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that can occur opening or initializing the `SQLite` store.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// The underlying `SQLite` connection failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The database file's parent directory could not be created.
    #[error("failed to create database directory: {0}")]
    Directory(String),
}

// ============================================================================
// SECTION: Row (De)serialization Helpers
// ============================================================================

/// Serializes `value` to a JSON string, mapping a failure onto [`StoreError::Io`].
fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|err| StoreError::Io(err.to_string()))
}

/// Deserializes a JSON string column, mapping a failure onto [`StoreError::Io`].
fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::Io(err.to_string()))
}

/// Returns the `SCREAMING_SNAKE_CASE` wire form used for the indexed
/// `status` column, matching `MessageStatus`'s serde representation.
const fn message_status_wire(status: MessageStatus) -> &'static str {
    match status {
        MessageStatus::Queued => "QUEUED",
        MessageStatus::Sending => "SENDING",
        MessageStatus::Sent => "SENT",
        MessageStatus::Delivered => "DELIVERED",
        MessageStatus::Read => "READ",
        MessageStatus::Failed => "FAILED",
        MessageStatus::Undelivered => "UNDELIVERED",
    }
}

/// The on-disk shape of one recipient row, separate from [`Recipient`]
/// because the E.164 key lives in the primary key column, not the blob.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct RecipientSnapshot {
    /// Open attribute bag.
    attributes: AttributeBag,
    /// Current consent state.
    consent_state: ConsentState,
    /// Creation timestamp.
    created_at: Timestamp,
    /// Last-update timestamp.
    updated_at: Timestamp,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed [`Store`] implementation.
#[derive(Clone)]
pub struct SqliteStore {
    /// Shared connection, guarded by a mutex; `SQLite` serializes writers
    /// internally, so one connection per process is sufficient.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if absent) a `SQLite`-backed store at the configured
    /// path, applying `WAL` journaling and running schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened,
    /// configured, or migrated.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(&config.path)?;
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let mut connection = Connection::open_with_flags(&config.path, flags)?;
        connection.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
        connection.pragma_update(None, "journal_mode", "WAL")?;
        connection.pragma_update(None, "synchronous", "NORMAL")?;
        connection.pragma_update(None, "foreign_keys", "ON")?;
        migrate(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Opens an in-memory `SQLite` database, for tests.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the in-memory database cannot be
    /// opened or migrated.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let mut connection = Connection::open_in_memory()?;
        migrate(&mut connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Locks the shared connection, recovering from poisoning.
    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Ensures the database file's parent directory exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|err| SqliteStoreError::Directory(err.to_string()))?;
        }
    }
    Ok(())
}

/// Applies the schema, idempotently.
fn migrate(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS recipients (
            e164 TEXT PRIMARY KEY,
            consent_state TEXT NOT NULL,
            data TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            campaign_id TEXT NOT NULL,
            status TEXT NOT NULL,
            provider_sid TEXT UNIQUE,
            data TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_campaign_status
            ON messages (campaign_id, status);
        CREATE TABLE IF NOT EXISTS inbound_events (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS receipts (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS audit (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            subject_key TEXT NOT NULL,
            data TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_audit_subject ON audit (subject_key);
        CREATE TABLE IF NOT EXISTS campaigns (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS templates (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS segments (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS id_sequence (
            prefix TEXT PRIMARY KEY,
            next_value INTEGER NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Allocates a fresh id with the given prefix, inside an already-open
/// transaction.
fn next_sequence_id(tx: &rusqlite::Transaction<'_>, prefix: &str) -> Result<String, StoreError> {
    tx.execute(
        "INSERT INTO id_sequence (prefix, next_value) VALUES (?1, 1)
         ON CONFLICT(prefix) DO UPDATE SET next_value = next_value + 1",
        params![prefix],
    )
    .map_err(|err| StoreError::Io(err.to_string()))?;
    let value: i64 = tx
        .query_row("SELECT next_value FROM id_sequence WHERE prefix = ?1", params![prefix], |row| row.get(0))
        .map_err(|err| StoreError::Io(err.to_string()))?;
    Ok(format!("{prefix}-{value}"))
}

impl Store for SqliteStore {
    fn get_recipient(&self, e164: &E164) -> Result<Option<Recipient>, StoreError> {
        let guard = self.lock();
        let row: Option<String> = guard
            .query_row("SELECT data FROM recipients WHERE e164 = ?1", params![e164.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|data| {
            let snapshot: RecipientSnapshot = from_json(&data)?;
            Ok(Recipient {
                e164: e164.clone(),
                attributes: snapshot.attributes,
                consent_state: snapshot.consent_state,
                created_at: snapshot.created_at,
                updated_at: snapshot.updated_at,
            })
        })
        .transpose()
    }

    fn upsert_recipient(&self, e164: &E164, attrs: AttributeBag, at: Timestamp) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let existing: Option<String> =
            tx.query_row("SELECT data FROM recipients WHERE e164 = ?1", params![e164.as_str()], |row| row.get(0))
                .optional()
                .map_err(|err| StoreError::Io(err.to_string()))?;
        let snapshot = match existing {
            Some(data) => {
                let mut snapshot: RecipientSnapshot = from_json(&data)?;
                merge_attributes(&mut snapshot.attributes, attrs);
                snapshot.updated_at = at;
                snapshot
            }
            None => RecipientSnapshot { attributes: attrs, consent_state: ConsentState::OptIn, created_at: at, updated_at: at },
        };
        let data = to_json(&snapshot)?;
        tx.execute(
            "INSERT INTO recipients (e164, consent_state, data) VALUES (?1, ?2, ?3)
             ON CONFLICT(e164) DO UPDATE SET consent_state = excluded.consent_state, data = excluded.data",
            params![e164.as_str(), snapshot.consent_state.to_string(), data],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    fn update_consent(
        &self,
        e164: &E164,
        new_state: ConsentState,
        _source: &str,
        at: Timestamp,
    ) -> Result<ConsentState, StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let data: String = tx
            .query_row("SELECT data FROM recipients WHERE e164 = ?1", params![e164.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?
            .ok_or_else(|| StoreError::NotFound(format!("recipient {e164}")))?;
        let mut snapshot: RecipientSnapshot = from_json(&data)?;
        let prior = snapshot.consent_state;
        snapshot.consent_state = new_state;
        snapshot.updated_at = at;
        let data = to_json(&snapshot)?;
        tx.execute(
            "UPDATE recipients SET consent_state = ?2, data = ?3 WHERE e164 = ?1",
            params![e164.as_str(), new_state.to_string(), data],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(prior)
    }

    fn insert_raw_inbound(&self, event: InboundEvent) -> Result<String, StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let id = next_sequence_id(&tx, "inbound")?;
        let mut event = event;
        event.id = id.clone();
        let data = to_json(&event)?;
        tx.execute("INSERT INTO inbound_events (id, data) VALUES (?1, ?2)", params![id, data])
            .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(id)
    }

    fn insert_raw_receipt(&self, receipt: DeliveryReceipt) -> Result<String, StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let id = next_sequence_id(&tx, "receipt")?;
        let mut receipt = receipt;
        receipt.id = id.clone();
        let data = to_json(&receipt)?;
        tx.execute("INSERT INTO receipts (id, data) VALUES (?1, ?2)", params![id, data])
            .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(id)
    }

    fn create_message(
        &self,
        campaign_id: &CampaignId,
        e164: &E164,
        rendered: &str,
        at: Timestamp,
    ) -> Result<MessageId, StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let id = MessageId::new(next_sequence_id(&tx, "msg")?);
        let message = Message {
            id: id.clone(),
            campaign_id: campaign_id.clone(),
            recipient: e164.clone(),
            rendered_content: rendered.to_string(),
            status: MessageStatus::Queued,
            provider_sid: None,
            error_code: None,
            retry_count: 0,
            created_at: at,
            sent_at: None,
            delivered_at: None,
        };
        let data = to_json(&message)?;
        tx.execute(
            "INSERT INTO messages (id, campaign_id, status, provider_sid, data) VALUES (?1, ?2, ?3, NULL, ?4)",
            params![id.as_str(), campaign_id.as_str(), message_status_wire(MessageStatus::Queued), data],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(id)
    }

    fn transition_message(
        &self,
        id: &MessageId,
        from: MessageStatus,
        to: MessageStatus,
        fields: MessageTransitionFields,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let data: String = tx
            .query_row("SELECT data FROM messages WHERE id = ?1", params![id.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?
            .ok_or_else(|| StoreError::NotFound(format!("message {id}")))?;
        let mut message: Message = from_json(&data)?;
        if message.status != from {
            return Err(StoreError::TransitionConflict(id.clone()));
        }
        message.status = to;
        if let Some(sid) = fields.provider_sid.clone() {
            message.provider_sid = Some(sid);
        }
        if let Some(code) = fields.error_code {
            message.error_code = Some(code);
        }
        if fields.increment_retry {
            message.retry_count += 1;
        }
        if to == MessageStatus::Sent {
            message.sent_at.get_or_insert(fields.at);
        }
        if to == MessageStatus::Delivered {
            message.delivered_at.get_or_insert(fields.at);
        }
        let data = to_json(&message)?;
        let result = tx.execute(
            "UPDATE messages SET status = ?2, provider_sid = ?3, data = ?4 WHERE id = ?1",
            params![id.as_str(), message_status_wire(to), message.provider_sid, data],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == rusqlite::ErrorCode::ConstraintViolation => {
                return Err(StoreError::Constraint(format!("duplicate provider_sid on message {id}")));
            }
            Err(err) => return Err(StoreError::Io(err.to_string())),
        }
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        debug!(message = %id, from = %message_status_wire(from), to = %message_status_wire(to), "message transitioned");
        Ok(())
    }

    fn get_message(&self, id: &MessageId) -> Result<Option<Message>, StoreError> {
        let guard = self.lock();
        let row: Option<String> = guard
            .query_row("SELECT data FROM messages WHERE id = ?1", params![id.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|data| from_json(&data)).transpose()
    }

    fn find_message_by_provider_sid(&self, sid: &str) -> Result<Option<Message>, StoreError> {
        let guard = self.lock();
        let row: Option<String> = guard
            .query_row("SELECT data FROM messages WHERE provider_sid = ?1", params![sid], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|data| from_json(&data)).transpose()
    }

    fn list_non_terminal_messages(&self, campaign_id: &CampaignId) -> Result<Vec<MessageId>, StoreError> {
        let guard = self.lock();
        let mut stmt = guard
            .prepare(
                "SELECT id FROM messages WHERE campaign_id = ?1
                 AND status NOT IN ('READ', 'FAILED', 'UNDELIVERED')",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![campaign_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        rows.map(|row| row.map(MessageId::new).map_err(|err| StoreError::Io(err.to_string()))).collect()
    }

    fn list_recipients_matching(
        &self,
        rule: &RuleNode,
        cursor: Cursor,
        limit: usize,
    ) -> Result<RecipientPage, StoreError> {
        let guard = self.lock();
        let resume_after = cursor.0.unwrap_or_default();
        let mut stmt = guard
            .prepare("SELECT e164, data FROM recipients WHERE e164 > ?1 ORDER BY e164 ASC")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![resume_after], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|err| StoreError::Io(err.to_string()))?;

        let mut matched = Vec::new();
        let mut last_seen: Option<String> = None;
        let mut exhausted = true;
        for row in rows {
            let (e164_str, data) = row.map_err(|err| StoreError::Io(err.to_string()))?;
            last_seen = Some(e164_str.clone());
            let snapshot: RecipientSnapshot = from_json(&data)?;
            let mut attrs = snapshot.attributes;
            attrs.insert(
                messaging_core::CONSENT_STATE_ATTRIBUTE.to_string(),
                serde_json::Value::String(snapshot.consent_state.to_string()),
            );
            if messaging_core::runtime::segment_evaluator::evaluate(rule, &attrs) {
                if let Ok(e164) = E164::parse(&e164_str) {
                    matched.push(e164);
                }
            }
            if matched.len() >= limit {
                exhausted = false;
                break;
            }
        }
        let next_cursor = if exhausted { Cursor(None) } else { Cursor(last_seen) };
        Ok(RecipientPage { recipients: matched, next_cursor })
    }

    fn append_audit(&self, record: AuditRecord) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let subject_key = to_json(&record.subject)?;
        let data = to_json(&record)?;
        tx.execute("INSERT INTO audit (subject_key, data) VALUES (?1, ?2)", params![subject_key, data])
            .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    fn list_audit(&self, subject: &AuditSubject) -> Result<Vec<AuditRecord>, StoreError> {
        let guard = self.lock();
        let subject_key = to_json(subject)?;
        let mut stmt = guard
            .prepare("SELECT data FROM audit WHERE subject_key = ?1 ORDER BY seq ASC")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![subject_key], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        rows.map(|row| from_json(&row.map_err(|err| StoreError::Io(err.to_string()))?)).collect()
    }

    fn get_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError> {
        let guard = self.lock();
        let row: Option<String> = guard
            .query_row("SELECT data FROM campaigns WHERE id = ?1", params![id.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|data| from_json(&data)).transpose()
    }

    fn upsert_campaign(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let data = to_json(campaign)?;
        tx.execute(
            "INSERT INTO campaigns (id, data) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            params![campaign.id.as_str(), data],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    fn save_materialization_progress(&self, id: &CampaignId, cursor: Cursor, complete: bool) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let tx = guard
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let data: String = tx
            .query_row("SELECT data FROM campaigns WHERE id = ?1", params![id.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?
            .ok_or_else(|| StoreError::NotFound(format!("campaign {id}")))?;
        let mut campaign: Campaign = from_json(&data)?;
        campaign.materialization_cursor = cursor.0;
        campaign.materialization_complete = complete;
        let data = to_json(&campaign)?;
        tx.execute("UPDATE campaigns SET data = ?2 WHERE id = ?1", params![id.as_str(), data])
            .map_err(|err| StoreError::Io(err.to_string()))?;
        tx.commit().map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    fn get_template(&self, id: &TemplateId) -> Result<Option<Template>, StoreError> {
        let guard = self.lock();
        let row: Option<String> = guard
            .query_row("SELECT data FROM templates WHERE id = ?1", params![id.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|data| from_json(&data)).transpose()
    }

    fn get_segment(&self, id: &SegmentId) -> Result<Option<Segment>, StoreError> {
        let guard = self.lock();
        let row: Option<String> = guard
            .query_row("SELECT data FROM segments WHERE id = ?1", params![id.as_str()], |row| row.get(0))
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|data| from_json(&data)).transpose()
    }
}

impl SqliteStore {
    /// Seeds a template row directly, for migrations and operator tooling.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    pub fn put_template(&self, template: &Template) -> Result<(), StoreError> {
        let guard = self.lock();
        let data = to_json(template)?;
        guard
            .execute(
                "INSERT INTO templates (id, data) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data",
                params![template.id.as_str(), data],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    /// Seeds a segment row directly, for migrations and operator tooling.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    pub fn put_segment(&self, segment: &Segment) -> Result<(), StoreError> {
        let guard = self.lock();
        let data = to_json(segment)?;
        guard
            .execute(
                "INSERT INTO segments (id, data) VALUES (?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data",
                params![segment.id.as_str(), data],
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }
}
