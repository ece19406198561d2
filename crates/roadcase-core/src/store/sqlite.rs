//! `SQLite` fleet store.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` to allow concurrent readers while a writer appends
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` to protect relational integrity

use chrono::NaiveDate;
use rusqlite::{Connection, params, params_from_iter, types::Type, types::Value};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use super::{FleetStore, lock::StoreWriteLock};
use crate::error::FleetError;
use crate::model::{
    assignment::{Assignment, AssignmentStatus},
    kit::{Kit, KitStatus, KitTier},
};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a writer waits for the advisory write lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS kits (
    kit_id              TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    code                TEXT,
    tier                TEXT NOT NULL,
    status              TEXT NOT NULL,
    default_ship_days   INTEGER NOT NULL,
    default_return_days INTEGER NOT NULL,
    home_location       TEXT NOT NULL,
    current_location    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assignments (
    assignment_id       TEXT PRIMARY KEY,
    kit_id              TEXT NOT NULL REFERENCES kits(kit_id),
    event_id            TEXT NOT NULL,
    event_name          TEXT NOT NULL,
    event_start         TEXT NOT NULL,
    event_end           TEXT NOT NULL,
    status              TEXT NOT NULL,
    ship_date           TEXT,
    arrival_date        TEXT,
    return_ship_date    TEXT,
    return_arrival_date TEXT,
    auto_planned        INTEGER NOT NULL DEFAULT 0,
    plan_reason         TEXT,
    confidence          REAL,
    notes               TEXT,
    created_on          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_assignments_kit_status
    ON assignments(kit_id, status);
CREATE INDEX IF NOT EXISTS idx_assignments_event
    ON assignments(event_id);
";

const ACTIVE_FILTER: &str = "status NOT IN ('cancelled', 'returned')";

const ASSIGNMENT_COLUMNS: &str = "assignment_id, kit_id, event_id, event_name, event_start, \
     event_end, status, ship_date, arrival_date, return_ship_date, return_arrival_date, \
     auto_planned, plan_reason, confidence, notes, created_on";

/// Fleet store backed by a `SQLite` database file.
///
/// The advisory write-lock file lives next to the database so independent
/// processes sharing the file contend on the same guard.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl SqliteStore {
    /// Open (or create) the fleet database, apply runtime pragmas, and
    /// migrate the schema to the latest version.
    pub fn open(path: &Path) -> Result<Self, FleetError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        configure_connection(&conn)?;
        migrate(&conn)?;

        let mut lock_path = path.to_path_buf();
        lock_path.set_extension("write.lock");

        Ok(Self {
            conn,
            lock_path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        })
    }

    /// Override the write-lock timeout (the default is 5 seconds).
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
        tracing::debug!(from = version, to = 1, "fleet schema migrated");
    }
    Ok(())
}

impl FleetStore for SqliteStore {
    type WriteGuard = StoreWriteLock;

    fn kit(&self, kit_id: &str) -> Result<Option<Kit>, FleetError> {
        let mut stmt = self.conn.prepare(
            "SELECT kit_id, name, code, tier, status, default_ship_days, default_return_days, \
             home_location, current_location FROM kits WHERE kit_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![kit_id], read_kit)?;
        rows.next().transpose().map_err(FleetError::from)
    }

    fn kits(&self) -> Result<Vec<Kit>, FleetError> {
        let mut stmt = self.conn.prepare(
            "SELECT kit_id, name, code, tier, status, default_ship_days, default_return_days, \
             home_location, current_location FROM kits ORDER BY kit_id",
        )?;
        let rows = stmt.query_map([], read_kit)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(FleetError::from)
    }

    fn upsert_kit(&self, kit: &Kit) -> Result<(), FleetError> {
        self.conn.execute(
            "INSERT INTO kits (kit_id, name, code, tier, status, default_ship_days, \
             default_return_days, home_location, current_location) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             ON CONFLICT(kit_id) DO UPDATE SET \
             name = excluded.name, code = excluded.code, tier = excluded.tier, \
             status = excluded.status, default_ship_days = excluded.default_ship_days, \
             default_return_days = excluded.default_return_days, \
             home_location = excluded.home_location, \
             current_location = excluded.current_location",
            params![
                kit.id,
                kit.name,
                kit.code,
                kit.tier.to_string(),
                kit.status.to_string(),
                kit.default_ship_days,
                kit.default_return_days,
                kit.home_location,
                kit.current_location,
            ],
        )?;
        Ok(())
    }

    fn assignment(&self, assignment_id: &str) -> Result<Option<Assignment>, FleetError> {
        let sql =
            format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE assignment_id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![assignment_id], read_assignment)?;
        rows.next().transpose().map_err(FleetError::from)
    }

    fn active_assignments_for_kit(&self, kit_id: &str) -> Result<Vec<Assignment>, FleetError> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments \
             WHERE kit_id = ?1 AND {ACTIVE_FILTER} ORDER BY event_start"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![kit_id], read_assignment)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(FleetError::from)
    }

    fn active_assignments(&self) -> Result<Vec<Assignment>, FleetError> {
        let sql = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments \
             WHERE {ACTIVE_FILTER} ORDER BY kit_id, event_start"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], read_assignment)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(FleetError::from)
    }

    fn insert_assignment(&self, assignment: &Assignment) -> Result<(), FleetError> {
        self.conn.execute(
            "INSERT INTO assignments (assignment_id, kit_id, event_id, event_name, event_start, \
             event_end, status, ship_date, arrival_date, return_ship_date, return_arrival_date, \
             auto_planned, plan_reason, confidence, notes, created_on) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params_from_iter(assignment_values(assignment)),
        )?;
        Ok(())
    }

    fn update_assignment(&self, assignment: &Assignment) -> Result<(), FleetError> {
        let changed = self.conn.execute(
            "UPDATE assignments SET kit_id = ?2, event_id = ?3, event_name = ?4, \
             event_start = ?5, event_end = ?6, status = ?7, ship_date = ?8, arrival_date = ?9, \
             return_ship_date = ?10, return_arrival_date = ?11, auto_planned = ?12, \
             plan_reason = ?13, confidence = ?14, notes = ?15, created_on = ?16 \
             WHERE assignment_id = ?1",
            params_from_iter(assignment_values(assignment)),
        )?;
        if changed == 0 {
            return Err(FleetError::AssignmentNotFound(assignment.id.clone()));
        }
        Ok(())
    }

    fn delete_assignment(&self, assignment_id: &str) -> Result<(), FleetError> {
        let changed = self.conn.execute(
            "DELETE FROM assignments WHERE assignment_id = ?1",
            params![assignment_id],
        )?;
        if changed == 0 {
            return Err(FleetError::AssignmentNotFound(assignment_id.to_string()));
        }
        Ok(())
    }

    fn lock_writes(&self) -> Result<StoreWriteLock, FleetError> {
        StoreWriteLock::acquire(&self.lock_path, self.lock_timeout).map_err(FleetError::from)
    }
}

fn read_kit(row: &rusqlite::Row<'_>) -> rusqlite::Result<Kit> {
    Ok(Kit {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        tier: parse_enum::<KitTier>(row, 3)?,
        status: parse_enum::<KitStatus>(row, 4)?,
        default_ship_days: row.get(5)?,
        default_return_days: row.get(6)?,
        home_location: row.get(7)?,
        current_location: row.get(8)?,
    })
}

fn read_assignment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        kit_id: row.get(1)?,
        event_id: row.get(2)?,
        event_name: row.get(3)?,
        event_start: parse_date(row, 4)?,
        event_end: parse_date(row, 5)?,
        status: parse_enum::<AssignmentStatus>(row, 6)?,
        ship_date: parse_opt_date(row, 7)?,
        arrival_date: parse_opt_date(row, 8)?,
        return_ship_date: parse_opt_date(row, 9)?,
        return_arrival_date: parse_opt_date(row, 10)?,
        auto_planned: row.get(11)?,
        plan_reason: row.get(12)?,
        confidence: row.get(13)?,
        notes: row.get(14)?,
        created_on: parse_date(row, 15)?,
    })
}

fn assignment_values(a: &Assignment) -> Vec<Value> {
    fn opt_text(value: Option<String>) -> Value {
        value.map_or(Value::Null, Value::Text)
    }

    vec![
        Value::Text(a.id.clone()),
        Value::Text(a.kit_id.clone()),
        Value::Text(a.event_id.clone()),
        Value::Text(a.event_name.clone()),
        Value::Text(a.event_start.to_string()),
        Value::Text(a.event_end.to_string()),
        Value::Text(a.status.to_string()),
        opt_text(a.ship_date.map(|d| d.to_string())),
        opt_text(a.arrival_date.map(|d| d.to_string())),
        opt_text(a.return_ship_date.map(|d| d.to_string())),
        opt_text(a.return_arrival_date.map(|d| d.to_string())),
        Value::Integer(i64::from(a.auto_planned)),
        opt_text(a.plan_reason.clone()),
        a.confidence.map_or(Value::Null, Value::Real),
        opt_text(a.notes.clone()),
        Value::Text(a.created_on.to_string()),
    ]
}

fn parse_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
    })
}

fn parse_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
    })
}

fn parse_opt_date(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
        })
    })
    .transpose()
}
