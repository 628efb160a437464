use std::path::Path;

use rusqlite::types::Type as SqlType;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::db::{BinaryRecord, ParseRunRecord, ParseRunStatus};
use crate::debuginfo::{DebugFunctionInfo, DebugInfo};
use crate::types::Type;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Error type for project database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A type definition could not be encoded for storage.
    #[error("Failed to encode type definition: {0}")]
    Encode(#[from] serde_json::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    #[error("Unknown parse run id {0}")]
    UnknownRun(i64),
}

/// Convenience result type for DB operations.
pub type DbResult<T> = Result<T, DbError>;

/// SQLite-backed project database.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Providing small, testable helpers for querying and updating records.
#[derive(Debug)]
pub struct ProjectDb {
    conn: Connection,
}

impl ProjectDb {
    /// Open (or create) a project database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database with the current schema, for tests and dry runs.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    /// For most code, prefer higher-level helpers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Schema version recorded in the database file.
    pub fn schema_version(&self) -> DbResult<i32> {
        current_schema_version(&self.conn)
    }

    /// Insert a binary record and return its row id.
    pub fn insert_binary(&self, record: &BinaryRecord) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO binaries (name, path, arch, format, hash)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![record.name, record.path, record.arch, record.format, record.hash],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// List all binaries (ordered by id).
    pub fn list_binaries(&self) -> DbResult<Vec<BinaryRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, path, arch, format, hash
            FROM binaries
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], map_binary)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn find_binary(&self, name: &str) -> DbResult<Option<BinaryRecord>> {
        let record = self
            .conn
            .query_row(
                r#"
                SELECT name, path, arch, format, hash
                FROM binaries
                WHERE name = ?1
                "#,
                params![name],
                map_binary,
            )
            .optional()?;
        Ok(record)
    }

    /// Insert a parse run record and return its row id.
    pub fn insert_parse_run(&self, record: &ParseRunRecord) -> DbResult<i64> {
        insert_run_row(&self.conn, record)
    }

    /// Insert a parse run and the debug info it produced in one transaction.
    ///
    /// Either both land or neither does.
    pub fn record_run(&self, record: &ParseRunRecord, info: &DebugInfo) -> DbResult<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let run_id = insert_run_row(&tx, record)?;
        insert_debug_rows(&tx, run_id, info)?;
        tx.commit()?;
        Ok(run_id)
    }

    /// List parse runs, optionally filtered by binary name.
    pub fn list_parse_runs(&self, binary: Option<&str>) -> DbResult<Vec<ParseRunRecord>> {
        fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParseRunRecord> {
            let status: String = row.get(2)?;
            let status = status.parse::<ParseRunStatus>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, SqlType::Text, e.into())
            })?;
            Ok(ParseRunRecord {
                binary: row.get(0)?,
                parser: row.get(1)?,
                status,
                types_added: row.get::<_, i64>(3)? as u64,
                functions_added: row.get::<_, i64>(4)? as u64,
                message: row.get(5)?,
                started_at: row.get(6)?,
                finished_at: row.get(7)?,
            })
        }

        let mut stmt = if binary.is_some() {
            self.conn.prepare(
                r#"
                SELECT binary, parser, status, types_added, functions_added, message, started_at, finished_at
                FROM parse_runs
                WHERE binary = ?1
                ORDER BY id
                "#,
            )?
        } else {
            self.conn.prepare(
                r#"
                SELECT binary, parser, status, types_added, functions_added, message, started_at, finished_at
                FROM parse_runs
                ORDER BY id
                "#,
            )?
        };

        let rows = if let Some(bin) = binary {
            stmt.query_map(params![bin], map_run)?
        } else {
            stmt.query_map([], map_run)?
        };

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Most recent run id for a given binary/parser pair.
    pub fn latest_run_id(&self, binary: &str, parser: &str) -> DbResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                r#"
                SELECT id FROM parse_runs
                WHERE binary = ?1 AND parser = ?2
                ORDER BY id DESC
                LIMIT 1
                "#,
                params![binary, parser],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Most recent run of every parser that ran over `binary`, oldest first.
    pub fn latest_runs_for_binary(&self, binary: &str) -> DbResult<Vec<(i64, String)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT MAX(id), parser FROM parse_runs
            WHERE binary = ?1
            GROUP BY parser
            ORDER BY MAX(id)
            "#,
        )?;
        let rows = stmt.query_map(params![binary], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Persist the entries of `info` under a parse run.
    pub fn insert_debug_info(&self, run_id: i64, info: &DebugInfo) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_debug_rows(&tx, run_id, info)?;
        tx.commit()?;
        Ok(())
    }

    /// Rebuild the debug info stored for a parse run, attributed to its parser.
    pub fn load_debug_info(&self, run_id: i64) -> DbResult<DebugInfo> {
        let parser: String = self
            .conn
            .query_row("SELECT parser FROM parse_runs WHERE id = ?1", params![run_id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or(DbError::UnknownRun(run_id))?;

        let mut info = DebugInfo::new();
        info.set_source(Some(parser));

        {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT name, definition FROM debug_types
                WHERE run_id = ?1
                ORDER BY rowid
                "#,
            )?;
            let rows = stmt.query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, decode_type(row, 1)?))
            })?;
            for row in rows {
                let (name, ty) = row?;
                info.add_type(name, ty);
            }
        }

        let mut parameters: Vec<(i64, String, Type)> = Vec::new();
        {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT address, name, definition FROM debug_parameters
                WHERE run_id = ?1
                ORDER BY address, idx
                "#,
            )?;
            let rows = stmt.query_map(params![run_id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, decode_type(row, 2)?))
            })?;
            for row in rows {
                parameters.push(row?);
            }
        }

        {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT address, short_name, full_name, raw_name, return_type FROM debug_functions
                WHERE run_id = ?1
                ORDER BY rowid
                "#,
            )?;
            let rows = stmt.query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    decode_type(row, 4)?,
                ))
            })?;
            for row in rows {
                let (address, short_name, full_name, raw_name, return_type) = row?;
                let params: Vec<(String, Type)> = parameters
                    .iter()
                    .filter(|(a, _, _)| *a == address)
                    .map(|(_, name, ty)| (name.clone(), ty.clone()))
                    .collect();
                info.add_function(DebugFunctionInfo::new(
                    short_name,
                    full_name,
                    raw_name,
                    address as u64,
                    Some(return_type),
                    params,
                ));
            }
        }

        info.set_source(None);
        Ok(info)
    }
}

fn map_binary(row: &rusqlite::Row<'_>) -> rusqlite::Result<BinaryRecord> {
    Ok(BinaryRecord {
        name: row.get(0)?,
        path: row.get(1)?,
        arch: row.get(2)?,
        format: row.get(3)?,
        hash: row.get(4)?,
    })
}

fn insert_run_row(conn: &Connection, record: &ParseRunRecord) -> DbResult<i64> {
    conn.execute(
        r#"
        INSERT INTO parse_runs (binary, parser, status, types_added, functions_added, message, started_at, finished_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            record.binary,
            record.parser,
            record.status.as_str(),
            record.types_added as i64,
            record.functions_added as i64,
            record.message,
            record.started_at,
            record.finished_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Write the type, function and parameter rows for `run_id`; the caller owns the transaction.
fn insert_debug_rows(conn: &Connection, run_id: i64, info: &DebugInfo) -> DbResult<()> {
    {
        let mut stmt = conn.prepare(
            r#"
            INSERT OR REPLACE INTO debug_types (run_id, name, definition)
            VALUES (?1, ?2, ?3)
            "#,
        )?;
        for entry in info.types() {
            stmt.execute(params![run_id, entry.name, serde_json::to_string(&entry.ty)?])?;
        }
    }

    let mut stmt_func = conn.prepare(
        r#"
        INSERT OR REPLACE INTO debug_functions (run_id, address, short_name, full_name, raw_name, return_type)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )?;
    let mut stmt_param = conn.prepare(
        r#"
        INSERT OR REPLACE INTO debug_parameters (run_id, address, idx, name, definition)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )?;
    for entry in info.functions() {
        let func = &entry.info;
        let address = func.address() as i64;
        stmt_func.execute(params![
            run_id,
            address,
            func.short_name(),
            func.full_name(),
            func.raw_name(),
            serde_json::to_string(func.return_type())?
        ])?;
        for (idx, (name, ty)) in func.parameters().iter().enumerate() {
            stmt_param.execute(params![
                run_id,
                address,
                idx as i64,
                name,
                serde_json::to_string(ty)?
            ])?;
        }
    }
    Ok(())
}

fn decode_type(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Type> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, SqlType::Text, Box::new(e)))
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: binaries
/// - 2: parse_runs
/// - 3: debug_types, debug_functions, debug_parameters
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let mut current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS binaries (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                name   TEXT NOT NULL UNIQUE,
                path   TEXT NOT NULL,
                arch   TEXT,
                format TEXT,
                hash   TEXT
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
        current_version = 1;
    }

    if current_version < 2 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS parse_runs (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                binary          TEXT NOT NULL,
                parser          TEXT NOT NULL,
                status          TEXT NOT NULL,
                types_added     INTEGER NOT NULL DEFAULT 0,
                functions_added INTEGER NOT NULL DEFAULT 0,
                message         TEXT,
                started_at      TEXT NOT NULL,
                finished_at     TEXT NOT NULL
            );

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
        current_version = 2;
    }

    if current_version < 3 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS debug_types (
                run_id     INTEGER NOT NULL,
                name       TEXT NOT NULL,
                definition TEXT NOT NULL,
                PRIMARY KEY(run_id, name)
            );
            CREATE TABLE IF NOT EXISTS debug_functions (
                run_id      INTEGER NOT NULL,
                address     INTEGER NOT NULL,
                short_name  TEXT NOT NULL,
                full_name   TEXT NOT NULL,
                raw_name    TEXT NOT NULL,
                return_type TEXT NOT NULL,
                PRIMARY KEY(run_id, address)
            );
            CREATE TABLE IF NOT EXISTS debug_parameters (
                run_id     INTEGER NOT NULL,
                address    INTEGER NOT NULL,
                idx        INTEGER NOT NULL,
                name       TEXT NOT NULL,
                definition TEXT NOT NULL,
                PRIMARY KEY(run_id, address, idx)
            );
            PRAGMA user_version = 3;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
