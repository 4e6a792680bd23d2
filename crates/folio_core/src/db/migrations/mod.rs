//! Document-store schema migrations.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Pending migrations are applied in one transaction.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - After migrating, every table in `REQUIRED_TABLES` exists.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "documents",
    sql: include_str!("0001_documents.sql"),
}];

/// Tables the document store reads and writes.
const REQUIRED_TABLES: &[&str] = &["documents"];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `DbError::MigrationFailed` naming the first script that failed.
/// - `DbError::MissingTable` when the resulting schema lacks a store table.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version < latest {
        let tx = conn.transaction()?;
        for migration in MIGRATIONS
            .iter()
            .filter(|migration| migration.version > current_version)
        {
            run_migration(&tx, migration)?;
        }
        tx.commit()?;

        info!(
            "event=db_migrate module=db status=ok from_version={} to_version={}",
            current_version, latest
        );
    }

    ensure_required_tables(conn)
}

fn run_migration(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    let wrap = |source: rusqlite::Error| DbError::MigrationFailed {
        version: migration.version,
        name: migration.name,
        source,
    };
    tx.execute_batch(migration.sql).map_err(wrap)?;
    tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
        .map_err(wrap)?;
    debug!(
        "event=db_migration_step module=db status=ok version={} name={}",
        migration.version, migration.name
    );
    Ok(())
}

fn ensure_required_tables(conn: &Connection) -> DbResult<()> {
    for table in REQUIRED_TABLES {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::MissingTable(*table));
        }
    }
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, MIGRATIONS};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn migration_versions_are_strictly_increasing() {
        let versions: Vec<u32> = MIGRATIONS.iter().map(|migration| migration.version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(versions.first(), Some(&1));
    }

    #[test]
    fn applying_twice_is_a_no_op() {
        let mut conn = Connection::open_in_memory().expect("open raw connection");
        apply_migrations(&mut conn).expect("first migration run");
        apply_migrations(&mut conn).expect("second migration run");
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .expect("read user_version");
        assert_eq!(version, latest_version());
    }

    #[test]
    fn dropped_documents_table_is_reported() {
        let mut conn = Connection::open_in_memory().expect("open raw connection");
        apply_migrations(&mut conn).expect("migrate");
        conn.execute_batch("DROP TABLE documents;")
            .expect("drop documents");

        match apply_migrations(&mut conn).expect_err("missing table must fail") {
            DbError::MissingTable(table) => assert_eq!(table, "documents"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
