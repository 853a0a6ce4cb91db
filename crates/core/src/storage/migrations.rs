//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, instrument};

use super::parse::now_string;
use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Physical rooms, ids assigned by the operator
            CREATE TABLE IF NOT EXISTS rooms (
                id INTEGER PRIMARY KEY,
                room_number TEXT NOT NULL UNIQUE,
                floor INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'vacant'
                    CHECK (status IN ('vacant', 'reserved', 'checkedin', 'checkout')),
                guest_name TEXT,
                check_in_time TEXT,
                check_out_time TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Date-ranged bookings, half-open [check_in_date, check_out_date)
            CREATE TABLE IF NOT EXISTS reservations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                guest_name TEXT NOT NULL,
                guest_email TEXT,
                check_in_date TEXT NOT NULL,
                check_out_date TEXT NOT NULL,
                number_of_guests INTEGER NOT NULL DEFAULT 1,
                special_requests TEXT,
                status TEXT NOT NULL DEFAULT 'confirmed'
                    CHECK (status IN ('confirmed', 'cancelled', 'completed')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK (check_in_date < check_out_date),
                FOREIGN KEY (room_id) REFERENCES rooms(id)
            );

            -- Room status audit trail
            CREATE TABLE IF NOT EXISTS room_status_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id INTEGER NOT NULL,
                previous_status TEXT NOT NULL,
                new_status TEXT NOT NULL,
                changed_by TEXT NOT NULL,
                changed_at TEXT NOT NULL,
                FOREIGN KEY (room_id) REFERENCES rooms(id)
            );

            -- Reservation audit trail
            CREATE TABLE IF NOT EXISTS reservation_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                reservation_id INTEGER NOT NULL,
                action TEXT NOT NULL CHECK (action IN ('created', 'cancelled')),
                changed_by TEXT NOT NULL,
                changed_at TEXT NOT NULL,
                FOREIGN KEY (reservation_id) REFERENCES reservations(id)
            );

            -- Staff accounts (credentials are opaque here)
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                last_login TEXT
            );

            -- Bounded per-user notification history
            CREATE TABLE IF NOT EXISTS user_notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                notification_type TEXT NOT NULL DEFAULT 'info',
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            -- Conflict lookups scan one room's confirmed stays
            CREATE INDEX IF NOT EXISTS idx_reservations_room_dates
                ON reservations(room_id, check_in_date, check_out_date);
            CREATE INDEX IF NOT EXISTS idx_reservations_dates
                ON reservations(check_in_date, check_out_date);

            CREATE INDEX IF NOT EXISTS idx_status_logs_room ON room_status_logs(room_id);
            CREATE INDEX IF NOT EXISTS idx_reservation_logs_reservation
                ON reservation_logs(reservation_id);

            -- Ring reads and evictions order by recency per user
            CREATE INDEX IF NOT EXISTS idx_notifications_user_time
                ON user_notifications(user_id, created_at DESC);
        "#,
    },
    Migration {
        version: 3,
        description: "Make audit trails append-only",
        sql: r#"
            CREATE TRIGGER IF NOT EXISTS room_status_logs_no_update
                BEFORE UPDATE ON room_status_logs
                BEGIN SELECT RAISE(ABORT, 'room_status_logs is append-only'); END;
            CREATE TRIGGER IF NOT EXISTS room_status_logs_no_delete
                BEFORE DELETE ON room_status_logs
                BEGIN SELECT RAISE(ABORT, 'room_status_logs is append-only'); END;

            CREATE TRIGGER IF NOT EXISTS reservation_logs_no_update
                BEFORE UPDATE ON reservation_logs
                BEGIN SELECT RAISE(ABORT, 'reservation_logs is append-only'); END;
            CREATE TRIGGER IF NOT EXISTS reservation_logs_no_delete
                BEFORE DELETE ON reservation_logs
                BEGIN SELECT RAISE(ABORT, 'reservation_logs is append-only'); END;

            -- Reservations are cancelled, never removed
            CREATE TRIGGER IF NOT EXISTS reservations_no_delete
                BEFORE DELETE ON reservations
                BEGIN SELECT RAISE(ABORT, 'reservations are never deleted'); END;
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
pub(crate) fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![migration.version, migration.description, now_string()],
    )?;
    Ok(())
}

/// Run all pending migrations
///
/// Each migration and its bookkeeping row commit together, so a crash
/// mid-upgrade never leaves a half-applied version behind. The version is
/// re-read under the write lock: several handles may open a fresh file at
/// once, and only the first to take the lock applies each version.
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        if get_current_version(&tx)? >= migration.version {
            debug!(version = migration.version, "Migration applied by another connection");
            continue;
        }

        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        tx.execute_batch(migration.sql)?;
        record_migration(&tx, migration)?;
        tx.commit()?;

        info!(version = migration.version, "Migration complete");
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}
