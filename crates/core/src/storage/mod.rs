//! SQLite storage layer for Concierge

mod audit;
mod migrations;
mod notifications;
mod parse;
mod reservations;
mod rooms;
mod users;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{is_lock_contention, Error, Result};

pub use audit::AuditStore;
pub use notifications::NotificationStore;
pub use reservations::ReservationStore;
pub use rooms::RoomStore;
pub use users::UserStore;

/// Main database handle
///
/// Owns one connection. Concurrent request handlers each open their own
/// handle on the same file; writes serialize on SQLite's database lock.
pub struct Database {
    conn: Connection,
    config: EngineConfig,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, EngineConfig::default())
    }

    /// Open or create database at the given path with explicit tunables
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(conn, config)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with_config(EngineConfig::default())
    }

    /// Open in-memory database with explicit tunables
    pub fn open_in_memory_with_config(config: EngineConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn, config)
    }

    fn configure(conn: Connection, config: EngineConfig) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let config = config.sanitized();
        conn.busy_timeout(config.busy_timeout())?;
        let db = Self { conn, config };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Close the connection, surfacing any error the drop would swallow
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        migrations::get_current_version(&self.conn).unwrap_or(0)
    }

    /// Round-trip to the store, for health checks
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Run `op` as one all-or-nothing unit.
    ///
    /// The transaction takes the write lock before `op` reads anything, so a
    /// check made inside `op` still holds when its writes commit. Returning an
    /// error (or panicking) rolls every step back. If another connection holds
    /// the lock past the busy timeout the whole unit is retried, up to
    /// `max_write_attempts`, then reported as `Error::WriteCollision`.
    pub fn atomic<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(&Connection) -> Result<T>,
    {
        let max_attempts = self.config.max_write_attempts;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.run_once(&mut op) {
                Err(Error::Database(e)) if is_lock_contention(&e) => {
                    if attempt >= max_attempts {
                        warn!(attempt, "Giving up on contended write");
                        return Err(Error::WriteCollision { attempts: attempt });
                    }
                    warn!(attempt, max_attempts, "Write lock contended, retrying");
                }
                other => return other,
            }
        }
    }

    fn run_once<T, F>(&self, op: &mut F) -> Result<T>
    where
        F: FnMut(&Connection) -> Result<T>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        // Dropping `tx` on the error path rolls back
        let value = op(&tx)?;
        tx.commit()?;
        debug!("Transaction committed");
        Ok(value)
    }

    /// Insert the demo rooms when the registry is empty, all or none
    pub fn seed_sample_rooms(&self) -> Result<u64> {
        self.atomic(|conn| RoomStore::new(conn).seed_sample_rooms())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Get room registry store
    pub fn rooms(&self) -> RoomStore<'_> {
        RoomStore::new(&self.conn)
    }

    /// Get reservation ledger store (raw rows, no policy)
    pub fn reservations(&self) -> ReservationStore<'_> {
        ReservationStore::new(&self.conn)
    }

    /// Get audit trail store
    pub fn audit(&self) -> AuditStore<'_> {
        AuditStore::new(&self.conn)
    }

    /// Get user store
    pub fn users(&self) -> UserStore<'_> {
        UserStore::new(&self.conn)
    }

    /// Get notification store (raw rows, no capacity policy)
    pub fn notifications(&self) -> NotificationStore<'_> {
        NotificationStore::new(&self.conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewRoom;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_open_file_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open(&path).unwrap();
        db.rooms().create(&NewRoom::new(101, "101", 1)).unwrap();
        let version = db.schema_version();
        db.close().unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version(), version);
        assert!(db.rooms().exists(101).unwrap());
        db.ping().unwrap();
    }

    #[test]
    fn test_atomic_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();

        let result: Result<()> = db.atomic(|conn| {
            RoomStore::new(conn).create(&NewRoom::new(101, "101", 1))?;
            Err(Error::InvalidState("abort after first step".into()))
        });

        assert!(matches!(result, Err(Error::InvalidState(_))));
        assert!(!db.rooms().exists(101).unwrap());
    }

    #[test]
    fn test_atomic_commits_all_steps() {
        let db = Database::open_in_memory().unwrap();

        db.atomic(|conn| {
            let rooms = RoomStore::new(conn);
            rooms.create(&NewRoom::new(101, "101", 1))?;
            rooms.create(&NewRoom::new(102, "102", 1))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(db.rooms().count().unwrap(), 2);
    }

    #[test]
    fn test_contended_lock_surfaces_retryable_conflict() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let config = EngineConfig {
            busy_timeout_ms: 20,
            max_write_attempts: 2,
            ..EngineConfig::default()
        };

        let holder = Database::open_with_config(&path, config.clone()).unwrap();
        let contender = Database::open_with_config(&path, config).unwrap();

        // Hold the write lock on one connection for the whole attempt
        let _lock =
            Transaction::new_unchecked(holder.conn(), TransactionBehavior::Immediate).unwrap();

        let mut attempts = 0;
        let result = contender.atomic(|conn| {
            attempts += 1;
            RoomStore::new(conn).create(&NewRoom::new(101, "101", 1))
        });

        let err = result.unwrap_err();
        assert!(matches!(err, Error::WriteCollision { attempts: 2 }));
        assert!(err.is_retryable());
        // BEGIN IMMEDIATE fails before the closure ever runs
        assert_eq!(attempts, 0);
    }

    #[test]
    fn test_concurrent_first_open_migrates_once() {
        const OPENERS: usize = 6;

        for round in 0..5 {
            let dir = tempdir().unwrap();
            let path = dir.path().join(format!("fresh-{round}.db"));
            let barrier = Arc::new(Barrier::new(OPENERS));

            let openers: Vec<_> = (0..OPENERS)
                .map(|_| {
                    let path = path.clone();
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        Database::open(&path).map(|db| db.schema_version())
                    })
                })
                .collect();

            let versions: Vec<u32> = openers
                .into_iter()
                .map(|t| t.join().unwrap().unwrap())
                .collect();
            let expected = Database::open(&path).unwrap().schema_version();
            assert!(expected > 0);
            assert!(versions.iter().all(|v| *v == expected));
        }
    }

    #[test]
    fn test_seed_failure_leaves_registry_empty() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_room_203 BEFORE INSERT ON rooms WHEN NEW.id = 203
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        assert!(db.seed_sample_rooms().is_err());
        assert_eq!(db.rooms().count().unwrap(), 0);

        db.conn().execute_batch("DROP TRIGGER reject_room_203").unwrap();
        assert_eq!(db.seed_sample_rooms().unwrap(), 15);
    }
}
