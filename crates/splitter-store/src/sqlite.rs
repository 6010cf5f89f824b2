//! SQLite implementation of the LedgerStore trait.
//!
//! This is the durable storage backend for the Splitter ledger. Savepoints
//! map directly onto SQL `SAVEPOINT` / `RELEASE` / `ROLLBACK TO`, so a
//! rolled-back payout never reaches disk.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use splitter_core::{amount_from_bytes, amount_to_bytes, Amount, Identity};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ControlRecord, LedgerStore, Savepoint};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    /// The SQLite connection and savepoint depth, protected by a mutex.
    conn: Arc<Mutex<SqliteInner>>,
}

struct SqliteInner {
    conn: Connection,
    depth: usize,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(SqliteInner { conn, depth: 0 })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SqliteInner>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Poisoned(format!("mutex poisoned: {}", e)))
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let inner = self.lock()?;
        f(&inner.conn)
    }

    /// Check that `savepoint` is the innermost one and close it.
    fn close_savepoint<F>(&self, savepoint: Savepoint, f: F) -> Result<()>
    where
        F: FnOnce(&Connection, &str) -> Result<()>,
    {
        let mut inner = self.lock()?;
        if inner.depth != savepoint.depth() {
            return Err(StoreError::Savepoint(format!(
                "savepoint {} is not the innermost (open: {})",
                savepoint.depth(),
                inner.depth
            )));
        }
        f(&inner.conn, &savepoint_name(savepoint.depth()))?;
        inner.depth -= 1;
        Ok(())
    }
}

fn savepoint_name(depth: usize) -> String {
    format!("ledger_sp_{}", depth)
}

fn decode_identity(bytes: Vec<u8>) -> Result<Identity> {
    Identity::try_from(bytes.as_slice())
        .map_err(|_| StoreError::InvalidData(format!("identity of {} bytes", bytes.len())))
}

fn decode_amount(bytes: Vec<u8>) -> Result<Amount> {
    amount_from_bytes(&bytes)
        .ok_or_else(|| StoreError::InvalidData(format!("amount of {} bytes", bytes.len())))
}

impl LedgerStore for SqliteStore {
    fn balance(&self, who: &Identity) -> Result<Amount> {
        self.with_conn(|conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT amount FROM balances WHERE identity = ?1",
                    params![who.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            bytes.map(decode_amount).transpose().map(|a| a.unwrap_or(0))
        })
    }

    fn set_balance(&self, who: &Identity, amount: Amount) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO balances (identity, amount) VALUES (?1, ?2)
                 ON CONFLICT(identity) DO UPDATE SET amount = excluded.amount",
                params![
                    who.as_bytes().as_slice(),
                    amount_to_bytes(amount).as_slice()
                ],
            )?;
            Ok(())
        })
    }

    fn balances(&self) -> Result<Vec<(Identity, Amount)>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT identity, amount FROM balances ORDER BY identity")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?;

            let mut entries = Vec::new();
            for row in rows {
                let (identity, amount) = row?;
                entries.push((decode_identity(identity)?, decode_amount(amount)?));
            }
            Ok(entries)
        })
    }

    fn held(&self) -> Result<Amount> {
        self.with_conn(|conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row("SELECT held FROM vault WHERE id = 1", [], |row| row.get(0))
                .optional()?;
            bytes.map(decode_amount).transpose().map(|a| a.unwrap_or(0))
        })
    }

    fn set_held(&self, amount: Amount) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO vault (id, held) VALUES (1, ?1)
                 ON CONFLICT(id) DO UPDATE SET held = excluded.held",
                params![amount_to_bytes(amount).as_slice()],
            )?;
            Ok(())
        })
    }

    fn control(&self) -> Result<Option<ControlRecord>> {
        self.with_conn(|conn| {
            let row: Option<(Vec<u8>, bool)> = conn
                .query_row("SELECT owner, paused FROM control WHERE id = 1", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .optional()?;

            row.map(|(owner, paused)| {
                Ok(ControlRecord {
                    owner: decode_identity(owner)?,
                    paused,
                })
            })
            .transpose()
        })
    }

    fn put_control(&self, record: &ControlRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO control (id, owner, paused) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET owner = excluded.owner, paused = excluded.paused",
                params![record.owner.as_bytes().as_slice(), record.paused],
            )?;
            Ok(())
        })
    }

    fn savepoint(&self) -> Result<Savepoint> {
        let mut inner = self.lock()?;
        let depth = inner.depth + 1;
        inner
            .conn
            .execute_batch(&format!("SAVEPOINT {}", savepoint_name(depth)))?;
        inner.depth = depth;
        Ok(Savepoint::new(depth))
    }

    fn release(&self, savepoint: Savepoint) -> Result<()> {
        self.close_savepoint(savepoint, |conn, name| {
            conn.execute_batch(&format!("RELEASE SAVEPOINT {}", name))?;
            Ok(())
        })
    }

    fn rollback_to(&self, savepoint: Savepoint) -> Result<()> {
        self.close_savepoint(savepoint, |conn, name| {
            conn.execute_batch(&format!(
                "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}"
            ))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::LedgerStoreExt;

    #[test]
    fn test_sqlite_store_basic() {
        let store = SqliteStore::open_memory().unwrap();
        let first = Identity::derive("first");
        let second = Identity::derive("second");

        assert_eq!(store.balance(&first).unwrap(), 0);

        store.set_balance(&first, 49).unwrap();
        store.set_balance(&second, 50).unwrap();
        store.set_held(99).unwrap();

        assert_eq!(store.balance(&first).unwrap(), 49);
        assert_eq!(store.balance(&second).unwrap(), 50);
        assert_eq!(store.held().unwrap(), 99);
        assert!(store.is_conserved().unwrap());
    }

    #[test]
    fn test_large_amounts_survive() {
        let store = SqliteStore::open_memory().unwrap();
        let first = Identity::derive("first");

        store.set_balance(&first, u128::MAX).unwrap();
        assert_eq!(store.balance(&first).unwrap(), u128::MAX);
    }

    #[test]
    fn test_control_record() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.control().unwrap().is_none());

        let record = ControlRecord {
            owner: Identity::derive("owner"),
            paused: true,
        };
        store.put_control(&record).unwrap();
        assert_eq!(store.control().unwrap(), Some(record));

        let record = ControlRecord {
            owner: Identity::derive("new-owner"),
            paused: false,
        };
        store.put_control(&record).unwrap();
        assert_eq!(store.control().unwrap(), Some(record));
    }

    #[test]
    fn test_savepoint_rollback() {
        let store = SqliteStore::open_memory().unwrap();
        let first = Identity::derive("first");
        store.set_balance(&first, 10).unwrap();

        let outer = store.savepoint().unwrap();
        store.set_balance(&first, 0).unwrap();

        let inner = store.savepoint().unwrap();
        store.set_held(5).unwrap();
        store.release(inner).unwrap();

        store.rollback_to(outer).unwrap();

        assert_eq!(store.balance(&first).unwrap(), 10);
        assert_eq!(store.held().unwrap(), 0);
    }

    #[test]
    fn test_savepoint_out_of_order() {
        let store = SqliteStore::open_memory().unwrap();
        let outer = store.savepoint().unwrap();
        let inner = store.savepoint().unwrap();

        assert!(matches!(
            store.rollback_to(outer),
            Err(StoreError::Savepoint(_))
        ));
        store.release(inner).unwrap();
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let first = Identity::derive("first");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set_balance(&first, 2000).unwrap();
            let sp = store.savepoint().unwrap();
            store.set_held(2000).unwrap();
            store.release(sp).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.balance(&first).unwrap(), 2000);
        assert_eq!(store.held().unwrap(), 2000);
    }
}
