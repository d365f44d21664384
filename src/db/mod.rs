pub mod customer;
pub mod migration;

use crate::Result;
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::Connection;
use std::path::Path;

pub fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}

/// WAL mode is persisted in the database file, so connections opened by the
/// pool inherit it from `open_connection`.
pub fn pool(path: &Path) -> Result<Pool> {
    let pool_size = std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(8);
    Config::new(path)
        .builder(Runtime::Tokio1)?
        .max_size(pool_size)
        .build()
        .map_err(Into::into)
}

#[cfg(test)]
pub mod test {
    use deadpool_sqlite::{Config, Pool, Runtime};
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static MEM_DB_COUNTER: AtomicUsize = AtomicUsize::new(1);

    pub fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        super::migration::run(&mut conn).unwrap();
        conn
    }

    /// A pool over a named shared-cache in-memory database. The database
    /// lives as long as `conn` does.
    pub struct TestDb {
        pub pool: Pool,
        pub conn: Connection,
    }

    pub fn db() -> TestDb {
        let uri = format!(
            "file:testdb_{}?mode=memory&cache=shared",
            MEM_DB_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let mut conn = Connection::open(&uri).unwrap();
        super::migration::run(&mut conn).unwrap();
        let pool = Config::new(uri)
            .builder(Runtime::Tokio1)
            .unwrap()
            .max_size(16)
            .build()
            .unwrap();
        TestDb { pool, conn }
    }
}
