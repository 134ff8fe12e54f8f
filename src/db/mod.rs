pub mod cache;
pub mod query;
pub mod schema;
pub mod sql;

use anyhow::Result;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

pub fn open_or_create<P: AsRef<Path>>(db_path: P) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    schema::apply_pragmas(&conn)?;
    schema::apply_schema(&conn)?;
    Ok(conn)
}

/// Creates the schema if needed and opens a pool of `size` connections.
pub fn create_pool<P: AsRef<Path>>(db_path: P, size: u32) -> Result<DbPool> {
    drop(open_or_create(db_path.as_ref())?);
    let manager = SqliteConnectionManager::file(db_path.as_ref()).with_init(|c| {
        c.pragma_update(None, "foreign_keys", "ON")?;
        c.pragma_update(None, "temp_store", "MEMORY")?;
        c.busy_timeout(std::time::Duration::from_secs(5))
    });
    let pool = r2d2::Pool::builder().max_size(size.max(1)).build(manager)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pool() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(dir.path().join("nazr.db"), 2).unwrap();
        let conn = pool.get().unwrap();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM photos", [], |r| r.get(0)).unwrap();
        assert_eq!(n, 0);
    }
}
