pub mod from_row;
pub mod queries;
pub mod scope;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::Config;
use crate::error::{AppError, Result};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub api_secret: Option<String>,
    pub session_ttl_hours: i64,
}

impl AppState {
    pub fn new(db: DbPool, config: &Config) -> Self {
        Self {
            db,
            api_secret: config.api_secret.clone(),
            session_ttl_hours: config.session_ttl_hours,
        }
    }

    /// Run a store operation on the blocking pool with a pooled connection.
    ///
    /// rusqlite is synchronous; running it here keeps a slow query from
    /// stalling the async workers that serve other requests.
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Database task failed: {}", e)))?
    }
}

/// Build the connection pool for a database file. Every connection gets the
/// same pragmas: enforced foreign keys, WAL, and a busy timeout so concurrent
/// writers queue instead of failing.
pub fn create_pool(path: &str, max_size: u32) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
    });
    let pool = Pool::builder().max_size(max_size).build(manager)?;
    Ok(pool)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT,
            role TEXT NOT NULL DEFAULT 'admin',
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            token_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            created_by TEXT NOT NULL REFERENCES users(id),
            created_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_products_name_owner
            ON products(name, created_by);

        CREATE TABLE IF NOT EXISTS consumers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            country TEXT,
            account_number TEXT NOT NULL,
            created_by TEXT NOT NULL REFERENCES users(id),
            created_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_consumers_email_owner
            ON consumers(email, created_by);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_consumers_account_owner
            ON consumers(account_number, created_by);
        CREATE INDEX IF NOT EXISTS idx_consumers_account ON consumers(account_number);

        CREATE TABLE IF NOT EXISTS licenses (
            id TEXT PRIMARY KEY,
            license_key TEXT NOT NULL UNIQUE,
            product_id TEXT NOT NULL REFERENCES products(id),
            consumer_id TEXT NOT NULL REFERENCES consumers(id),
            license_type TEXT NOT NULL CHECK (license_type IN ('trial', 'full')),
            expires INTEGER,
            active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL REFERENCES users(id),
            created_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_licenses_combination
            ON licenses(license_type, product_id, consumer_id, created_by);
        CREATE INDEX IF NOT EXISTS idx_licenses_key_consumer
            ON licenses(license_key, consumer_id);
        CREATE INDEX IF NOT EXISTS idx_licenses_product ON licenses(product_id);
        CREATE INDEX IF NOT EXISTS idx_licenses_consumer ON licenses(consumer_id);
        ",
    )?;
    Ok(())
}
