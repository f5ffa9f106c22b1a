use std::sync::Arc;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::auth::TokenVerifier;
use crate::config::{Auth0Config, AuthStrategy, MutationPolicy};
use crate::error::Result;

mod from_row;
pub mod queries;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub verifier: Arc<TokenVerifier>,
    pub auth_strategy: AuthStrategy,
    pub mutation_policy: MutationPolicy,
    pub auth0: Option<Auth0Config>,
    pub base_url: String,
}

pub fn init_pool(path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path);
    Ok(r2d2::Pool::new(manager)?)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            publication_year INTEGER,
            isbn TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            created_by TEXT NOT NULL,
            updated_by TEXT NOT NULL
        );",
    )?;
    Ok(())
}
