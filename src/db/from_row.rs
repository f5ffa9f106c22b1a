//! Row-mapping helpers. Each model declares its column list once; queries
//! interpolate the list so SELECT order and `from_row` order cannot drift.

use rusqlite::{Connection, Params, Row};

use crate::error::Result;
use crate::models::{Book, User};

pub const USER_COLS: &str = "id, username, email, password_hash, is_admin, created_at";

pub const BOOK_COLS: &str =
    "id, title, author, publication_year, isbn, created_at, updated_at, created_by, updated_by";

pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl FromRow for User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            is_admin: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Book {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            publication_year: row.get(3)?,
            isbn: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            created_by: row.get(7)?,
            updated_by: row.get(8)?,
        })
    }
}

pub fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params, |row| T::from_row(row))?;
    Ok(rows.next().transpose()?)
}

pub fn query_all<T: FromRow, P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
}
