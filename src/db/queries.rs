use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Book, CreateBook, UpdateBook, User};

use super::from_row::{query_all, query_one, BOOK_COLS, USER_COLS};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Translate a UNIQUE-constraint failure into a conflict the handler can
/// report as 400, instead of a generic store error.
fn map_constraint(err: rusqlite::Error, message: &str) -> AppError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _)
            if code.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Db(err),
    }
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Users ============

pub fn create_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<User> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO users (id, username, email, password_hash, is_admin, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, username, email, password_hash, is_admin, now],
    )
    .map_err(|e| map_constraint(e, "Username or email already exists"))?;

    Ok(User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        is_admin,
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        [id],
    )
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE username = ?1", USER_COLS),
        [username],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        [email],
    )
}

// ============ Books ============

pub fn create_book(conn: &Connection, input: &CreateBook, created_by: &str) -> Result<Book> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO books (id, title, author, publication_year, isbn,
                            created_at, updated_at, created_by, updated_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &id,
            &input.title,
            &input.author,
            input.publication_year,
            &input.isbn,
            now,
            now,
            created_by,
            created_by,
        ],
    )?;

    Ok(Book {
        id,
        title: input.title.clone(),
        author: input.author.clone(),
        publication_year: input.publication_year,
        isbn: input.isbn.clone(),
        created_at: now,
        updated_at: now,
        created_by: created_by.to_string(),
        updated_by: created_by.to_string(),
    })
}

pub fn get_book_by_id(conn: &Connection, id: &str) -> Result<Option<Book>> {
    query_one(
        conn,
        &format!("SELECT {} FROM books WHERE id = ?1", BOOK_COLS),
        [id],
    )
}

pub fn list_books(conn: &Connection) -> Result<Vec<Book>> {
    query_all(
        conn,
        &format!("SELECT {} FROM books ORDER BY created_at DESC", BOOK_COLS),
        [],
    )
}

pub fn update_book(
    conn: &Connection,
    id: &str,
    input: &UpdateBook,
    updated_by: &str,
) -> Result<bool> {
    UpdateBuilder::new("books", id)
        .with_updated_at()
        .set("updated_by", updated_by.to_string())
        .set_opt("title", input.title.clone())
        .set_opt("author", input.author.clone())
        .set_opt("publication_year", input.publication_year)
        .set_opt("isbn", input.isbn.clone())
        .execute(conn)
}

pub fn delete_book(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}
