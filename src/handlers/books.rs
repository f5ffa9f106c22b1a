use axum::extract::{Extension, State};
use axum::http::StatusCode;
use rusqlite::Connection;

use crate::auth::Identity;
use crate::config::MutationPolicy;
use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::models::{Book, CreateBook, UpdateBook};

#[derive(serde::Deserialize)]
pub struct BookPath {
    pub id: String,
}

/// Admin-policy gate: the verified subject must resolve to a stored user
/// with the admin flag.
fn require_admin(conn: &Connection, identity: &Identity) -> Result<()> {
    let user = queries::get_user_by_username(conn, &identity.subject)?;
    match user {
        Some(user) if user.is_admin => Ok(()),
        _ => Err(AppError::Forbidden("Admins only".into())),
    }
}

/// Policy check for update/delete on an existing record.
fn authorize_mutation(
    state: &AppState,
    conn: &Connection,
    identity: &Identity,
    book: &Book,
) -> Result<()> {
    match state.mutation_policy {
        MutationPolicy::AdminRole => require_admin(conn, identity),
        MutationPolicy::Owner => {
            if book.created_by == identity.subject {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "Only the creator may modify this book".into(),
                ))
            }
        }
    }
}

fn validate_create(input: &CreateBook) -> Result<()> {
    for (field, value) in [
        ("title", &input.title),
        ("author", &input.author),
        ("isbn", &input.isbn),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("'{}' must not be empty", field)));
        }
    }
    Ok(())
}

/// Same emptiness rules as create, applied to whichever fields the
/// partial update provides.
fn validate_update(input: &UpdateBook) -> Result<()> {
    for (field, value) in [
        ("title", input.title.as_deref()),
        ("author", input.author.as_deref()),
        ("isbn", input.isbn.as_deref()),
    ] {
        if let Some(value) = value {
            if value.trim().is_empty() {
                return Err(AppError::BadRequest(format!("'{}' must not be empty", field)));
            }
        }
    }
    Ok(())
}

pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<Book>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_books(&conn)?))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(path): Path<BookPath>,
) -> Result<Json<Book>> {
    let conn = state.db.get()?;
    let book = queries::get_book_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))?;
    Ok(Json(book))
}

pub async fn create_book(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<CreateBook>,
) -> Result<(StatusCode, Json<Book>)> {
    validate_create(&input)?;

    let conn = state.db.get()?;

    // Under the ownership policy any verified identity may create;
    // the admin policy gates creation too.
    if state.mutation_policy == MutationPolicy::AdminRole {
        require_admin(&conn, &identity)?;
    }

    let book = queries::create_book(&conn, &input, &identity.subject)?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(path): Path<BookPath>,
    Json(input): Json<UpdateBook>,
) -> Result<Json<Book>> {
    let conn = state.db.get()?;

    let existing = queries::get_book_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))?;

    authorize_mutation(&state, &conn, &identity, &existing)?;
    validate_update(&input)?;

    queries::update_book(&conn, &path.id, &input, &identity.subject)?;

    let book = queries::get_book_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))?;
    Ok(Json(book))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(path): Path<BookPath>,
) -> Result<StatusCode> {
    let conn = state.db.get()?;

    let existing = queries::get_book_by_id(&conn, &path.id)?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))?;

    authorize_mutation(&state, &conn, &identity, &existing)?;

    queries::delete_book(&conn, &path.id)?;
    Ok(StatusCode::NO_CONTENT)
}
