pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::AppState;
use crate::handlers::auth::{auth0_callback, login, login_redirect, register};
use crate::handlers::books::{create_book, delete_book, get_book, list_books, update_book};

/// Public catalog reads, authenticated mutations. The authenticate layer
/// wraps only the mutating book routes; policy checks run inside the
/// handlers against the threaded identity.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/books", get(list_books))
        .route("/books/{id}", get(get_book))
        .route("/auth/register", post(register))
        .route("/auth/login", get(login_redirect).post(login))
        .route("/auth/callback", get(auth0_callback));

    let protected = Router::new()
        .route("/books", post(create_book))
        .route("/books/{id}", put(update_book).delete(delete_book))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
