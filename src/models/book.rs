use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub publication_year: Option<i32>,
    pub isbn: String,
    pub created_at: i64,
    pub updated_at: i64,
    /// Subject of the identity that created the record; the ownership
    /// policy compares against this on update/delete.
    pub created_by: String,
    pub updated_by: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publication_year: Option<i32>,
    pub isbn: String,
}

/// Partial update: absent fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_year: Option<i32>,
    pub isbn: Option<String>,
}
