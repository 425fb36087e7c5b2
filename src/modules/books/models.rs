use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A book row joined with its author and genre names.
///
/// Field names on the wire keep the store's column naming (`BookID`,
/// `AuthorName`, ...), which is the shape every read endpoint serves.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookRecord {
    #[serde(rename = "BookID")]
    #[sqlx(rename = "BookID")]
    pub book_id: i64,
    #[serde(rename = "Title")]
    #[sqlx(rename = "Title")]
    pub title: String,
    #[serde(rename = "AuthorID")]
    #[sqlx(rename = "AuthorID")]
    pub author_id: Option<i64>,
    #[serde(rename = "GenreID")]
    #[sqlx(rename = "GenreID")]
    pub genre_id: Option<i64>,
    #[serde(rename = "Pages")]
    #[sqlx(rename = "Pages")]
    pub pages: Option<i64>,
    #[serde(rename = "PublishedDate")]
    #[sqlx(rename = "PublishedDate")]
    pub published_date: Option<String>,
    #[serde(rename = "AuthorName")]
    #[sqlx(rename = "AuthorName")]
    pub author_name: String,
    #[serde(rename = "GenreName")]
    #[sqlx(rename = "GenreName")]
    pub genre_name: String,
}

/// Request body for creating or updating a book.
///
/// Every field is optional; missing fields flow through to the store as
/// NULLs and surface as constraint errors or null columns, never as a
/// validation response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub genre_name: Option<String>,
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub published_date: Option<String>,
}

/// Collection filter, taken verbatim from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub author: Option<String>,
}
