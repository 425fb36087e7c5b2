//! HTTP handlers for the books module: a thin mapping from HTTP verbs to
//! catalog operations.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use biblio_http::error::AppError;

use super::models::{BookFilter, BookPayload, BookRecord};
use super::store::Catalog;

/// Build the books router. Mounted by the HTTP gateway under `/books`.
pub fn router(catalog: Catalog) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(catalog)
}

/// GET /: list books, optionally filtered by `search`, `genre`, `author`.
async fn list_books(
    State(catalog): State<Catalog>,
    Query(filter): Query<BookFilter>,
) -> Result<Json<Vec<BookRecord>>, AppError> {
    let books = catalog.list_books(&filter).await?;
    Ok(Json(books))
}

/// GET /{id}: fetch one book or 404.
async fn get_book(
    State(catalog): State<Catalog>,
    Path(id): Path<i64>,
) -> Result<Json<BookRecord>, AppError> {
    let book = catalog
        .get_book(id)
        .await?
        .ok_or_else(|| AppError::not_found("Book not found"))?;
    Ok(Json(book))
}

/// POST /: create a book, resolving author and genre names.
async fn create_book(
    State(catalog): State<Catalog>,
    Json(payload): Json<BookPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let book_id = catalog.create_book(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Book added successfully",
            "bookId": book_id
        })),
    ))
}

/// PUT /{id}: update a book; a missing id yields `changes: 0`, not an error.
async fn update_book(
    State(catalog): State<Catalog>,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<Value>, AppError> {
    let changes = catalog.update_book(id, &payload).await?;
    Ok(Json(json!({
        "message": "Book updated successfully",
        "changes": changes
    })))
}

/// DELETE /{id}: delete a book; a missing id yields `deleted: 0`.
async fn delete_book(
    State(catalog): State<Catalog>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let deleted = catalog.delete_book(id).await?;
    Ok(Json(json!({
        "message": "Book deleted successfully",
        "deleted": deleted
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::BOOKS_SCHEMA;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use biblio_db::Db;
    use tower::ServiceExt;

    async fn seeded_router() -> Router {
        let db = Db::open_in_memory().await.unwrap();
        db.apply_migration("books", "001_init", BOOKS_SCHEMA)
            .await
            .unwrap();
        let catalog = Catalog::new(db);
        catalog.seed_if_empty().await.unwrap();
        router(catalog)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn list_returns_seeded_books() {
        let app = seeded_router().await;

        let response = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let books = body_json(response).await;
        assert_eq!(books.as_array().unwrap().len(), 2);
        assert_eq!(books[0]["Title"], "Harry Potter and the Philosopher's Stone");
        assert_eq!(books[0]["AuthorName"], "J.K. Rowling");
    }

    #[tokio::test]
    async fn genre_filter_returns_only_matching_books() {
        let app = seeded_router().await;

        let response = app.oneshot(get_request("/?genre=Fantasy")).await.unwrap();
        let books = body_json(response).await;

        let books = books.as_array().unwrap();
        assert_eq!(books.len(), 1);
        assert!(books.iter().all(|b| b["GenreName"] == "Fantasy"));
    }

    #[tokio::test]
    async fn empty_query_params_list_everything() {
        let app = seeded_router().await;

        let response = app
            .oneshot(get_request("/?search=&genre=&author="))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let books = body_json(response).await;
        assert_eq!(books.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_missing_book_returns_404_with_message() {
        let app = seeded_router().await;

        let response = app.oneshot(get_request("/9999")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Book not found");
    }

    #[tokio::test]
    async fn post_then_get_round_trips_the_names() {
        let app = seeded_router().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/",
                json!({
                    "title": "The Dispossessed",
                    "authorName": "Ursula K. Le Guin",
                    "genreName": "Science Fiction",
                    "pages": 341,
                    "publishedDate": "1974-05-01"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Book added successfully");
        let book_id = body["bookId"].as_i64().unwrap();

        let response = app
            .oneshot(get_request(&format!("/{}", book_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let book = body_json(response).await;
        assert_eq!(book["AuthorName"], "Ursula K. Le Guin");
        assert_eq!(book["GenreName"], "Science Fiction");
        assert_eq!(book["Pages"], 341);
    }

    #[tokio::test]
    async fn post_against_seeded_store_reuses_author_and_genre() {
        let app = seeded_router().await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/",
                json!({
                    "title": "Animal Farm",
                    "authorName": "George Orwell",
                    "genreName": "Dystopian",
                    "pages": 112,
                    "publishedDate": "1945-08-17"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        let book_id = body["bookId"].as_i64().unwrap();
        // Seeded books occupy ids 1 and 2.
        assert!(book_id > 2);

        // "1984" (book 2) already references the seeded Orwell/Dystopian rows;
        // the new book must point at the same ids.
        let seeded = app
            .clone()
            .oneshot(get_request("/2"))
            .await
            .unwrap();
        let seeded = body_json(seeded).await;

        let created = app
            .oneshot(get_request(&format!("/{}", book_id)))
            .await
            .unwrap();
        let created = body_json(created).await;

        assert_eq!(created["AuthorID"], seeded["AuthorID"]);
        assert_eq!(created["GenreID"], seeded["GenreID"]);
    }

    #[tokio::test]
    async fn post_without_title_returns_500_with_error() {
        let app = seeded_router().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/",
                json!({
                    "authorName": "George Orwell",
                    "genreName": "Dystopian"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn put_missing_id_returns_200_with_zero_changes() {
        let app = seeded_router().await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/9999",
                json!({
                    "title": "Ghost",
                    "authorName": "George Orwell",
                    "genreName": "Dystopian"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Book updated successfully");
        assert_eq!(body["changes"], 0);
    }

    #[tokio::test]
    async fn delete_then_get_returns_404() {
        let app = seeded_router().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Book deleted successfully");
        assert_eq!(body["deleted"], 1);

        let response = app.oneshot(get_request("/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_missing_id_returns_200_with_zero_deleted() {
        let app = seeded_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/9999")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["deleted"], 0);
    }
}
