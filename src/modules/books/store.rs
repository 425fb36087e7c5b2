//! Catalog service: book-centric store operations keyed by author and genre
//! names rather than raw identifiers.

use biblio_db::Db;
use sqlx::{QueryBuilder, Sqlite};

use super::models::{BookFilter, BookPayload, BookRecord};

/// Joined read: books whose author or genre reference does not resolve are
/// silently omitted, not reported as errors.
const JOINED_SELECT: &str = "SELECT Books.BookID, Books.Title, Books.AuthorID, Books.GenreID, \
     Books.Pages, Books.PublishedDate, \
     Authors.Name AS AuthorName, Genres.Name AS GenreName \
     FROM Books \
     JOIN Authors ON Books.AuthorID = Authors.AuthorID \
     JOIN Genres ON Books.GenreID = Genres.GenreID";

/// Book-level operations over the store. Cheap to clone; shares the pool.
#[derive(Clone)]
pub struct Catalog {
    db: Db,
}

impl Catalog {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// List joined book rows matching the filter. Conditions combine with
    /// AND; an empty parameter counts as absent. No pagination, insertion
    /// order.
    pub async fn list_books(&self, filter: &BookFilter) -> Result<Vec<BookRecord>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(JOINED_SELECT);
        query.push(" WHERE 1=1");

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            query.push(" AND (Books.Title LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR Authors.Name LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        if let Some(genre) = filter.genre.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND Genres.Name = ");
            query.push_bind(genre.to_string());
        }

        if let Some(author) = filter.author.as_deref().filter(|s| !s.is_empty()) {
            query.push(" AND Authors.Name = ");
            query.push_bind(author.to_string());
        }

        query
            .build_query_as::<BookRecord>()
            .fetch_all(self.db.pool())
            .await
    }

    /// Fetch one joined book row by id.
    pub async fn get_book(&self, id: i64) -> Result<Option<BookRecord>, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new(JOINED_SELECT);
        query.push(" WHERE Books.BookID = ");
        query.push_bind(id);

        query
            .build_query_as::<BookRecord>()
            .fetch_optional(self.db.pool())
            .await
    }

    /// Create a book, resolving author and genre names to ids.
    ///
    /// Find-or-create of the author, find-or-create of the genre, and the
    /// book insert run in one transaction: a failure anywhere rolls the
    /// whole operation back. Returns the new BookID.
    pub async fn create_book(&self, payload: &BookPayload) -> Result<i64, sqlx::Error> {
        let mut tx = self.db.pool().begin().await?;

        let author_id = resolve_author(&mut tx, payload.author_name.as_deref()).await?;
        let genre_id = resolve_genre(&mut tx, payload.genre_name.as_deref()).await?;
        let book_id = insert_book(&mut tx, payload, Some(author_id), Some(genre_id)).await?;

        tx.commit().await?;
        Ok(book_id)
    }

    /// Update a book in a single statement, re-resolving author and genre
    /// ids from their names. An unmatched name sets the reference to NULL
    /// rather than failing. Returns the count of rows changed (0 when the
    /// id does not exist; not an error).
    pub async fn update_book(&self, id: i64, payload: &BookPayload) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE Books \
             SET Title = ?, Pages = ?, PublishedDate = ?, \
                 AuthorID = (SELECT AuthorID FROM Authors WHERE Name = ?), \
                 GenreID = (SELECT GenreID FROM Genres WHERE Name = ?) \
             WHERE BookID = ?",
        )
        .bind(payload.title.as_deref())
        .bind(payload.pages)
        .bind(payload.published_date.as_deref())
        .bind(payload.author_name.as_deref())
        .bind(payload.genre_name.as_deref())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a book. Returns the count of rows changed (0 when the id does
    /// not exist; not an error).
    pub async fn delete_book(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM Books WHERE BookID = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Seed the sample catalog into a freshly created database.
    pub async fn seed_if_empty(&self) -> Result<(), sqlx::Error> {
        let authors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Authors")
            .fetch_one(self.db.pool())
            .await?;
        if authors > 0 {
            return Ok(());
        }

        let mut tx = self.db.pool().begin().await?;

        let rowling = insert_author(&mut tx, Some("J.K. Rowling")).await?;
        let orwell = insert_author(&mut tx, Some("George Orwell")).await?;
        let fantasy = insert_genre(
            &mut tx,
            "Fantasy",
            Some("Imaginative fiction involving magic"),
        )
        .await?;
        let dystopian = insert_genre(
            &mut tx,
            "Dystopian",
            Some("Fictional societies with oppressive social control"),
        )
        .await?;

        let potter = BookPayload {
            title: Some("Harry Potter and the Philosopher's Stone".to_string()),
            pages: Some(223),
            published_date: Some("1997-06-26".to_string()),
            ..Default::default()
        };
        insert_book(&mut tx, &potter, Some(rowling), Some(fantasy)).await?;

        let nineteen_eighty_four = BookPayload {
            title: Some("1984".to_string()),
            pages: Some(328),
            published_date: Some("1949-06-08".to_string()),
            ..Default::default()
        };
        insert_book(&mut tx, &nineteen_eighty_four, Some(orwell), Some(dystopian)).await?;

        tx.commit().await?;
        tracing::info!(target: "biblio-books", "seeded sample catalog");
        Ok(())
    }
}

/// Find an author id by name, inserting the author when absent.
///
/// A NULL name never matches the lookup and then trips the `Name NOT NULL`
/// constraint on insert, surfacing as a store error.
async fn resolve_author(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    name: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT AuthorID FROM Authors WHERE Name = ?")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;

    match existing {
        Some(id) => Ok(id),
        None => insert_author(tx, name).await,
    }
}

/// Find a genre id by name, inserting the genre (without a description)
/// when absent.
async fn resolve_genre(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    name: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT GenreID FROM Genres WHERE Name = ?")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?;

    match existing {
        Some(id) => Ok(id),
        None => {
            let result = sqlx::query("INSERT INTO Genres (Name) VALUES (?)")
                .bind(name)
                .execute(&mut **tx)
                .await?;
            Ok(result.last_insert_rowid())
        }
    }
}

async fn insert_author(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    name: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO Authors (Name) VALUES (?)")
        .bind(name)
        .execute(&mut **tx)
        .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_genre(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    name: &str,
    description: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO Genres (Name, Description) VALUES (?, ?)")
        .bind(name)
        .bind(description)
        .execute(&mut **tx)
        .await?;
    Ok(result.last_insert_rowid())
}

async fn insert_book(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    payload: &BookPayload,
    author_id: Option<i64>,
    genre_id: Option<i64>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO Books (Title, AuthorID, GenreID, Pages, PublishedDate) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(payload.title.as_deref())
    .bind(author_id)
    .bind(genre_id)
    .bind(payload.pages)
    .bind(payload.published_date.as_deref())
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}
