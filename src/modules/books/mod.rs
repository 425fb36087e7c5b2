pub mod models;
pub mod routes;
pub mod store;

use async_trait::async_trait;
use axum::Router;
use biblio_db::Db;
use biblio_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use anyhow::Context;
use store::Catalog;

/// Catalog schema. The PascalCase table and column names are served
/// verbatim by the read endpoints.
pub(crate) const BOOKS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Authors (
    AuthorID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS Genres (
    GenreID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    Description TEXT
);

CREATE TABLE IF NOT EXISTS Books (
    BookID INTEGER PRIMARY KEY AUTOINCREMENT,
    Title TEXT NOT NULL,
    AuthorID INTEGER,
    GenreID INTEGER,
    Pages INTEGER,
    PublishedDate DATE,
    FOREIGN KEY(AuthorID) REFERENCES Authors(AuthorID),
    FOREIGN KEY(GenreID) REFERENCES Genres(GenreID)
);
"#;

/// Books module: the bookstore catalog (CRUD plus name-based
/// find-or-create of authors and genres).
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, db: &Db) -> Router {
        routes::router(Catalog::new(db.clone()))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "search",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "string" },
                                "description": "Substring match on title or author name"
                            },
                            {
                                "name": "genre",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "string" },
                                "description": "Exact genre name"
                            },
                            {
                                "name": "author",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "string" },
                                "description": "Exact author name"
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "List of books with author and genre names",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            },
                            "500": {
                                "description": "Internal server error",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/BookInput"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Book created",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "message": { "type": "string" },
                                                "bookId": { "type": "integer" }
                                            },
                                            "required": ["message", "bookId"]
                                        }
                                    }
                                }
                            },
                            "500": {
                                "description": "Internal server error",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book by id",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "integer" }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/Book"
                                        }
                                    }
                                }
                            },
                            "404": {
                                "description": "Book not found",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/NotFoundResponse"
                                        }
                                    }
                                }
                            },
                            "500": {
                                "description": "Internal server error",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "put": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "integer" }
                            }
                        ],
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "$ref": "#/components/schemas/BookInput"
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Update result; changes is 0 when the id does not exist",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "message": { "type": "string" },
                                                "changes": { "type": "integer" }
                                            },
                                            "required": ["message", "changes"]
                                        }
                                    }
                                }
                            },
                            "500": {
                                "description": "Internal server error",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "integer" }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Delete result; deleted is 0 when the id does not exist",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "message": { "type": "string" },
                                                "deleted": { "type": "integer" }
                                            },
                                            "required": ["message", "deleted"]
                                        }
                                    }
                                }
                            },
                            "500": {
                                "description": "Internal server error",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "$ref": "#/components/schemas/ErrorResponse"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "BookID": { "type": "integer" },
                            "Title": { "type": "string" },
                            "AuthorID": { "type": "integer", "nullable": true },
                            "GenreID": { "type": "integer", "nullable": true },
                            "Pages": { "type": "integer", "nullable": true },
                            "PublishedDate": { "type": "string", "nullable": true },
                            "AuthorName": { "type": "string" },
                            "GenreName": { "type": "string" }
                        },
                        "required": ["BookID", "Title", "AuthorName", "GenreName"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "authorName": { "type": "string" },
                            "genreName": { "type": "string" },
                            "pages": { "type": "integer" },
                            "publishedDate": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: BOOKS_SCHEMA,
        }]
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Catalog::new(ctx.db.clone())
            .seed_if_empty()
            .await
            .context("failed to seed the sample catalog")?;

        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}
