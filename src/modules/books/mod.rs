pub mod models;
pub mod routes;
pub mod store;

use async_trait::async_trait;
use shelf_kernel::{InitCtx, Migration, Module};

/// Schema for the catalog table. Shared with the store tests so they run
/// against exactly what the migration creates.
pub(crate) const CREATE_BOOK_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS book (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         VARCHAR(255)  NOT NULL,
    author       VARCHAR(1000) NOT NULL,
    publish_date DATE          NOT NULL DEFAULT CURRENT_DATE,
    description  VARCHAR(255)  NOT NULL
);
"#;

/// Book catalog module: CRUD routes over the `book` table.
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

    fn routes(&self, ctx: &InitCtx<'_>) -> axum::Router {
        routes::router(ctx)
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 0 } },
                            { "name": "orderBy", "in": "query", "schema": { "type": "string", "enum": ["name", "author", "publishDate", "id"] } },
                            { "name": "filter", "in": "query", "schema": { "type": "string" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "One page of books with pagination links",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookPage" }
                                    }
                                }
                            },
                            "500": {
                                "description": "Query failed or timed out",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
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
                                "application/x-www-form-urlencoded": {
                                    "schema": { "$ref": "#/components/schemas/BookForm" }
                                }
                            }
                        },
                        "responses": {
                            "303": { "description": "Redirect to the list with a flash message" },
                            "422": {
                                "description": "Validation error with per-field details",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/new": {
                    "get": {
                        "summary": "Blank create form",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Empty field skeleton",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BookForm" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}/edit": {
                    "get": {
                        "summary": "Fetch a book for editing",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                        ],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "404": {
                                "description": "No such book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/{id}": {
                    "post": {
                        "summary": "Update a book",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                        ],
                        "requestBody": {
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": { "$ref": "#/components/schemas/BookForm" }
                                }
                            }
                        },
                        "responses": {
                            "303": { "description": "Redirect to the list with a flash message" },
                            "404": { "description": "No such book" },
                            "422": { "description": "Validation error with per-field details" }
                        }
                    }
                },
                "/{id}/delete": {
                    "post": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                        ],
                        "responses": {
                            "303": { "description": "Redirect to the list with a flash message" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "description": "Unique identifier for the book" },
                            "name": { "type": "string", "description": "Title of the book" },
                            "author": { "type": "string", "description": "Author of the book" },
                            "publish_date": { "type": "string", "format": "date", "description": "Publication date" },
                            "description": { "type": "string", "description": "Short description" }
                        },
                        "required": ["id", "name", "author", "publish_date", "description"]
                    },
                    "BookForm": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "author": { "type": "string" },
                            "publishDate": { "type": "string", "format": "date" },
                            "description": { "type": "string" }
                        },
                        "required": ["name", "author", "publishDate", "description"]
                    },
                    "BookPage": {
                        "type": "object",
                        "properties": {
                            "flash": {
                                "type": "object",
                                "nullable": true,
                                "properties": {
                                    "kind": { "type": "string", "enum": ["success", "error"] },
                                    "message": { "type": "string" }
                                }
                            },
                            "books": {
                                "type": "object",
                                "properties": {
                                    "items": { "type": "array", "items": { "$ref": "#/components/schemas/Book" } },
                                    "page": { "type": "integer" },
                                    "offset": { "type": "integer" },
                                    "total": { "type": "integer" },
                                    "prev": { "type": "integer", "nullable": true },
                                    "next": { "type": "integer", "nullable": true }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: CREATE_BOOK_TABLE,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
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
