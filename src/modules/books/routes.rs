use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::json;

use shelf_db::{run_with_deadline, DeadlineError};
use shelf_http::cache::ResponseCache;
use shelf_http::error::AppError;
use shelf_http::flash::{redirect_with_flash, Flash, FlashKind, Notice};
use shelf_kernel::InitCtx;

use super::models::{Book, BookForm, BookSort};
use super::store::{BookStore, DEFAULT_PAGE_SIZE};

/// Where write endpoints send the browser after a redirect.
const LIST_PATH: &str = "/api/books";

/// Shared handler state, constructed once when the module is mounted.
#[derive(Clone)]
pub struct BooksCtx {
    store: BookStore,
    cache: Arc<ResponseCache>,
    cache_enabled: bool,
    query_deadline: Duration,
}

pub fn router(ctx: &InitCtx<'_>) -> Router {
    let state = BooksCtx {
        store: BookStore::new(ctx.db.clone()),
        cache: Arc::new(ResponseCache::new(ctx.settings.cache.ttl())),
        cache_enabled: ctx.settings.cache.enabled,
        query_deadline: ctx.settings.database.query_deadline(),
    };

    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/new", get(new_book))
        .route("/{id}/edit", get(edit_book))
        .route("/{id}", post(update_book))
        .route("/{id}/delete", post(delete_book))
        .with_state(state)
}

/// Query parameters accepted by the list endpoint. Unknown `orderBy`
/// values fail deserialization and never reach the store.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    order_by: BookSort,
    filter: Option<String>,
    flash: Option<FlashKind>,
    notice: Option<Notice>,
}

impl ListParams {
    fn like_pattern(&self) -> String {
        match self.filter.as_deref() {
            Some(filter) if !filter.is_empty() => format!("%{filter}%"),
            _ => "%".to_string(),
        }
    }
}

/// Paginated, filterable, sortable catalog listing.
///
/// The store call runs under the query deadline; the rendered page body is
/// memoized by request parameters (flash excluded, so a redirect never
/// poisons the cache).
async fn list_books(
    State(ctx): State<BooksCtx>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let flash = Flash::resolve(params.flash, params.notice);
    let pattern = params.like_pattern();
    let key = format!(
        "books:list:page={}:order={}:filter={}",
        params.page,
        params.order_by.column(),
        pattern
    );

    let cached = if ctx.cache_enabled {
        ctx.cache.get(&key)
    } else {
        None
    };

    let listing = match cached {
        Some(listing) => listing,
        None => {
            let store = ctx.store.clone();
            let page = params.page;
            let sort = params.order_by;
            let like = pattern.clone();

            let outcome = run_with_deadline(
                async move { store.list(page, DEFAULT_PAGE_SIZE, sort, &like).await },
                ctx.query_deadline,
            )
            .await;

            let page = match outcome {
                Ok(Ok(page)) => page,
                Ok(Err(err)) => {
                    return Err(AppError::internal(
                        anyhow::Error::new(err).context("book list query failed"),
                    ));
                }
                Err(DeadlineError::Elapsed(deadline)) => {
                    tracing::error!(
                        deadline_ms = deadline.as_millis() as u64,
                        "book list query exceeded its deadline"
                    );
                    return Err(AppError::timeout("the catalog query timed out"));
                }
                Err(err) => return Err(AppError::internal(err)),
            };

            let listing = serde_json::to_value(&page).map_err(AppError::internal)?;
            if ctx.cache_enabled {
                ctx.cache.insert(key, listing.clone());
            }
            listing
        }
    };

    Ok(Json(json!({ "flash": flash, "books": listing })))
}

/// Blank field skeleton for the create form.
async fn new_book() -> Json<BookForm> {
    Json(BookForm::default())
}

/// Record payload for the edit form, or 404.
async fn edit_book(
    State(ctx): State<BooksCtx>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    let book = ctx.store.find_by_id(id).await.map_err(|err| {
        AppError::internal(anyhow::Error::new(err).context("book lookup failed"))
    })?;

    book.map(Json)
        .ok_or_else(|| AppError::not_found(format!("book {id} does not exist")))
}

/// Validate and insert, then redirect to the list with a flash message.
async fn create_book(
    State(ctx): State<BooksCtx>,
    Form(form): Form<BookForm>,
) -> Result<Response, AppError> {
    let input = form
        .validate()
        .map_err(|details| AppError::validation(details, "book form has invalid fields"))?;

    match ctx.store.insert(&input).await {
        Ok(id) => {
            tracing::info!(id = ?id, name = %input.name, "book created");
            Ok(redirect_with_flash(LIST_PATH, FlashKind::Success, Notice::Created).into_response())
        }
        Err(err) => {
            tracing::error!(error = %err, "book insert failed");
            Ok(
                redirect_with_flash(LIST_PATH, FlashKind::Error, Notice::StoreFailed)
                    .into_response(),
            )
        }
    }
}

/// Validate and update by id, then redirect; an unknown id is a 404.
async fn update_book(
    State(ctx): State<BooksCtx>,
    Path(id): Path<i64>,
    Form(form): Form<BookForm>,
) -> Result<Response, AppError> {
    let input = form
        .validate()
        .map_err(|details| AppError::validation(details, "book form has invalid fields"))?;

    match ctx.store.update(id, &input).await {
        Ok(0) => Err(AppError::not_found(format!("book {id} does not exist"))),
        Ok(_) => {
            tracing::info!(id, name = %input.name, "book updated");
            Ok(redirect_with_flash(LIST_PATH, FlashKind::Success, Notice::Updated).into_response())
        }
        Err(err) => {
            tracing::error!(id, error = %err, "book update failed");
            Ok(
                redirect_with_flash(LIST_PATH, FlashKind::Error, Notice::StoreFailed)
                    .into_response(),
            )
        }
    }
}

/// Delete by id and redirect; deleting a missing row flashes an error
/// instead of failing the request.
async fn delete_book(
    State(ctx): State<BooksCtx>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    match ctx.store.delete(id).await {
        Ok(0) => {
            Ok(redirect_with_flash(LIST_PATH, FlashKind::Error, Notice::Missing).into_response())
        }
        Ok(_) => {
            tracing::info!(id, "book deleted");
            Ok(redirect_with_flash(LIST_PATH, FlashKind::Success, Notice::Deleted).into_response())
        }
        Err(err) => {
            tracing::error!(id, error = %err, "book delete failed");
            Ok(
                redirect_with_flash(LIST_PATH, FlashKind::Error, Notice::StoreFailed)
                    .into_response(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::LOCATION, StatusCode};
    use time::macros::date;

    use crate::modules::books::models::BookInput;

    async fn test_ctx() -> BooksCtx {
        let db = shelf_db::connect("sqlite::memory:", 1).await.unwrap();
        sqlx::raw_sql(crate::modules::books::CREATE_BOOK_TABLE)
            .execute(&db)
            .await
            .unwrap();

        BooksCtx {
            store: BookStore::new(db),
            cache: Arc::new(ResponseCache::unbounded()),
            cache_enabled: true,
            query_deadline: Duration::from_secs(5),
        }
    }

    fn dune() -> BookInput {
        BookInput {
            name: "Dune".to_string(),
            author: "Herbert".to_string(),
            publish_date: date!(1965 - 01 - 01),
            description: "Sci-fi".to_string(),
        }
    }

    fn valid_form() -> BookForm {
        BookForm {
            name: "Dune".to_string(),
            author: "Herbert".to_string(),
            publish_date: "1965-01-01".to_string(),
            description: "Sci-fi".to_string(),
        }
    }

    #[tokio::test]
    async fn list_renders_page_and_no_flash() {
        let ctx = test_ctx().await;
        ctx.store.insert(&dune()).await.unwrap();

        let Json(body) = list_books(State(ctx), Query(ListParams::default()))
            .await
            .unwrap();

        assert_eq!(body["flash"], serde_json::Value::Null);
        assert_eq!(body["books"]["total"], 1);
        assert_eq!(body["books"]["items"][0]["name"], "Dune");
    }

    #[tokio::test]
    async fn list_resolves_flash_from_redirect_params() {
        let ctx = test_ctx().await;

        let params = ListParams {
            flash: Some(FlashKind::Success),
            notice: Some(Notice::Created),
            ..ListParams::default()
        };
        let Json(body) = list_books(State(ctx), Query(params)).await.unwrap();

        assert_eq!(body["flash"]["kind"], "success");
        assert_eq!(body["flash"]["message"], "Book created.");
    }

    #[tokio::test]
    async fn second_identical_list_is_served_from_cache() {
        let ctx = test_ctx().await;
        ctx.store.insert(&dune()).await.unwrap();

        let Json(first) = list_books(State(ctx.clone()), Query(ListParams::default()))
            .await
            .unwrap();

        // A write after the first render is invisible to the cached page.
        ctx.store.insert(&dune()).await.unwrap();

        let Json(second) = list_books(State(ctx), Query(ListParams::default()))
            .await
            .unwrap();
        assert_eq!(first["books"], second["books"]);
        assert_eq!(second["books"]["total"], 1);
    }

    #[tokio::test]
    async fn edit_unknown_id_is_not_found() {
        let ctx = test_ctx().await;

        let err = edit_book(State(ctx), Path(999)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn create_with_invalid_form_never_touches_the_store() {
        let ctx = test_ctx().await;

        let err = create_book(State(ctx.clone()), Form(BookForm::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(ctx.store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_redirects_with_success_flash() {
        let ctx = test_ctx().await;

        let response = create_book(State(ctx.clone()), Form(valid_form()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/api/books?flash=success&notice=created");
        assert_eq!(ctx.store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let ctx = test_ctx().await;

        let err = update_book(State(ctx), Path(999), Form(valid_form()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_missing_row_redirects_with_error_flash() {
        let ctx = test_ctx().await;

        let response = delete_book(State(ctx), Path(999)).await.unwrap();
        let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/api/books?flash=error&notice=missing");
    }

    #[tokio::test]
    async fn delete_existing_row_redirects_with_success_flash() {
        let ctx = test_ctx().await;
        let id = ctx.store.insert(&dune()).await.unwrap().unwrap();

        let response = delete_book(State(ctx.clone()), Path(id)).await.unwrap();
        let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
        assert_eq!(location, "/api/books?flash=success&notice=deleted");
        assert_eq!(ctx.store.find_by_id(id).await.unwrap(), None);
    }
}
