//! Catalog HTTP Routes
//!
//! List endpoints run the query pipeline; each request gets a child of the
//! server's shutdown token so in-flight queries stop on shutdown.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{Book, Chapter, CatalogError, NewChapter, Story, Tag};
use crate::query::{PagedResult, QueryError, QueryRequest, QuerySource};

use super::errors::{ApiError, ApiResult};
use super::server::AppState;

/// Routes under `/api/v1`
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/stories", get(list_stories))
        .route("/stories/:id", get(get_story))
        .route("/stories/:id/books", get(list_story_books))
        .route("/books", get(list_books))
        .route("/books/:id", get(get_book))
        .route("/books/:id/chapters", get(list_book_chapters).post(submit_chapter))
        .route("/chapters", get(list_chapters))
        .route("/chapters/:id", get(get_chapter))
        .route("/tags", get(list_tags))
        .route("/tags/:id", get(get_tag))
}

type Params = Query<HashMap<String, String>>;
type Page = Json<PagedResult<Value>>;

async fn run_list<S: QuerySource>(
    state: &AppState,
    source: S,
    params: &HashMap<String, String>,
) -> ApiResult<Page> {
    let request = QueryRequest::from_params(params, &state.limits).map_err(QueryError::from)?;
    let cancel = state.shutdown.child_token();
    let page = state.pipeline.execute(source, &request, &cancel).await?;
    Ok(Json(page))
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidId(raw.to_string()))
}

// ==================
// Lists
// ==================

async fn list_stories(State(state): State<AppState>, Query(params): Params) -> ApiResult<Page> {
    run_list(&state, state.catalog.stories(), &params).await
}

async fn list_books(State(state): State<AppState>, Query(params): Params) -> ApiResult<Page> {
    run_list(&state, state.catalog.books()?, &params).await
}

async fn list_chapters(State(state): State<AppState>, Query(params): Params) -> ApiResult<Page> {
    run_list(&state, state.catalog.chapters()?, &params).await
}

async fn list_tags(State(state): State<AppState>, Query(params): Params) -> ApiResult<Page> {
    run_list(&state, state.catalog.tags(), &params).await
}

async fn list_story_books(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Params,
) -> ApiResult<Page> {
    let books = state.catalog.books_of_story(parse_id(&id)?)?;
    run_list(&state, books, &params).await
}

async fn list_book_chapters(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Params,
) -> ApiResult<Page> {
    let chapters = state.catalog.chapters_of_book(parse_id(&id)?)?;
    run_list(&state, chapters, &params).await
}

// ==================
// Lookups
// ==================

async fn get_story(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Story>> {
    Ok(Json(state.catalog.story(parse_id(&id)?)?))
}

async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Book>> {
    Ok(Json(state.catalog.book(parse_id(&id)?)?))
}

async fn get_chapter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Chapter>> {
    Ok(Json(state.catalog.chapter(parse_id(&id)?)?))
}

async fn get_tag(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Tag>> {
    Ok(Json(state.catalog.tag(parse_id(&id)?)?))
}

// ==================
// Submission
// ==================

async fn submit_chapter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NewChapter>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Chapter>)> {
    let book_id = parse_id(&id)?;
    let Json(submission) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;

    match state.catalog.submit_chapter(book_id, submission) {
        Ok(chapter) => {
            state.metrics.increment_chapters_submitted();
            Ok((StatusCode::CREATED, Json(chapter)))
        }
        Err(err) => {
            if matches!(err, CatalogError::Rejected(_)) {
                state.metrics.increment_chapters_rejected();
            }
            Err(err.into())
        }
    }
}
