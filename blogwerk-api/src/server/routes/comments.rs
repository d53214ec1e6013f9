use crate::server::{
    Result, ServerError, ServerRouter,
    auth::AuthenticatedUser,
    json::Json,
    pagination::{PageQuery, Paginated, PaginationConfig},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use axum_extra::routing::{RouterExt, TypedPath};
use blogwerk_common::model::{
    Id,
    comment::{Comment, CommentDraft, CommentMarker, CommentPatch},
    post::PostMarker,
};
use blogwerk_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_post(create_comment)
        .typed_get(get_comment)
        .typed_put(replace_comment)
        .typed_patch(patch_comment)
        .typed_delete(delete_comment)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comments", rejection(ServerError))]
struct CommentsPath {
    post_id: Id<PostMarker>,
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}/comments/{id}", rejection(ServerError))]
struct CommentPath {
    post_id: Id<PostMarker>,
    id: Id<CommentMarker>,
}

async fn require_post_exists(db: &DbClient, post_id: Id<PostMarker>) -> Result<()> {
    if db.fetch_post(post_id).await?.is_none() {
        return Err(ServerError::PostByIdNotFound(post_id));
    }

    Ok(())
}

fn require_text(text: &str) -> Result<()> {
    if text.is_empty() {
        Err(ServerError::EmptyText)
    } else {
        Ok(())
    }
}

async fn list_comments(
    CommentsPath { post_id }: CommentsPath,
    State(db): State<Arc<DbClient>>,
    State(pagination): State<PaginationConfig>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Comment>>> {
    require_post_exists(&db, post_id).await?;
    let page = page.resolve(pagination);

    let count = db.count_comments(post_id).await?;
    let results = db.list_comments(post_id, page).await?;

    Ok(Json(Paginated { count, results }))
}

async fn create_comment(
    CommentsPath { post_id }: CommentsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<CommentDraft>,
) -> Result<(StatusCode, Json<Comment>)> {
    require_post_exists(&db, post_id).await?;
    require_text(&draft.text)?;

    let comment = db
        .create_comment(post_id, user.user_id(), user.username(), &draft)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_comment(
    CommentPath { post_id, id }: CommentPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Comment>> {
    let comment = db
        .fetch_comment(post_id, id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(post_id, id))?;

    Ok(Json(comment))
}

async fn replace_comment(
    CommentPath { post_id, id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<CommentDraft>,
) -> Result<Json<Comment>> {
    let existing = db
        .fetch_comment(post_id, id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(post_id, id))?;
    if existing.author != *user.username() {
        return Err(ServerError::NotResourceAuthor);
    }

    require_text(&draft.text)?;

    let comment = db
        .update_comment(post_id, id, &draft.text)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(post_id, id))?;

    Ok(Json(comment))
}

async fn patch_comment(
    CommentPath { post_id, id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(patch): Json<CommentPatch>,
) -> Result<Json<Comment>> {
    let existing = db
        .fetch_comment(post_id, id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(post_id, id))?;
    if existing.author != *user.username() {
        return Err(ServerError::NotResourceAuthor);
    }

    let text = patch.text.unwrap_or(existing.text);
    require_text(&text)?;

    let comment = db
        .update_comment(post_id, id, &text)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(post_id, id))?;

    Ok(Json(comment))
}

async fn delete_comment(
    CommentPath { post_id, id }: CommentPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    let existing = db
        .fetch_comment(post_id, id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(post_id, id))?;
    if existing.author != *user.username() && !user.is_staff() {
        return Err(ServerError::NotResourceAuthor);
    }

    if !db.delete_comment(post_id, id).await? {
        return Err(ServerError::CommentByIdNotFound(post_id, id));
    }

    Ok(StatusCode::NO_CONTENT)
}
