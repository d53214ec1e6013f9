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
    group::GroupMarker,
    post::{Post, PostDraft, PostMarker, PostPatch},
};
use blogwerk_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(replace_post)
        .typed_patch(patch_post)
        .typed_delete(delete_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct PostsPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{post_id}", rejection(ServerError))]
struct PostPath {
    post_id: Id<PostMarker>,
}

async fn require_group_exists(db: &DbClient, group: Option<Id<GroupMarker>>) -> Result<()> {
    if let Some(group) = group {
        if db.fetch_group(group).await?.is_none() {
            return Err(ServerError::GroupByIdNotFound(group));
        }
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

async fn list_posts(
    PostsPath(): PostsPath,
    State(db): State<Arc<DbClient>>,
    State(pagination): State<PaginationConfig>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Post>>> {
    let page = page.resolve(pagination);

    let count = db.count_posts().await?;
    let results = db.list_posts(page).await?;

    Ok(Json(Paginated { count, results }))
}

async fn create_post(
    PostsPath(): PostsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, Json<Post>)> {
    require_text(&draft.text)?;
    require_group_exists(&db, draft.group).await?;

    let post = db
        .create_post(user.user_id(), user.username(), &draft)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    PostPath { post_id: id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Post>> {
    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn replace_post(
    PostPath { post_id: id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<PostDraft>,
) -> Result<Json<Post>> {
    let existing = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    if existing.author != *user.username() {
        return Err(ServerError::NotResourceAuthor);
    }

    require_text(&draft.text)?;
    require_group_exists(&db, draft.group).await?;

    let post = db
        .update_post(id, &draft.text, draft.image.as_deref(), draft.group)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn patch_post(
    PostPath { post_id: id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(patch): Json<PostPatch>,
) -> Result<Json<Post>> {
    let existing = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    if existing.author != *user.username() {
        return Err(ServerError::NotResourceAuthor);
    }

    require_group_exists(&db, patch.group).await?;

    let text = patch.text.unwrap_or(existing.text);
    require_text(&text)?;
    let image = patch.image.or(existing.image);
    let group = patch.group.or(existing.group);

    let post = db
        .update_post(id, &text, image.as_deref(), group)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn delete_post(
    PostPath { post_id: id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    let existing = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    if existing.author != *user.username() && !user.is_staff() {
        return Err(ServerError::NotResourceAuthor);
    }

    if !db.delete_post(id).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }

    Ok(StatusCode::NO_CONTENT)
}
