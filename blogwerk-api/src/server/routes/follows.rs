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
use blogwerk_common::model::follow::{Follow, FollowDraft, FollowRequest};
use blogwerk_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_follows)
        .typed_post(create_follow)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/follows", rejection(ServerError))]
struct FollowsPath();

/// Exact-match filter against the followee's or the follower's username. As
/// listings are already pinned to the requester, the follower arm only ever
/// confirms the requester's own name.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
struct FollowSearchQuery {
    search: Option<String>,
}

async fn list_follows(
    FollowsPath(): FollowsPath,
    State(db): State<Arc<DbClient>>,
    State(pagination): State<PaginationConfig>,
    user: AuthenticatedUser,
    Query(search): Query<FollowSearchQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Follow>>> {
    let page = page.resolve(pagination);
    let search = search.search.as_deref();

    let count = db.count_follows(user.user_id(), search).await?;
    let results = db.list_follows(user.user_id(), search, page).await?;

    Ok(Json(Paginated { count, results }))
}

async fn create_follow(
    FollowsPath(): FollowsPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
    Json(draft): Json<FollowDraft>,
) -> Result<(StatusCode, Json<Follow>)> {
    let followee = db
        .fetch_user_id_by_username(&draft.following)
        .await?
        .ok_or_else(|| ServerError::UserByNameNotFound(draft.following.clone()))?;

    let request = FollowRequest::new(user.user_id(), followee)?;

    if db.follow_exists(&request).await? {
        return Err(ServerError::DuplicateFollow(draft.following));
    }

    let Some(id) = db.create_follow(&request).await? else {
        // Lost the race against a concurrent identical create.
        return Err(ServerError::DuplicateFollow(draft.following));
    };

    let follow = Follow {
        id,
        user: user.username().clone(),
        following: draft.following,
    };

    Ok((StatusCode::CREATED, Json(follow)))
}
