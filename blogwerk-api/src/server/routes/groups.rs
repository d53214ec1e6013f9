use crate::server::{
    Result, ServerError, ServerRouter,
    json::Json,
    pagination::{PageQuery, Paginated, PaginationConfig},
};
use axum::extract::{Query, State};
use axum_extra::routing::{RouterExt, TypedPath};
use blogwerk_common::model::{
    Id,
    group::{Group, GroupMarker},
};
use blogwerk_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(list_groups).typed_get(get_group)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/groups", rejection(ServerError))]
struct GroupsPath();

#[derive(TypedPath, Deserialize)]
#[typed_path("/groups/{id}", rejection(ServerError))]
struct GroupPath {
    id: Id<GroupMarker>,
}

async fn list_groups(
    GroupsPath(): GroupsPath,
    State(db): State<Arc<DbClient>>,
    State(pagination): State<PaginationConfig>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Group>>> {
    let page = page.resolve(pagination);

    let count = db.count_groups().await?;
    let results = db.list_groups(page).await?;

    Ok(Json(Paginated { count, results }))
}

async fn get_group(
    GroupPath { id }: GroupPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Group>> {
    let group = db
        .fetch_group(id)
        .await?
        .ok_or(ServerError::GroupByIdNotFound(id))?;

    Ok(Json(group))
}
