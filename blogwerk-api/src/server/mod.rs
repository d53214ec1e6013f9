use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use blogwerk_common::model::{
    Id,
    auth::{TokenDecodeError, TokenHashError},
    comment::CommentMarker,
    follow::SelfFollowError,
    group::GroupMarker,
    post::PostMarker,
    user::{UserMarker, Username},
};
use blogwerk_db::client::{DbClient, DbError};
use json::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

mod auth;
mod json;
mod pagination;
mod routes;

pub use pagination::PaginationConfig;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, Debug, FromRef)]
pub struct ServerState {
    pub db_client: Arc<DbClient>,
    pub pagination: PaginationConfig,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided api token could not be decoded: {0}")]
    InvalidAuthToken(#[from] TokenDecodeError),
    #[error("The api token could not be hashed: {0}")]
    AuthTokenHash(#[from] TokenHashError),
    #[error("Provided token was invalid")]
    InvalidToken,
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Group with id {0} was not found.")]
    GroupByIdNotFound(Id<GroupMarker>),
    #[error("User with id {0} was not found.")]
    UserByIdNotFound(Id<UserMarker>),
    #[error("User {0} was not found.")]
    UserByNameNotFound(Username),
    #[error("Comment with id {1} was not found under post {0}.")]
    CommentByIdNotFound(Id<PostMarker>, Id<CommentMarker>),
    #[error(transparent)]
    SelfFollow(#[from] SelfFollowError),
    #[error("Already following {0}")]
    DuplicateFollow(Username),
    #[error("Text must not be empty")]
    EmptyText,
    #[error("Only the author may modify this resource")]
    NotResourceAuthor,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::GroupByIdNotFound(_)
            | ServerError::UserByIdNotFound(_)
            | ServerError::UserByNameNotFound(_)
            | ServerError::CommentByIdNotFound(_, _) => StatusCode::NOT_FOUND,
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::InvalidToken => StatusCode::UNAUTHORIZED,
            ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::InvalidAuthToken(_)
            | ServerError::SelfFollow(_)
            | ServerError::DuplicateFollow(_)
            | ServerError::EmptyText => StatusCode::BAD_REQUEST,
            ServerError::NotResourceAuthor => StatusCode::FORBIDDEN,
            ServerError::JsonResponse(_)
            | ServerError::Database(_)
            | ServerError::AuthTokenHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let detail = if status.is_server_error() {
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };
        let error_response = ErrorResponse {
            status: status.as_u16(),
            detail,
        };
        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::{ErrorResponse, ServerError};
    use axum::http::{StatusCode, Uri};
    use blogwerk_common::model::{Id, follow::SelfFollowError, user::Username};

    fn username(name: &str) -> Username {
        Username::new(name.to_owned()).unwrap()
    }

    #[test]
    fn not_found_statuses() {
        assert_eq!(
            ServerError::UnknownRoute(Uri::from_static("/nope")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::PostByIdNotFound(Id::new(1)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::UserByNameNotFound(username("ghost")).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn follow_validation_statuses() {
        assert_eq!(
            ServerError::SelfFollow(SelfFollowError).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::DuplicateFollow(username("bob")).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn permission_statuses() {
        assert_eq!(
            ServerError::NotResourceAuthor.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ServerError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn validation_errors_carry_a_readable_detail() {
        use axum::response::IntoResponse;

        let response = ServerError::SelfFollow(SelfFollowError).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error = ServerError::DuplicateFollow(username("bob"));
        assert_eq!(error.to_string(), "Already following bob");
    }

    #[test]
    fn error_response_serializes_as_status_and_detail() {
        let serialized = serde_json::to_string(&ErrorResponse {
            status: 400,
            detail: "Cannot follow yourself".to_owned(),
        })
        .unwrap();

        assert_eq!(
            serialized,
            "{\"status\":400,\"detail\":\"Cannot follow yourself\"}"
        );
    }
}
