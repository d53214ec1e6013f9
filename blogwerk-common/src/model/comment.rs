use crate::model::{Id, post::PostMarker, user::Username};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub author: Username,
    pub post: Id<PostMarker>,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub struct CommentDraft {
    pub text: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentPatch {
    pub text: Option<String>,
}
