use crate::model::{Id, group::GroupMarker, user::Username};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: Username,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub pub_date: OffsetDateTime,
    pub image: Option<String>,
    pub group: Option<Id<GroupMarker>>,
}

/// Client-supplied post content. The author is never part of the body, it is
/// always taken from the authenticated requester.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub struct PostDraft {
    pub text: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub group: Option<Id<GroupMarker>>,
}

/// Partial update. Omitted fields keep their current value; clearing `image`
/// or `group` requires a full replace via `PUT`.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostPatch {
    pub text: Option<String>,
    pub image: Option<String>,
    pub group: Option<Id<GroupMarker>>,
}
