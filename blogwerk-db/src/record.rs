//! Raw row shapes and their conversions into the domain model. Conversion
//! fails if a stored value no longer satisfies the model's validation rules.

use blogwerk_common::model::{
    Id, ModelValidationError,
    auth::AuthSession,
    comment::Comment,
    follow::Follow,
    group::{Group, GroupSlug},
    post::Post,
    user::{User, Username},
};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub post_ids: Vec<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub struct GroupRecord {
    pub group_id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub struct PostRecord {
    pub post_id: i64,
    pub author_username: String,
    pub body: String,
    pub published_at: OffsetDateTime,
    pub image: Option<String>,
    pub group_id: Option<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub struct CommentRecord {
    pub comment_id: i64,
    pub author_username: String,
    pub post_id: i64,
    pub body: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub struct FollowRecord {
    pub follow_id: i64,
    pub follower_username: String,
    pub followee_username: String,
}

#[derive(Clone, Eq, PartialEq, Debug, FromRow)]
pub struct TokenRecord {
    pub user_id: i64,
    pub username: String,
    pub is_staff: bool,
    pub expires_at: Option<OffsetDateTime>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.into(),
            username: Username::new(value.username)?,
            posts: value.post_ids.into_iter().map(Id::new).collect(),
        })
    }
}

impl TryFrom<GroupRecord> for Group {
    type Error = ModelValidationError;

    fn try_from(value: GroupRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.group_id.into(),
            title: value.title,
            slug: GroupSlug::new(value.slug)?,
            description: value.description,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.into(),
            author: Username::new(value.author_username)?,
            text: value.body,
            pub_date: value.published_at,
            image: value.image,
            group: value.group_id.map(Id::new),
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.into(),
            author: Username::new(value.author_username)?,
            post: value.post_id.into(),
            text: value.body,
            created: value.created_at,
        })
    }
}

impl TryFrom<FollowRecord> for Follow {
    type Error = ModelValidationError;

    fn try_from(value: FollowRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.follow_id.into(),
            user: Username::new(value.follower_username)?,
            following: Username::new(value.followee_username)?,
        })
    }
}

impl TryFrom<TokenRecord> for AuthSession {
    type Error = ModelValidationError;

    fn try_from(value: TokenRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.into(),
            username: Username::new(value.username)?,
            staff: value.is_staff,
            expires_at: value.expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{FollowRecord, UserRecord};
    use blogwerk_common::model::{follow::Follow, user::User};

    #[test]
    fn user_record_conversion() {
        let record = UserRecord {
            user_id: 3,
            username: "alice".to_owned(),
            post_ids: vec![10, 11],
        };

        let user = User::try_from(record).unwrap();
        assert_eq!(user.id.get(), 3);
        assert_eq!(user.username.get(), "alice");
        assert_eq!(user.posts.len(), 2);
    }

    #[test]
    fn invalid_stored_username_is_an_error() {
        let record = FollowRecord {
            follow_id: 1,
            follower_username: "alice".to_owned(),
            followee_username: "not valid".to_owned(),
        };

        assert!(Follow::try_from(record).is_err());
    }
}
