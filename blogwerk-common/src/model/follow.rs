use crate::model::{
    Id,
    user::{UserMarker, Username},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub struct FollowMarker;

/// A stored follow edge. `user` receives the content of `following`.
#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Follow {
    pub id: Id<FollowMarker>,
    pub user: Username,
    pub following: Username,
}

#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub struct FollowDraft {
    pub following: Username,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("Cannot follow yourself")]
pub struct SelfFollowError;

/// A follow edge that passed the self-follow check. Constructing one is the
/// only way to hand an edge to the database layer, so an edge with
/// `follower == followee` cannot be persisted.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct FollowRequest {
    follower: Id<UserMarker>,
    followee: Id<UserMarker>,
}

impl FollowRequest {
    pub fn new(
        follower: Id<UserMarker>,
        followee: Id<UserMarker>,
    ) -> Result<Self, SelfFollowError> {
        if follower == followee {
            Err(SelfFollowError)
        } else {
            Ok(Self { follower, followee })
        }
    }

    #[must_use]
    pub fn follower(self) -> Id<UserMarker> {
        self.follower
    }

    #[must_use]
    pub fn followee(self) -> Id<UserMarker> {
        self.followee
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        follow::{FollowRequest, SelfFollowError},
    };

    #[test]
    fn following_yourself_is_rejected() {
        let id = Id::new(1);
        assert_eq!(FollowRequest::new(id, id), Err(SelfFollowError));
    }

    #[test]
    fn following_somebody_else_is_allowed() {
        let request = FollowRequest::new(Id::new(1), Id::new(2)).unwrap();
        assert_eq!(request.follower().get(), 1);
        assert_eq!(request.followee().get(), 2);
    }
}
