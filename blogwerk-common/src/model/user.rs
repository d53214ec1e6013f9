use crate::model::{Id, post::PostMarker};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::Display;
use thiserror::Error;

pub const USERNAME_MAX_LEN: usize = 150;

pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub posts: Vec<Id<PostMarker>>,
}

/// Unique human-readable alias for a user. Letters, digits and `@.+-_`,
/// at most [`USERNAME_MAX_LEN`] characters.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
#[error("The username is invalid: {0}")]
pub struct InvalidUsernameError(String);

impl Username {
    pub fn new(username: String) -> Result<Self, InvalidUsernameError> {
        let legal_length =
            !username.is_empty() && username.chars().count() <= USERNAME_MAX_LEN;
        let legal_chars = username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));

        if legal_length && legal_chars {
            Ok(Username(username))
        } else {
            Err(InvalidUsernameError(username))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Username::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"Username"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::user::{USERNAME_MAX_LEN, Username};

    #[test]
    fn legal_usernames() {
        for legal in ["alice", "bob-42", "mail@example.com", "a.b+c_d", "7"] {
            assert!(Username::new(legal.to_owned()).is_ok(), "{legal}");
        }
    }

    #[test]
    fn illegal_usernames() {
        let too_long = "a".repeat(USERNAME_MAX_LEN + 1);

        for illegal in ["", "white space", "semi;colon", "умлаут", too_long.as_str()] {
            assert!(Username::new(illegal.to_owned()).is_err(), "{illegal}");
        }
    }

    #[test]
    fn deserializing_validates() {
        let parsed: Username = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(parsed.get(), "alice");

        assert!(serde_json::from_str::<Username>("\"no spaces\"").is_err());
    }
}
