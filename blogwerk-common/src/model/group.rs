use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::Display;
use thiserror::Error;

pub const GROUP_SLUG_MAX_LEN: usize = 64;

pub struct GroupMarker;

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Group {
    pub id: Id<GroupMarker>,
    pub title: String,
    pub slug: GroupSlug,
    pub description: String,
}

/// URL-safe unique identifier of a group. Letters, digits, `-` and `_`,
/// at most [`GROUP_SLUG_MAX_LEN`] characters.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupSlug(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
#[error("The group slug is invalid: {0}")]
pub struct InvalidGroupSlugError(String);

impl GroupSlug {
    pub fn new(slug: String) -> Result<Self, InvalidGroupSlugError> {
        let legal_length = !slug.is_empty() && slug.chars().count() <= GROUP_SLUG_MAX_LEN;
        let legal_chars = slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));

        if legal_length && legal_chars {
            Ok(GroupSlug(slug))
        } else {
            Err(InvalidGroupSlugError(slug))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for GroupSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for GroupSlug {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        GroupSlug::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"GroupSlug"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::group::GroupSlug;

    #[test]
    fn legal_slugs() {
        for legal in ["rust", "rust-lang", "blog_posts", "x64"] {
            assert!(GroupSlug::new(legal.to_owned()).is_ok(), "{legal}");
        }
    }

    #[test]
    fn illegal_slugs() {
        for illegal in ["", "with space", "dot.dot", "päck"] {
            assert!(GroupSlug::new(illegal.to_owned()).is_err(), "{illegal}");
        }
    }
}
