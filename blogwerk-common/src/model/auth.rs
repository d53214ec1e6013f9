//! Bearer token scheme: the client keeps the raw token, the server only ever
//! stores an argon2 hash of it.
//!
//! A token string is `<user id>.<secret>.<salt>` with the two binary parts
//! encoded as unpadded url-safe base64.

use crate::model::{
    Id,
    user::{UserMarker, Username},
};
use argon2::{Argon2, Params};
use base64::{DecodeError, Engine, display::Base64Display, prelude::BASE64_URL_SAFE_NO_PAD};
use std::{
    fmt::{Debug, Formatter},
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

pub const TOKEN_SECRET_LEN: usize = 32;
pub const TOKEN_SALT_LEN: usize = 16;
pub const TOKEN_HASH_LEN: usize = Params::DEFAULT_OUTPUT_LEN;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing the api token failed: {0}")]
pub struct TokenHashError(argon2::Error);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum TokenDecodeError {
    #[error("Not enough parts separated by '.'")]
    NotEnoughParts,
    #[error("Invalid user id: {0}")]
    InvalidUserId(ParseIntError),
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The length of the secret part is incorrect")]
    InvalidSecretLength,
    #[error("The length of the salt part is incorrect")]
    InvalidSaltLength,
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ApiToken {
    pub user_id: Id<UserMarker>,
    pub secret: [u8; TOKEN_SECRET_LEN],
    pub salt: [u8; TOKEN_SALT_LEN],
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct TokenHash([u8; TOKEN_HASH_LEN]);

impl ApiToken {
    #[must_use]
    pub fn generate_random(user_id: Id<UserMarker>) -> Self {
        Self {
            user_id,
            secret: rand::random(),
            salt: rand::random(),
        }
    }

    /// The string handed to the client, to be sent back as a bearer token.
    #[must_use]
    pub fn as_token_str(&self) -> String {
        let user_id = self.user_id;
        let secret = Base64Display::new(&self.secret, &BASE64_URL_SAFE_NO_PAD);
        let salt = Base64Display::new(&self.salt, &BASE64_URL_SAFE_NO_PAD);

        format!("{user_id}.{secret}.{salt}")
    }

    pub fn hash(&self) -> Result<TokenHash, TokenHashError> {
        let argon2 = Argon2::default();

        let mut hash = [0; TOKEN_HASH_LEN];
        argon2
            .hash_password_into(&self.secret, &self.salt, &mut hash)
            .map_err(TokenHashError)?;

        Ok(TokenHash(hash))
    }
}

impl FromStr for ApiToken {
    type Err = TokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');

        let user_id_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;
        let secret_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;
        let salt_part = parts.next().ok_or(Self::Err::NotEnoughParts)?;

        let user_id = i64::from_str(user_id_part)
            .map_err(Self::Err::InvalidUserId)?
            .into();
        let secret = BASE64_URL_SAFE_NO_PAD
            .decode(secret_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidSecretLength)?;
        let salt = BASE64_URL_SAFE_NO_PAD
            .decode(salt_part)?
            .try_into()
            .map_err(|_| Self::Err::InvalidSaltLength)?;

        Ok(Self {
            user_id,
            secret,
            salt,
        })
    }
}

impl Debug for ApiToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiToken")
            .field("user_id", &self.user_id)
            .field("secret", &"[redacted]")
            .field("salt", &"[redacted]")
            .finish()
    }
}

impl TokenHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for TokenHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TokenHash").field(&"[redacted]").finish()
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The api token hash had an invalid length")]
pub struct InvalidTokenHashError;

impl TryFrom<Vec<u8>> for TokenHash {
    type Error = InvalidTokenHashError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Ok(Self(
            value.try_into().map_err(|_| InvalidTokenHashError)?,
        ))
    }
}

/// Optional lifetime of a token, always positive.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct TokenTtl(Duration);

impl TokenTtl {
    #[must_use]
    pub fn new(duration: Duration) -> Option<Self> {
        duration.is_positive().then_some(Self(duration))
    }

    #[must_use]
    pub fn get(self) -> Duration {
        self.0
    }
}

/// The principal a valid token resolves to.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct AuthSession {
    pub user: Id<UserMarker>,
    pub username: Username,
    pub staff: bool,
    pub expires_at: Option<OffsetDateTime>,
}

impl AuthSession {
    #[must_use]
    pub fn expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        auth::{ApiToken, AuthSession, TokenDecodeError, TokenTtl},
        user::Username,
    };
    use time::{Duration, macros::datetime};

    fn session(expires_at: Option<time::OffsetDateTime>) -> AuthSession {
        AuthSession {
            user: Id::new(1),
            username: Username::new("alice".to_owned()).unwrap(),
            staff: false,
            expires_at,
        }
    }

    #[test]
    fn token_survives_a_string_round_trip() {
        let token = ApiToken::generate_random(Id::new(17));
        let parsed: ApiToken = token.as_token_str().parse().unwrap();

        assert_eq!(parsed, token);
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert_eq!(
            "just-one-part".parse::<ApiToken>(),
            Err(TokenDecodeError::NotEnoughParts)
        );
        assert!(matches!(
            "x.YQ.YQ".parse::<ApiToken>(),
            Err(TokenDecodeError::InvalidUserId(_))
        ));
        assert_eq!(
            "17.YQ.YQ".parse::<ApiToken>(),
            Err(TokenDecodeError::InvalidSecretLength)
        );
    }

    #[test]
    fn hashing_is_deterministic() {
        let token = ApiToken::generate_random(Id::new(1));

        assert_eq!(token.hash().unwrap(), token.hash().unwrap());
    }

    #[test]
    fn debug_output_is_redacted() {
        let token = ApiToken::generate_random(Id::new(1));
        let debug = format!("{token:?} {:?}", token.hash().unwrap());

        assert_eq!(debug.matches("[redacted]").count(), 3);
        assert!(!debug.contains(&token.as_token_str()));
    }

    #[test]
    fn session_expiry() {
        let now = datetime!(2026-06-01 12:00 UTC);

        assert!(!session(None).expired_at(now));
        assert!(!session(Some(now + Duration::minutes(1))).expired_at(now));
        assert!(session(Some(now - Duration::minutes(1))).expired_at(now));
    }

    #[test]
    fn token_ttl_must_be_positive() {
        assert!(TokenTtl::new(Duration::hours(1)).is_some());
        assert!(TokenTtl::new(Duration::ZERO).is_none());
        assert!(TokenTtl::new(Duration::hours(-1)).is_none());
    }
}
