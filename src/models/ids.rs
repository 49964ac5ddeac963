use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ModelError;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn parse(raw: impl AsRef<str>) -> Result<Self, ModelError> {
                let trimmed = raw.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(ModelError::EmptyIdentifier($label));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::parse(raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(PollId, "poll id");
identifier!(OptionId, "option id");
identifier!(
    /// Opaque caller identity handed to us by the identity provider.
    UserId,
    "user id"
);
identifier!(VoteId, "vote id");
