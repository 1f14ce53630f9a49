use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", $label, " identifier, rejecting blank input.")]
            pub fn new(id: impl Into<String>) -> Result<Self> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(CoreError::InvalidIdentifier(format!(
                        "{} id must not be empty",
                        $label
                    )));
                }
                Ok(Self(id))
            }

            /// Creates an identifier without validation.
            ///
            /// Use this only for ids handed out by the backend.
            pub fn new_unchecked(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a site user (comment author, follower, favoriter).
    UserId,
    "user"
);
string_id!(
    /// Identifier of a design template shown in the gallery.
    TemplateId,
    "template"
);
string_id!(
    /// Identifier of a comment or reply, assigned by the backend.
    CommentId,
    "comment"
);
