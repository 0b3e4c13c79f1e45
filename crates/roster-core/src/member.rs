// # Member Model
//
// Two shapes of the same person:
//
// - [`DirectoryMember`]: what the directory service sends, both from its
//   list endpoint and inside change events. Every field is optional on the
//   wire, and an explicit `null` decodes the same as an absent field.
// - [`Member`]: the canonical stored record, keyed by `id`.
//
// Conversion between them lives in `crate::mapping`.

use serde::{Deserialize, Deserializer, Serialize};

/// Canonical member record as stored
///
/// Every upsert carries a complete instance; there are no partial patches.
/// Members are never removed, `deleted` is set instead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Member {
    /// Stable identifier assigned by the directory (primary key)
    pub id: String,
    /// Handle / login
    pub name: String,
    /// Display name
    pub real_name: String,
    /// Deactivated upstream
    pub deleted: bool,
    /// Free-form zone identifier or offset label
    pub timezone: String,
    pub status_text: String,
    pub status_emoji: String,
    /// Profile image URL
    pub avatar_url: String,
}

impl Member {
    /// Create a member with only an id set
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Reject records that would break the store's key invariant
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.id.is_empty() {
            return Err(crate::Error::invalid_input("member id cannot be empty"));
        }
        Ok(())
    }
}

/// Member as represented by the directory service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryMember {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub deleted: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub real_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tz: String,
    #[serde(deserialize_with = "null_as_default")]
    pub profile: DirectoryProfile,
}

/// Nested profile object of a [`DirectoryMember`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryProfile {
    #[serde(deserialize_with = "null_as_default")]
    pub status_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status_emoji: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_512: String,
}

/// Decode `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
