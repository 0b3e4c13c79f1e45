//! Directory → storage mapping
//!
//! Shared by the bulk reconciliation path and the single change-event path
//! so both write identical records for identical input.

use crate::member::{DirectoryMember, Member};

/// Map a directory member to the stored record shape
///
/// Total: absent upstream fields already default to empty / `false` at
/// decode time, so there is nothing here that can fail.
pub fn to_member_record(source: &DirectoryMember) -> Member {
    Member {
        id: source.id.clone(),
        name: source.name.clone(),
        real_name: source.real_name.clone(),
        deleted: source.deleted,
        timezone: source.tz.clone(),
        status_text: source.profile.status_text.clone(),
        status_emoji: source.profile.status_emoji.clone(),
        avatar_url: source.profile.image_512.clone(),
    }
}

/// Map a whole directory listing, preserving order
pub fn to_member_records(source: &[DirectoryMember]) -> Vec<Member> {
    source.iter().map(to_member_record).collect()
}
