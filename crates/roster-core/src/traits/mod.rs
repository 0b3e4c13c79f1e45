//! Core traits for the roster sync service
//!
//! This module defines the capability interfaces injected into the core.
//!
//! - [`MemberLister`]: Fetch the full member list from the directory
//! - [`MemberStore`]: Persist and list members

pub mod member_lister;
pub mod member_store;

pub use member_lister::MemberLister;
pub use member_store::MemberStore;
