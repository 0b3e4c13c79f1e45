// # Member Store Implementations
//
// This module provides implementations of the MemberStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileMemberStore;
pub use memory::MemoryMemberStore;

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::traits::MemberStore;

/// Build the member store described by the configuration
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn MemberStore>, crate::Error> {
    config.validate()?;

    match config {
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory member store; members are lost on restart");
            Ok(Arc::new(MemoryMemberStore::new()))
        }
        StoreConfig::File { path } => {
            let store = FileMemberStore::open(path).await?;
            tracing::info!("Using file member store at {}", store.path().display());
            Ok(Arc::new(store))
        }
    }
}
