// # Member Lister Trait
//
// Defines the interface for fetching the full member list from the
// directory service.
//
// ## Implementations
//
// - Slack Web API: `roster-directory-slack` crate
// - Tests: scripted in-memory fakes
//
// ## Usage
//
// ```rust,ignore
// use roster_core::MemberLister;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let directory = /* MemberLister implementation */;
//
//     let members = directory.list_members().await?;
//     println!("{} members upstream", members.len());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::member::DirectoryMember;

/// Trait for directory client implementations
///
/// # Trust Level: Untrusted
///
/// Directory clients are **untrusted** external integrations:
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS calls to their own API endpoints
/// - ✅ Follow the API's own pagination to return a complete listing
/// - ✅ Return success or failure (the reconciler handles retry)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (owned by `Reconciler`)
/// - ❌ Access the member store (owned by `Reconciler`)
/// - ❌ Map to storage records (owned by `mapping`)
/// - ❌ Spawn tasks that outlive a call
///
/// ## Cancellation
///
/// The reconciler bounds each call with a timeout and drops the future on
/// expiry, so implementations must be cancellation-safe.
#[async_trait]
pub trait MemberLister: Send + Sync {
    /// Fetch every member of the organization
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DirectoryMember>)`: The complete listing
    /// - `Err(Error)`: Any failure; a partial listing is never returned
    async fn list_members(&self) -> Result<Vec<DirectoryMember>, crate::Error>;

    /// Get the directory name (for logging/debugging)
    fn directory_name(&self) -> &'static str;
}
