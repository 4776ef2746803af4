use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::admins::{AdminBootstrapOutcome, AdminDirectoryEntity};

#[async_trait]
#[automock]
pub trait AdminDirectoryRepository {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<AdminDirectoryEntity>>;

    /// Lookup by normalized (trimmed, lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminDirectoryEntity>>;

    /// One-time bootstrap: creates the record or reactivates an inactive
    /// one. An already-active record is reported, not overwritten.
    async fn upsert_active(&self, uid: &str, email: &str) -> Result<AdminBootstrapOutcome>;
}
