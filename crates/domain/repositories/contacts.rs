use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::contacts::ContactEntity;

#[async_trait]
#[automock]
pub trait ContactRepository {
    async fn list_birthday_contacts(
        &self,
        tenant_id: Uuid,
        month: i32,
        day: i32,
    ) -> Result<Vec<ContactEntity>>;

    /// Contacts whose last visit falls inside the given window, used by the
    /// return-reminder job. Bounds are computed by the caller so a batch
    /// that straddles midnight stays consistent.
    async fn list_return_due_contacts(
        &self,
        tenant_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<ContactEntity>>;
}
