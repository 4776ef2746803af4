use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plans::PlanEntity;

#[async_trait]
#[automock]
pub trait PlanRepository {
    /// Resolves any plan by id, including free and deprecated ones.
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;

    /// Customer-facing listing: price ascending, zero-price and deprecated
    /// plans excluded.
    async fn list_paid_plans(&self) -> Result<Vec<PlanEntity>>;

    async fn list_all_plans(&self) -> Result<Vec<PlanEntity>>;

    async fn upsert_plan(&self, plan: PlanEntity) -> Result<()>;

    /// Returns true when a row was actually deleted.
    async fn delete_plan(&self, plan_id: Uuid) -> Result<bool>;
}
