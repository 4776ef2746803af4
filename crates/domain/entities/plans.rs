use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::{enums::plan_statuses::PlanStatus, plans::PlanFeatures},
    infra::db::postgres::schema::plans,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_minor: i32,
    pub duration_days: i32,
    pub features: PlanFeatures,
    pub is_featured: bool,
    pub status: PlanStatus,
}

impl PlanEntity {
    pub fn is_free(&self) -> bool {
        self.duration_days == 0
    }
}

/// Raw row used for Diesel queries. Features stay as JSON and are parsed into PlanFeatures.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_minor: i32,
    pub duration_days: i32,
    pub features: serde_json::Value,
    pub is_featured: bool,
    pub status: String,
}

impl From<PlanRow> for PlanEntity {
    fn from(value: PlanRow) -> Self {
        let features = serde_json::from_value(value.features).unwrap_or_default();

        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price_minor: value.price_minor,
            duration_days: value.duration_days,
            features,
            is_featured: value.is_featured,
            status: PlanStatus::from_str(&value.status),
        }
    }
}

/// Write-side row for catalog sync and admin updates.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = plans)]
pub struct UpsertPlanRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_minor: i32,
    pub duration_days: i32,
    pub features: serde_json::Value,
    pub is_featured: bool,
    pub status: String,
}

impl From<&PlanEntity> for UpsertPlanRow {
    fn from(value: &PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            description: value.description.clone(),
            price_minor: value.price_minor,
            duration_days: value.duration_days,
            features: serde_json::to_value(&value.features).unwrap_or_default(),
            is_featured: value.is_featured,
            status: value.status.to_string(),
        }
    }
}
