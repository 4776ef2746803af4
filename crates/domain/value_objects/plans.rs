use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::feature_flags::FeatureFlag;

/// Fixed UUID representing the free plan. Never expires.
pub const FREE_PLAN_ID: Uuid = Uuid::nil();

/// The one deprecated trial plan removed by catalog sync when present.
pub const LEGACY_TRIAL_PLAN_ID: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_0000dead0001);

/// Daily outbound-message cap applied when a plan declares no explicit limit.
pub const FREE_DAILY_MESSAGE_LIMIT: i64 = 30;

/// Feature grants and limits attached to a plan. Stored as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PlanFeatures {
    #[serde(default)]
    pub flags: BTreeSet<FeatureFlag>,

    #[serde(default)]
    pub daily_message_limit: Option<i64>,
}

impl PlanFeatures {
    pub fn has(&self, flag: FeatureFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn daily_message_limit_or_default(&self) -> i64 {
        self.daily_message_limit.unwrap_or(FREE_DAILY_MESSAGE_LIMIT)
    }
}

impl FromIterator<FeatureFlag> for PlanFeatures {
    fn from_iter<I: IntoIterator<Item = FeatureFlag>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
            daily_message_limit: None,
        }
    }
}

/// Customer-facing plan shape returned by the listing routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_minor: i32,
    pub duration_days: i32,
    pub features: PlanFeatures,
    pub is_featured: bool,
}

impl From<crate::domain::entities::plans::PlanEntity> for PlanDto {
    fn from(value: crate::domain::entities::plans::PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price_minor: value.price_minor,
            duration_days: value.duration_days,
            features: value.features,
            is_featured: value.is_featured,
        }
    }
}
