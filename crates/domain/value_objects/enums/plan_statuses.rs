use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlanStatus {
    #[default]
    Active,
    Inactive,
}

impl Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            PlanStatus::Active => "active",
            PlanStatus::Inactive => "inactive",
        };
        write!(f, "{}", status)
    }
}

impl PlanStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => PlanStatus::Active,
            "inactive" => PlanStatus::Inactive,
            _ => PlanStatus::Inactive,
        }
    }
}
