use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Why a feature check was denied. Callers render "renew" prompts for
/// expiry and "upgrade" prompts for a plan that simply lacks the feature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DenialReason {
    AccessExpired,
    PlanLacksFeature,
}

impl Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            DenialReason::AccessExpired => "access expired",
            DenialReason::PlanLacksFeature => "plan lacks feature",
        };
        write!(f, "{}", reason)
    }
}

/// Outcome of a feature-entitlement check. Denial is an expected result,
/// not an error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: Option<DenialReason>,
}

impl AccessDecision {
    pub fn granted() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn denied(reason: DenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}
