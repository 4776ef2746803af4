use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Automation capabilities a plan can grant. Stored as kebab-case tokens in
/// the plan's JSONB feature set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureFlag {
    #[serde(rename = "reminder-24h")]
    Reminder24h,
    #[serde(rename = "reminder-2h")]
    Reminder2h,
    #[serde(rename = "post-visit-feedback")]
    PostVisitFeedback,
    #[serde(rename = "birthday-reminder")]
    BirthdayReminder,
    #[serde(rename = "bulk-messaging")]
    BulkMessaging,
    #[serde(rename = "ai-auto-reply")]
    AiAutoReply,
    #[serde(rename = "escalation-to-human")]
    EscalationToHuman,
    #[serde(rename = "call-rejection")]
    CallRejection,
    #[serde(rename = "manager-notification")]
    ManagerNotification,
    /// Tokens written by newer deployments. Never matches a gate.
    #[serde(other)]
    Unknown,
}

impl Display for FeatureFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = match self {
            FeatureFlag::Reminder24h => "reminder-24h",
            FeatureFlag::Reminder2h => "reminder-2h",
            FeatureFlag::PostVisitFeedback => "post-visit-feedback",
            FeatureFlag::BirthdayReminder => "birthday-reminder",
            FeatureFlag::BulkMessaging => "bulk-messaging",
            FeatureFlag::AiAutoReply => "ai-auto-reply",
            FeatureFlag::EscalationToHuman => "escalation-to-human",
            FeatureFlag::CallRejection => "call-rejection",
            FeatureFlag::ManagerNotification => "manager-notification",
            FeatureFlag::Unknown => "unknown",
        };
        write!(f, "{}", flag)
    }
}

impl FeatureFlag {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "reminder-24h" => Some(FeatureFlag::Reminder24h),
            "reminder-2h" => Some(FeatureFlag::Reminder2h),
            "post-visit-feedback" => Some(FeatureFlag::PostVisitFeedback),
            "birthday-reminder" => Some(FeatureFlag::BirthdayReminder),
            "bulk-messaging" => Some(FeatureFlag::BulkMessaging),
            "ai-auto-reply" => Some(FeatureFlag::AiAutoReply),
            "escalation-to-human" => Some(FeatureFlag::EscalationToHuman),
            "call-rejection" => Some(FeatureFlag::CallRejection),
            "manager-notification" => Some(FeatureFlag::ManagerNotification),
            _ => None,
        }
    }
}
