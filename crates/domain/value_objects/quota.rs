use serde::{Deserialize, Serialize};

/// Outcome of a quota check-and-increment. `sent_count` is the count after
/// the call: unchanged on denial, incremented on success.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub sent_count: i64,
}
