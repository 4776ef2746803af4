use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::system_admins;

/// Directory-backed admin record. Only `active = true` grants authority.
#[derive(Debug, Clone, Selectable, Queryable)]
#[diesel(table_name = system_admins)]
pub struct AdminDirectoryEntity {
    pub uid: String,
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of the one-time bootstrap upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminBootstrapOutcome {
    Created,
    Reactivated,
    AlreadyActive,
}
