pub mod admins;
pub mod contacts;
pub mod daily_quota;
pub mod messaging;
pub mod plans;
pub mod tenants;
